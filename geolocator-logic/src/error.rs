use std::time::Duration;

use crate::{transport::Method, types::RuntimePlatform};

#[derive(Debug, thiserror::Error)]
pub enum GeolocatorError {
    /// No reply arrived in time. The native request itself keeps running.
    #[error("{method} timed out after {timeout:?}")]
    Timeout { method: Method, timeout: Duration },

    /// The call has no equivalent on this platform, nothing was sent
    #[error("{method} is not supported on {platform}")]
    Unsupported {
        method: Method,
        platform: RuntimePlatform,
    },

    /// The channel to the native layer failed or the peer rejected the call
    #[error("Transport error: {0:#}")]
    Transport(#[from] anyhow::Error),

    /// The native layer replied with something that doesn't fit the expected type
    #[error("Invalid reply to {method}: {source}")]
    InvalidReply {
        method: Method,
        #[source]
        source: serde_json::Error,
    },
}

impl GeolocatorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
