use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::*;

/// Remote operations the native peer understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    GetCurrentPosition,
    GetLastKnownPosition,
    GetPermissionStatus,
    RequestPermission,
    IsLocationServiceEnabled,
    OpenAppSettings,
    OpenLocationSettings,
    DistanceBetween,
}

impl Method {
    pub const ALL: [Self; 8] = [
        Self::GetCurrentPosition,
        Self::GetLastKnownPosition,
        Self::GetPermissionStatus,
        Self::RequestPermission,
        Self::IsLocationServiceEnabled,
        Self::OpenAppSettings,
        Self::OpenLocationSettings,
        Self::DistanceBetween,
    ];

    /// Name of the method on the wire
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetCurrentPosition => "get_current_position",
            Self::GetLastKnownPosition => "get_last_known_position",
            Self::GetPermissionStatus => "get_permission_status",
            Self::RequestPermission => "request_permission",
            Self::IsLocationServiceEnabled => "is_location_service_enabled",
            Self::OpenAppSettings => "open_app_settings",
            Self::OpenLocationSettings => "open_location_settings",
            Self::DistanceBetween => "distance_between",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Whether the method has an equivalent in the browser's geolocation API
    pub const fn supported_on_web(&self) -> bool {
        !matches!(
            self,
            Self::GetLastKnownPosition | Self::OpenAppSettings | Self::OpenLocationSettings
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A push notification from the native layer that isn't the reply to a call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NativeEvent {
    /// A new position, still in its raw form
    PositionChange(Value),
    /// An asynchronous failure, the payload is opaque
    Error(Value),
    /// The channel to the native layer closed, no more events will come
    Disconnected,
}

pub trait Transport: Send + Sync {
    /// Invoke `method` on the native peer and wait for its raw reply.
    /// This is not expected to time out on its own, callers race it against a timer.
    fn invoke(&self, method: Method, args: Value) -> impl Future<Output = Result<Value>> + Send;
    /// Wait for the next batch of push notifications
    fn receive_notifications(&self) -> impl Future<Output = Vec<NativeEvent>> + Send;
    /// Disconnect from the native peer
    fn disconnect(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
