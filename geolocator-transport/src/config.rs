use std::time::Duration;

use interprocess::local_socket::{GenericNamespaced, Name, ToNsName};

use geolocator_logic::prelude::*;

const fn default_socket() -> &'static str {
    if let Some(name) = option_env!("GEOLOCATOR_SOCKET") {
        name
    } else {
        "geolocator.sock"
    }
}

const fn connect_timeout_secs() -> u64 {
    if let Some(secs) = option_env!("GEOLOCATOR_CONNECT_TIMEOUT") {
        const_str::parse!(secs, u64)
    } else {
        5
    }
}

/// Socket the native peer listens on unless told otherwise
pub const DEFAULT_SOCKET_NAME: &str = default_socket();

/// How long to wait for the native peer to accept the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(connect_timeout_secs());

pub fn socket_name(base_name: &str) -> Result<Name<'static>> {
    base_name
        .to_string()
        .to_ns_name::<GenericNamespaced>()
        .context("Failed to parse socket name")
}
