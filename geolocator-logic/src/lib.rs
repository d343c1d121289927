mod error;
mod events;
mod geolocator;
mod position;
mod services;
mod settings;
#[cfg(test)]
mod tests;
mod transport;
mod types;

pub use error::GeolocatorError;
pub use events::{GeolocatorErrorEvent, GeolocatorPositionChangeEvent};
pub use geolocator::{
    CURRENT_POSITION_TIMEOUT, DEFAULT_TIMEOUT, DISCONNECTED_MESSAGE, DetachedCall, Geolocator,
    GeolocatorResult, REQUEST_PERMISSION_TIMEOUT,
};
pub use position::{GeolocatorPosition, UtcDT};
pub use services::{Service, ServiceCollection};
pub use settings::{AndroidSettings, AppleSettings, GeolocatorSettings, PlatformSettings, WebSettings};
pub use transport::{Method, NativeEvent, Transport};
pub use types::{
    GeolocatorActivityType, GeolocatorPermissionStatus, GeolocatorPositionAccuracy,
    RuntimePlatform,
};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
