use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
/// Requested precision tier for a location fix
pub enum GeolocatorPositionAccuracy {
    Lowest,
    Low,
    Medium,
    High,
    #[default]
    Best,
    BestForNavigation,
    /// Approximate location only (iOS 14+ reduced accuracy mode)
    Reduced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
/// Authorization the app currently holds for accessing the device's location
pub enum GeolocatorPermissionStatus {
    /// Denied, but the user may still be prompted again
    Denied,
    /// Denied permanently, only the app settings can change this
    DeniedForever,
    /// Granted only while the app is in use
    WhileInUse,
    /// Granted even while the app runs in the background
    Always,
    /// The platform could not determine the status
    UnableToDetermine,
}

impl GeolocatorPermissionStatus {
    /// Whether the app is allowed to receive locations in any form
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::WhileInUse | Self::Always)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
/// Kind of activity the location updates are used for, Apple platforms only
pub enum GeolocatorActivityType {
    AutomotiveNavigation,
    Fitness,
    OtherNavigation,
    Airborne,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
/// The platform the hosting page is running on
pub enum RuntimePlatform {
    Web,
    Android,
    Ios,
    MacOs,
    Windows,
    Linux,
}

impl RuntimePlatform {
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Web)
    }

    /// Platform of the current native build, never [RuntimePlatform::Web]
    pub const fn native() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

impl fmt::Display for RuntimePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Web => "web",
            Self::Android => "android",
            Self::Ios => "ios",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
        };
        f.write_str(name)
    }
}
