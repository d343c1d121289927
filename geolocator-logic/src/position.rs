use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A fix as reported by the native location layer
pub struct GeolocatorPosition {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Speed in meters per second
    #[serde(default)]
    pub speed: Option<f64>,
    /// Altitude in meters above the WGS84 ellipsoid
    #[serde(default)]
    pub altitude: Option<f64>,
    /// When the fix was taken, milliseconds since the epoch on the wire
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<UtcDT>,
    /// Estimated horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub altitude_accuracy: Option<f64>,
    /// Heading in degrees, 0 is north
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub heading_accuracy: Option<f64>,
    #[serde(default)]
    pub speed_accuracy: Option<f64>,
    /// Floor inside a building, only reported on some Apple devices
    #[serde(default)]
    pub floor: Option<i32>,
    /// Android only, whether the fix came from a mock provider
    #[serde(default)]
    pub is_mocked: Option<bool>,
}

impl GeolocatorPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed: None,
            altitude: None,
            timestamp: None,
            accuracy: None,
            altitude_accuracy: None,
            heading: None,
            heading_accuracy: None,
            speed_accuracy: None,
            floor: None,
            is_mocked: None,
        }
    }
}
