use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::position::GeolocatorPosition;

/// The device's position changed, fired for every position the native layer pushes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeolocatorPositionChangeEvent {
    pub position: GeolocatorPosition,
}

/// An error not tied to a specific call, e.g. the position stream failed or a detached call
/// didn't go through. The payload is passed along as the native layer sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeolocatorErrorEvent {
    pub data: Value,
}

impl GeolocatorErrorEvent {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            data: Value::String(msg.into()),
        }
    }
}
