use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

use crate::types::{GeolocatorActivityType, GeolocatorPositionAccuracy};

/// Durations travel as whole milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => ser.serialize_some(&(value.as_millis() as u64)),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(de).map(|ms| ms.map(Duration::from_millis))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Settings for a location request, the common fields apply on every platform, the rest is
/// in [PlatformSettings]
pub struct GeolocatorSettings {
    /// Accuracy the native layer should try to achieve
    #[serde(default)]
    pub accuracy: GeolocatorPositionAccuracy,
    /// Minimum distance in meters the device has to move before a new position is pushed
    #[serde(default)]
    pub distance_filter: u32,
    /// Give up on a single fetch after this long
    #[serde(default, with = "duration_ms::option")]
    pub time_limit: Option<Duration>,
    #[serde(flatten)]
    pub platform: PlatformSettings,
}

impl GeolocatorSettings {
    pub fn with_accuracy(accuracy: GeolocatorPositionAccuracy) -> Self {
        Self {
            accuracy,
            ..Default::default()
        }
    }

    pub fn distance_filter(mut self, meters: u32) -> Self {
        self.distance_filter = meters;
        self
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn platform(mut self, platform: impl Into<PlatformSettings>) -> Self {
        self.platform = platform.into();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(tag = "platform", rename_all = "snake_case")]
/// Platform specific part of [GeolocatorSettings]. The native layer ignores or rejects a variant
/// that doesn't match the platform it runs on. Settings without a `platform` key decode as
/// [PlatformSettings::Generic].
pub enum PlatformSettings {
    #[default]
    Generic,
    Web(WebSettings),
    Apple(AppleSettings),
    Android(AndroidSettings),
}

#[derive(Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
enum TaggedPlatform {
    Generic,
    Web(WebSettings),
    Apple(AppleSettings),
    Android(AndroidSettings),
}

impl From<TaggedPlatform> for PlatformSettings {
    fn from(tagged: TaggedPlatform) -> Self {
        match tagged {
            TaggedPlatform::Generic => Self::Generic,
            TaggedPlatform::Web(web) => Self::Web(web),
            TaggedPlatform::Apple(apple) => Self::Apple(apple),
            TaggedPlatform::Android(android) => Self::Android(android),
        }
    }
}

impl<'de> Deserialize<'de> for PlatformSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        if fields.get("platform").is_none_or(Value::is_null) {
            return Ok(Self::Generic);
        }
        serde_json::from_value::<TaggedPlatform>(Value::Object(fields))
            .map(Self::from)
            .map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSettings {
    /// Maximum age of a cached position the browser may hand back, zero forces a new fix
    #[serde(default, with = "duration_ms")]
    pub maximum_age: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppleSettings {
    pub activity_type: GeolocatorActivityType,
    pub pause_location_updates_automatically: bool,
    pub show_background_location_indicator: bool,
    pub allow_background_location_updates: bool,
}

impl Default for AppleSettings {
    fn default() -> Self {
        Self {
            activity_type: GeolocatorActivityType::default(),
            pause_location_updates_automatically: false,
            show_background_location_indicator: false,
            allow_background_location_updates: true,
        }
    }
}

const DEFAULT_CHANNEL_NAME: &str = "Background Location";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AndroidSettings {
    /// Use the legacy LocationManager instead of the fused provider
    pub force_location_manager: bool,
    /// Interval between location updates
    #[serde(with = "duration_ms::option")]
    pub interval_duration: Option<Duration>,
    pub foreground_notification_text: Option<String>,
    pub foreground_notification_title: Option<String>,
    pub foreground_notification_channel_name: String,
    pub foreground_notification_enable_wake_lock: bool,
    pub foreground_notification_enable_wifi_lock: bool,
    pub foreground_notification_set_ongoing: bool,
    /// Any color value the host UI understands, e.g. `#ff0000` or `red`
    pub foreground_notification_color: Option<String>,
}

impl Default for AndroidSettings {
    fn default() -> Self {
        Self {
            force_location_manager: false,
            interval_duration: None,
            foreground_notification_text: None,
            foreground_notification_title: None,
            foreground_notification_channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            foreground_notification_enable_wake_lock: false,
            foreground_notification_enable_wifi_lock: false,
            foreground_notification_set_ongoing: false,
            foreground_notification_color: None,
        }
    }
}

impl From<WebSettings> for PlatformSettings {
    fn from(v: WebSettings) -> Self {
        Self::Web(v)
    }
}

impl From<AppleSettings> for PlatformSettings {
    fn from(v: AppleSettings) -> Self {
        Self::Apple(v)
    }
}

impl From<AndroidSettings> for PlatformSettings {
    fn from(v: AndroidSettings) -> Self {
        Self::Android(v)
    }
}
