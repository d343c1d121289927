use chrono::Utc;
use geolocator_logic::{
    GeolocatorPermissionStatus, GeolocatorPosition, GeolocatorPositionAccuracy,
    GeolocatorSettings, Method,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::distance::{haversine_distance, offset};

/// How the simulated device starts out
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub start: (f64, f64),
    pub permission: GeolocatorPermissionStatus,
    pub service_enabled: bool,
    /// Behave like a browser, which has no last known position or settings pages
    pub web: bool,
    /// Largest distance in meters the device moves per step
    pub max_step: f64,
    pub seed: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            start: (37.7749, -122.4194),
            permission: GeolocatorPermissionStatus::Denied,
            service_enabled: true,
            web: false,
            max_step: 15.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DistanceArgs {
    start_latitude: f64,
    start_longitude: f64,
    end_latitude: f64,
    end_longitude: f64,
}

/// Stand-in for a phone's location stack, answers the same calls a real native layer would
pub struct SimulatedDevice {
    rng: ChaCha20Rng,
    coords: (f64, f64),
    heading: f64,
    speed: f64,
    last_pushed: Option<(f64, f64)>,
    permission: GeolocatorPermissionStatus,
    service_enabled: bool,
    web: bool,
    max_step: f64,
    settings: GeolocatorSettings,
}

fn accuracy_meters(accuracy: GeolocatorPositionAccuracy) -> f64 {
    match accuracy {
        GeolocatorPositionAccuracy::Lowest => 3000.0,
        GeolocatorPositionAccuracy::Low => 1000.0,
        GeolocatorPositionAccuracy::Medium => 100.0,
        GeolocatorPositionAccuracy::High => 10.0,
        GeolocatorPositionAccuracy::Best => 5.0,
        GeolocatorPositionAccuracy::BestForNavigation => 3.0,
        GeolocatorPositionAccuracy::Reduced => 5000.0,
    }
}

impl SimulatedDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(config.seed),
            coords: config.start,
            heading: 0.0,
            speed: 0.0,
            last_pushed: None,
            permission: config.permission,
            service_enabled: config.service_enabled,
            web: config.web,
            max_step: config.max_step,
            settings: GeolocatorSettings::default(),
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        self.coords
    }

    pub fn set_service_enabled(&mut self, enabled: bool) {
        self.service_enabled = enabled;
    }

    fn can_locate(&self) -> Result<(), String> {
        if !self.permission.is_granted() {
            Err("User denied permissions to access the device's location".to_string())
        } else if !self.service_enabled {
            Err("Location services are disabled".to_string())
        } else {
            Ok(())
        }
    }

    fn position(&self) -> GeolocatorPosition {
        let (latitude, longitude) = self.coords;
        GeolocatorPosition {
            speed: Some(self.speed),
            altitude: Some(0.0),
            timestamp: Some(Utc::now()),
            accuracy: Some(accuracy_meters(self.settings.accuracy)),
            heading: Some(self.heading),
            is_mocked: Some(true),
            ..GeolocatorPosition::new(latitude, longitude)
        }
    }

    fn position_value(&self) -> Result<Value, String> {
        serde_json::to_value(self.position()).map_err(|why| why.to_string())
    }

    /// Answer a call the way a native layer would, `Err` carries the message to fail it with
    pub fn handle_call(&mut self, method: &str, args: &Value) -> Result<Value, String> {
        let method = Method::from_name(method).ok_or_else(|| format!("Unknown method {method}"))?;

        if self.web && !method.supported_on_web() {
            return Err(format!("{method} is not supported on web"));
        }

        match method {
            Method::GetCurrentPosition => {
                let settings = match args.get("configuration") {
                    Some(Value::Null) | None => GeolocatorSettings::default(),
                    Some(raw) => serde_json::from_value(raw.clone())
                        .map_err(|why| format!("Invalid configuration: {why}"))?,
                };
                self.can_locate()?;
                self.settings = settings;
                self.position_value()
            }
            Method::GetLastKnownPosition => {
                self.can_locate()?;
                self.position_value()
            }
            Method::GetPermissionStatus => Ok(json!(self.permission)),
            Method::RequestPermission => {
                if self.permission == GeolocatorPermissionStatus::Denied {
                    self.permission = GeolocatorPermissionStatus::WhileInUse;
                }
                Ok(json!(self.permission))
            }
            Method::IsLocationServiceEnabled => Ok(json!(self.service_enabled)),
            Method::OpenAppSettings => Ok(json!(true)),
            Method::OpenLocationSettings => {
                // Pretend the user flipped the switch
                self.service_enabled = true;
                Ok(json!(true))
            }
            Method::DistanceBetween => {
                let args: DistanceArgs = serde_json::from_value(args.clone())
                    .map_err(|why| format!("Invalid coordinates: {why}"))?;
                let dist = haversine_distance(
                    (args.start_latitude, args.start_longitude),
                    (args.end_latitude, args.end_longitude),
                );
                Ok(json!(dist))
            }
        }
    }

    /// Move the device a bit. Returns the new position if it should be pushed to the bridge,
    /// i.e. locating is possible and it moved at least the distance filter since the last push.
    pub fn step(&mut self) -> Option<Value> {
        let meters: f64 = self.rng.random_range(0.0..=self.max_step);
        let turn: f64 = self.rng.random_range(-30.0..=30.0);
        self.heading = (self.heading + turn).rem_euclid(360.0);
        self.speed = meters;
        self.coords = offset(self.coords, meters, self.heading);

        if self.can_locate().is_err() {
            return None;
        }

        let filter = self.settings.distance_filter as f64;
        let moved_enough = self
            .last_pushed
            .is_none_or(|last| haversine_distance(last, self.coords) >= filter);

        if moved_enough {
            self.last_pushed = Some(self.coords);
            self.position_value().ok()
        } else {
            None
        }
    }
}
