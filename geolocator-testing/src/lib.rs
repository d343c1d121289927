mod device;
mod distance;

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use device::{DeviceConfig, SimulatedDevice};
pub use distance::{EARTH_RADIUS_M, haversine_distance, offset};
pub use prelude::*;
