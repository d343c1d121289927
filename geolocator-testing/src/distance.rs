/// Mean radius of the Earth in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude, close enough for small steps
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance in meters between two (latitude, longitude) pairs in degrees,
/// using the haversine formula
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Move `from` by `meters` towards `bearing` (degrees, 0 is north)
pub fn offset(from: (f64, f64), meters: f64, bearing: f64) -> (f64, f64) {
    let (lat, lon) = from;
    let bearing = bearing.to_radians();
    let dlat = meters * bearing.cos() / METERS_PER_DEGREE;
    let dlon = meters * bearing.sin() / (METERS_PER_DEGREE * lat.to_radians().cos().max(1e-6));
    ((lat + dlat).clamp(-90.0, 90.0), wrap_longitude(lon + dlon))
}

fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
