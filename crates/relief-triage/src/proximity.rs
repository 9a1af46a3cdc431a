use relief_types::Coordinates;
use serde::Serialize;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance at or under which a disaster counts as nearby.
pub const NEARBY_RADIUS_KM: f64 = 10.0;

/// Distance between an observer and a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Proximity {
    pub nearby: bool,
    pub distance_km: f64,
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn classify_proximity(observer: Coordinates, target: Coordinates) -> Proximity {
    let distance_km = haversine_km(observer, target);
    Proximity {
        nearby: distance_km <= NEARBY_RADIUS_KM,
        distance_km,
    }
}
