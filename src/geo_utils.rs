//! Geographic and time utilities shared across the pipeline.

use crate::Coordinate;
use chrono::{DateTime, Timelike, Utc};

/// Spherical-earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers (haversine).
///
/// # Example
/// ```
/// use towertrace::Coordinate;
/// use towertrace::geo_utils::haversine_km;
///
/// let london = Coordinate::new(51.5074, -0.1278);
/// let paris = Coordinate::new(48.8566, 2.3522);
/// let d = haversine_km(&london, &paris);
/// assert!(d > 340.0 && d < 350.0);
/// ```
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Absolute gap between two epoch-second timestamps, in minutes.
pub fn minutes_between(a: i64, b: i64) -> f64 {
    (b - a).abs() as f64 / 60.0
}

/// Implied travel speed in km/h, or infinity for a zero/negative gap.
pub fn implied_speed_kmh(distance_km: f64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return f64::INFINITY;
    }
    distance_km / (elapsed_secs / 3600.0)
}

/// UTC hour of day (0-23) for an epoch-second timestamp.
///
/// Returns `None` for timestamps chrono cannot represent.
pub fn hour_of_day(timestamp: i64) -> Option<u32> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.hour())
}

/// Whether an hour falls inside the wrap-around night window
/// `[night_start, 23] ∪ [0, night_end]`.
pub fn is_night_hour(hour: u32, night_start: u32, night_end: u32) -> bool {
    hour >= night_start || hour <= night_end
}

/// Whether a timestamp falls in the night window. Unrepresentable timestamps
/// are treated as daytime.
pub fn is_night(timestamp: i64, night_start: u32, night_end: u32) -> bool {
    hour_of_day(timestamp)
        .map(|h| is_night_hour(h, night_start, night_end))
        .unwrap_or(false)
}
