//! Geographic calculations and the banded travel time model

use crate::types::{Coordinates, OptimizerConfig};

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude in kilometers
pub const KM_PER_DEGREE: f64 = 111.32;

/// A coordinate pair is usable when both parts are finite, in range and non-zero.
/// Zero is how upstream imports mark "no fix".
pub fn has_valid_fix(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && lat != 0.0
        && lng != 0.0
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Haversine distance in kilometers.
///
/// Returns `f64::INFINITY` when any input is NaN, so the result never compares
/// as "close" to anything.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1.is_nan() || lon1.is_nan() || lat2.is_nan() || lon2.is_nan() {
        return f64::INFINITY;
    }

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two coordinate pairs in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    distance_km(from.lat, from.lng, to.lat, to.lng)
}

/// Estimate road distance from straight-line distance
pub fn road_distance_km(straight_km: f64, config: &OptimizerConfig) -> f64 {
    straight_km * config.driving_distance_factor
}

/// Estimate travel time in minutes for a leg of `distance_km`.
///
/// Speed depends on the leg length (urban, arterial, highway) and the traffic
/// multiplier is raised to a floor on short legs.
pub fn travel_time_min(distance_km: f64, config: &OptimizerConfig) -> f64 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0.0;
    }

    let bands = &config.speed_bands;
    let speed_kmh = if distance_km < bands.urban_limit_km {
        bands.urban_kmh
    } else if distance_km <= bands.arterial_limit_km {
        bands.arterial_kmh
    } else {
        config.highway_kmh()
    };

    let traffic = if distance_km < bands.short_leg_limit_km {
        config.traffic_factor.max(bands.short_leg_traffic_floor)
    } else {
        config.traffic_factor
    };

    (distance_km / speed_kmh) * 60.0 * traffic
}

/// Longitude span (degrees) covering `lat_window` degrees of ground distance at `lat`
pub fn lng_window_for(lat_window: f64, lat: f64) -> f64 {
    let cos = lat.to_radians().cos().abs().max(0.01);
    lat_window / cos
}

/// Absolute longitude difference in degrees, wrapped across the antimeridian (0..=180)
pub fn lng_delta(a: f64, b: f64) -> f64 {
    (((b - a) + 540.0) % 360.0 - 180.0).abs()
}
