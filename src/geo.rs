/*!
 * Geographic calculations.
 *
 * Idling locations come from vehicle GPS fixes, so a spherical Earth and the haversine formula
 * are plenty accurate for grouping points that are a few miles apart.
 */

use crate::IdleSpotError;
use serde::Serialize;

/// Mean radius of the Earth in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Check that the latitude is within -90 to 90 and the longitude within -180 to 180.
    pub fn validate(&self) -> Result<(), IdleSpotError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(IdleSpotError::InvalidInput(format!(
                "non-finite coordinate ({}, {})",
                self.lat, self.lon
            )));
        }

        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(IdleSpotError::InvalidInput(format!(
                concat!(
                    "coordinate out of range (-90.0 to 90.0 and -180.0 to 180.0):",
                    " lat={} lon={}"
                ),
                self.lat, self.lon
            )));
        }

        Ok(())
    }

    /// Test whether two coordinates are within `eps` degrees of each other in both directions.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }
}

/**
 * The simple great circle distance calculation (haversine formula).
 *
 * #Arguments
 * * from - the first point.
 * * to - the second point.
 * * earth_radius - the radius of the Earth in whatever units the result should have.
 *
 * #Returns
 * The distance between the points in the units of `earth_radius`.
 */
pub fn great_circle_distance(from: Coord, to: Coord, earth_radius: f64) -> f64 {
    let lat1_r = from.lat * DEG2RAD;
    let lon1_r = from.lon * DEG2RAD;
    let lat2_r = to.lat * DEG2RAD;
    let lon2_r = to.lon * DEG2RAD;

    let sin_dlat = f64::sin((lat2_r - lat1_r) / 2.0);
    let sin_dlon = f64::sin((lon2_r - lon1_r) / 2.0);

    let h = sin_dlat * sin_dlat + sin_dlon * sin_dlon * f64::cos(lat1_r) * f64::cos(lat2_r);

    // Rounding can push h a hair over 1 for antipodal points.
    let arc = 2.0 * f64::asin(f64::sqrt(h.min(1.0)));

    arc * earth_radius
}

/// The change in longitude (degrees) along the equator that covers `miles`.
pub fn equatorial_degrees(miles: f64, earth_radius: f64) -> f64 {
    miles / earth_radius / DEG2RAD
}
