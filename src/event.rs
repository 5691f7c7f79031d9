/*!
 * A single idling occurrence.
 */

use crate::geo::Coord;
use chrono::{DateTime, Utc};

/**
 * One recorded idling occurrence with location, duration, and time.
 *
 * Events are built once from an idling report and then moved into the clustering pass, which
 * owns them until the hotspots are reported.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct IdleEvent {
    /// Opaque identifier, unique within one run.
    pub id: String,
    /// Name of the vehicle that was idling.
    pub vehicle: String,
    /// Where the vehicle was idling.
    pub coord: Coord,
    /// How long the vehicle idled in seconds.
    pub duration_seconds: u64,
    /// When the idling started.
    pub timestamp: DateTime<Utc>,
}

impl IdleEvent {
    pub fn new<S: Into<String>, V: Into<String>>(
        id: S,
        vehicle: V,
        lat: f64,
        lon: f64,
        duration_seconds: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        IdleEvent {
            id: id.into(),
            vehicle: vehicle.into(),
            coord: Coord { lat, lon },
            duration_seconds,
            timestamp,
        }
    }
}
