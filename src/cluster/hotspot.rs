use crate::{
    event::IdleEvent,
    geo::{great_circle_distance, Coord},
};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

/**
 * The aggregate properties of a group of IdleEvent objects that are close to each other.
 *
 * The centroid is the arithmetic mean of the member coordinates and is recomputed every time a
 * member is added. Members are kept in the order they joined.
 *
 * Longitudes are averaged as plain numbers, so a cluster that straddles the antimeridian gets a
 * centroid near longitude 0 instead of near 180. Events on opposite sides of 180 degrees may then
 * fail to join a cluster they are only a few miles from.
 */
#[derive(Clone, Debug)]
pub struct Cluster {
    /// Average location of the events in the cluster.
    centroid: Coord,
    /// Running sums of the member coordinates, used to update the centroid.
    lat_sum: f64,
    lon_sum: f64,
    /// Total (sum) of the idle time of the events in the cluster in seconds, saturating at
    /// `u64::MAX`.
    total_duration_seconds: u64,
    /// Number of events per vehicle name.
    vehicles: FxHashMap<String, u32>,
    /// The events in discovery order.
    members: Vec<IdleEvent>,
}

impl Cluster {
    /// Start a new cluster containing only `event`.
    pub fn new(event: IdleEvent) -> Self {
        let mut clust = Cluster {
            centroid: event.coord,
            lat_sum: 0.0,
            lon_sum: 0.0,
            total_duration_seconds: 0,
            vehicles: FxHashMap::default(),
            members: Vec::with_capacity(1),
        };

        clust.add(event);
        clust
    }

    /// Add an event and update the centroid and totals.
    pub fn add(&mut self, event: IdleEvent) {
        self.lat_sum += event.coord.lat;
        self.lon_sum += event.coord.lon;
        self.total_duration_seconds = self
            .total_duration_seconds
            .saturating_add(event.duration_seconds);
        *self.vehicles.entry(event.vehicle.clone()).or_insert(0) += 1;

        self.members.push(event);

        let count = self.members.len() as f64;
        self.centroid = Coord {
            lat: self.lat_sum / count,
            lon: self.lon_sum / count,
        };
    }

    /// Distance from `coord` to the current centroid in the units of `earth_radius`.
    pub fn distance_to(&self, coord: Coord, earth_radius: f64) -> f64 {
        great_circle_distance(coord, self.centroid, earth_radius)
    }

    pub fn centroid(&self) -> Coord {
        self.centroid
    }

    pub fn members(&self) -> &[IdleEvent] {
        &self.members
    }

    pub fn total_events(&self) -> usize {
        self.members.len()
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.total_duration_seconds
    }

    /// The number of distinct vehicles that idled in this cluster.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Events per vehicle, most events first and then by vehicle name.
    pub fn vehicle_counts(&self) -> Vec<(&str, u32)> {
        let mut counts: Vec<(&str, u32)> = self
            .vehicles
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();

        counts.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        counts
    }

    /// Identifiers of the first `max` members in discovery order.
    pub fn representative_ids(&self, max: usize) -> Vec<&str> {
        self.members
            .iter()
            .take(max)
            .map(|evt| evt.id.as_str())
            .collect()
    }

    /// The earliest and latest member timestamps.
    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        // A cluster always has at least one member.
        let first = self.members[0].timestamp;

        self.members
            .iter()
            .fold((first, first), |(start, end), evt| {
                (start.min(evt.timestamp), end.max(evt.timestamp))
            })
    }
}
