use crate::{cluster::Cluster, event::IdleEvent, geo::EARTH_RADIUS_MILES, IdleSpotError};

/// Events closer than this to a cluster centroid are grouped into that cluster.
pub const DEFAULT_RADIUS_MILES: f64 = 2.0;

/// The number of hotspots reported.
pub const DEFAULT_TOP_K: usize = 5;

/// Parameters for a clustering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Maximum distance (inclusive) from a cluster centroid for an event to join it.
    pub radius_miles: f64,
    /// How many of the largest clusters to keep.
    pub top_k: usize,
    /// Radius of the Earth used in the distance calculation.
    pub earth_radius_miles: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            radius_miles: DEFAULT_RADIUS_MILES,
            top_k: DEFAULT_TOP_K,
            earth_radius_miles: EARTH_RADIUS_MILES,
        }
    }
}

impl ClusterConfig {
    fn validate(&self) -> Result<(), IdleSpotError> {
        if !(self.radius_miles.is_finite() && self.radius_miles > 0.0) {
            return Err(IdleSpotError::InvalidInput(format!(
                "radius must be positive, got {}",
                self.radius_miles
            )));
        }

        if self.top_k == 0 {
            return Err(IdleSpotError::InvalidInput(
                "top_k must be positive, got 0".to_owned(),
            ));
        }

        if !(self.earth_radius_miles.is_finite() && self.earth_radius_miles > 0.0) {
            return Err(IdleSpotError::InvalidInput(format!(
                "earth radius must be positive, got {}",
                self.earth_radius_miles
            )));
        }

        Ok(())
    }
}

/**
 * Groups idling events into hotspots.
 *
 * Each event, in the order given, joins the cluster whose centroid is nearest to it if that
 * centroid is within the configured radius. Otherwise it starts a new cluster. A cluster's
 * centroid moves as members join, so the result depends on the input order.
 */
#[derive(Debug, Clone, Copy)]
pub struct HotspotClusterer {
    config: ClusterConfig,
}

impl HotspotClusterer {
    /// Create a clusterer, failing if the radius or the count is not positive.
    pub fn new(config: ClusterConfig) -> Result<Self, IdleSpotError> {
        config.validate()?;
        Ok(HotspotClusterer { config })
    }

    pub fn config(&self) -> ClusterConfig {
        self.config
    }

    /**
     * Group every event into a cluster.
     *
     * #Returns
     * All of the clusters in the order they were started. Every event is in exactly one of them.
     */
    pub fn cluster_all(&self, events: Vec<IdleEvent>) -> Result<Vec<Cluster>, IdleSpotError> {
        for evt in &events {
            evt.coord.validate().map_err(|err| match err {
                IdleSpotError::InvalidInput(msg) => {
                    IdleSpotError::InvalidInput(format!("event {}: {}", evt.id, msg))
                }
            })?;
        }

        let num_events = events.len();
        let mut clusters: Vec<Cluster> = vec![];

        for evt in events {
            let nearest = clusters
                .iter()
                .enumerate()
                .map(|(idx, clust)| {
                    (
                        idx,
                        clust.distance_to(evt.coord, self.config.earth_radius_miles),
                    )
                })
                .fold(None, |best: Option<(usize, f64)>, (idx, dist)| match best {
                    // Keep the earlier cluster on a tie.
                    Some((_, best_dist)) if best_dist <= dist => best,
                    _ => Some((idx, dist)),
                });

            match nearest {
                Some((idx, dist)) if dist <= self.config.radius_miles => {
                    log::trace!("{} joins cluster {} at {:.3} miles", evt.id, idx, dist);
                    clusters[idx].add(evt);
                }
                _ => {
                    log::trace!("{} starts cluster {}", evt.id, clusters.len());
                    clusters.push(Cluster::new(evt));
                }
            }
        }

        log::debug!(
            "grouped {} idling events into {} clusters",
            num_events,
            clusters.len()
        );

        Ok(clusters)
    }

    /**
     * Group the events and keep the largest clusters.
     *
     * #Returns
     * At most `top_k` clusters, largest event count first. Clusters with the same count stay in
     * the order they were started.
     */
    pub fn rank(&self, events: Vec<IdleEvent>) -> Result<Vec<Cluster>, IdleSpotError> {
        let mut clusters = self.cluster_all(events)?;

        // sort_by is stable, so ties keep discovery order.
        clusters.sort_by(|left, right| right.total_events().cmp(&left.total_events()));

        if clusters.len() > self.config.top_k {
            log::debug!(
                "dropping {} clusters below the top {}",
                clusters.len() - self.config.top_k,
                self.config.top_k
            );
            clusters.truncate(self.config.top_k);
        }

        Ok(clusters)
    }
}

/**
 * Find the `top_k` largest idling hotspots.
 *
 * #Arguments
 * events - the idling events, in the order they should be considered.
 * radius_miles - the grouping radius, must be positive.
 * top_k - how many clusters to return, must be positive.
 */
pub fn cluster(
    events: Vec<IdleEvent>,
    radius_miles: f64,
    top_k: usize,
) -> Result<Vec<Cluster>, IdleSpotError> {
    let clusterer = HotspotClusterer::new(ClusterConfig {
        radius_miles,
        top_k,
        ..ClusterConfig::default()
    })?;

    clusterer.rank(events)
}
