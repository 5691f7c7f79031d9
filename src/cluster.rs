/*!
 * Types and functions for working with clusters.
 *
 * A cluster describes the aggregate properties of a group of nearby IdleEvent objects. Clusters
 * are grown greedily in the order events are supplied, so the same events in a different order
 * can produce different clusters. That is intentional, the goal is a quick approximate picture of
 * where vehicles sit idling, not an optimal partition.
 */

pub use clusterer::{
    cluster, ClusterConfig, HotspotClusterer, DEFAULT_RADIUS_MILES, DEFAULT_TOP_K,
};
pub use hotspot::Cluster;

mod clusterer;
mod hotspot;
