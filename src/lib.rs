pub use cluster::{
    cluster, Cluster, ClusterConfig, HotspotClusterer, DEFAULT_RADIUS_MILES, DEFAULT_TOP_K,
};
pub use error::{IdleSpotError, IdleSpotResult};
pub use event::IdleEvent;
pub use geo::{great_circle_distance, Coord, EARTH_RADIUS_MILES};
pub use kml::{KmlFile, KmlWriter};
pub use report::{EventWindow, IdlingReport, IdlingReportPage, DEFAULT_HISTORY_HOURS};
pub use summary::{
    format_message, HotspotSink, HotspotSummary, JsonSink, TextSink, WebhookPayload,
};

pub mod geo;

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod error;
mod event;
mod kml;
mod report;
mod summary;
