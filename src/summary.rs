/*!
 * Reporting ranked hotspots.
 *
 * The clustering pass does not know where its results go. A [HotspotSink] takes the ranked
 * clusters and delivers them somewhere: a plain text message, the JSON body for a notification
 * webhook, or a KML file (see [KmlFile](crate::KmlFile)).
 */

use crate::{geo::Coord, Cluster, IdleSpotResult};
use serde::Serialize;
use std::{fmt::Write as _, io::Write};

/// How many member ids are listed for each hotspot.
pub const REPRESENTATIVE_IDS: usize = 3;

/// Something that can deliver a ranked list of hotspots.
pub trait HotspotSink {
    fn deliver(&mut self, hotspots: &[Cluster]) -> IdleSpotResult<()>;
}

/// The reported properties of a single hotspot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotSummary {
    /// Position in the ranking, starting at 1.
    pub rank: usize,
    pub centroid: Coord,
    pub total_events: usize,
    pub total_duration_seconds: u64,
    pub vehicles: usize,
    pub representative_ids: Vec<String>,
}

impl HotspotSummary {
    pub fn new(rank: usize, clust: &Cluster) -> Self {
        HotspotSummary {
            rank,
            centroid: clust.centroid(),
            total_events: clust.total_events(),
            total_duration_seconds: clust.total_duration_seconds(),
            vehicles: clust.vehicle_count(),
            representative_ids: clust
                .representative_ids(REPRESENTATIVE_IDS)
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Summarize each hotspot, ranked in the order given.
    pub fn from_ranked(hotspots: &[Cluster]) -> Vec<Self> {
        hotspots
            .iter()
            .enumerate()
            .map(|(idx, clust)| HotspotSummary::new(idx + 1, clust))
            .collect()
    }
}

/// Build the human readable notification message.
pub fn format_message(hotspots: &[Cluster]) -> String {
    if hotspots.is_empty() {
        return "No idling clusters found.\n".to_owned();
    }

    let mut msg = format!("Top {} idling clusters:\n\n", hotspots.len());

    for summary in HotspotSummary::from_ranked(hotspots) {
        // Writing to a String can't fail.
        let _ = writeln!(
            &mut msg,
            "{}. ({:.6}, {:.6}): {} event(s) across {} vehicle(s)",
            summary.rank,
            summary.centroid.lat,
            summary.centroid.lon,
            summary.total_events,
            summary.vehicles
        );
    }

    msg
}

/// The body posted to a notification webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub message: String,
    pub hotspots: Vec<HotspotSummary>,
}

impl WebhookPayload {
    pub fn new(hotspots: &[Cluster]) -> Self {
        WebhookPayload {
            message: format_message(hotspots),
            hotspots: HotspotSummary::from_ranked(hotspots),
        }
    }
}

/// Writes the notification message as plain text.
pub struct TextSink<W: Write>(pub W);

impl<W: Write> HotspotSink for TextSink<W> {
    fn deliver(&mut self, hotspots: &[Cluster]) -> IdleSpotResult<()> {
        self.0.write_all(format_message(hotspots).as_bytes())?;
        self.0.flush()?;
        Ok(())
    }
}

/// Writes the webhook payload as pretty printed JSON.
pub struct JsonSink<W: Write>(pub W);

impl<W: Write> HotspotSink for JsonSink<W> {
    fn deliver(&mut self, hotspots: &[Cluster]) -> IdleSpotResult<()> {
        serde_json::to_writer_pretty(&mut self.0, &WebhookPayload::new(hotspots))?;
        writeln!(self.0)?;
        self.0.flush()?;
        Ok(())
    }
}
