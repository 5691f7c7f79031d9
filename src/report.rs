/*!
 * Reading vehicle idling reports.
 *
 * The fleet API returns idling reports in pages. Each page has a `data` array with one record
 * per idling occurrence and a `pagination` object that says whether another page follows. This
 * module turns those pages into [IdleEvent](crate::IdleEvent) objects and provides the time
 * window the reports are requested for.
 */

use crate::{event::IdleEvent, IdleSpotError, IdleSpotResult};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::io::Read;

/// How far back the idling reports reach by default.
pub const DEFAULT_HISTORY_HOURS: i64 = 8;

/// One page of the idling report.
#[derive(Debug, Clone, Deserialize)]
pub struct IdlingReportPage {
    #[serde(default)]
    pub data: Vec<IdlingReport>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Cursor information for walking through the pages of a report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub end_cursor: String,
    #[serde(default)]
    pub has_next_page: bool,
}

/// A single idling occurrence as reported by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlingReport {
    pub vehicle: VehicleRef,
    pub address: Address,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub latitude: f64,
    pub longitude: f64,
}

impl IdlingReportPage {
    /// Parse a page from a JSON string.
    pub fn from_json(json: &str) -> IdleSpotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a page from anything readable, such as a saved response file.
    pub fn from_reader<R: Read>(rdr: R) -> IdleSpotResult<Self> {
        Ok(serde_json::from_reader(rdr)?)
    }

    /// The cursor for the next page, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        match self.pagination {
            Some(Pagination {
                ref end_cursor,
                has_next_page: true,
            }) if !end_cursor.is_empty() => Some(end_cursor.as_str()),
            _ => None,
        }
    }

    /// Convert every record on this page into an IdleEvent.
    pub fn into_events(self) -> Vec<IdleEvent> {
        self.data.into_iter().map(IdlingReport::into_event).collect()
    }
}

impl IdlingReport {
    /// Convert to an IdleEvent. The id combines the vehicle and the start time, which is unique
    /// for a deduplicated report.
    pub fn into_event(self) -> IdleEvent {
        let IdlingReport {
            vehicle,
            address,
            start_time,
            duration_ms,
        } = self;

        let id = format!(
            "{}@{}",
            vehicle.id.as_deref().unwrap_or(&vehicle.name),
            start_time.to_rfc3339()
        );

        IdleEvent::new(
            id,
            vehicle.name,
            address.latitude,
            address.longitude,
            duration_ms / 1000,
            start_time,
        )
    }
}

/// A half open time range `[start, end)` that idling events must start in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    /**
     * The window covering the `hours` hours before `end`.
     *
     * #Returns
     * An `InvalidInput` error if `hours` is not positive or reaches past the range `chrono` can
     * represent.
     */
    pub fn past_hours(end: DateTime<Utc>, hours: i64) -> Result<Self, IdleSpotError> {
        if hours <= 0 {
            return Err(IdleSpotError::InvalidInput(format!(
                "window length must be a positive number of hours, got {}",
                hours
            )));
        }

        let start = Duration::try_hours(hours)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                IdleSpotError::InvalidInput(format!(
                    "a window of {} hours before {} is out of range",
                    hours, end
                ))
            })?;

        Ok(EventWindow { start, end })
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time < self.end
    }

    /// Keep only the events that started inside this window, preserving order.
    pub fn retain_window(&self, events: &mut Vec<IdleEvent>) {
        let before = events.len();
        events.retain(|evt| self.contains(evt.timestamp));

        log::debug!(
            "kept {} of {} events between {} and {}",
            events.len(),
            before,
            self.start,
            self.end
        );
    }
}
