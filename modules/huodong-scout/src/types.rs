use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::tags::TagSet;

/// One activity card as read off the page, before enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCard {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub status: String,
    pub progress: String,
    pub page_type_tag: String,
}

/// Lifecycle state of an activity, read from its status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ongoing,
    Upcoming,
    Ended,
}

impl Status {
    pub const ONGOING_MARKER: &'static str = "进行中";
    pub const UPCOMING_MARKER: &'static str = "未开始";
    pub const ENDED_MARKER: &'static str = "已结束";

    /// Markers are checked ongoing, upcoming, ended; first hit wins.
    /// Text carrying none of them has no status.
    pub fn classify(text: &str) -> Option<Self> {
        if text.contains(Self::ONGOING_MARKER) {
            Some(Status::Ongoing)
        } else if text.contains(Self::UPCOMING_MARKER) {
            Some(Status::Upcoming)
        } else if text.contains(Self::ENDED_MARKER) {
            Some(Status::Ended)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ongoing => write!(f, "ongoing"),
            Status::Upcoming => write!(f, "upcoming"),
            Status::Ended => write!(f, "ended"),
        }
    }
}

/// A classified card with tags and resolved timestamps. This is the record
/// persisted in the snapshot; the status drives classification only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedActivity {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub progress: String,
    pub tags: TagSet,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(skip)]
    pub status: Status,
}

/// The persisted output of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub crawl_time: DateTime<FixedOffset>,
    pub activities: Vec<EnrichedActivity>,
}
