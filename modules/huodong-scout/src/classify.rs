use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::tags::tags_for_card;
use crate::timing::{parse_time_delta, resolve_times};
use crate::types::{EnrichedActivity, RawCard, Status};

/// Ended activities kept per snapshot, taken in page order.
pub const MAX_ENDED: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub ongoing: usize,
    pub upcoming: usize,
    pub ended: usize,
    pub kept: usize,
    pub discarded: usize,
}

impl fmt::Display for ClassifyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ongoing={} upcoming={} ended={} kept={} discarded={}",
            self.ongoing, self.upcoming, self.ended, self.kept, self.discarded
        )
    }
}

/// Bucket cards by status and apply the retention policy: every ongoing
/// card, then every upcoming card, then the first [`MAX_ENDED`] ended cards,
/// each bucket in extraction order. Cards without a title or a recognised
/// status are dropped. Each kept card is tagged and its progress text
/// resolved against `crawl_time`.
pub fn classify(
    cards: Vec<RawCard>,
    crawl_time: DateTime<FixedOffset>,
) -> (Vec<EnrichedActivity>, ClassifyStats) {
    let mut stats = ClassifyStats::default();
    let mut ongoing = Vec::new();
    let mut upcoming = Vec::new();
    let mut ended = Vec::new();

    for card in cards {
        if card.title.trim().is_empty() {
            stats.discarded += 1;
            continue;
        }
        match Status::classify(&card.status) {
            Some(Status::Ongoing) => ongoing.push((card, Status::Ongoing)),
            Some(Status::Upcoming) => upcoming.push((card, Status::Upcoming)),
            Some(Status::Ended) => ended.push((card, Status::Ended)),
            None => stats.discarded += 1,
        }
    }

    stats.ongoing = ongoing.len();
    stats.upcoming = upcoming.len();
    stats.ended = ended.len();
    ended.truncate(MAX_ENDED);

    let activities: Vec<EnrichedActivity> = ongoing
        .into_iter()
        .chain(upcoming)
        .chain(ended)
        .map(|(card, status)| enrich(card, status, crawl_time))
        .collect();
    stats.kept = activities.len();

    (activities, stats)
}

fn enrich(card: RawCard, status: Status, crawl_time: DateTime<FixedOffset>) -> EnrichedActivity {
    let tags = tags_for_card(&card.title, &card.page_type_tag);
    let delta = parse_time_delta(&card.progress, &card.status);
    let (start_time, end_time) = resolve_times(crawl_time, status, delta);

    EnrichedActivity {
        title: card.title,
        description: card.description,
        image_url: card.image_url,
        progress: card.progress,
        tags,
        start_time,
        end_time,
        status,
    }
}
