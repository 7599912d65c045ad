use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use tracing::info;

use crate::classify::{classify, ClassifyStats};
use crate::config::Config;
use crate::extractor::Extractor;
use crate::snapshot::write_snapshot;
use crate::timing::crawl_time_now;
use crate::types::Snapshot;

/// Outcome of one scout run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub path: PathBuf,
    pub crawl_time: DateTime<FixedOffset>,
    pub extracted: usize,
    pub stats: ClassifyStats,
    pub first_title: Option<String>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} activities to {} (crawl_time={}, extracted={}, {})",
            self.stats.kept,
            self.path.display(),
            self.crawl_time.to_rfc3339(),
            self.extracted,
            self.stats
        )
    }
}

pub struct Scout {
    config: Config,
    extractor: Extractor,
}

impl Scout {
    pub fn new(config: Config, extractor: Extractor) -> Self {
        Self { config, extractor }
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(crawl_time_now()).await
    }

    /// Extract, classify and persist against a fixed crawl time. Extraction
    /// problems only shrink the snapshot; a failed write is an error.
    ///
    /// [`Scout::run`] takes the crawl time before extraction starts, so a
    /// scroll that crosses an hour boundary still resolves every timestamp
    /// against the earlier hour.
    pub async fn run_at(&self, crawl_time: DateTime<FixedOffset>) -> Result<RunReport> {
        let region = self.config.region();
        info!(
            server_id = self.config.server_id.as_str(),
            folder = region.folder(),
            crawl_time = %crawl_time.to_rfc3339(),
            "Scout run starting"
        );

        let cards = self.extractor.extract(&self.config.server_id).await;
        let extracted = cards.len();

        let (activities, stats) = classify(cards, crawl_time);
        info!(
            ongoing = stats.ongoing,
            upcoming = stats.upcoming,
            ended = stats.ended,
            kept = stats.kept,
            discarded = stats.discarded,
            "Activities classified"
        );

        let first_title = activities.first().map(|a| a.title.clone());
        let snapshot = Snapshot {
            crawl_time,
            activities,
        };

        let path = write_snapshot(&self.config.data_dir, region, &snapshot)
            .with_context(|| format!("Failed to write snapshot for folder {}", region.folder()))?;

        info!(
            path = %path.display(),
            crawl_time = %crawl_time.to_rfc3339(),
            count = stats.kept,
            first = first_title.as_deref().unwrap_or(""),
            "Snapshot saved"
        );

        Ok(RunReport {
            path,
            crawl_time,
            extracted,
            stats,
            first_title,
        })
    }
}
