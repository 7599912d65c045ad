use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

/// Listing page URL; the server id is the last path segment.
pub const TARGET_URL_BASE: &str = "https://www.gamekee.com/ba/huodong";

pub fn target_url(server_id: &str) -> String {
    format!("{TARGET_URL_BASE}/{server_id}")
}

/// Game server region. Decides the output folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Jp,
    Cn,
    Intl,
}

impl Region {
    /// Unknown ids fall back to the international server.
    pub fn for_server(server_id: &str) -> Self {
        match server_id {
            "15" => Region::Jp,
            "16" => Region::Cn,
            "17" => Region::Intl,
            _ => Region::Intl,
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            Region::Jp => "jp",
            Region::Cn => "cn",
            Region::Intl => "intl",
        }
    }
}

/// Run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_id: String,
    pub headless: bool,
    pub webdriver_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_id: env::var("SERVER_ID").unwrap_or_else(|_| "17".to_string()),
            headless: flag("HEADLESS") || env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:9515".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
        }
    }

    pub fn region(&self) -> Region {
        Region::for_server(&self.server_id)
    }

    pub fn target_url(&self) -> String {
        target_url(&self.server_id)
    }

    pub fn log_summary(&self) {
        info!(
            server_id = self.server_id.as_str(),
            folder = self.region().folder(),
            headless = self.headless,
            webdriver_url = self.webdriver_url.as_str(),
            data_dir = %self.data_dir.display(),
            "Configuration loaded"
        );
    }
}

fn flag(key: &str) -> bool {
    env::var(key).is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Timing knobs for page extraction.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// How long to wait for the first card to render.
    pub card_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause after each scroll before measuring the page again.
    pub scroll_delay: Duration,
    /// Pause once scrolling has settled, before reading cards.
    pub settle_delay: Duration,
    pub max_scroll_rounds: usize,
    /// Wall-clock ceiling for the whole scroll phase.
    pub scroll_ceiling: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            card_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(500),
            scroll_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(3),
            max_scroll_rounds: 50,
            scroll_ceiling: Duration::from_secs(180),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_servers_map_to_folders() {
        assert_eq!(Region::for_server("15").folder(), "jp");
        assert_eq!(Region::for_server("16").folder(), "cn");
        assert_eq!(Region::for_server("17").folder(), "intl");
    }

    #[test]
    fn unknown_server_defaults_to_intl() {
        assert_eq!(Region::for_server("99"), Region::Intl);
        assert_eq!(Region::for_server(""), Region::Intl);
    }

    #[test]
    fn url_embeds_server_id() {
        assert_eq!(target_url("16"), "https://www.gamekee.com/ba/huodong/16");
    }
}
