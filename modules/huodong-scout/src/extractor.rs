use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{target_url, ExtractorSettings};
use crate::error::{Result, ScoutError};
use crate::renderer::{Browser, ElementHandle, RenderingContext};
use crate::types::RawCard;

pub const CARD_SELECTOR: &str = ".activity-item";
pub const TYPE_SELECTOR: &str = ".activity-item_type";
pub const IMAGE_SELECTOR: &str = ".activity-item_img img";
pub const TITLE_SELECTOR: &str = ".activity-item_title";
pub const DESCRIPTION_SELECTOR: &str = ".activity-item_description";
pub const STATUS_SELECTOR: &str = ".activity-item_status";
pub const PROGRESS_SELECTOR: &str = ".time";

pub const SCROLL_HEIGHT_JS: &str = "return document.body.scrollHeight";
pub const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Drives a browser over the activity listing and reads every card.
pub struct Extractor {
    browser: Box<dyn Browser>,
    settings: ExtractorSettings,
}

impl Extractor {
    pub fn new(browser: Box<dyn Browser>, settings: ExtractorSettings) -> Self {
        Self { browser, settings }
    }

    /// Cards for `server_id` in page order. Never fails: any error is logged
    /// and yields an empty list. The browser is released on every path.
    pub async fn extract(&self, server_id: &str) -> Vec<RawCard> {
        let url = target_url(server_id);

        let page = match self.browser.open().await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %truncate_for_log(&e.to_string(), 200), "Could not open browser");
                return Vec::new();
            }
        };

        let result = self.extract_from(page.as_ref(), &url).await;

        if let Err(e) = page.release().await {
            warn!(error = %e, "Browser release failed");
        }

        match result {
            Ok(cards) => cards,
            Err(e) => {
                error!(
                    url = url.as_str(),
                    error = %truncate_for_log(&e.to_string(), 200),
                    "Extraction failed, returning no cards"
                );
                Vec::new()
            }
        }
    }

    async fn extract_from(&self, page: &dyn RenderingContext, url: &str) -> Result<Vec<RawCard>> {
        info!(url, "Loading activity page");
        page.navigate(url).await?;
        page.wait_for_element(CARD_SELECTOR, self.settings.card_timeout)
            .await?;

        self.scroll_to_end(page).await?;

        let elements = page.find_elements(CARD_SELECTOR).await?;
        let total = elements.len();
        info!(total, "Found activity cards");

        let mut cards = Vec::with_capacity(total);
        for (i, element) in elements.iter().enumerate() {
            let index = i + 1;
            match read_card(page, element).await {
                Ok(Some(card)) => {
                    info!(card = index, total, status = card.status.as_str(), "Parsed card");
                    cards.push(card);
                }
                Ok(None) => debug!(card = index, total, "Skipping card without title or status"),
                Err(e) => warn!(
                    card = index,
                    total,
                    error = %truncate_for_log(&e.to_string(), 100),
                    "Card parse error"
                ),
            }
        }

        Ok(cards)
    }

    /// Scroll to the bottom until the document height stops changing, then
    /// let the page settle. Bounded by `max_scroll_rounds` and
    /// `scroll_ceiling`; hitting either bound is not an error.
    async fn scroll_to_end(&self, page: &dyn RenderingContext) -> Result<()> {
        info!("Scrolling to load all cards");
        let started = Instant::now();
        let mut last_height = page_height(page).await?;
        let mut rounds = 0;
        let mut settled = false;

        while rounds < self.settings.max_scroll_rounds {
            rounds += 1;
            page.execute(SCROLL_TO_BOTTOM_JS).await?;
            sleep(self.settings.scroll_delay).await;

            let height = page_height(page).await?;
            debug!(round = rounds, height, "Scrolled");
            if height == last_height {
                settled = true;
                break;
            }
            last_height = height;

            if started.elapsed() >= self.settings.scroll_ceiling {
                break;
            }
        }

        if !settled {
            warn!(
                rounds,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scroll limit reached before page height settled"
            );
        }

        sleep(self.settings.settle_delay).await;
        Ok(())
    }
}

async fn page_height(page: &dyn RenderingContext) -> Result<i64> {
    let value = page.execute(SCROLL_HEIGHT_JS).await?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|h| h as i64))
        .ok_or_else(|| ScoutError::Script(format!("unexpected scroll height: {value}")))
}

/// Read one card. `Ok(None)` when the title or status is missing; optional
/// fields that cannot be read become empty strings.
async fn read_card(page: &dyn RenderingContext, card: &ElementHandle) -> Result<Option<RawCard>> {
    let Some(title) = required(page.child_text(card, TITLE_SELECTOR).await?) else {
        return Ok(None);
    };
    let Some(status) = required(page.child_text(card, STATUS_SELECTOR).await?) else {
        return Ok(None);
    };

    let page_type_tag = optional(page.child_text(card, TYPE_SELECTOR).await, "type");
    let image_url = optional(
        page.child_attribute(card, IMAGE_SELECTOR, "src").await,
        "image",
    );
    let description = optional(
        page.child_text(card, DESCRIPTION_SELECTOR).await,
        "description",
    );
    let progress = optional(page.child_text(card, PROGRESS_SELECTOR).await, "progress");

    Ok(Some(RawCard {
        title,
        description,
        image_url,
        status,
        progress,
        page_type_tag,
    }))
}

fn required(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn optional(lookup: Result<Option<String>>, field: &str) -> String {
    match lookup {
        Ok(value) => value.map(|v| v.trim().to_string()).unwrap_or_default(),
        Err(e) => {
            debug!(field, error = %e, "Optional field unreadable");
            String::new()
        }
    }
}

/// Cut `s` to at most `max` characters for log output.
pub(crate) fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_for_log("活动卡片解析", 2), "活动...");
        assert_eq!(truncate_for_log("short", 100), "short");
    }

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required(Some("  标题 ".to_string())), Some("标题".to_string()));
        assert_eq!(required(Some("   ".to_string())), None);
        assert_eq!(required(None), None);
    }

    #[test]
    fn optional_defaults_to_empty() {
        assert_eq!(optional(Ok(None), "image"), "");
        assert_eq!(
            optional(Err(ScoutError::Browser("stale element".into())), "image"),
            ""
        );
        assert_eq!(optional(Ok(Some(" 爬塔 ".to_string())), "type"), "爬塔");
    }
}
