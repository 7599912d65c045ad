// Test mocks for the extraction pipeline.
//
// MockBrowser (Browser) hands out MockPage (RenderingContext) instances
// backed by a fixed list of MockCard values and a scripted page height.
// Counters are shared through Arc so tests can check navigation, scrolling
// and release after the extractor has dropped the page.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ExtractorSettings;
use crate::error::{Result, ScoutError};
use crate::extractor::{
    CARD_SELECTOR, DESCRIPTION_SELECTOR, IMAGE_SELECTOR, PROGRESS_SELECTOR, SCROLL_HEIGHT_JS,
    SCROLL_TO_BOTTOM_JS, STATUS_SELECTOR, TITLE_SELECTOR, TYPE_SELECTOR,
};
use crate::renderer::{Browser, ElementHandle, RenderingContext};

/// Settings with every delay set to zero.
pub fn instant_settings() -> ExtractorSettings {
    ExtractorSettings {
        card_timeout: Duration::ZERO,
        poll_interval: Duration::ZERO,
        scroll_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
        max_scroll_rounds: 50,
        scroll_ceiling: Duration::from_secs(60),
    }
}

// ---------------------------------------------------------------------------
// MockCard
// ---------------------------------------------------------------------------

/// One card element. `None` fields have no matching child element.
#[derive(Debug, Clone, Default)]
pub struct MockCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub page_type: Option<String>,
    /// Every lookup on this card fails with a browser error.
    pub broken: bool,
    /// Optional-field lookups fail with a browser error.
    pub flaky_optional: bool,
}

impl MockCard {
    pub fn new(title: &str, status: &str, progress: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            status: Some(status.to_string()),
            progress: Some(progress.to_string()),
            ..Default::default()
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn image(mut self, url: &str) -> Self {
        self.image_url = Some(url.to_string());
        self
    }

    pub fn page_type(mut self, label: &str) -> Self {
        self.page_type = Some(label.to_string());
        self
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn without_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn flaky_optional(mut self) -> Self {
        self.flaky_optional = true;
        self
    }
}

// ---------------------------------------------------------------------------
// MockBrowser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ScrollModel {
    /// Height after n scrolls is `steps[n]`, holding at the last entry.
    Steps(Vec<i64>),
    /// Every scroll grows the page; it never settles.
    Endless,
}

#[derive(Debug, Default)]
pub struct MockCounters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub navigated: Mutex<Vec<String>>,
}

impl MockCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().unwrap().clone()
    }
}

pub struct MockBrowser {
    cards: Vec<MockCard>,
    scroll: ScrollModel,
    fail_open: bool,
    fail_navigate: bool,
    counters: Arc<MockCounters>,
}

impl MockBrowser {
    pub fn new(cards: Vec<MockCard>) -> Self {
        Self {
            cards,
            scroll: ScrollModel::Steps(vec![1000, 2000, 2000]),
            fail_open: false,
            fail_navigate: false,
            counters: Arc::new(MockCounters::default()),
        }
    }

    pub fn with_heights(mut self, heights: Vec<i64>) -> Self {
        self.scroll = ScrollModel::Steps(heights);
        self
    }

    pub fn endless_scroll(mut self) -> Self {
        self.scroll = ScrollModel::Endless;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigate = true;
        self
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open(&self) -> Result<Box<dyn RenderingContext>> {
        if self.fail_open {
            return Err(ScoutError::Browser("session not created".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            cards: self.cards.clone(),
            scroll: self.scroll.clone(),
            fail_navigate: self.fail_navigate,
            counters: self.counters.clone(),
        }))
    }
}

pub struct MockPage {
    cards: Vec<MockCard>,
    scroll: ScrollModel,
    fail_navigate: bool,
    counters: Arc<MockCounters>,
}

impl MockPage {
    fn height(&self) -> i64 {
        let scrolls = self.counters.scrolls();
        match &self.scroll {
            ScrollModel::Steps(steps) => steps
                .get(scrolls)
                .or_else(|| steps.last())
                .copied()
                .unwrap_or(0),
            ScrollModel::Endless => 1000 + scrolls as i64 * 500,
        }
    }

    fn card(&self, handle: &ElementHandle) -> Result<&MockCard> {
        handle
            .id()
            .strip_prefix("card-")
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| self.cards.get(i))
            .ok_or_else(|| ScoutError::Browser(format!("stale element {}", handle.id())))
    }
}

#[async_trait]
impl RenderingContext for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.counters.navigated.lock().unwrap().push(url.to_string());
        if self.fail_navigate {
            return Err(ScoutError::Browser("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()> {
        if selector == CARD_SELECTOR && !self.cards.is_empty() {
            return Ok(());
        }
        Err(ScoutError::Timeout {
            selector: selector.to_string(),
            waited: timeout,
        })
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        match script {
            SCROLL_HEIGHT_JS => Ok(json!(self.height())),
            SCROLL_TO_BOTTOM_JS => {
                self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
            other => Err(ScoutError::Script(format!("unexpected script: {other}"))),
        }
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        if selector != CARD_SELECTOR {
            return Ok(Vec::new());
        }
        Ok((0..self.cards.len())
            .map(|i| ElementHandle::new(format!("card-{i}")))
            .collect())
    }

    async fn child_text(&self, parent: &ElementHandle, selector: &str) -> Result<Option<String>> {
        let card = self.card(parent)?;
        if card.broken {
            return Err(ScoutError::Browser("stale element reference".to_string()));
        }
        let optional = matches!(
            selector,
            TYPE_SELECTOR | DESCRIPTION_SELECTOR | PROGRESS_SELECTOR
        );
        if optional && card.flaky_optional {
            return Err(ScoutError::Browser("element not interactable".to_string()));
        }
        Ok(match selector {
            TITLE_SELECTOR => card.title.clone(),
            STATUS_SELECTOR => card.status.clone(),
            TYPE_SELECTOR => card.page_type.clone(),
            DESCRIPTION_SELECTOR => card.description.clone(),
            PROGRESS_SELECTOR => card.progress.clone(),
            _ => None,
        })
    }

    async fn child_attribute(
        &self,
        parent: &ElementHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let card = self.card(parent)?;
        if card.broken || card.flaky_optional {
            return Err(ScoutError::Browser("stale element reference".to_string()));
        }
        if selector == IMAGE_SELECTOR && name == "src" {
            return Ok(card.image_url.clone());
        }
        Ok(None)
    }

    async fn release(&self) -> Result<()> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
