// Rendering boundary.
//
// Browser opens a RenderingContext: one live page with exactly the
// capabilities the extractor needs. WebDriverBrowser backs it with a
// chromedriver session; tests use testing::MockBrowser.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde_json::{json, Value};
use tracing::{info, warn};
use webdriver_client::{ChromeOptions, ElementRef, Session, WebDriverClient};

use crate::error::Result;

/// Opaque reference to an element in a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ElementHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Start a fresh rendering context. The caller must `release` it.
    async fn open(&self) -> Result<Box<dyn RenderingContext>>;
}

#[async_trait]
pub trait RenderingContext: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Block until `selector` matches at least one element, failing with
    /// `ScoutError::Timeout` after `timeout`.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn execute(&self, script: &str) -> Result<Value>;

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Text of the first descendant matching `selector`, `None` if no
    /// descendant matches.
    async fn child_text(&self, parent: &ElementHandle, selector: &str) -> Result<Option<String>>;

    /// Attribute `name` of the first descendant matching `selector`, `None`
    /// if no descendant matches or the attribute is unset.
    async fn child_attribute(
        &self,
        parent: &ElementHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>>;

    async fn release(&self) -> Result<()>;
}

// --- WebDriver backend ---

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/113.0.0.0 Safari/537.36",
];

/// Injected before any page script runs.
const HIDE_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

pub struct WebDriverBrowser {
    client: WebDriverClient,
    headless: bool,
    poll_interval: Duration,
}

impl WebDriverBrowser {
    pub fn new(client: WebDriverClient, headless: bool, poll_interval: Duration) -> Self {
        Self {
            client,
            headless,
            poll_interval,
        }
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS.choose(&mut rand::rng()).copied().unwrap_or(USER_AGENTS[0])
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn RenderingContext>> {
        let user_agent = random_user_agent();
        let options = ChromeOptions::stealth(self.headless, Some(user_agent.to_string()));
        let session = self.client.new_session(&options).await?;

        info!(
            session = session.id(),
            headless = self.headless,
            user_agent,
            "Browser session opened"
        );

        if let Err(e) = session
            .execute_cdp(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": HIDE_WEBDRIVER_JS }),
            )
            .await
        {
            warn!(error = %e, "Could not hide navigator.webdriver");
        }

        Ok(Box::new(WebDriverPage {
            session,
            poll_interval: self.poll_interval,
        }))
    }
}

struct WebDriverPage {
    session: Session,
    poll_interval: Duration,
}

impl WebDriverPage {
    async fn child(&self, parent: &ElementHandle, selector: &str) -> Result<Option<ElementRef>> {
        Ok(self
            .session
            .find_child(&ElementRef::new(parent.id()), selector)
            .await?)
    }
}

#[async_trait]
impl RenderingContext for WebDriverPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        Ok(self.session.navigate(url).await?)
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.session
            .wait_for_element(selector, timeout, self.poll_interval)
            .await?;
        Ok(())
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        Ok(self.session.execute(script, Vec::new()).await?)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let found = self.session.find_elements(selector).await?;
        Ok(found.iter().map(|e| ElementHandle::new(e.id())).collect())
    }

    async fn child_text(&self, parent: &ElementHandle, selector: &str) -> Result<Option<String>> {
        match self.child(parent, selector).await? {
            Some(element) => Ok(Some(self.session.text(&element).await?)),
            None => Ok(None),
        }
    }

    async fn child_attribute(
        &self,
        parent: &ElementHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let Some(element) = self.child(parent, selector).await? else {
            return Ok(None);
        };
        // Prefer the resolved DOM property (absolute `src`), then the markup.
        if let Some(value) = self.session.property(&element, name).await? {
            return Ok(Some(value));
        }
        Ok(self.session.attribute(&element, name).await?)
    }

    async fn release(&self) -> Result<()> {
        self.session.delete().await?;
        info!(session = self.session.id(), "Browser session closed");
        Ok(())
    }
}
