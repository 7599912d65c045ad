pub mod capabilities;
pub mod error;

pub use capabilities::ChromeOptions;
pub use error::{Result, WebDriverError};

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

/// W3C web element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a07a-4c739450a1f4";
/// Pre-W3C (JSON wire protocol) element key, still emitted by some drivers.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Start a new browser session. The returned [`Session`] owns the browser
    /// until [`Session::delete`] is called.
    pub async fn new_session(&self, options: &ChromeOptions) -> Result<Session> {
        let endpoint = format!("{}/session", self.base_url);
        let value = send(self.client.post(&endpoint).json(&options.to_capabilities())).await?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Parse(format!("session id missing in response: {value}")))?
            .to_string();

        debug!(session = id.as_str(), headless = options.headless, "WebDriver session created");

        Ok(Session {
            client: self.client.clone(),
            endpoint: format!("{}/session/{}", self.base_url, id),
            id,
        })
    }
}

/// Opaque handle to an element inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        ElementRef(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
    }
}

pub struct Session {
    client: reqwest::Client,
    endpoint: String,
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        send(self.client.post(format!("{}/url", self.endpoint)).json(&json!({ "url": url }))).await?;
        Ok(())
    }

    /// Run a synchronous script in the page and return its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        send(
            self.client
                .post(format!("{}/execute/sync", self.endpoint))
                .json(&json!({ "script": script, "args": args })),
        )
        .await
    }

    /// Send a Chrome DevTools Protocol command through chromedriver's
    /// vendor extension endpoint.
    pub async fn execute_cdp(&self, cmd: &str, params: Value) -> Result<Value> {
        send(
            self.client
                .post(format!("{}/goog/cdp/execute", self.endpoint))
                .json(&json!({ "cmd": cmd, "params": params })),
        )
        .await
    }

    pub async fn find_elements(&self, css: &str) -> Result<Vec<ElementRef>> {
        let value = send(
            self.client
                .post(format!("{}/elements", self.endpoint))
                .json(&locator(css)),
        )
        .await?;
        parse_element_list(&value)
    }

    /// Find the first descendant of `parent` matching `css`. A lookup that
    /// matches nothing is `Ok(None)`.
    pub async fn find_child(&self, parent: &ElementRef, css: &str) -> Result<Option<ElementRef>> {
        let result = send(
            self.client
                .post(format!("{}/element/{}/element", self.endpoint, parent.id()))
                .json(&locator(css)),
        )
        .await;

        match result {
            Ok(value) => ElementRef::from_value(&value)
                .map(Some)
                .ok_or_else(|| WebDriverError::Parse(format!("not an element reference: {value}"))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Rendered (visible) text of an element.
    pub async fn text(&self, element: &ElementRef) -> Result<String> {
        let value = send(
            self.client
                .get(format!("{}/element/{}/text", self.endpoint, element.id())),
        )
        .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Markup attribute as written in the document. `None` when absent.
    pub async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = send(self.client.get(format!(
            "{}/element/{}/attribute/{}",
            self.endpoint,
            element.id(),
            name
        )))
        .await?;
        Ok(scalar_to_string(value))
    }

    /// DOM property (e.g. `src` resolved to an absolute URL). `None` when unset.
    pub async fn property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = send(self.client.get(format!(
            "{}/element/{}/property/{}",
            self.endpoint,
            element.id(),
            name
        )))
        .await?;
        Ok(scalar_to_string(value))
    }

    /// Poll until at least one element matches `css`, or fail with
    /// [`WebDriverError::Timeout`] once `timeout` has elapsed.
    pub async fn wait_for_element(
        &self,
        css: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Vec<ElementRef>> {
        let started = Instant::now();
        loop {
            let found = self.find_elements(css).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(WebDriverError::Timeout {
                    selector: css.to_string(),
                    waited,
                });
            }
            tokio::time::sleep(poll.min(timeout - waited)).await;
        }
    }

    /// End the session and shut the browser down.
    pub async fn delete(&self) -> Result<()> {
        send(self.client.delete(&self.endpoint)).await?;
        debug!(session = self.id.as_str(), "WebDriver session deleted");
        Ok(())
    }
}

fn locator(css: &str) -> Value {
    json!({ "using": "css selector", "value": css })
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value> {
    let resp = request.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    decode_response(status, &body)
}

/// Unwrap the `value` member of a WebDriver response. A `value.error`
/// member is a command failure whatever the HTTP status says.
fn decode_response(status: u16, body: &str) -> Result<Value> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(ref v) = parsed {
        if let Some(error) = v.pointer("/value/error").and_then(Value::as_str) {
            let message = v
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown webdriver error");
            return Err(WebDriverError::Command {
                error: error.to_string(),
                message: message.to_string(),
            });
        }
    }

    if !(200..300).contains(&status) {
        return Err(WebDriverError::Api {
            status,
            message: body.to_string(),
        });
    }

    match parsed {
        Some(mut v) => Ok(v.get_mut("value").map(Value::take).unwrap_or(Value::Null)),
        None => Err(WebDriverError::Parse(format!("response is not JSON: {body}"))),
    }
}

fn parse_element_list(value: &Value) -> Result<Vec<ElementRef>> {
    let items = value
        .as_array()
        .ok_or_else(|| WebDriverError::Parse(format!("expected element list, got {value}")))?;
    items
        .iter()
        .map(|item| {
            ElementRef::from_value(item)
                .ok_or_else(|| WebDriverError::Parse(format!("not an element reference: {item}")))
        })
        .collect()
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
