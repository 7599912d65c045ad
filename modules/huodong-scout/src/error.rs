use std::time::Duration;

use thiserror::Error;
use webdriver_client::WebDriverError;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Timed out after {waited:?} waiting for `{selector}`")]
    Timeout { selector: String, waited: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Persist error: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<WebDriverError> for ScoutError {
    fn from(err: WebDriverError) -> Self {
        match err {
            WebDriverError::Timeout { selector, waited } => ScoutError::Timeout { selector, waited },
            other => ScoutError::Browser(other.to_string()),
        }
    }
}
