use serde_json::{json, Value};

/// Chrome launch options sent with the new-session request.
#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub exclude_switches: Vec<String>,
    pub use_automation_extension: bool,
}

impl ChromeOptions {
    /// Options that suppress the usual automation fingerprints: the
    /// `AutomationControlled` blink feature, the `enable-automation` switch
    /// and the automation extension.
    pub fn stealth(headless: bool, user_agent: Option<String>) -> Self {
        Self {
            headless,
            user_agent,
            args: vec!["--disable-blink-features=AutomationControlled".to_string()],
            exclude_switches: vec!["enable-automation".to_string()],
            use_automation_extension: false,
        }
    }

    /// Full argument list, headless flags first.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.extend(
                ["--headless=new", "--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"]
                    .map(String::from),
            );
        }
        if let Some(ref ua) = self.user_agent {
            args.push(format!("user-agent={ua}"));
        }
        args.extend(self.args.iter().cloned());
        args
    }

    /// W3C new-session request body.
    pub fn to_capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": self.chrome_args(),
                        "excludeSwitches": self.exclude_switches,
                        "useAutomationExtension": self.use_automation_extension,
                    }
                }
            }
        })
    }
}
