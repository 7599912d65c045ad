use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use huodong_scout::extractor::Extractor;
use huodong_scout::renderer::WebDriverBrowser;
use huodong_scout::scout::Scout;
use huodong_scout::{Config, ExtractorSettings};
use webdriver_client::WebDriverClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("huodong=info".parse()?))
        .init();

    info!("Huodong Scout starting...");

    // Load config
    let config = Config::from_env();
    config.log_summary();

    let settings = ExtractorSettings::default();
    let client = WebDriverClient::new(&config.webdriver_url)?;
    let browser = WebDriverBrowser::new(client, config.headless, settings.poll_interval);
    let extractor = Extractor::new(Box::new(browser), settings);

    let report = Scout::new(config, extractor).run().await?;

    info!("Scout complete. {report}");
    Ok(())
}
