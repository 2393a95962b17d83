use anyhow::{Context, Result};
use harvest::{config::Settings, harvester::Harvester};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env().context("failed to load settings")?;
    info!(
        "Configuration - concurrency: {}, timeout: {}s, sites file: {:?}, refresh: {:?}",
        settings.concurrency,
        settings.timeout.as_secs(),
        settings.sites_file,
        settings.refresh_mode
    );

    let harvester = Harvester::from_settings(&settings)?;
    let harvest = harvester.all_comments(false).await;

    for err in &harvest.errors {
        warn!("{}", err);
    }

    println!("{}", serde_json::to_string_pretty(&harvest.comments)?);
    Ok(())
}
