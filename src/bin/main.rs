use anyhow::Context;
use occurrence_server::{
    config::Config,
    domain::ingest::{SetupResult, setup, setup_logging},
    inbound::http,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config =
        Config::from_env().context("Failed to load configuration from environment variables")?;

    setup_logging(config.log_level)?;
    info!(
        "Loading {} with the {} pipeline",
        config.dataset_path.display(),
        config.variant
    );

    let SetupResult { dataset, summary } = match setup(&config) {
        Ok(result) => result,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return Err(e);
        }
    };
    if summary.rows_served == 0 {
        warn!("Cleaned dataset is empty; the endpoint will serve an empty array");
    }

    http::serve(&config, dataset).await
}
