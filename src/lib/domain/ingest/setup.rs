use super::{CleaningSummary, clean, log_summary};
use crate::config::Config;
use crate::domain::models::Dataset;
use crate::inbound::file::{Reader, Tsv};
use anyhow::Context;
use chrono::Utc;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_DIR: &str = "log";

pub struct SetupResult {
    pub dataset: Arc<Dataset>,
    pub summary: CleaningSummary,
}

pub fn setup_logging(log_level: tracing::Level) -> anyhow::Result<()> {
    std::fs::create_dir_all(LOG_DIR)
        .with_context(|| format!("Failed to create log directory: {}", LOG_DIR))?;
    let timestamp_str = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let log_file_path = format!("{}/occurrence_server_{}.log", LOG_DIR, timestamp_str);
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_file_path)
        .with_context(|| format!("Failed to open log file: {}", log_file_path))?;
    Registry::default()
        .with(LevelFilter::from_level(log_level))
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_writer(std::io::stdout))
        .init();
    info!("Starting occurrence server");
    info!("Configuration loaded successfully");
    Ok(())
}

/// Loads and cleans the dataset once. Any failure here must keep the server from starting.
pub fn setup(config: &Config) -> anyhow::Result<SetupResult> {
    let table = Reader::read_tsv(&config.dataset_path).with_context(|| {
        format!(
            "Failed to load dataset from {}",
            config.dataset_path.display()
        )
    })?;
    let (dataset, summary) = clean(&table, &config.cleaning_options())
        .context("Failed to clean occurrence dataset")?;
    log_summary(&summary);
    Ok(SetupResult {
        dataset: Arc::new(dataset),
        summary,
    })
}
