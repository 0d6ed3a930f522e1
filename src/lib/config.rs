use crate::domain::ingest::{CleaningOptions, DateFallback, PipelineVariant};
use anyhow::Context;
use std::{net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    pub target_species: String,
    pub variant: PipelineVariant,
    pub date_fallback: DateFallback,
    pub row_limit: usize,
    pub log_level: tracing::Level,
}

const DATASET_PATH_KEY: &str = "DATASET_PATH";
const BIND_ADDR_KEY: &str = "BIND_ADDR";
const ALLOWED_ORIGIN_KEY: &str = "ALLOWED_ORIGIN";
const TARGET_SPECIES_KEY: &str = "TARGET_SPECIES";
const PIPELINE_VARIANT_KEY: &str = "PIPELINE_VARIANT";
const DATE_FALLBACK_KEY: &str = "DATE_FALLBACK";
const ROW_LIMIT_KEY: &str = "ROW_LIMIT";
const LOG_LEVEL_KEY: &str = "LOG_LEVEL";

const DEFAULT_DATASET_PATH: &str = "dataset.csv";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ALLOWED_ORIGIN: &str = "https://kookmao.github.io";
const DEFAULT_TARGET_SPECIES: &str = "Hirundo rustica";
const DEFAULT_ROW_LIMIT: usize = 1000;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Absent keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dataset_path = lookup(DATASET_PATH_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH));
        let bind_addr = lookup(BIND_ADDR_KEY)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| format!("{} is not a valid socket address", BIND_ADDR_KEY))?;
        let allowed_origin =
            lookup(ALLOWED_ORIGIN_KEY).unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        let target_species =
            lookup(TARGET_SPECIES_KEY).unwrap_or_else(|| DEFAULT_TARGET_SPECIES.to_string());
        let variant = match lookup(PIPELINE_VARIANT_KEY) {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid {}", PIPELINE_VARIANT_KEY))?,
            None => PipelineVariant::Full,
        };
        let date_fallback = match lookup(DATE_FALLBACK_KEY) {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid {}", DATE_FALLBACK_KEY))?,
            None => DateFallback::Dataset,
        };
        let row_limit = match lookup(ROW_LIMIT_KEY) {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a non-negative integer", ROW_LIMIT_KEY))?,
            None => DEFAULT_ROW_LIMIT,
        };
        let log_level = match lookup(LOG_LEVEL_KEY) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {}: {}", LOG_LEVEL_KEY, e))?,
            None => tracing::Level::INFO,
        };

        Ok(Self {
            dataset_path,
            bind_addr,
            allowed_origin,
            target_species,
            variant,
            date_fallback,
            row_limit,
            log_level,
        })
    }

    pub fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            variant: self.variant,
            target_species: self.target_species.clone(),
            date_fallback: self.date_fallback,
            row_limit: self.row_limit,
        }
    }
}
