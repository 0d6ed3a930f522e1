pub mod dates;
pub mod pipeline;
pub mod setup;
pub mod summary;

pub use pipeline::clean;
pub use setup::{SetupResult, setup, setup_logging};
pub use summary::{CleaningSummary, log_summary};

use std::{fmt, str::FromStr};

/// Which cleaning pipeline runs at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineVariant {
    /// Species filter, date normalization, year reconciliation and count coercion.
    Full,
    /// Column projection, null-row removal and a row cap.
    Minimal,
}

impl FromStr for PipelineVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "minimal" => Ok(Self::Minimal),
            other => {
                anyhow::bail!("unknown pipeline variant '{}', expected full or minimal", other)
            }
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Minimal => write!(f, "minimal"),
        }
    }
}

/// Scope of the year-extraction fallback when a parsed date cannot be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFallback {
    /// One failing row discards parsed dates for every row.
    Dataset,
    /// Only the failing row falls back.
    Row,
}

impl FromStr for DateFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dataset" => Ok(Self::Dataset),
            "row" => Ok(Self::Row),
            other => anyhow::bail!("unknown date fallback '{}', expected dataset or row", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CleaningOptions {
    pub variant: PipelineVariant,
    pub target_species: String,
    pub date_fallback: DateFallback,
    pub row_limit: usize,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            variant: PipelineVariant::Full,
            target_species: "Hirundo rustica".to_string(),
            date_fallback: DateFallback::Dataset,
            row_limit: 1000,
        }
    }
}
