use super::PipelineVariant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CleaningSummary {
    pub variant: PipelineVariant,
    pub rows_read: usize,
    pub rows_matching_species: usize,
    pub dates_month_first: usize,
    pub dates_iso8601: usize,
    pub dates_unparsed: usize,
    pub dataset_date_fallback: bool,
    pub rows_date_fallback: usize,
    pub counts_defaulted: usize,
    pub rows_dropped_incomplete: usize,
    pub rows_served: usize,
}

impl CleaningSummary {
    pub fn new(variant: PipelineVariant, rows_read: usize) -> Self {
        Self {
            variant,
            rows_read,
            rows_matching_species: rows_read,
            dates_month_first: 0,
            dates_iso8601: 0,
            dates_unparsed: 0,
            dataset_date_fallback: false,
            rows_date_fallback: 0,
            counts_defaulted: 0,
            rows_dropped_incomplete: 0,
            rows_served: 0,
        }
    }
}

pub fn log_summary(summary: &CleaningSummary) {
    info!("=== Cleaning Summary ({} pipeline) ===", summary.variant);
    info!("Rows read: {}", summary.rows_read);
    info!("Rows matching target species: {}", summary.rows_matching_species);
    info!(
        "Dates parsed: {} month-first, {} ISO-8601, {} left unparsed",
        summary.dates_month_first, summary.dates_iso8601, summary.dates_unparsed
    );
    if summary.dataset_date_fallback {
        warn!("Date parsing fell back to year extraction for the entire dataset");
    } else if summary.rows_date_fallback > 0 {
        warn!(
            "Date parsing fell back to year extraction for {} row(s)",
            summary.rows_date_fallback
        );
    }
    info!("Counts defaulted to 1: {}", summary.counts_defaulted);
    info!("Rows dropped as incomplete: {}", summary.rows_dropped_incomplete);
    info!("Rows served: {}", summary.rows_served);
}
