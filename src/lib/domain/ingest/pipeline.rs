use super::{
    CleaningOptions, CleaningSummary, DateFallback, PipelineVariant,
    dates::{
        DateSource, ParsedDate, first_four_digit_run, format_canonical, parse_event_date,
        parse_event_date_column, trim_non_digits,
    },
};
use crate::domain::models::{
    CellValue, Dataset, MinimalRecord, Numeric, OccurrenceRecord, RawTable,
};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

const SPECIES: &str = "species";
const DECIMAL_LATITUDE: &str = "decimalLatitude";
const DECIMAL_LONGITUDE: &str = "decimalLongitude";
const EVENT_DATE: &str = "eventDate";
const INDIVIDUAL_COUNT: &str = "individualCount";
const YEAR: &str = "year";
const STATE_PROVINCE: &str = "stateProvince";

const DEFAULT_INDIVIDUAL_COUNT: i64 = 1;

/// Column positions of the projected fields. The minimal pipeline does not project
/// `year` or `stateProvince`.
struct Columns {
    species: usize,
    latitude: usize,
    longitude: usize,
    event_date: usize,
    individual_count: usize,
    year: Option<usize>,
    state_province: Option<usize>,
}

impl Columns {
    fn resolve(table: &RawTable, variant: PipelineVariant) -> anyhow::Result<Self> {
        let (year, state_province) = match variant {
            PipelineVariant::Full => (
                Some(table.require_column(YEAR)?),
                Some(table.require_column(STATE_PROVINCE)?),
            ),
            PipelineVariant::Minimal => (None, None),
        };
        Ok(Self {
            species: table.require_column(SPECIES)?,
            latitude: table.require_column(DECIMAL_LATITUDE)?,
            longitude: table.require_column(DECIMAL_LONGITUDE)?,
            event_date: table.require_column(EVENT_DATE)?,
            individual_count: table.require_column(INDIVIDUAL_COUNT)?,
            year,
            state_province,
        })
    }
}

/// A row reduced to the projected columns.
struct ProjectedRow<'a> {
    species: Option<&'a str>,
    latitude: Option<&'a str>,
    longitude: Option<&'a str>,
    event_date: Option<&'a str>,
    individual_count: Option<&'a str>,
    year: Option<&'a str>,
    state_province: Option<&'a str>,
}

/// Date information resolved for one row.
struct RowDate {
    parsed: Option<NaiveDate>,
    year: Option<f64>,
}

fn project<'a>(table: &'a RawTable, columns: &Columns, row: usize) -> ProjectedRow<'a> {
    let optional = |column: Option<usize>| column.and_then(|c| table.value(row, c));
    ProjectedRow {
        species: table.value(row, columns.species),
        latitude: table.value(row, columns.latitude),
        longitude: table.value(row, columns.longitude),
        event_date: table.value(row, columns.event_date),
        individual_count: table.value(row, columns.individual_count),
        year: optional(columns.year),
        state_province: optional(columns.state_province),
    }
}

/// Interprets a cell as a finite number. Non-numeric and non-finite text is missing.
fn parse_finite(text: Option<&str>) -> Option<f64> {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Truncates a parseable count to an integer, `None` when it cannot be read.
fn parse_count(text: Option<&str>) -> Option<i64> {
    parse_finite(text).map(|value| value.trunc() as i64)
}

/// Runs the configured pipeline over a loaded table.
pub fn clean(
    table: &RawTable,
    options: &CleaningOptions,
) -> anyhow::Result<(Dataset, CleaningSummary)> {
    let columns = Columns::resolve(table, options.variant)?;
    let (dataset, mut summary) = match options.variant {
        PipelineVariant::Full => {
            let (records, summary) = clean_full(table, &columns, options);
            (Dataset::Full(records), summary)
        }
        PipelineVariant::Minimal => {
            let (records, summary) = clean_minimal(table, &columns, options);
            (Dataset::Minimal(records), summary)
        }
    };
    let dataset = dataset.scrubbed();
    summary.rows_served = dataset.len();
    Ok((dataset, summary))
}

fn clean_full(
    table: &RawTable,
    columns: &Columns,
    options: &CleaningOptions,
) -> (Vec<OccurrenceRecord>, CleaningSummary) {
    let mut summary = CleaningSummary::new(PipelineVariant::Full, table.row_count());
    let rows: Vec<ProjectedRow> = (0..table.row_count())
        .map(|row| project(table, columns, row))
        .filter(|row| row.species == Some(options.target_species.as_str()))
        .collect();
    summary.rows_matching_species = rows.len();

    let trimmed: Vec<Option<&str>> = rows
        .iter()
        .map(|row| row.event_date.map(trim_non_digits))
        .collect();
    let dates = resolve_dates(&trimmed, options.date_fallback, &mut summary);

    let mut records = Vec::with_capacity(rows.len());
    for ((row, date), trimmed) in rows.iter().zip(dates).zip(&trimmed) {
        let year = date.year.or_else(|| parse_finite(row.year));
        let individual_count = parse_count(row.individual_count).unwrap_or_else(|| {
            summary.counts_defaulted += 1;
            DEFAULT_INDIVIDUAL_COUNT
        });
        let (Some(latitude), Some(longitude), Some(year)) =
            (parse_finite(row.latitude), parse_finite(row.longitude), year)
        else {
            summary.rows_dropped_incomplete += 1;
            continue;
        };
        let event_date = match date.parsed {
            Some(parsed) => Some(format_canonical(parsed)),
            None => trimmed.map(str::to_string),
        };
        records.push(OccurrenceRecord {
            species: options.target_species.clone(),
            decimal_latitude: Numeric::Number(latitude),
            decimal_longitude: Numeric::Number(longitude),
            event_date,
            individual_count,
            year: Numeric::Number(year),
            state_province: row.state_province.map(str::to_string),
        });
    }
    (records, summary)
}

/// Resolves parsed dates and year-from-date for every row, applying the configured fallback.
fn resolve_dates(
    trimmed: &[Option<&str>],
    fallback: DateFallback,
    summary: &mut CleaningSummary,
) -> Vec<RowDate> {
    let extracted = |text: &Option<&str>| RowDate {
        parsed: None,
        year: text.and_then(first_four_digit_run).map(f64::from),
    };
    let resolved: Vec<Option<RowDate>> = match fallback {
        DateFallback::Dataset => match parse_event_date_column(trimmed) {
            Ok(parsed) => parsed
                .into_iter()
                .map(|date| Some(tally(date, summary)))
                .collect(),
            Err(e) => {
                warn!(
                    "Date parsing failed for the dataset ({}); extracting bare years for all rows",
                    e
                );
                summary.dataset_date_fallback = true;
                summary.rows_date_fallback = trimmed.len();
                summary.dates_unparsed = trimmed.len();
                return trimmed.iter().map(extracted).collect();
            }
        },
        DateFallback::Row => trimmed
            .iter()
            .enumerate()
            .map(|(row, text)| match text {
                Some(text) => match parse_event_date(row, text) {
                    Ok(date) => Some(tally(date, summary)),
                    Err(e) => {
                        debug!("Falling back to year extraction: {}", e);
                        summary.rows_date_fallback += 1;
                        summary.dates_unparsed += 1;
                        None
                    }
                },
                None => Some(tally(None, summary)),
            })
            .collect(),
    };
    resolved
        .into_iter()
        .zip(trimmed)
        .map(|(date, text)| date.unwrap_or_else(|| extracted(text)))
        .collect()
}

fn tally(date: Option<ParsedDate>, summary: &mut CleaningSummary) -> RowDate {
    match date {
        Some(ParsedDate { date, source }) => {
            match source {
                DateSource::MonthFirst => summary.dates_month_first += 1,
                DateSource::Iso8601 => summary.dates_iso8601 += 1,
            }
            RowDate {
                parsed: Some(date),
                year: Some(f64::from(date.year())),
            }
        }
        None => {
            summary.dates_unparsed += 1;
            RowDate {
                parsed: None,
                year: None,
            }
        }
    }
}

/// Keeps the first `row_limit` rows with no missing projected cell. Values pass through as read.
fn clean_minimal(
    table: &RawTable,
    columns: &Columns,
    options: &CleaningOptions,
) -> (Vec<MinimalRecord>, CleaningSummary) {
    let mut summary = CleaningSummary::new(PipelineVariant::Minimal, table.row_count());
    let mut records = Vec::new();
    for row in (0..table.row_count()).map(|row| project(table, columns, row)) {
        if records.len() >= options.row_limit {
            break;
        }
        let (Some(species), Some(latitude), Some(longitude), Some(event_date), Some(count)) = (
            row.species,
            row.latitude,
            row.longitude,
            row.event_date,
            row.individual_count,
        ) else {
            summary.rows_dropped_incomplete += 1;
            continue;
        };
        records.push(MinimalRecord {
            species: species.to_string(),
            decimal_latitude: CellValue::from_text(latitude),
            decimal_longitude: CellValue::from_text(longitude),
            event_date: event_date.to_string(),
            individual_count: CellValue::from_text(count),
        });
    }
    (records, summary)
}
