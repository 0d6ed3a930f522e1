use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Offset-bearing layouts tried before the naive ones; offsets are normalized to UTC.
const MONTH_FIRST_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%m/%d/%Y %H:%M:%S%:z",
    "%m/%d/%Y %H:%M:%S%z",
];

const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%m.%d.%Y %H:%M:%S",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const MONTH_FIRST_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y", "%m/%d/%y", "%Y-%m-%d", "%Y/%m/%d", "%d %B %Y",
    "%d %b %Y",
];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateColumnError {
    #[error("row {row}: parsed date falls in year {year}, outside 1..=9999")]
    OutOfRange { row: usize, year: i32 },
}

/// Which convention produced a parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    MonthFirst,
    Iso8601,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

/// Strips any leading and trailing run of non-digit characters.
pub fn trim_non_digits(text: &str) -> &str {
    text.trim_matches(|c: char| !c.is_ascii_digit())
}

/// The first run of four consecutive ASCII digits, as a year.
pub fn first_four_digit_run(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut run_start = None;
    for (idx, byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            let start = *run_start.get_or_insert(idx);
            if idx + 1 - start == 4 {
                return text[start..=idx].parse().ok();
            }
        } else {
            run_start = None;
        }
    }
    None
}

/// Position of the year among the numeric fields of `format`, with the digits it must span.
///
/// `None` when the format has no year or the year runs straight into another field
/// (`%Y%m%d`), where the width is already fixed by the layout.
fn year_field(format: &str) -> Option<(usize, usize)> {
    let mut index = 0;
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next()? {
            'Y' => return (chars.peek() != Some(&'%')).then_some((index, 4)),
            'y' => return Some((index, 2)),
            'm' | 'd' | 'H' | 'M' | 'S' => index += 1,
            _ => {}
        }
    }
    None
}

/// chrono's `%Y` also accepts one to three digits, so `03/15/20` would otherwise read as
/// the year 20. The year's digit run must match the width the format expects.
fn year_width_matches(text: &str, format: &str) -> bool {
    let Some((index, width)) = year_field(format) else {
        return true;
    };
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .nth(index)
        .is_some_and(|run| run.len() == width)
}

pub fn parse_month_first(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in MONTH_FIRST_OFFSET_FORMATS {
        if year_width_matches(text, format)
            && let Ok(dt) = DateTime::parse_from_str(text, format)
        {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in MONTH_FIRST_DATETIME_FORMATS {
        if year_width_matches(text, format)
            && let Ok(ndt) = NaiveDateTime::parse_from_str(text, format)
        {
            return Some(ndt.and_utc());
        }
    }
    for format in MONTH_FIRST_DATE_FORMATS {
        if year_width_matches(text, format)
            && let Ok(date) = NaiveDate::parse_from_str(text, format)
        {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

/// Strict ISO-8601, including the reduced-precision forms `YYYY`, `YYYY-MM` and `YYYY-MM-DDTHH`.
pub fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ISO_DATETIME_FORMATS {
        if year_width_matches(text, format)
            && let Ok(ndt) = NaiveDateTime::parse_from_str(text, format)
        {
            return Some(ndt.and_utc());
        }
    }
    if let Some((date, hour)) = text.split_once('T')
        && hour.len() == 2
        && year_width_matches(date, "%Y-%m-%d")
        && let Ok(ndt) =
            NaiveDateTime::parse_from_str(&format!("{date}T{hour}:00"), "%Y-%m-%dT%H:%M")
    {
        return Some(ndt.and_utc());
    }
    for format in ISO_DATE_FORMATS {
        if year_width_matches(text, format)
            && let Ok(date) = NaiveDate::parse_from_str(text, format)
        {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let date = match text.split_once('-') {
        Some((year, month))
            if year.len() == 4 && month.len() == 2 && all_digits(year) && all_digits(month) =>
        {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?
        }
        None if text.len() == 4 && all_digits(text) => {
            NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1)?
        }
        _ => return None,
    };
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Parses one digit-trimmed `eventDate`: month-first first, strict ISO-8601 second.
///
/// `Ok(None)` means the text is not a date under either convention. A date that parses
/// but cannot be rendered as `YYYY-MM-DD` is an error for the whole column.
pub fn parse_event_date(row: usize, text: &str) -> Result<Option<ParsedDate>, DateColumnError> {
    let parsed = parse_month_first(text)
        .map(|dt| (dt, DateSource::MonthFirst))
        .or_else(|| parse_iso8601(text).map(|dt| (dt, DateSource::Iso8601)));
    let Some((dt, source)) = parsed else {
        return Ok(None);
    };
    let date = dt.date_naive();
    if !(1..=9999).contains(&date.year()) {
        return Err(DateColumnError::OutOfRange {
            row,
            year: date.year(),
        });
    }
    Ok(Some(ParsedDate { date, source }))
}

/// Parses every row's trimmed `eventDate`; the first failing row fails the whole column.
pub fn parse_event_date_column(
    values: &[Option<&str>],
) -> Result<Vec<Option<ParsedDate>>, DateColumnError> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(text) => parse_event_date(row, text),
            None => Ok(None),
        })
        .collect()
}

pub fn format_canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
