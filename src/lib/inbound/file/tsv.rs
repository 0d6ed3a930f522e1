use crate::{domain::models::RawTable, inbound::file::Reader};
use anyhow::Context;
use csv::ReaderBuilder;
use std::{io::Read, path::Path};
use tracing::info;

/// Cell contents read as missing, in addition to the empty string.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub trait Tsv {
    fn read_tsv(path: &Path) -> anyhow::Result<RawTable>;
    fn read_tsv_from<R: Read>(source: R, source_name: &str) -> anyhow::Result<RawTable>;
}

fn cell_value(cell: &str) -> Option<String> {
    if cell.is_empty() || MISSING_MARKERS.contains(&cell) {
        None
    } else {
        Some(cell.to_string())
    }
}

impl Tsv for Reader {
    fn read_tsv(path: &Path) -> anyhow::Result<RawTable> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown file")
            .to_string();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open tsv file: {}", path.display()))?;
        let table = Self::read_tsv_from(file, &file_name)?;
        info!(
            "Loaded '{}': {} rows, {} columns",
            file_name,
            table.row_count(),
            table.headers().len()
        );
        Ok(table)
    }

    fn read_tsv_from<R: Read>(source: R, source_name: &str) -> anyhow::Result<RawTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(source);
        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("failed to read header row of tsv file: {}", source_name))?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            anyhow::bail!("tsv file '{}' has no header row", source_name);
        }
        let mut rows = Vec::new();
        for (row_num, result) in rdr.records().enumerate() {
            let record = result.with_context(|| {
                format!(
                    "failed to read row {} in tsv file: {}",
                    row_num + 1,
                    source_name
                )
            })?;
            rows.push(record.iter().map(cell_value).collect());
        }
        Ok(RawTable::new(headers, rows))
    }
}
