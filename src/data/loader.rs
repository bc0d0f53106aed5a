use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::clean::{clean, CleaningConfig, RawListing};
use super::model::ListingTable;

/// Columns every source must provide, in the order [`raw_listing`] expects.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "Name",
    "Location",
    "Year",
    "Kilometers_Driven",
    "Fuel_Type",
    "Transmission",
    "Owner_Type",
    "Mileage",
    "Engine",
    "Power",
    "Price",
    "New_Price",
];

/// Load failures a caller may want to tell apart. I/O and decoder errors are
/// reported through `anyhow` context instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },
    #[error("unsupported file extension: .{ext}")]
    UnsupportedExtension { ext: String },
    #[error("expected a top-level JSON array of records")]
    NotRecordArray,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and clean a listings file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the source column names (extra columns,
///   including an unnamed index column, are ignored)
/// * `.json`    – `[{ "Name": ..., "Year": ..., ... }, ...]`
/// * `.parquet` – any column types; cells are read as text
pub fn load_file(path: &Path, config: &CleaningConfig) -> Result<ListingTable> {
    let raw = read_raw(path)?;
    log::info!("Read {} rows from {}", raw.len(), path.display());
    Ok(clean(&raw, config))
}

/// Read a file into raw rows without cleaning them.
pub fn read_raw(path: &Path) -> Result<Vec<RawListing>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV file {}", path.display()))?;
            read_csv(file).with_context(|| format!("reading {}", path.display()))
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension {
            ext: other.to_string(),
        }
        .into()),
    }
}

/// Map each required column to its position in `headers`.
fn resolve_columns<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Vec<usize>, LoadError> {
    let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
    for extra in headers.iter().filter(|h| !REQUIRED_COLUMNS.contains(*h)) {
        log::debug!("Ignoring column '{extra}'");
    }
    REQUIRED_COLUMNS
        .iter()
        .map(|&col| {
            headers
                .iter()
                .position(|h| *h == col)
                .ok_or_else(|| LoadError::MissingColumn {
                    column: col.to_string(),
                })
        })
        .collect()
}

/// Assemble a row; `cell(i)` yields the value of `REQUIRED_COLUMNS[i]`.
fn raw_listing(mut cell: impl FnMut(usize) -> Option<String>) -> RawListing {
    RawListing {
        name: cell(0),
        location: cell(1),
        year: cell(2),
        kilometers_driven: cell(3),
        fuel_type: cell(4),
        transmission: cell(5),
        owner_type: cell(6),
        mileage: cell(7),
        engine: cell(8),
        power: cell(9),
        price: cell(10),
        new_price: cell(11),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV text. Short rows are accepted; their trailing cells are missing.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawListing>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let positions = resolve_columns(headers.iter())?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(raw_listing(|i| record.get(positions[i]).map(str::to_string)));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Name": "Maruti Wagon R LXI CNG", "Year": 2010, "Mileage": "26.6 km/kg", ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawListing>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading JSON file {}", path.display()))?;
    read_json(&text)
}

pub fn read_json(text: &str) -> Result<Vec<RawListing>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().ok_or(LoadError::NotRecordArray)?;

    for col in REQUIRED_COLUMNS {
        if !records
            .iter()
            .any(|r| r.as_object().is_some_and(|o| o.contains_key(col)))
        {
            return Err(LoadError::MissingColumn {
                column: col.to_string(),
            }
            .into());
        }
    }

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| -> Result<RawListing> {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(raw_listing(|c| {
                obj.get(REQUIRED_COLUMNS[c]).and_then(json_to_text)
            }))
        })
        .collect()
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
/// Numeric columns are rendered to text and go through the same parsers as
/// CSV cells.
fn load_parquet(path: &Path) -> Result<Vec<RawListing>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let positions = resolve_columns(schema.fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns: Vec<&Arc<dyn Array>> = positions.iter().map(|&p| batch.column(p)).collect();
        for row in 0..batch.num_rows() {
            rows.push(raw_listing(|i| arrow_cell_to_text(columns[i], row)));
        }
    }
    Ok(rows)
}

fn arrow_cell_to_text(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match array_value_to_string(col, row) {
        Ok(s) => Some(s),
        Err(e) => {
            log::debug!("Unreadable parquet cell at row {row}: {e}");
            None
        }
    }
}
