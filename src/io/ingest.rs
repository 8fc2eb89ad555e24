//! CSV ingest of angle-resolved measurements.
//!
//! Expected columns (header names are case/whitespace-insensitive):
//!
//! | column       | required | meaning                                  |
//! |--------------|----------|------------------------------------------|
//! | `angle`      | yes      | angle of incidence (deg)                 |
//! | `irradiance` | yes      | irradiance during the measurement (W/m²) |
//! | `pmax`       | *        | maximum power (W)                        |
//! | `isc`        | *        | short-circuit current (A)                |
//! | `voc`        | *        | open-circuit voltage (V)                 |
//!
//! `*` the column for the analysed metric must be present.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear error + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No analysis logic here**: range checks on values belong to the curve builder

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Measurement, Metric};
use crate::error::AppError;

/// A row that could not be parsed.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedData {
    pub measurements: Vec<Measurement>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load measurements from a CSV file.
pub fn load_measurements(path: &Path, metric: Metric) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_measurements(file, metric)
}

/// Load measurements from any CSV reader.
pub fn read_measurements<R: std::io::Read>(reader: R, metric: Metric) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV header: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["angle", "irradiance", metric.label()] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(2, format!("Missing required CSV column '{required}'.")));
        }
    }

    let mut measurements = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (i, record) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        rows_read += 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("unreadable row: {e}"),
                });
                continue;
            }
        };
        match parse_row(&record, &header_map, metric) {
            Ok(m) => measurements.push(m),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        tracing::warn!(line = err.line, message = %err.message, "skipping CSV row");
    }
    tracing::debug!(rows = rows_read, kept = measurements.len(), "measurements loaded");

    Ok(IngestedData {
        measurements,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header_name(h), i))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>, metric: Metric) -> Result<Measurement, String> {
    let angle = parse_required_f64(record, header_map, "angle")?;
    let irradiance = parse_required_f64(record, header_map, "irradiance")?;
    // The analysed metric is required per row; the others are carried along if present.
    parse_required_f64(record, header_map, metric.label())?;

    Ok(Measurement {
        angle,
        pmax: parse_opt_f64(get_optional(record, header_map, "pmax")),
        isc: parse_opt_f64(get_optional(record, header_map, "isc")),
        voc: parse_opt_f64(get_optional(record, header_map, "voc")),
        irradiance,
    })
}

fn parse_required_f64(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let raw = get_optional(record, header_map, name).ok_or_else(|| format!("missing '{name}'"))?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid '{name}' value '{raw}'"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = *header_map.get(name)?;
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    s.and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite())
}
