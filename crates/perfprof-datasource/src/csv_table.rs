//! CSV benchmark tables shared by the file and object-storage sources.
//!
//! The first record is the header. Header names and cell values are
//! trimmed of surrounding whitespace before use.

use std::io::Read;

use csv::{ByteRecord, ReaderBuilder, Trim};
use tracing::{debug, warn};

use perfprof_core::{DataSourceError, MeasurementPoint, RequestType, WorkerConfiguration};

pub const ACCELERATOR_TYPE: &str = "accelerator_type";
pub const INPUT_RANGE: &str = "input_range";
pub const OUTPUT_RANGE: &str = "output_range";
pub const REQUEST_RATE: &str = "metrics_request_rate";
pub const TPOT_LATENCY: &str = "metrics_p90_per_output_token_latency_mean";

/// Columns every benchmark table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    ACCELERATOR_TYPE,
    INPUT_RANGE,
    OUTPUT_RANGE,
    REQUEST_RATE,
    TPOT_LATENCY,
];

/// Positions of the required columns within a header record.
#[derive(Debug, Clone, Copy)]
struct Columns {
    accelerator: usize,
    input: usize,
    output: usize,
    rate: usize,
    latency: usize,
}

impl Columns {
    fn locate(header: &ByteRecord, location: &str) -> Result<Self, DataSourceError> {
        let find = |column: &str| {
            header
                .iter()
                .position(|name| name == column.as_bytes())
                .ok_or_else(|| DataSourceError::MissingColumn {
                    location: location.to_string(),
                    column: column.to_string(),
                })
        };

        // Checked in REQUIRED_COLUMNS order so the first missing one is reported.
        Ok(Self {
            accelerator: find(ACCELERATOR_TYPE)?,
            input: find(INPUT_RANGE)?,
            output: find(OUTPUT_RANGE)?,
            rate: find(REQUEST_RATE)?,
            latency: find(TPOT_LATENCY)?,
        })
    }
}

/// Read a CSV table and return the rows matching the pair.
///
/// Only the required cells are decoded as UTF-8. A row whose key cells do
/// not decode never matches; a row with an undecodable or unparsable rate or
/// latency is skipped with a warning. Unequal field counts fail the whole
/// read.
pub fn filter_measurements<R: Read>(
    reader: R,
    location: &str,
    worker: &WorkerConfiguration,
    request: &RequestType,
) -> Result<Vec<MeasurementPoint>, DataSourceError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);

    let records = csv_reader
        .byte_records()
        .collect::<Result<Vec<ByteRecord>, _>>()
        .map_err(|e| DataSourceError::Csv {
            location: location.to_string(),
            message: e.to_string(),
        })?;

    // A header and at least one data row.
    if records.len() < 2 {
        warn!(%location, "CSV table has no data rows");
        return Ok(Vec::new());
    }

    let columns = Columns::locate(&records[0], location)?;
    let mut points = Vec::new();

    for (i, row) in records[1..].iter().enumerate() {
        let text = |idx: usize| std::str::from_utf8(row.get(idx).unwrap_or_default()).ok();
        let row_number = i + 2;

        if text(columns.accelerator) != Some(worker.accelerator_type.as_str())
            || text(columns.input) != Some(request.input_size_bucket.as_str())
            || text(columns.output) != Some(request.output_size_bucket.as_str())
        {
            continue;
        }

        let rate = match parse_number(row.get(columns.rate)) {
            Ok(v) => v,
            Err(e) => {
                warn!(%location, row = row_number, error = %e, "failed to parse request rate, skipping row");
                continue;
            }
        };

        let latency = match parse_number(row.get(columns.latency)) {
            Ok(v) => v,
            Err(e) => {
                warn!(%location, row = row_number, error = %e, "failed to parse latency, skipping row");
                continue;
            }
        };

        points.push(MeasurementPoint::for_pair(rate, latency, worker, request));
    }

    if points.is_empty() {
        debug!(
            %location,
            worker = %worker.id,
            request = %request.id,
            "no data points matched after filtering"
        );
    }

    Ok(points)
}

fn parse_number(cell: Option<&[u8]>) -> Result<f32, String> {
    let raw = cell.unwrap_or_default();
    let value = std::str::from_utf8(raw).map_err(|e| format!("invalid UTF-8: {e}"))?;
    value.parse::<f32>().map_err(|e| format!("{e}: '{value}'"))
}
