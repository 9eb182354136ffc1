use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::common::{
    error::{BacktestError, ErrCode},
    time::parse_date,
};
use crate::data::price_series::{PricePoint, PriceSeries};

const DATE_FIELDS: &[&str] = &["date", "datetime", "time_key", "timestamp"];
const CLOSE_FIELD: &str = "close";
const MISSING_VALUES: &[&str] = &["", "nan", "null", "none"];

/// Load closing prices from a CSV file and keep `start <= date < end`.
pub fn load_prices_from_path(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, BacktestError> {
    let file = File::open(path).map_err(|e| {
        BacktestError::new(
            format!("cannot open price file {}: {}", path.display(), e),
            ErrCode::SrcDataNotFound,
        )
    })?;
    let series = load_prices(file, start, end)?;
    info!(
        path = %path.display(),
        rows = series.len(),
        "loaded price history"
    );
    Ok(series)
}

/// Parse CSV with a date column and a `Close` column.
///
/// Rows whose close is missing are dropped. The result must be non-empty.
pub fn load_prices<R: Read>(
    reader: R,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, BacktestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| DATE_FIELDS.iter().any(|f| h.eq_ignore_ascii_case(f)))
        .ok_or_else(|| {
            BacktestError::new("missing date column", ErrCode::SrcDataFormatError)
        })?;
    let close_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(CLOSE_FIELD))
        .ok_or_else(|| {
            BacktestError::new("missing Close column", ErrCode::SrcDataFormatError)
        })?;

    let mut points = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let raw_date = record.get(date_idx).unwrap_or("");
        let raw_close = record.get(close_idx).unwrap_or("");

        let date = parse_date(raw_date)?;
        if start.map_or(false, |s| date < s) || end.map_or(false, |e| date >= e) {
            continue;
        }

        if MISSING_VALUES.iter().any(|m| raw_close.eq_ignore_ascii_case(m)) {
            debug!(row = line + 1, %date, "dropping row without close");
            continue;
        }
        let close: f64 = raw_close.parse().map_err(|_| {
            BacktestError::new(
                format!("row {}: invalid close '{}'", line + 1, raw_close),
                ErrCode::SrcDataFormatError,
            )
        })?;
        if close.is_nan() {
            debug!(row = line + 1, %date, "dropping row without close");
            continue;
        }

        points.push(PricePoint::new(date, close));
    }

    if points.is_empty() {
        return Err(BacktestError::no_data("no price rows in the requested range"));
    }
    PriceSeries::new(points)
}
