//! Delimited-text export of forecast tables for the presentation layer

use crate::aggregate::DatePoint;
use crate::error::{ForecastError, Result};
use crate::future::FutureRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exported row of a per-store forecast table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreForecastRow {
    /// Forecast date
    pub date: NaiveDate,
    /// Predicted sales
    pub predicted_sales: f64,
    /// Store identifier
    pub store: u32,
    /// Store type
    pub store_type: Option<String>,
}

/// One exported row of the global forecast table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalForecastRow {
    /// Forecast date
    pub date: NaiveDate,
    /// Summed predicted sales
    pub predicted_sales: f64,
}

/// Render predicted future rows as a per-store forecast table
/// (`date,predicted_sales,store,store_type` with a header row)
pub fn store_forecast_csv(rows: &[FutureRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        let predicted_sales = row.predicted_sales.ok_or_else(|| {
            ForecastError::ValidationError(format!(
                "future row for store {} on {} has no prediction",
                row.store, row.date
            ))
        })?;
        writer.serialize(StoreForecastRow {
            date: row.date,
            predicted_sales,
            store: row.store,
            store_type: row.store_type.clone(),
        })?;
    }
    finish(writer)
}

/// Render an aggregate series as the global forecast table
/// (`date,predicted_sales` with a header row)
pub fn global_forecast_csv(series: &[DatePoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in series {
        writer.serialize(GlobalForecastRow {
            date: point.date,
            predicted_sales: point.sales,
        })?;
    }
    finish(writer)
}

/// Parse a per-store forecast table back into rows
pub fn parse_store_forecast_csv(text: &str) -> Result<Vec<StoreForecastRow>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    reader
        .deserialize()
        .map(|row| row.map_err(ForecastError::from))
        .collect()
}

/// Parse a global forecast table back into rows
pub fn parse_global_forecast_csv(text: &str) -> Result<Vec<GlobalForecastRow>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    reader
        .deserialize()
        .map(|row| row.map_err(ForecastError::from))
        .collect()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ForecastError::CsvError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ForecastError::CsvError(e.to_string()))
}
