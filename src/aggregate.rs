//! Joining known and predicted series, and cross-store aggregation

use crate::data::SalesHistory;
use crate::error::{ForecastError, Result};
use crate::future::FutureRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Known points shown alongside one store's predictions
pub const STORE_KNOWN_TAIL: usize = 20;

/// Known dates shown alongside the global aggregate
pub const GLOBAL_KNOWN_TAIL: usize = 10;

/// Whether a series point is an observed value or a model prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Observed historical value
    Known,
    /// Model-produced forecast
    Predicted,
}

/// One point of a per-store series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Date of the point
    pub date: NaiveDate,
    /// Sales value
    pub sales: f64,
    /// Observed or predicted
    pub kind: SeriesKind,
}

/// One point of a date-keyed aggregate series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatePoint {
    /// Date of the point
    pub date: NaiveDate,
    /// Sales value
    pub sales: f64,
}

/// One store's joined known/predicted series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreForecast {
    /// Store identifier
    pub store: u32,
    /// Store type for display and export
    pub store_type: Option<String>,
    /// Date-ordered points, known tail first, predictions after
    pub points: Vec<SeriesPoint>,
}

impl StoreForecast {
    /// The known points of the series
    pub fn known(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter().filter(|p| p.kind == SeriesKind::Known)
    }

    /// The predicted points of the series
    pub fn predicted(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points
            .iter()
            .filter(|p| p.kind == SeriesKind::Predicted)
    }
}

/// Scalar summary metrics of a global forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastKpis {
    /// Sum of all predicted sales over the horizon
    pub total_predicted_sales: f64,
    /// Mean predicted sales per horizon day
    pub average_daily_sales: f64,
    /// Mean of the per-store predicted totals
    pub average_sales_per_store: f64,
}

/// Cross-store aggregate forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalForecast {
    /// Summed actual sales per date, most recent tail
    pub known: Vec<DatePoint>,
    /// Summed predicted sales per horizon date
    pub predicted: Vec<DatePoint>,
    /// Scalar summary metrics
    pub kpis: ForecastKpis,
}

/// Joins known and predicted series and aggregates across stores
#[derive(Debug)]
pub struct ForecastAggregator;

impl ForecastAggregator {
    /// Pair each store's most recent known points with its predicted block.
    ///
    /// Output series are sorted by date with no duplicate (store, date)
    /// keys; grouping is by store id even when horizons overlap in
    /// calendar date across stores.
    pub fn per_store(
        history: &SalesHistory,
        rows: &[FutureRow],
        known_tail: usize,
    ) -> Result<Vec<StoreForecast>> {
        let mut by_store: BTreeMap<u32, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for row in rows {
            by_store
                .entry(row.store)
                .or_default()
                .insert(row.date, predicted_sales(row)?);
        }

        let mut forecasts = Vec::with_capacity(by_store.len());
        for (store, predicted) in by_store {
            let known: Vec<(NaiveDate, f64)> = history
                .store_records(store)
                .iter()
                .filter_map(|r| r.sales.map(|sales| (r.date, sales)))
                .collect();
            let start = known.len().saturating_sub(known_tail);

            let mut points: Vec<SeriesPoint> = known[start..]
                .iter()
                .map(|&(date, sales)| SeriesPoint {
                    date,
                    sales,
                    kind: SeriesKind::Known,
                })
                .collect();
            points.extend(predicted.into_iter().map(|(date, sales)| SeriesPoint {
                date,
                sales,
                kind: SeriesKind::Predicted,
            }));

            forecasts.push(StoreForecast {
                store,
                store_type: history.latest_record(store).and_then(|r| r.store_type.clone()),
                points,
            });
        }

        Ok(forecasts)
    }

    /// Sum predictions by date across stores and compute the scalar KPIs.
    ///
    /// The known series is the sum of actual sales grouped by date over the
    /// whole history, restricted to the most recent `known_tail` dates.
    pub fn global(
        history: &SalesHistory,
        rows: &[FutureRow],
        known_tail: usize,
    ) -> Result<GlobalForecast> {
        if rows.is_empty() {
            return Err(ForecastError::ValidationError(
                "no prediction rows to aggregate".to_string(),
            ));
        }

        let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut per_store: BTreeMap<u32, f64> = BTreeMap::new();
        for row in rows {
            let sales = predicted_sales(row)?;
            *per_date.entry(row.date).or_insert(0.0) += sales;
            *per_store.entry(row.store).or_insert(0.0) += sales;
        }

        let total_predicted_sales: f64 = per_date.values().sum();
        let average_daily_sales = total_predicted_sales / per_date.len() as f64;
        let average_sales_per_store =
            per_store.values().sum::<f64>() / per_store.len() as f64;

        let mut known_by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in history.iter() {
            if let Some(sales) = record.sales {
                *known_by_date.entry(record.date).or_insert(0.0) += sales;
            }
        }
        let known_all: Vec<DatePoint> = known_by_date
            .into_iter()
            .map(|(date, sales)| DatePoint { date, sales })
            .collect();
        let start = known_all.len().saturating_sub(known_tail);

        Ok(GlobalForecast {
            known: known_all[start..].to_vec(),
            predicted: per_date
                .into_iter()
                .map(|(date, sales)| DatePoint { date, sales })
                .collect(),
            kpis: ForecastKpis {
                total_predicted_sales,
                average_daily_sales,
                average_sales_per_store,
            },
        })
    }
}

fn predicted_sales(row: &FutureRow) -> Result<f64> {
    row.predicted_sales.ok_or_else(|| {
        ForecastError::ValidationError(format!(
            "future row for store {} on {} has no prediction",
            row.store, row.date
        ))
    })
}
