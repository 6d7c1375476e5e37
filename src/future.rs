//! Forward-looking feature frame synthesis for a forecast horizon

use crate::data::{HistoricalRecord, SalesHistory, StoreProfile};
use crate::error::{ForecastError, Result};
use crate::features::{CalendarFeatures, EnrichedHistory, LAG_WINDOW, PROMO_INTERVAL_NONE};
use chrono::{Duration, NaiveDate};

/// Smallest accepted forecast horizon in days
pub const MIN_HORIZON_DAYS: usize = 1;

/// Largest accepted forecast horizon in days
pub const MAX_HORIZON_DAYS: usize = 30;

/// Holiday indicator assumed for every future date
pub const NO_HOLIDAY: &str = "0";

/// A feature value as presented to the model: numeric, or a categorical
/// level to be encoded by the artifact
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Numeric feature
    Number(f64),
    /// Categorical feature level
    Category(String),
}

/// One synthesized row per (store, future date) within a horizon
#[derive(Debug, Clone, PartialEq)]
pub struct FutureRow {
    /// Store identifier
    pub store: u32,
    /// Future date
    pub date: NaiveDate,
    /// Calendar features of the future date
    pub calendar: CalendarFeatures,
    /// Promo flag carried forward from the latest record
    pub promo: Option<f64>,
    /// Competition distance carried forward, median-filled when missing
    pub competition_distance: f64,
    /// Continuing promotion flag carried forward
    pub promo2: Option<f64>,
    /// Store type carried forward
    pub store_type: Option<String>,
    /// Assortment carried forward
    pub assortment: Option<String>,
    /// Promo interval carried forward, "None" when missing
    pub promo_interval: String,
    /// Holiday indicator, fixed to "0"
    pub state_holiday: String,
    /// Lag values fixed at the store's last historical date, lag_1 first
    pub lags: [f64; LAG_WINDOW],
    /// Model prediction, populated by the forecast engine
    pub predicted_sales: Option<f64>,
}

impl FutureRow {
    /// Look up a feature by its canonical column name
    pub fn feature(&self, name: &str) -> Option<FeatureValue> {
        use FeatureValue::{Category, Number};

        let value = match name {
            "store" => Number(f64::from(self.store)),
            "year" => Number(f64::from(self.calendar.year)),
            "month" => Number(f64::from(self.calendar.month)),
            "day" => Number(f64::from(self.calendar.day)),
            "day_of_week" => Number(f64::from(self.calendar.day_of_week)),
            "week_of_year" => Number(f64::from(self.calendar.week_of_year)),
            "is_weekend" => Number(if self.calendar.is_weekend { 1.0 } else { 0.0 }),
            "promo" => Number(self.promo.unwrap_or(0.0)),
            "competition_distance" => Number(self.competition_distance),
            "promo2" => Number(self.promo2.unwrap_or(0.0)),
            "store_type" => Category(self.store_type.clone().unwrap_or_default()),
            "assortment" => Category(self.assortment.clone().unwrap_or_default()),
            "state_holiday" => Category(self.state_holiday.clone()),
            lag => {
                let k = lag.strip_prefix("sales_lag_")?.parse::<usize>().ok()?;
                if !(1..=LAG_WINDOW).contains(&k) {
                    return None;
                }
                Number(self.lags[k - 1])
            }
        };

        Some(value)
    }
}

/// Validate a requested horizon length against the accepted bounds
pub fn validate_horizon(horizon_days: usize) -> Result<()> {
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(ForecastError::InvalidParameter(format!(
            "horizon must be between {} and {} days, got {}",
            MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, horizon_days
        )));
    }
    Ok(())
}

/// Synthesizes future feature frames from the historical set
#[derive(Debug)]
pub struct FutureFrameBuilder<'a> {
    history: &'a SalesHistory,
    competition_distance_fill: f64,
}

impl<'a> FutureFrameBuilder<'a> {
    /// Create a builder over the loaded history, reusing the enrichment
    /// median for stores whose latest record lacks a competition distance
    pub fn new(history: &'a SalesHistory, enriched: &EnrichedHistory) -> Self {
        Self {
            history,
            competition_distance_fill: enriched.competition_distance_median(),
        }
    }

    /// Build one contiguous future block per requested store and
    /// concatenate them in request order
    pub fn build(&self, stores: &[u32], horizon_days: usize) -> Result<Vec<FutureRow>> {
        validate_horizon(horizon_days)?;

        let mut rows = Vec::with_capacity(stores.len() * horizon_days);
        for &store in stores {
            rows.extend(self.build_store(store, horizon_days)?);
        }
        Ok(rows)
    }

    /// Build the future block of one store, starting the day after its
    /// latest historical date.
    ///
    /// The seven lag values are fixed for the whole block at the lags
    /// observed at the store's last historical date; they are not updated
    /// as predictions accumulate.
    pub fn build_store(&self, store: u32, horizon_days: usize) -> Result<Vec<FutureRow>> {
        validate_horizon(horizon_days)?;

        let records = self.history.store_records(store);
        if records.is_empty() {
            return Err(ForecastError::EmptyHistoryError { store });
        }

        let profile = StoreProfile::latest(self.history, store)?;
        let last_date = records[records.len() - 1].date;
        let lags = lag_vector(records);
        let competition_distance = profile
            .competition_distance
            .unwrap_or(self.competition_distance_fill);
        let promo_interval = profile
            .promo_interval
            .clone()
            .unwrap_or_else(|| PROMO_INTERVAL_NONE.to_string());

        let mut rows = Vec::with_capacity(horizon_days);
        for offset in 1..=horizon_days {
            let date = last_date + Duration::days(offset as i64);
            rows.push(FutureRow {
                store,
                date,
                calendar: CalendarFeatures::from_date(date),
                promo: profile.promo,
                competition_distance,
                promo2: profile.promo2,
                store_type: profile.store_type.clone(),
                assortment: profile.assortment.clone(),
                promo_interval: promo_interval.clone(),
                state_holiday: NO_HOLIDAY.to_string(),
                lags,
                predicted_sales: None,
            });
        }

        Ok(rows)
    }
}

/// Lag values as observed at the store's last historical date: lag_k is the
/// sales of the record k steps before the last one, falling back to the
/// store's mean historical sales when that record is absent or has null
/// sales
fn lag_vector(records: &[HistoricalRecord]) -> [f64; LAG_WINDOW] {
    let observed: Vec<f64> = records.iter().filter_map(|r| r.sales).collect();
    let mean = if observed.is_empty() {
        0.0
    } else {
        observed.iter().sum::<f64>() / observed.len() as f64
    };

    let n = records.len();
    let mut lags = [0.0; LAG_WINDOW];
    for k in 1..=LAG_WINDOW {
        lags[k - 1] = if n > k {
            records[n - 1 - k].sales.unwrap_or(mean)
        } else {
            mean
        };
    }
    lags
}
