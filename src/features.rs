//! Calendar and sales-lag feature enrichment of the historical record set

use crate::data::{HistoricalRecord, SalesHistory};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Number of backward sales lags computed per record
pub const LAG_WINDOW: usize = 7;

/// Sentinel category for a missing promo interval
pub const PROMO_INTERVAL_NONE: &str = "None";

/// Calendar-derived features of one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Day of week, 0 = Monday through 6 = Sunday
    pub day_of_week: u32,
    /// ISO week number
    pub week_of_year: u32,
    /// Whether the day falls on Saturday or Sunday
    pub is_weekend: bool,
}

impl CalendarFeatures {
    /// Derive the calendar features of a date
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week,
            week_of_year: date.iso_week().week(),
            is_weekend: day_of_week >= 5,
        }
    }
}

/// Normalize a raw state-holiday value to the canonical string domain
/// ("0" for no holiday, lowercase letter categories otherwise)
pub fn normalize_state_holiday(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => "0".to_string(),
        Some(value) => {
            if let Ok(parsed) = value.parse::<f64>() {
                if parsed == 0.0 {
                    return "0".to_string();
                }
            }
            value.to_lowercase()
        }
    }
}

/// A historical record with imputed attributes, calendar features, and a
/// complete backward lag window
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// Store identifier
    pub store: u32,
    /// Transaction date
    pub date: NaiveDate,
    /// Actual sales; `None` on closed days
    pub sales: Option<f64>,
    /// Calendar features of the date
    pub calendar: CalendarFeatures,
    /// Promo flag for the day
    pub promo: Option<f64>,
    /// School-holiday flag for the day
    pub school_holiday: Option<f64>,
    /// Canonical state-holiday indicator
    pub state_holiday: String,
    /// Store type category
    pub store_type: Option<String>,
    /// Assortment category
    pub assortment: Option<String>,
    /// Competition distance, imputed with the global median when missing
    pub competition_distance: f64,
    /// Month the nearest competitor opened
    pub competition_open_since_month: Option<f64>,
    /// Year the nearest competitor opened
    pub competition_open_since_year: Option<f64>,
    /// Continuing promotion flag
    pub promo2: Option<f64>,
    /// Week the continuing promotion started
    pub promo2_since_week: Option<f64>,
    /// Year the continuing promotion started
    pub promo2_since_year: Option<f64>,
    /// Promo interval descriptor, "None" when missing
    pub promo_interval: String,
    /// Backward sales lags, lag_1 first
    pub lags: [f64; LAG_WINDOW],
}

/// The enriched record set, with the frozen imputation statistic
#[derive(Debug, Clone)]
pub struct EnrichedHistory {
    records: BTreeMap<u32, Vec<EnrichedRecord>>,
    competition_distance_median: f64,
    imputed_competition_rows: usize,
}

impl EnrichedHistory {
    /// Store identifiers that produced at least one enriched record
    pub fn store_ids(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(store, _)| *store)
            .collect()
    }

    /// Enriched records of one store in date order
    pub fn store_records(&self, store: u32) -> &[EnrichedRecord] {
        self.records
            .get(&store)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// The most recent enriched record of one store
    pub fn latest_record(&self, store: u32) -> Option<&EnrichedRecord> {
        self.records.get(&store).and_then(|r| r.last())
    }

    /// Iterate over every enriched record
    pub fn iter(&self) -> impl Iterator<Item = &EnrichedRecord> {
        self.records.values().flatten()
    }

    /// Total number of enriched records
    pub fn len(&self) -> usize {
        self.records.values().map(|r| r.len()).sum()
    }

    /// Check whether enrichment produced no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The competition-distance median frozen at enrichment time
    pub fn competition_distance_median(&self) -> f64 {
        self.competition_distance_median
    }

    /// How many rows had their competition distance imputed from the
    /// global median rather than an observed value
    pub fn imputed_competition_rows(&self) -> usize {
        self.imputed_competition_rows
    }
}

/// Derives calendar and backward-lag features on the historical set
#[derive(Debug)]
pub struct FeatureEnricher;

impl FeatureEnricher {
    /// Enrich the historical set.
    ///
    /// Imputation runs before lag computation so lag values never carry
    /// unresolved missingness, and the median is computed once over the
    /// entire input set. Records whose lag window is incomplete are dropped.
    pub fn enrich(history: &SalesHistory) -> Result<EnrichedHistory> {
        let distances: Vec<f64> = history
            .iter()
            .filter_map(|r| r.competition_distance)
            .collect();
        let median = if distances.is_empty() {
            0.0
        } else {
            let mut data = Data::new(distances);
            data.median()
        };

        let imputed = history
            .iter()
            .filter(|r| r.competition_distance.is_none())
            .count();
        if imputed > 0 {
            // The fill rests on a global statistic, not a per-store one
            warn!(
                rows = imputed,
                median, "imputing competition distance from the global median"
            );
        }

        let mut records = BTreeMap::new();
        for store in history.store_ids() {
            let store_records = history.store_records(store);
            let mut enriched = Vec::new();

            for (idx, record) in store_records.iter().enumerate() {
                let lags = match lag_window(store_records, idx) {
                    Some(lags) => lags,
                    None => continue,
                };

                enriched.push(EnrichedRecord {
                    store: record.store,
                    date: record.date,
                    sales: record.sales,
                    calendar: CalendarFeatures::from_date(record.date),
                    promo: record.promo,
                    school_holiday: record.school_holiday,
                    state_holiday: normalize_state_holiday(record.state_holiday.as_deref()),
                    store_type: record.store_type.clone(),
                    assortment: record.assortment.clone(),
                    competition_distance: record.competition_distance.unwrap_or(median),
                    competition_open_since_month: record.competition_open_since_month,
                    competition_open_since_year: record.competition_open_since_year,
                    promo2: record.promo2,
                    promo2_since_week: record.promo2_since_week,
                    promo2_since_year: record.promo2_since_year,
                    promo_interval: record
                        .promo_interval
                        .clone()
                        .unwrap_or_else(|| PROMO_INTERVAL_NONE.to_string()),
                    lags,
                });
            }

            records.insert(store, enriched);
        }

        let enriched = EnrichedHistory {
            records,
            competition_distance_median: median,
            imputed_competition_rows: imputed,
        };

        info!(
            input = history.len(),
            enriched = enriched.len(),
            "enriched sales history"
        );

        Ok(enriched)
    }
}

/// The backward lag window ending just before `idx`, or `None` when any of
/// the seven preceding records is missing or has null sales
fn lag_window(records: &[HistoricalRecord], idx: usize) -> Option<[f64; LAG_WINDOW]> {
    if idx < LAG_WINDOW {
        return None;
    }

    let mut lags = [0.0; LAG_WINDOW];
    for k in 1..=LAG_WINDOW {
        lags[k - 1] = records[idx - k].sales?;
    }
    Some(lags)
}
