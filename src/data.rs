//! Historical sales data loading and the joined record set

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Join key column shared by the transaction and store-attribute tables
pub const JOIN_KEY: &str = "Store";

/// One historical row per (store, date), with the store attributes joined in.
///
/// Attribute fields stay `None` when the store has no match in the attribute
/// table or the source value cannot be read as the expected type.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    /// Store identifier
    pub store: u32,
    /// Transaction date
    pub date: NaiveDate,
    /// Actual sales; `None` on closed days
    pub sales: Option<f64>,
    /// Promo flag for the day
    pub promo: Option<f64>,
    /// Raw state-holiday indicator
    pub state_holiday: Option<String>,
    /// School-holiday flag for the day
    pub school_holiday: Option<f64>,
    /// Store type category
    pub store_type: Option<String>,
    /// Assortment category
    pub assortment: Option<String>,
    /// Distance to the nearest competitor
    pub competition_distance: Option<f64>,
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
    /// Promo interval descriptor
    pub promo_interval: Option<String>,
}

/// The full historical record set, grouped per store and sorted by date
#[derive(Debug, Clone, Default)]
pub struct SalesHistory {
    records: BTreeMap<u32, Vec<HistoricalRecord>>,
}

impl SalesHistory {
    /// Build a history from in-memory records, grouping and date-sorting them
    pub fn from_records(records: Vec<HistoricalRecord>) -> Self {
        let mut by_store: BTreeMap<u32, Vec<HistoricalRecord>> = BTreeMap::new();
        for record in records {
            by_store.entry(record.store).or_default().push(record);
        }
        for store_records in by_store.values_mut() {
            store_records.sort_by_key(|r| r.date);
        }
        Self { records: by_store }
    }

    /// Known store identifiers in ascending order
    pub fn store_ids(&self) -> Vec<u32> {
        self.records.keys().copied().collect()
    }

    /// All records of one store in date order; empty for an unknown store
    pub fn store_records(&self, store: u32) -> &[HistoricalRecord] {
        self.records
            .get(&store)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// The most recent record of one store
    pub fn latest_record(&self, store: u32) -> Option<&HistoricalRecord> {
        self.records.get(&store).and_then(|r| r.last())
    }

    /// Iterate over every record, store by store in date order
    pub fn iter(&self) -> impl Iterator<Item = &HistoricalRecord> {
        self.records.values().flatten()
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.records.values().map(|r| r.len()).sum()
    }

    /// Check whether the history holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct stores
    pub fn store_count(&self) -> usize {
        self.records.len()
    }
}

/// Static attributes of one store, derived from its latest historical record
#[derive(Debug, Clone, PartialEq)]
pub struct StoreProfile {
    /// Store identifier
    pub store: u32,
    /// Store type category
    pub store_type: Option<String>,
    /// Assortment category
    pub assortment: Option<String>,
    /// Distance to the nearest competitor
    pub competition_distance: Option<f64>,
    /// Promo flag at the latest date
    pub promo: Option<f64>,
    /// Continuing promotion flag
    pub promo2: Option<f64>,
    /// Promo interval descriptor
    pub promo_interval: Option<String>,
}

impl StoreProfile {
    /// Derive the profile from the store's latest historical record
    pub fn latest(history: &SalesHistory, store: u32) -> Result<Self> {
        let record = history
            .latest_record(store)
            .ok_or(ForecastError::EmptyHistoryError { store })?;

        Ok(Self {
            store,
            store_type: record.store_type.clone(),
            assortment: record.assortment.clone(),
            competition_distance: record.competition_distance,
            promo: record.promo,
            promo2: record.promo2,
            promo_interval: record.promo_interval.clone(),
        })
    }
}

/// Loader that merges the transaction and store-attribute tables
#[derive(Debug)]
pub struct HistoryStore;

impl HistoryStore {
    /// Load and join the two source tables from CSV files
    pub fn from_csv<P: AsRef<Path>, Q: AsRef<Path>>(
        sales_path: P,
        stores_path: Q,
    ) -> Result<SalesHistory> {
        let sales = Self::read_csv(sales_path.as_ref())?;
        let stores = Self::read_csv(stores_path.as_ref())?;
        Self::from_dataframes(sales, stores)
    }

    /// Join already-loaded source frames into a history
    pub fn from_dataframes(sales: DataFrame, stores: DataFrame) -> Result<SalesHistory> {
        require_columns(&sales, &["Date", JOIN_KEY, "Sales"], "transaction")?;
        require_columns(&stores, &[JOIN_KEY], "store attribute")?;

        // Left join keeps transactional rows with no attribute match
        let joined = sales.left_join(&stores, [JOIN_KEY], [JOIN_KEY])?;
        let records = Self::records_from_frame(&joined)?;
        let history = SalesHistory::from_records(records);

        info!(
            stores = history.store_count(),
            records = history.len(),
            "loaded sales history"
        );

        Ok(history)
    }

    fn read_csv(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            ForecastError::DataSourceError(format!("cannot open {}: {}", path.display(), e))
        })?;

        CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| {
                ForecastError::DataSourceError(format!("cannot parse {}: {}", path.display(), e))
            })
    }

    fn records_from_frame(df: &DataFrame) -> Result<Vec<HistoricalRecord>> {
        let stores = required_u32_column(df, JOIN_KEY)?;
        let dates = date_column(df, "Date")?;
        let sales = opt_f64_column(df, "Sales")?;
        let promo = opt_f64_column(df, "Promo")?;
        let state_holiday = opt_str_column(df, "StateHoliday")?;
        let school_holiday = opt_f64_column(df, "SchoolHoliday")?;
        let store_type = opt_str_column(df, "StoreType")?;
        let assortment = opt_str_column(df, "Assortment")?;
        let competition_distance = opt_f64_column(df, "CompetitionDistance")?;
        let competition_open_since_month = opt_f64_column(df, "CompetitionOpenSinceMonth")?;
        let competition_open_since_year = opt_f64_column(df, "CompetitionOpenSinceYear")?;
        let promo2 = opt_f64_column(df, "Promo2")?;
        let promo2_since_week = opt_f64_column(df, "Promo2SinceWeek")?;
        let promo2_since_year = opt_f64_column(df, "Promo2SinceYear")?;
        let promo_interval = opt_str_column(df, "PromoInterval")?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            records.push(HistoricalRecord {
                store: stores[i],
                date: dates[i],
                sales: sales[i],
                promo: promo[i],
                state_holiday: state_holiday[i].clone(),
                school_holiday: school_holiday[i],
                store_type: store_type[i].clone(),
                assortment: assortment[i].clone(),
                competition_distance: competition_distance[i],
                competition_open_since_month: competition_open_since_month[i],
                competition_open_since_year: competition_open_since_year[i],
                promo2: promo2[i],
                promo2_since_week: promo2_since_week[i],
                promo2_since_year: promo2_since_year[i],
                promo_interval: promo_interval[i].clone(),
            });
        }

        Ok(records)
    }
}

fn require_columns(df: &DataFrame, columns: &[&str], table: &str) -> Result<()> {
    let names = df.get_column_names();
    for column in columns {
        if !names.iter().any(|name| name == column) {
            return Err(ForecastError::DataSourceError(format!(
                "{} table is missing the '{}' column",
                table, column
            )));
        }
    }
    Ok(())
}

fn required_u32_column(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    opt_f64_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(v) if v >= 0.0 => Ok(v as u32),
            _ => Err(ForecastError::DataSourceError(format!(
                "column '{}' has no usable value at row {}",
                name, i
            ))),
        })
        .collect()
}

/// Read a column as dates, from either string or native date values
fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let col = df.column(name)?;

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .map(|value| {
                let raw = value.ok_or_else(|| {
                    ForecastError::DataSourceError(format!("column '{}' has a null date", name))
                })?;
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                    ForecastError::DataSourceError(format!(
                        "column '{}' has unparseable date '{}': {}",
                        name, raw, e
                    ))
                })
            })
            .collect(),
        DataType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            col.date()?
                .into_iter()
                .map(|value| {
                    let days = value.ok_or_else(|| {
                        ForecastError::DataSourceError(format!(
                            "column '{}' has a null date",
                            name
                        ))
                    })?;
                    Ok(epoch + chrono::Duration::days(days as i64))
                })
                .collect()
        }
        other => Err(ForecastError::DataSourceError(format!(
            "column '{}' has unsupported date type {}",
            name, other
        ))),
    }
}

/// Read a column as optional numbers, coercing strings and treating
/// non-numeric or absent values as unknown rather than zero
fn opt_f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = match df.column(name) {
        Ok(col) => col,
        Err(_) => return Ok(vec![None; df.height()]),
    };

    let values = match col.dtype() {
        DataType::Float64 => col.f64()?.into_iter().collect(),
        DataType::Float32 => col
            .f32()?
            .into_iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => col.i64()?.into_iter().map(|v| v.map(|v| v as f64)).collect(),
        DataType::Int32 => col.i32()?.into_iter().map(|v| v.map(|v| v as f64)).collect(),
        DataType::UInt64 => col.u64()?.into_iter().map(|v| v.map(|v| v as f64)).collect(),
        DataType::UInt32 => col.u32()?.into_iter().map(|v| v.map(|v| v as f64)).collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
            .collect(),
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        DataType::Null => vec![None; df.height()],
        other => {
            return Err(ForecastError::DataSourceError(format!(
                "column '{}' has unsupported numeric type {}",
                name, other
            )))
        }
    };

    Ok(values)
}

/// Read a column as optional strings, stringifying numeric values
fn opt_str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = match df.column(name) {
        Ok(col) => col,
        Err(_) => return Ok(vec![None; df.height()]),
    };

    let values = match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .map(|v| {
                v.map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect(),
        DataType::Int64 => col
            .i64()?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()))
            .collect(),
        DataType::Int32 => col
            .i32()?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()))
            .collect(),
        DataType::Float64 => col
            .f64()?
            .into_iter()
            .map(|v| v.map(|v| format!("{}", v)))
            .collect(),
        DataType::Null => vec![None; df.height()],
        other => {
            return Err(ForecastError::DataSourceError(format!(
                "column '{}' has unsupported string type {}",
                name, other
            )))
        }
    };

    Ok(values)
}
