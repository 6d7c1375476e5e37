//! # Retail Forecast
//!
//! A Rust library for forecasting near-future daily sales of retail stores
//! from a historical transaction table and static store attributes, using a
//! pre-trained regression artifact.
//!
//! ## Features
//!
//! - Loading and joining the transaction and store-attribute tables
//! - Calendar and backward sales-lag feature enrichment
//! - Future feature-frame synthesis for a 1-30 day horizon
//! - Inference through a frozen, schema-validated regression artifact
//! - Per-store and cross-store aggregation with scalar KPIs
//! - Delimited-text export of forecast tables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retail_forecast::{ForecastEngine, ForecastPipeline, ForecastRequest, HistoryStore};
//!
//! # fn main() -> retail_forecast::Result<()> {
//! // Load the historical record set and the frozen model
//! let history = HistoryStore::from_csv("train.csv", "store.csv")?;
//! let engine = ForecastEngine::from_artifact_file("models/sales_regression.json")?;
//!
//! // Initialize the pipeline once; it enriches the history up front
//! let pipeline = ForecastPipeline::new(history, engine)?;
//!
//! // Forecast the default selection (first three stores, 20 days)
//! let request = ForecastRequest::default_for(pipeline.history());
//! let batch = pipeline.forecast_stores(&request)?;
//!
//! // Aggregate every store over a one-week horizon
//! let global = pipeline.forecast_global(7)?;
//! println!("total predicted: {:.2}", global.kpis.total_predicted_sales);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod future;
pub mod model;
pub mod pipeline;
pub mod request;

// Re-export commonly used types
pub use crate::aggregate::{
    DatePoint, ForecastAggregator, ForecastKpis, GlobalForecast, SeriesKind, SeriesPoint,
    StoreForecast,
};
pub use crate::data::{HistoricalRecord, HistoryStore, SalesHistory, StoreProfile};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{CalendarFeatures, EnrichedHistory, EnrichedRecord, FeatureEnricher};
pub use crate::future::{FutureFrameBuilder, FutureRow};
pub use crate::model::{ForecastEngine, RegressionArtifact};
pub use crate::pipeline::{BatchForecast, ForecastPipeline, StoreFailure};
pub use crate::request::{ChartStyle, ForecastRequest};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
