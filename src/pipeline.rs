//! End-to-end forecast pipeline over the process-wide immutable state

use crate::aggregate::{
    ForecastAggregator, GlobalForecast, StoreForecast, GLOBAL_KNOWN_TAIL, STORE_KNOWN_TAIL,
};
use crate::data::SalesHistory;
use crate::error::{ForecastError, Result};
use crate::features::{EnrichedHistory, FeatureEnricher};
use crate::future::{FutureFrameBuilder, FutureRow};
use crate::model::ForecastEngine;
use crate::request::ForecastRequest;
use tracing::{info, warn};

/// A store that failed inside a batch request, without aborting the rest
#[derive(Debug)]
pub struct StoreFailure {
    /// Store identifier
    pub store: u32,
    /// What went wrong for this store
    pub error: ForecastError,
}

/// Result of a multi-store request: per-store forecasts plus the isolated
/// failures
#[derive(Debug)]
pub struct BatchForecast {
    /// One joined series per store that produced a forecast
    pub forecasts: Vec<StoreForecast>,
    /// Stores that failed, with their errors
    pub failures: Vec<StoreFailure>,
    /// The predicted future rows, for tabular display and export
    pub rows: Vec<FutureRow>,
}

/// Owns the enriched history and the loaded model, both initialized once
/// and shared read-only; every request recomputes its future frame
#[derive(Debug)]
pub struct ForecastPipeline {
    history: SalesHistory,
    enriched: EnrichedHistory,
    engine: ForecastEngine,
}

impl ForecastPipeline {
    /// Build the pipeline: enrich the history once and keep the engine
    pub fn new(history: SalesHistory, engine: ForecastEngine) -> Result<Self> {
        let enriched = FeatureEnricher::enrich(&history)?;

        info!(
            stores = history.store_count(),
            records = history.len(),
            enriched = enriched.len(),
            "forecast pipeline initialized"
        );

        Ok(Self {
            history,
            enriched,
            engine,
        })
    }

    /// The loaded history
    pub fn history(&self) -> &SalesHistory {
        &self.history
    }

    /// The enriched record set
    pub fn enriched(&self) -> &EnrichedHistory {
        &self.enriched
    }

    /// Run a per-store batch request.
    ///
    /// A store with no history is reported in the batch result instead of
    /// aborting the other stores; any other failure aborts the request.
    pub fn forecast_stores(&self, request: &ForecastRequest) -> Result<BatchForecast> {
        request.validate()?;

        let builder = FutureFrameBuilder::new(&self.history, &self.enriched);
        let mut predicted_rows = Vec::new();
        let mut failures = Vec::new();

        for &store in &request.stores {
            match self.predicted_store_rows(&builder, store, request.horizon_days) {
                Ok(rows) => predicted_rows.extend(rows),
                Err(error @ ForecastError::EmptyHistoryError { .. }) => {
                    warn!(store, "skipping store with no history");
                    failures.push(StoreFailure { store, error });
                }
                Err(error) => return Err(error),
            }
        }

        let forecasts =
            ForecastAggregator::per_store(&self.history, &predicted_rows, STORE_KNOWN_TAIL)?;

        Ok(BatchForecast {
            forecasts,
            failures,
            rows: predicted_rows,
        })
    }

    /// Run a global request over every known store
    pub fn forecast_global(&self, horizon_days: usize) -> Result<GlobalForecast> {
        let builder = FutureFrameBuilder::new(&self.history, &self.enriched);
        let mut rows = builder.build(&self.history.store_ids(), horizon_days)?;
        self.engine.fill_predictions(&mut rows)?;

        ForecastAggregator::global(&self.history, &rows, GLOBAL_KNOWN_TAIL)
    }

    fn predicted_store_rows(
        &self,
        builder: &FutureFrameBuilder,
        store: u32,
        horizon_days: usize,
    ) -> Result<Vec<FutureRow>> {
        let mut rows = builder.build_store(store, horizon_days)?;
        self.engine.fill_predictions(&mut rows)?;
        Ok(rows)
    }
}
