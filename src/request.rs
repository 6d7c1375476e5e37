//! Per-request configuration surface

use crate::data::SalesHistory;
use crate::error::{ForecastError, Result};
use crate::future::validate_horizon;
use serde::{Deserialize, Serialize};

/// Stores selected when the caller does not pick any
pub const DEFAULT_STORE_COUNT: usize = 3;

/// Horizon length selected when the caller does not pick one
pub const DEFAULT_HORIZON_DAYS: usize = 20;

/// Chart rendering hint passed through to the presentation layer;
/// it does not affect computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    /// Bar chart
    Bar,
    /// Line chart
    #[default]
    Line,
}

/// One forecast request: which stores, how far ahead, and how to draw it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Selected store identifiers
    pub stores: Vec<u32>,
    /// Horizon length in days
    pub horizon_days: usize,
    /// Chart rendering hint
    #[serde(default)]
    pub chart_style: ChartStyle,
}

impl ForecastRequest {
    /// Create a validated request with the default chart style
    pub fn new(stores: Vec<u32>, horizon_days: usize) -> Result<Self> {
        let request = Self {
            stores,
            horizon_days,
            chart_style: ChartStyle::default(),
        };
        request.validate()?;
        Ok(request)
    }

    /// The default request for a loaded history: its first three known
    /// stores over the default horizon
    pub fn default_for(history: &SalesHistory) -> Self {
        Self {
            stores: history
                .store_ids()
                .into_iter()
                .take(DEFAULT_STORE_COUNT)
                .collect(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            chart_style: ChartStyle::default(),
        }
    }

    /// Validate store selection and horizon bounds
    pub fn validate(&self) -> Result<()> {
        if self.stores.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one store must be selected".to_string(),
            ));
        }

        for (idx, store) in self.stores.iter().enumerate() {
            if self.stores[..idx].contains(store) {
                return Err(ForecastError::InvalidParameter(format!(
                    "store {} is selected more than once",
                    store
                )));
            }
        }

        validate_horizon(self.horizon_days)
    }
}
