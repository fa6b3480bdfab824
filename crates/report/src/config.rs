//! Report configuration.
//!
//! Values come from environment variables; anything unset falls back to the
//! defaults below.

use thiserror::Error;

use stockflow_inventory::{DEFAULT_RESTOCK_THRESHOLD, FifoEngine, OutgoingOrder};

pub const RESTOCK_THRESHOLD_VAR: &str = "STOCKFLOW_RESTOCK_THRESHOLD";
pub const OUTGOING_ORDER_VAR: &str = "STOCKFLOW_OUTGOING_ORDER";
pub const BEST_SELLERS_VAR: &str = "STOCKFLOW_BEST_SELLERS";

pub const DEFAULT_BEST_SELLER_LIMIT: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// Remaining stock below this is flagged for restocking.
    pub restock_threshold: i64,
    pub outgoing_order: OutgoingOrder,
    /// Number of products listed in the dashboard's best-seller ranking.
    pub best_seller_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            restock_threshold: DEFAULT_RESTOCK_THRESHOLD,
            outgoing_order: OutgoingOrder::default(),
            best_seller_limit: DEFAULT_BEST_SELLER_LIMIT,
        }
    }
}

impl ReportConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` (key -> value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup(RESTOCK_THRESHOLD_VAR)) {
            config.restock_threshold = raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: RESTOCK_THRESHOLD_VAR,
                message: format!("'{raw}': {e}"),
            })?;
        }

        if let Some(raw) = non_empty(lookup(OUTGOING_ORDER_VAR)) {
            config.outgoing_order = raw.parse().map_err(|e: stockflow_core::DomainError| {
                ConfigError::InvalidValue {
                    key: OUTGOING_ORDER_VAR,
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(raw) = non_empty(lookup(BEST_SELLERS_VAR)) {
            config.best_seller_limit = raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: BEST_SELLERS_VAR,
                message: format!("'{raw}': {e}"),
            })?;
        }

        Ok(config)
    }

    pub fn engine(&self) -> FifoEngine {
        FifoEngine::new().with_outgoing_order(self.outgoing_order)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
