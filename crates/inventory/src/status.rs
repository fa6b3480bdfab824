//! Stock status classification for restock recommendations.

use serde::{Deserialize, Serialize};

/// Remaining stock below this is flagged for restocking.
pub const DEFAULT_RESTOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Enough stock left.
    Safe,
    /// Stock is below the restock threshold.
    NeedsRestock,
    /// Demand exceeded supply; remaining stock is negative.
    Oversold,
}

impl StockStatus {
    pub fn classify(remaining_stock: i64, restock_threshold: i64) -> Self {
        if remaining_stock < 0 {
            StockStatus::Oversold
        } else if remaining_stock < restock_threshold {
            StockStatus::NeedsRestock
        } else {
            StockStatus::Safe
        }
    }

    pub fn needs_attention(self) -> bool {
        !matches!(self, StockStatus::Safe)
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            StockStatus::Safe => "safe",
            StockStatus::NeedsRestock => "needs_restock",
            StockStatus::Oversold => "oversold",
        };
        f.write_str(s)
    }
}
