//! Allocation output: per-slice trace, shortfalls and per-lot balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{LotId, TransactionId, ValueObject};

use crate::status::StockStatus;

/// One slice of an outgoing transaction drawn from a single lot.
///
/// A transaction split across several lots produces several records, in the
/// order the lots were consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub outgoing_id: TransactionId,
    pub outgoing_date: DateTime<Utc>,
    /// Always > 0.
    pub quantity: i64,
    pub source_lot_id: LotId,
    pub source_lot_expiry: Option<DateTime<Utc>>,
}

impl ValueObject for AllocationRecord {}

/// Demand that could not be met because every lot was exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub outgoing_id: TransactionId,
    pub requested: i64,
    pub allocated: i64,
    /// `requested - allocated`, always > 0.
    pub missing: i64,
}

impl ValueObject for Shortfall {}

/// State of a lot after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotBalance {
    pub lot_id: LotId,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub original: i64,
    pub consumed: i64,
    pub remaining: i64,
}

impl LotBalance {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl ValueObject for LotBalance {}

/// Result of one FIFO allocation run for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoAllocation {
    /// Allocation slices in emission order.
    pub records: Vec<AllocationRecord>,
    /// One entry per transaction that could not be fully served.
    pub shortfalls: Vec<Shortfall>,
    /// Lots in FIFO order (arrival, then id).
    pub lot_balances: Vec<LotBalance>,
    /// Physical quantity left across all lots; never negative.
    pub on_hand: i64,
    /// Total supply minus total demand. Negative when oversold.
    pub remaining_stock: i64,
    /// Set when at least one transaction had a shortfall.
    pub insufficient_stock: bool,
}

impl FifoAllocation {
    pub fn has_shortfall(&self) -> bool {
        self.insufficient_stock
    }

    /// Remaining stock clamped at zero, for views that cannot show oversold stock.
    pub fn reported_stock(&self) -> i64 {
        self.remaining_stock.max(0)
    }

    pub fn total_allocated(&self) -> i64 {
        self.records.iter().map(|r| r.quantity).sum()
    }

    pub fn total_missing(&self) -> i64 {
        self.shortfalls.iter().map(|s| s.missing).sum()
    }

    /// Quantity allocated to one outgoing transaction.
    pub fn allocated_for(&self, outgoing_id: TransactionId) -> i64 {
        self.records
            .iter()
            .filter(|r| r.outgoing_id == outgoing_id)
            .map(|r| r.quantity)
            .sum()
    }

    /// Quantity drawn from one lot.
    pub fn consumed_from(&self, lot_id: LotId) -> i64 {
        self.records
            .iter()
            .filter(|r| r.source_lot_id == lot_id)
            .map(|r| r.quantity)
            .sum()
    }

    pub fn shortfall_for(&self, outgoing_id: TransactionId) -> Option<&Shortfall> {
        self.shortfalls.iter().find(|s| s.outgoing_id == outgoing_id)
    }

    /// Whether a further withdrawal of `quantity` could be served from stock on hand.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        quantity >= 0 && quantity <= self.on_hand
    }

    pub fn status(&self, restock_threshold: i64) -> StockStatus {
        StockStatus::classify(self.remaining_stock, restock_threshold)
    }
}
