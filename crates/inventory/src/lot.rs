//! Input records: incoming lots and outgoing transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult, Entity, LotId, TransactionId};

/// A single incoming-stock record (one receipt of goods).
///
/// `expires_at` is carried through to allocation output for traceability; it
/// has no influence on allocation order (arrival order, not expiry order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingLot {
    pub id: LotId,
    /// Quantity available at computation start. Must be non-negative.
    pub quantity: i64,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IncomingLot {
    pub fn new(id: LotId, quantity: i64, received_at: DateTime<Utc>) -> Self {
        Self {
            id,
            quantity,
            received_at,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::invalid_input(format!(
                "incoming lot {} has negative quantity {}",
                self.id, self.quantity
            )));
        }
        Ok(())
    }

    /// FIFO ordering key: arrival time, then id for equal arrivals.
    pub(crate) fn fifo_key(&self) -> (DateTime<Utc>, LotId) {
        (self.received_at, self.id)
    }
}

impl Entity for IncomingLot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A single outgoing-stock record (goods leaving the warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransaction {
    pub id: TransactionId,
    /// Requested quantity. Must be non-negative.
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

impl OutgoingTransaction {
    pub fn new(id: TransactionId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            quantity,
            occurred_at,
        }
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::invalid_input(format!(
                "outgoing transaction {} has negative quantity {}",
                self.id, self.quantity
            )));
        }
        Ok(())
    }
}

impl Entity for OutgoingTransaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
