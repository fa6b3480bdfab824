use serde::{Deserialize, Serialize};

use stockflow_core::ProductId;
use stockflow_inventory::{IncomingLot, OutgoingTransaction};

/// A product together with its stock movements, as fetched for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    /// Stock counter kept by the source system, if it sent one.
    pub recorded_stock: Option<i64>,
    pub incoming: Vec<IncomingLot>,
    pub outgoing: Vec<OutgoingTransaction>,
}

impl Product {
    pub fn total_incoming(&self) -> i64 {
        self.incoming
            .iter()
            .fold(0i64, |acc, lot| acc.saturating_add(lot.quantity))
    }

    pub fn total_outgoing(&self) -> i64 {
        self.outgoing
            .iter()
            .fold(0i64, |acc, tx| acc.saturating_add(tx.quantity))
    }
}
