//! Dashboard aggregation over the per-product reports.

use serde::{Deserialize, Serialize};

use stockflow_core::ProductId;
use stockflow_inventory::StockStatus;

use crate::report::ProductReport;

/// One row of the best-seller ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSeller {
    pub product_id: ProductId,
    pub name: String,
    pub total_outgoing: i64,
}

/// Headline figures across all reported products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub total_incoming: i64,
    pub total_outgoing: i64,
    /// Σ (outgoing quantity × unit price) per product.
    pub estimated_sales: i64,
    pub needs_restock: usize,
    pub oversold: usize,
    /// Ranked by outgoing quantity descending, then product id ascending.
    pub best_sellers: Vec<BestSeller>,
}

impl DashboardSummary {
    pub fn from_reports(reports: &[ProductReport], best_seller_limit: usize) -> Self {
        let total_incoming = reports
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.total_incoming));
        let total_outgoing = reports
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.total_outgoing));
        let estimated_sales = reports.iter().fold(0i64, |acc, r| {
            acc.saturating_add(r.total_outgoing.saturating_mul(r.price))
        });

        let count_status =
            |status: StockStatus| reports.iter().filter(|r| r.status == status).count();

        let mut ranked: Vec<&ProductReport> = reports.iter().collect();
        ranked.sort_by(|a, b| {
            b.total_outgoing
                .cmp(&a.total_outgoing)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        let best_sellers = ranked
            .into_iter()
            .take(best_seller_limit)
            .map(|r| BestSeller {
                product_id: r.product_id,
                name: r.name.clone(),
                total_outgoing: r.total_outgoing,
            })
            .collect();

        Self {
            product_count: reports.len(),
            total_incoming,
            total_outgoing,
            estimated_sales,
            needs_restock: count_status(StockStatus::NeedsRestock),
            oversold: count_status(StockStatus::Oversold),
            best_sellers,
        }
    }
}
