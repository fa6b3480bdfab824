//! Per-product FIFO stock report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult, ProductId, duplicate_ids};
use stockflow_inventory::{AllocationRecord, FifoAllocation, LotBalance, Shortfall, StockStatus};

use crate::config::ReportConfig;
use crate::dashboard::DashboardSummary;
use crate::payload::{ProductRecord, ProductSnapshot};
use crate::product::Product;

/// FIFO outcome for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReport {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub recorded_stock: Option<i64>,
    pub total_incoming: i64,
    pub total_outgoing: i64,
    /// Physical stock left in lots; never negative.
    pub on_hand: i64,
    /// Supply minus demand; negative when oversold.
    pub remaining_stock: i64,
    pub insufficient_stock: bool,
    pub status: StockStatus,
    pub allocations: Vec<AllocationRecord>,
    pub shortfalls: Vec<Shortfall>,
    pub lot_balances: Vec<LotBalance>,
}

impl ProductReport {
    pub fn new(product: &Product, allocation: FifoAllocation, restock_threshold: i64) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            recorded_stock: product.recorded_stock,
            total_incoming: product.total_incoming(),
            total_outgoing: product.total_outgoing(),
            on_hand: allocation.on_hand,
            remaining_stock: allocation.remaining_stock,
            insufficient_stock: allocation.insufficient_stock,
            status: allocation.status(restock_threshold),
            allocations: allocation.records,
            shortfalls: allocation.shortfalls,
            lot_balances: allocation.lot_balances,
        }
    }
}

/// A product left out of the report because its data was malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProduct {
    pub product_id: ProductId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    /// Reported products in ascending id order.
    pub products: Vec<ProductReport>,
    pub skipped: Vec<SkippedProduct>,
    pub dashboard: DashboardSummary,
}

impl InventoryReport {
    pub fn product(&self, product_id: ProductId) -> Option<&ProductReport> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    pub fn restock_candidates(&self) -> impl Iterator<Item = &ProductReport> {
        self.products.iter().filter(|p| p.status.needs_attention())
    }
}

/// Run the FIFO engine for one product record.
pub fn report_product(record: ProductRecord, config: &ReportConfig) -> DomainResult<ProductReport> {
    let product = record.into_product()?;
    let allocation = config.engine().allocate(&product.incoming, &product.outgoing)?;
    Ok(ProductReport::new(&product, allocation, config.restock_threshold))
}

/// Report a single product out of a snapshot.
pub fn report_single(
    snapshot: ProductSnapshot,
    product_id: ProductId,
    config: &ReportConfig,
) -> DomainResult<ProductReport> {
    let record = snapshot
        .data
        .into_iter()
        .find(|r| r.id == product_id)
        .ok_or_else(DomainError::not_found)?;
    report_product(record, config)
}

/// Build the full report for every product in the snapshot.
///
/// Products with malformed data are skipped and listed with the reason; the
/// rest are still reported. Every product sharing an id with another is
/// skipped, since their movements cannot be told apart.
pub fn build_report(snapshot: ProductSnapshot, config: &ReportConfig) -> InventoryReport {
    let mut records = snapshot.data;
    records.sort_by_key(|r| r.id);
    let duplicated: HashSet<ProductId> = duplicate_ids(&records).into_iter().collect();

    let mut products = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        let product_id = record.id;
        let outcome = if duplicated.contains(&product_id) {
            Err(DomainError::invalid_input(format!(
                "duplicate product id {product_id}"
            )))
        } else {
            report_product(record, config)
        };
        match outcome {
            Ok(report) => {
                if report.insufficient_stock {
                    let missing: i64 = report.shortfalls.iter().map(|s| s.missing).sum();
                    tracing::info!(
                        product_id = %product_id,
                        missing,
                        "outgoing stock exceeds incoming stock"
                    );
                }
                tracing::debug!(
                    product_id = %product_id,
                    remaining_stock = report.remaining_stock,
                    status = %report.status,
                    "product allocated"
                );
                products.push(report);
            }
            Err(err) => {
                tracing::warn!(product_id = %product_id, error = %err, "skipping product");
                skipped.push(SkippedProduct {
                    product_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    let dashboard = DashboardSummary::from_reports(&products, config.best_seller_limit);

    InventoryReport {
        products,
        skipped,
        dashboard,
    }
}
