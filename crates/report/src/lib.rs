//! FIFO inventory reporting over product snapshots.
//!
//! Reads the product/stock-movement snapshot produced by the inventory
//! application, runs the FIFO engine per product, and assembles the report and
//! dashboard figures. Fetching the snapshot and rendering the report are left
//! to the caller.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod payload;
pub mod product;
pub mod report;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub use config::{ConfigError, ReportConfig};
pub use dashboard::{BestSeller, DashboardSummary};
pub use error::ReportError;
pub use payload::{IncomingRecord, OutgoingRecord, ProductRecord, ProductSnapshot};
pub use product::Product;
pub use report::{
    InventoryReport, ProductReport, SkippedProduct, build_report, report_product, report_single,
};

/// Deserialize a snapshot from any reader.
pub fn read_snapshot<R: Read>(reader: R) -> Result<ProductSnapshot, ReportError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Open and deserialize a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<ProductSnapshot, ReportError> {
    let file = File::open(path)?;
    read_snapshot(BufReader::new(file))
}
