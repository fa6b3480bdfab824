//! Tracing and logging setup shared by stockflow binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide observability (tracing/logging).
///
/// The format comes from `STOCKFLOW_LOG_FORMAT` (`json` or `pretty`, default
/// `json`). This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format = std::env::var("STOCKFLOW_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    tracing::init(format);
}
