use thiserror::Error;

use stockflow_core::DomainError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
