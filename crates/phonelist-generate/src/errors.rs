use thiserror::Error;

use crate::model::GenerationReport;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] phonelist_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("progress store error: {0}")]
    Checkpoint(String),
    #[error("worker failed on area code {area_code} range {range}: {message}")]
    Worker {
        area_code: String,
        range: usize,
        message: String,
    },
    #[error("generation incomplete: {} range(s) failed", .0.failures.len())]
    Incomplete(GenerationReport),
}

impl GenerationError {
    /// Whether the error must stop the whole run rather than a single range.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Worker { .. })
    }
}
