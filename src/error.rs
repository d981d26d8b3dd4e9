//! Engine error type

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("invalid optimizer config: {0}")]
    InvalidConfig(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deduplication worker exited without a report")]
    WorkerGone,
    #[error("no tokio runtime to run the deduplication worker on")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
