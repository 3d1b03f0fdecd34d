use cadence_core::ConfigError;
use thiserror::Error;

/// Errors that can surface from the engine's lifecycle operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration rejected during construction or a live swap.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The task failed while the failure policy said "do not retry".
    #[error("task failed: {0:#}")]
    Task(anyhow::Error),

    /// The surrounding execution scope was cancelled (window end or caller
    /// shutdown). A normal stop condition, not an application failure.
    #[error("execution cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
