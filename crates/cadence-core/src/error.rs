use thiserror::Error;

/// A window boundary string failed to parse into valid clock components.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("expected \"HH:MM\", got {0:?}")]
    Format(String),

    #[error("hour {0} out of range (0-23)")]
    Hour(u32),

    #[error("minute {0} out of range (0-59)")]
    Minute(u32),
}

/// Configuration rejected at validation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One of the configured windows failed to parse. The index identifies
    /// the offending entry; the whole config is discarded with it.
    #[error("time window {index} is invalid: {source}")]
    Window { index: usize, source: WindowError },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
