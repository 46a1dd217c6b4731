use thiserror::Error;

/// Rejected configuration. Raised before any buffer is allocated or worker spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Producer count is zero or negative.
    #[error("producer count must be greater than zero, got {0}")]
    Producers(i64),
    /// Consumer count is zero or negative.
    #[error("consumer count must be greater than zero, got {0}")]
    Consumers(i64),
    /// Buffer capacity is zero or negative.
    #[error("buffer capacity must be greater than zero, got {0}")]
    Capacity(i64),
    /// Run duration is zero or negative.
    #[error("run duration must be greater than zero seconds, got {0}")]
    RunDuration(i64),
}

/// Returned by a semaphore acquisition that was interrupted by the shutdown signal.
///
/// Not a failure: the worker that sees it stops normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("shutdown in progress")]
pub struct ShutdownInProgress;
