use tokio::task::JoinError;

/// Errors raised by the offload scheduler rather than by the work itself.
#[derive(Debug, thiserror::Error)]
pub enum OffloadError {
    /// The scheduler was created outside a tokio runtime.
    #[error("no tokio runtime is available on this thread")]
    NoRuntime,

    /// The job panicked while running on the blocking pool.
    #[error("offloaded job panicked: {0}")]
    Panicked(String),

    /// The runtime shut down before the job completed.
    #[error("offloaded job was cancelled by runtime shutdown")]
    Cancelled,

    /// The scheduler was closed before the job got a worker.
    #[error("offload scheduler is closed")]
    Closed,
}

impl From<JoinError> for OffloadError {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return Self::Cancelled;
        }
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}

/// Result alias for offload operations.
pub type OffloadResult<T> = Result<T, OffloadError>;
