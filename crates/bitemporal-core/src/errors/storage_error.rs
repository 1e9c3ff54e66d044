/// Failures raised by the range-loading collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The caller may retry the whole transaction.
    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("storage load failed: {0}")]
    LoadFailed(String),
}
