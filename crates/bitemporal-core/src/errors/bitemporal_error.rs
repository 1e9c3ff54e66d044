use super::{StorageError, TemporalError};

/// Top-level error type for the bitemporal engine.
/// Subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum BitemporalError {
    #[error("{message} (key: {key}{})", date_suffix(.business_date))]
    DeletedObject {
        key: String,
        business_date: Option<String>,
        message: String,
    },

    #[error("transaction conflict on {key}: {message}")]
    TransactionConflict { key: String, message: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unsupported operation {operation}: {message}")]
    UnsupportedOperation {
        operation: &'static str,
        message: String,
    },

    #[error("temporal error: {0}")]
    TemporalError(#[from] TemporalError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("config error: {0}")]
    ConfigError(String),
}

fn date_suffix(date: &Option<String>) -> String {
    match date {
        Some(d) => format!(", business date: {d}"),
        None => String::new(),
    }
}

/// Classification used by callers deciding what to do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeletedObject,
    TransactionConflict,
    InvariantViolation,
    UnsupportedOperation,
    InvalidInput,
    Storage,
    Config,
}

impl BitemporalError {
    pub fn deleted(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeletedObject {
            key: key.into(),
            business_date: None,
            message: message.into(),
        }
    }

    pub fn conflict(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransactionConflict {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(operation: &'static str, message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DeletedObject { .. } => ErrorKind::DeletedObject,
            Self::TransactionConflict { .. } => ErrorKind::TransactionConflict,
            // Editing a historical view conflicts with the current one.
            Self::TemporalError(TemporalError::ImmutableHistory { .. }) => {
                ErrorKind::TransactionConflict
            }
            Self::TemporalError(_) => ErrorKind::InvalidInput,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::StorageError(_) => ErrorKind::Storage,
            Self::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Only transient storage failures are worth retrying, and never by the engine itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageError(StorageError::Transient(_)))
    }
}

/// Convenience type alias.
pub type BitemporalResult<T> = Result<T, BitemporalError>;
