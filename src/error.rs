use thiserror::Error;
use tracing::{error, warn};

use crate::config::ConfigError;
use crate::shortcuts::{PatternError, StoreError};
use crate::storage::StorageError;

/// Error severity for user-facing reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable, defaults or fallbacks were used
    Error,    // operation failed
    Critical, // data may not have been saved
}

/// Domain-specific errors for the shortcut engine
#[derive(Error, Debug)]
pub enum ShortkeysError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to parse imported shortcuts: {0}")]
    Import(#[source] serde_json::Error),

    #[error("Unknown shortcut pack '{0}'")]
    UnknownPack(String),
}

impl ShortkeysError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Storage(StorageError::QuotaExceeded { .. }) => ErrorSeverity::Warning,
            Self::Storage(StorageError::ReadOnly(_)) => ErrorSeverity::Error,
            Self::Storage(_) => ErrorSeverity::Error,
            Self::Store(StoreError::LocalWriteFailed(_)) => ErrorSeverity::Critical,
            Self::Store(_) => ErrorSeverity::Error,
            Self::Pattern(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Import(_) => ErrorSeverity::Error,
            Self::UnknownPack(_) => ErrorSeverity::Info,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(e) => format!("Storage problem: {}", e),
            Self::Store(StoreError::LocalWriteFailed(_)) => {
                "Your shortcuts could not be saved. Check disk space and permissions.".to_string()
            }
            Self::Store(e) => format!("Could not save shortcuts: {}", e),
            Self::Pattern(e) => format!("Site pattern ignored: {}", e),
            Self::Config(e) => format!("Configuration issue: {}", e),
            Self::Import(e) => format!("Import file is not a shortcut list: {}", e),
            Self::UnknownPack(name) => {
                format!("No pack named '{}'. Run `shortkeys packs` to list them.", name)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ShortkeysError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use shortkeys::error::ResultExt;
///
/// // Continue with defaults if migration bookkeeping fails
/// persistence.migrate_local_to_sync().warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
