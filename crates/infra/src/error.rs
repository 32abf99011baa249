//! Infrastructure-facing error type.
//!
//! Domain failures pass through untouched; anything the storage backend
//! reports is classified here so callers only ever see a `DomainError` or
//! `Storage`.
//!
//! ## SQLSTATE mapping
//!
//! | SQLSTATE | Meaning | LedgerError |
//! |----------|---------|-------------|
//! | `55P03` | lock_not_available (lock_timeout) | `TransientContention` |
//! | `40001` | serialization_failure | `TransientContention` |
//! | `40P01` | deadlock_detected | `TransientContention` |
//! | `57014` | query_canceled (statement_timeout) | `TransientContention` |
//! | `23514` | check_violation (`quantity >= 0`) | `IntegrityViolation` |
//! | `23503` | foreign_key_violation | `NotFound` |
//! | other / pool / io | | `Storage` |

use thiserror::Error;

use grocer_core::DomainError;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend failed in a way that is neither a business rule nor contention.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            LedgerError::Domain(e) => Some(e),
            LedgerError::Storage(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.as_domain().is_some_and(DomainError::is_retryable)
    }

    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Domain(e) => e.code(),
            LedgerError::Storage(_) => "storage_error",
        }
    }

    /// Classify a sqlx error raised during `operation`.
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            let detail = format!("{operation}: {}", db.message());
            match db.code().as_deref() {
                Some("55P03") | Some("40001") | Some("40P01") | Some("57014") => {
                    return DomainError::contention(detail).into();
                }
                Some("23514") => return DomainError::integrity(detail).into(),
                Some("23503") => return DomainError::not_found(detail).into(),
                _ => {}
            }
        }
        match err {
            sqlx::Error::PoolTimedOut => {
                DomainError::contention(format!("{operation}: connection pool timed out")).into()
            }
            other => LedgerError::Storage(format!("{operation}: {other}")),
        }
    }
}
