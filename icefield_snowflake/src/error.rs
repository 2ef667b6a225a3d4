//! Error kinds surfaced by the Snowflake side of the provider.
//!
//! Every failure is a typed value. The adaptor layer wraps these in
//! `anyhow::Error` with context; callers can still downcast to decide policy
//! (e.g. deletes swallow [`Error::ObjectMissing`]).

use icefield_core::Cancelled;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Snowflake error codes the classification keys on.
mod codes {
    pub(super) const OBJECT_DOES_NOT_EXIST: &str = "002003";
    pub(super) const OBJECT_DOES_NOT_EXIST_OR_NOT_AUTHORIZED: &str = "002043";
    pub(super) const INSUFFICIENT_PRIVILEGES: &str = "003001";
    pub(super) const SYNTAX_ERROR: &str = "001003";
    pub(super) const STATEMENT_TIMEOUT: &str = "000630";
}

/// Every way an operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An identifier failed to parse or had the wrong number of parts.
    #[error("{0}")]
    InvalidIdentifier(String),
    /// The grant-id codec rejected a string.
    #[error("invalid grant id: {0}")]
    InvalidGrantId(String),
    /// The target role or object does not exist.
    #[error("object does not exist or not authorized: {0}")]
    ObjectMissing(String),
    /// The session role lacks authority.
    #[error("insufficient privileges: {0}")]
    Forbidden(String),
    /// Snowflake reports the requested state is already in place in a way
    /// that can't be repeated (e.g. replication already enabled).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Connection reset, timeout or throttling. The host runtime retries.
    #[error("transient failure: {0}")]
    Transient(String),
    /// The requested scope can't be observed or operated on.
    #[error("unsupported scope: {0}")]
    UnsupportedScope(String),
    /// The request is malformed or violates an invariant.
    #[error("invalid request: {0}")]
    Invalid(String),
    /// Any other Snowflake failure.
    #[error("SQL execution error {sql_state}: {message}")]
    Other {
        /// ANSI sql-state reported by Snowflake.
        sql_state: String,
        /// The message Snowflake returned.
        message: String,
    },
    /// The operation's context was cancelled before the next dispatch.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl Error {
    /// Classify a failed statement from the code, sql-state and message the
    /// Snowflake SQL API returns.
    pub fn from_sql_failure(code: &str, sql_state: &str, message: &str) -> Self {
        let lowered = message.to_lowercase();
        let message = message.to_owned();
        match code {
            codes::OBJECT_DOES_NOT_EXIST | codes::OBJECT_DOES_NOT_EXIST_OR_NOT_AUTHORIZED => {
                return Error::ObjectMissing(message)
            }
            codes::INSUFFICIENT_PRIVILEGES => return Error::Forbidden(message),
            codes::STATEMENT_TIMEOUT => return Error::Transient(message),
            codes::SYNTAX_ERROR => return Error::Invalid(message),
            _ => (),
        }
        if lowered.contains("does not exist") {
            Error::ObjectMissing(message)
        } else if lowered.contains("insufficient privileges") {
            Error::Forbidden(message)
        } else if lowered.contains("already enabled") {
            Error::Conflict(message)
        } else if sql_state.starts_with("08") || sql_state == "57014" {
            Error::Transient(message)
        } else if sql_state.starts_with("42") {
            Error::Invalid(message)
        } else {
            Error::Other {
                sql_state: sql_state.to_owned(),
                message,
            }
        }
    }

    /// Whether the target role or object does not exist.
    pub fn is_object_missing(&self) -> bool {
        matches!(self, Error::ObjectMissing(_))
    }

    /// Whether this is a swallowable conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Whether retrying may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

/// Treat "object does not exist" as success. Used on delete paths.
pub fn ignore_missing<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(e) if e.is_object_missing() => Ok(T::default()),
        other => other,
    }
}
