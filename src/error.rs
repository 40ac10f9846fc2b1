use std::time::Duration;

use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

/// All errors surfaced by this crate.
///
/// Conditions a caller may want to branch on get their own variant: an empty
/// `query_one` result ([`NoRows`](Self::NoRows)) is not a database failure,
/// and a guard timeout ([`Busy`](Self::Busy)) is retryable in a way a broken
/// connection is not.
#[derive(Debug, Error)]
pub enum SqlShimError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Database failure reported by a backend without a dedicated error type.
    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// A bind value outside the supported set (text, i32, i64).
    #[error("unsupported parameter type {kind}: {value}")]
    UnsupportedParam { kind: &'static str, value: String },

    /// `query_one` found an empty result set.
    #[error("query returned no rows, one required")]
    NoRows,

    /// `try_next` was called past the end of a row stream.
    #[error("no more rows in result stream")]
    StreamExhausted,

    /// The statement guard could not be acquired within the timeout.
    #[error("previous operation still in progress (waited {timeout:?})")]
    Busy { timeout: Duration },

    /// A key-returning execute produced no generated-key row.
    #[error("no generated keys returned by statement")]
    MissingGeneratedKeys,

    /// A single-row key-returning execute affected the wrong number of rows.
    #[error("statement affected {rows} rows, exactly one expected")]
    UnexpectedRowCount { rows: u64 },

    /// Releasing a statement or cursor failed. Kept distinct from errors
    /// raised while the resource was in use.
    #[error("failed to release statement resources")]
    CloseFailed(#[source] Box<SqlShimError>),

    /// Rollback itself failed while handling `original`. Both failures are
    /// preserved; `original` is never lost.
    #[error("rollback failed ({rollback}) while handling error: {original}")]
    RollbackFailed {
        rollback: Box<SqlShimError>,
        original: Box<SqlShimError>,
    },

    /// Operation on a statement handle that was already closed.
    #[error("statement already closed")]
    StatementClosed,
}
