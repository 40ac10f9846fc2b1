//! Reusable prepared-statement wrappers.
//!
//! Each wrapper owns one compiled statement for its whole lifetime and
//! serializes concurrent use: [`PreparedExec`] and the key-returning
//! wrappers with a plain lock (unbounded wait), [`PreparedQuery`] with a
//! timed lock that fails [`Busy`](crate::SqlShimError::Busy) instead of
//! blocking indefinitely. Callers needing more throughput use one statement
//! per worker instead of sharing.
//!
//! Release is explicit and exactly-once: `close(self)` consumes the
//! wrapper.

mod exec;
mod query;
mod returning;

pub use exec::PreparedExec;
pub use query::{DEFAULT_LOCK_TIMEOUT, PreparedQuery, SharedRows};
pub use returning::{PreparedReturning, PreparedReturningOne, ReturnedKeys};

use tracing::warn;

use crate::backend::{Row, Rows, Statement};
use crate::error::SqlShimError;

/// Release `rows`, preserving whichever error matters most.
///
/// A close failure after a successful operation surfaces as `CloseFailed`;
/// on a path that already failed, the primary error wins and the close
/// failure is logged.
pub(crate) fn finish_cursor<R: Rows, T>(
    mut rows: R,
    result: Result<T, SqlShimError>,
) -> Result<T, SqlShimError> {
    match rows.close() {
        Ok(()) => result,
        Err(close_err) => match result {
            Ok(_) => Err(SqlShimError::CloseFailed(Box::new(close_err))),
            Err(primary) => {
                warn!(error = %close_err, "cursor close failed while handling an earlier error");
                Err(primary)
            }
        },
    }
}

/// First-row fetch shared by the key-returning wrappers: advance once, map,
/// and always release the key cursor.
pub(crate) fn map_generated_keys<S, M, T>(
    stmt: &mut S,
    mapper: &M,
) -> Result<T, SqlShimError>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    let mut keys = stmt.generated_keys()?;
    let result = match keys.advance() {
        Ok(false) => Err(SqlShimError::MissingGeneratedKeys),
        Ok(true) => mapper(&keys),
        Err(e) => Err(e),
    };
    finish_cursor(keys, result)
}
