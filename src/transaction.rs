//! Commit/rollback scoping for a unit of work.

use tracing::{debug, warn};

use crate::backend::Connection;
use crate::error::SqlShimError;

/// Restores the connection's auto-commit flag when the scope ends, on every
/// exit path (including unwinding). A restore failure is logged — the one
/// place this crate swallows an error, so it can never mask the outcome of
/// the work itself.
struct RestoreAutoCommit<'a, C: Connection> {
    conn: &'a C,
}

impl<C: Connection> Drop for RestoreAutoCommit<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.set_auto_commit(true) {
            warn!(error = %e, "failed to restore auto-commit after transaction");
        }
    }
}

/// Run `work` inside a transaction on `conn`.
///
/// Auto-commit is disabled, `work` runs, and the transaction is committed
/// if `work` returns `Ok` or rolled back if it returns `Err` — in which
/// case the original error is re-raised after the rollback completes.
/// Auto-commit is restored afterward regardless of outcome.
///
/// Nested transactions are not supported: the guard against concurrent use
/// is the connection's own auto-commit flag, which is not reentrant. The
/// connection is not locked by this function; callers must not run
/// unrelated statements on it while the transaction is open unless those
/// statements are meant to be part of the transaction.
///
/// # Errors
/// The error returned by `work` (after rollback), a commit or rollback
/// failure, or [`SqlShimError::RollbackFailed`] carrying both errors when
/// rollback itself fails while handling a failed unit of work.
pub fn run_in_transaction<C, W, T>(conn: &C, work: W) -> Result<T, SqlShimError>
where
    C: Connection,
    W: FnOnce() -> Result<T, SqlShimError>,
{
    conn.set_auto_commit(false)?;
    let _restore = RestoreAutoCommit { conn };
    match work() {
        Ok(value) => {
            debug!("transaction work finished, committing");
            conn.commit()?;
            Ok(value)
        }
        Err(original) => {
            debug!(error = %original, "transaction work failed, rolling back");
            match conn.rollback() {
                Ok(()) => Err(original),
                Err(rollback) => Err(SqlShimError::RollbackFailed {
                    rollback: Box::new(rollback),
                    original: Box::new(original),
                }),
            }
        }
    }
}
