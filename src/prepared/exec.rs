use parking_lot::Mutex;

use crate::backend::Statement;
use crate::error::SqlShimError;
use crate::params::{Param, bind_params};

/// A reusable parameterized DML statement.
///
/// One compiled statement serves every invocation; concurrent `exec` calls
/// serialize on an internal lock with unbounded wait. That trades throughput
/// for memory — sharing one handle is correct but never parallel.
pub struct PreparedExec<S: Statement> {
    stmt: Mutex<S>,
}

impl<S: Statement> PreparedExec<S> {
    pub(crate) fn new(stmt: S) -> Self {
        Self {
            stmt: Mutex::new(stmt),
        }
    }

    /// Bind `params` and run the statement, returning the affected-row
    /// count.
    ///
    /// # Errors
    /// [`SqlShimError::UnsupportedParam`] for a non-bindable value, or the
    /// backend's database error.
    pub fn exec(&self, params: &[Param]) -> Result<u64, SqlShimError> {
        let mut stmt = self.stmt.lock();
        bind_params(&mut *stmt, params)?;
        stmt.execute_update()
    }

    /// Release the underlying statement handle.
    ///
    /// Consumes the wrapper, so release happens exactly once.
    ///
    /// # Errors
    /// [`SqlShimError::CloseFailed`] wrapping the backend error.
    pub fn close(self) -> Result<(), SqlShimError> {
        let mut stmt = self.stmt.into_inner();
        stmt.close()
            .map_err(|e| SqlShimError::CloseFailed(Box::new(e)))
    }
}
