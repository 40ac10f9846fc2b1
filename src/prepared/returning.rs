use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::backend::{Row, Statement};
use crate::error::SqlShimError;
use crate::params::{Param, bind_params};
use crate::prepared::map_generated_keys;

/// Outcome of a relaxed key-returning execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnedKeys<T> {
    /// Rows affected by the execute.
    pub rows_affected: u64,
    /// The mapped generated keys.
    pub keys: T,
}

/// A reusable DML statement that reports its generated keys.
///
/// Permissive about the affected-row count by design, for batch scenarios
/// where one call touches several rows; use [`PreparedReturningOne`] for
/// the strict single-row contract. Concurrent `exec` calls serialize on an
/// internal lock with unbounded wait.
pub struct PreparedReturning<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    stmt: Mutex<S>,
    mapper: M,
    _out: PhantomData<fn() -> T>,
}

impl<S, M, T> PreparedReturning<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    pub(crate) fn new(stmt: S, mapper: M) -> Self {
        Self {
            stmt: Mutex::new(stmt),
            mapper,
            _out: PhantomData,
        }
    }

    /// Bind `params`, run the statement, and fetch the generated keys.
    ///
    /// # Errors
    /// [`SqlShimError::MissingGeneratedKeys`] if the backend produced no
    /// key row, [`SqlShimError::UnsupportedParam`] for a non-bindable
    /// value, or the backend's database error.
    pub fn exec(&self, params: &[Param]) -> Result<ReturnedKeys<T>, SqlShimError> {
        let mut stmt = self.stmt.lock();
        bind_params(&mut *stmt, params)?;
        let rows_affected = stmt.execute_update()?;
        let keys = map_generated_keys(&mut *stmt, &self.mapper)?;
        Ok(ReturnedKeys { rows_affected, keys })
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

/// A reusable single-row DML statement that returns its generated key.
///
/// The strict sibling of [`PreparedReturning`]: the execute must affect
/// exactly one row, and only the mapped key is returned.
pub struct PreparedReturningOne<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    stmt: Mutex<S>,
    mapper: M,
    _out: PhantomData<fn() -> T>,
}

impl<S, M, T> PreparedReturningOne<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    pub(crate) fn new(stmt: S, mapper: M) -> Self {
        Self {
            stmt: Mutex::new(stmt),
            mapper,
            _out: PhantomData,
        }
    }

    /// Bind `params`, run the statement, require exactly one affected row,
    /// and return the mapped generated key.
    ///
    /// # Errors
    /// [`SqlShimError::UnexpectedRowCount`] unless exactly one row was
    /// affected, [`SqlShimError::MissingGeneratedKeys`] if the backend
    /// produced no key row, or the backend's database error.
    pub fn exec(&self, params: &[Param]) -> Result<T, SqlShimError> {
        let mut stmt = self.stmt.lock();
        bind_params(&mut *stmt, params)?;
        let rows = stmt.execute_update()?;
        if rows != 1 {
            return Err(SqlShimError::UnexpectedRowCount { rows });
        }
        map_generated_keys(&mut *stmt, &self.mapper)
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
