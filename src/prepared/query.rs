use std::marker::PhantomData;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::backend::{Row, Rows, Statement};
use crate::error::SqlShimError;
use crate::params::{Param, bind_params};
use crate::prepared::finish_cursor;
use crate::stream::RowStream;

/// How long [`PreparedQuery`] waits for the statement guard before failing
/// with [`Busy`](SqlShimError::Busy).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A reusable parameterized query bound to one row mapper.
///
/// At most one logical operation uses the compiled statement at a time. The
/// guard is acquired with a bounded wait ([`DEFAULT_LOCK_TIMEOUT`] unless
/// overridden); on timeout the call fails with
/// [`Busy`](SqlShimError::Busy) instead of blocking indefinitely, and the
/// statement's bound state is left untouched.
///
/// The stream returned by [`query`](Self::query) holds the guard for its
/// entire lifetime: every other operation on this wrapper waits (and then
/// times out) until the stream is drained, closed, or dropped. Close
/// promptly.
pub struct PreparedQuery<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    stmt: Mutex<S>,
    mapper: M,
    lock_timeout: Duration,
    _out: PhantomData<fn() -> T>,
}

impl<S, M, T> PreparedQuery<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    pub(crate) fn new(stmt: S, mapper: M) -> Self {
        Self {
            stmt: Mutex::new(stmt),
            mapper,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            _out: PhantomData,
        }
    }

    /// Replace the guard-acquisition timeout.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The configured guard-acquisition timeout.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn acquire(&self) -> Result<MutexGuard<'_, S>, SqlShimError> {
        self.stmt
            .try_lock_for(self.lock_timeout)
            .ok_or(SqlShimError::Busy {
                timeout: self.lock_timeout,
            })
    }

    /// Bind `params`, run the query, and map the first row.
    ///
    /// Exactly one row is required to exist; rows beyond the first are
    /// neither fetched nor rejected. The row cursor is released on every
    /// exit path; the statement stays compiled for the next call.
    ///
    /// # Errors
    /// [`SqlShimError::Busy`] if the guard cannot be acquired in time,
    /// [`SqlShimError::NoRows`] if the result set is empty, or the
    /// backend's database error.
    pub fn query_one(&self, params: &[Param]) -> Result<T, SqlShimError> {
        let mut stmt = self.acquire()?;
        bind_params(&mut *stmt, params)?;
        let mut rows = stmt.execute_query()?;
        let result = match rows.advance() {
            Ok(false) => Err(SqlShimError::NoRows),
            Ok(true) => (self.mapper)(&rows),
            Err(e) => Err(e),
        };
        finish_cursor(rows, result)
    }

    /// Bind `params`, run the query, and return a lazy stream of mapped
    /// rows.
    ///
    /// The stream keeps the statement guard until it is closed or dropped —
    /// see the type-level note. If stream construction fails, the guard is
    /// released before the error propagates.
    ///
    /// # Errors
    /// [`SqlShimError::Busy`] if the guard cannot be acquired in time, or
    /// the backend's database error.
    pub fn query(&self, params: &[Param]) -> Result<SharedRows<'_, S, M, T>, SqlShimError> {
        let mut guard = self.acquire()?;
        bind_params(&mut *guard, params)?;
        let rows = guard.execute_query()?;
        let stream = RowStream::new(rows, &self.mapper)?;
        Ok(SharedRows {
            stream,
            guard: Some(guard),
        })
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

/// A row stream derived from a [`PreparedQuery`].
///
/// Holds the statement guard for as long as it lives; closing releases the
/// guard, never the statement.
pub struct SharedRows<'q, S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    // Field order matters: the stream (and its cursor) goes down before the
    // guard is released.
    stream: RowStream<S::Rows, &'q M, T>,
    guard: Option<MutexGuard<'q, S>>,
}

impl<'q, S, M, T> SharedRows<'q, S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    /// See [`RowStream::has_next`].
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.stream.has_next()
    }

    /// See [`RowStream::try_next`].
    ///
    /// # Errors
    /// As [`RowStream::try_next`].
    pub fn try_next(&mut self) -> Result<T, SqlShimError> {
        self.stream.try_next()
    }

    /// Release the cursor and the statement guard. Safe to call more than
    /// once. The guard is released even if the cursor close fails.
    ///
    /// # Errors
    /// [`SqlShimError::CloseFailed`] if the cursor cannot be released.
    pub fn close(&mut self) -> Result<(), SqlShimError> {
        let result = self.stream.close();
        self.guard.take();
        result
    }
}

impl<'q, S, M, T> Iterator for SharedRows<'q, S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    type Item = Result<T, SqlShimError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next()
    }
}
