//! Lazy mapped row streams.

use std::marker::PhantomData;

use tracing::warn;

use crate::backend::{Row, Rows, Statement};
use crate::error::SqlShimError;

/// A pull-based, forward-only sequence of mapped rows.
///
/// Construction fetches once to learn whether a first row exists; the mapper
/// never runs until [`try_next`](Self::try_next). Each `try_next` maps the
/// buffered row, then advances the cursor. The sequence is single-pass and
/// not restartable.
///
/// Streams should be drained or closed promptly. [`close`](Self::close) is
/// idempotent; dropping an unclosed stream closes the cursor best-effort and
/// logs a failure instead of surfacing it.
pub struct RowStream<R, M, T>
where
    R: Rows,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    rows: R,
    mapper: M,
    has_row: bool,
    closed: bool,
    done: bool,
    _out: PhantomData<fn() -> T>,
}

impl<R, M, T> RowStream<R, M, T>
where
    R: Rows,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    /// Wrap an executed cursor. Advances once to establish has-next.
    ///
    /// # Errors
    /// Fails with the backend error if the initial fetch fails; the cursor
    /// is closed best-effort before the error propagates.
    pub fn new(mut rows: R, mapper: M) -> Result<Self, SqlShimError> {
        let has_row = match rows.advance() {
            Ok(has_row) => has_row,
            Err(e) => {
                if let Err(close_err) = rows.close() {
                    warn!(error = %close_err, "cursor close failed after fetch error");
                }
                return Err(e);
            }
        };
        Ok(Self {
            rows,
            mapper,
            has_row,
            closed: false,
            done: false,
            _out: PhantomData,
        })
    }

    /// Whether a row is buffered and the next [`try_next`](Self::try_next)
    /// will yield a value.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.has_row
    }

    /// Map the buffered row and advance the cursor.
    ///
    /// Calling this past the end of the stream is a programming error, not a
    /// normal condition.
    ///
    /// # Errors
    /// [`SqlShimError::StreamExhausted`] past the last row; the mapper's or
    /// the cursor's database error otherwise. A mapper failure leaves the
    /// cursor position unchanged.
    pub fn try_next(&mut self) -> Result<T, SqlShimError> {
        if !self.has_row {
            return Err(SqlShimError::StreamExhausted);
        }
        let value = (self.mapper)(&self.rows)?;
        self.has_row = self.rows.advance()?;
        Ok(value)
    }

    /// Release the underlying cursor. Safe to call more than once.
    ///
    /// # Errors
    /// [`SqlShimError::CloseFailed`] wrapping the backend error if the
    /// cursor cannot be released.
    pub fn close(&mut self) -> Result<(), SqlShimError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.has_row = false;
        self.rows
            .close()
            .map_err(|e| SqlShimError::CloseFailed(Box::new(e)))
    }
}

impl<R, M, T> Iterator for RowStream<R, M, T>
where
    R: Rows,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    type Item = Result<T, SqlShimError>;

    /// Yields `None` at exhaustion and fuses after yielding an error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.has_row {
            return None;
        }
        let item = self.try_next();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl<R, M, T> Drop for RowStream<R, M, T>
where
    R: Rows,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "row stream close failed on drop");
        }
    }
}

/// A row stream that owns its one-shot statement.
///
/// Produced by ad-hoc queries; closing the stream also releases the
/// statement. Statement-release failures surface as
/// [`SqlShimError::CloseFailed`], distinct from iteration errors.
pub struct AdhocRows<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    stream: RowStream<S::Rows, M, T>,
    stmt: Option<S>,
}

impl<S, M, T> AdhocRows<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    pub(crate) fn new(stmt: S, stream: RowStream<S::Rows, M, T>) -> Self {
        Self {
            stream,
            stmt: Some(stmt),
        }
    }

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

    /// Release the cursor and the statement. Safe to call more than once.
    ///
    /// # Errors
    /// [`SqlShimError::CloseFailed`] if either release fails. When both
    /// fail, the cursor failure wins and the statement failure is logged.
    pub fn close(&mut self) -> Result<(), SqlShimError> {
        let cursor_result = self.stream.close();
        let stmt_result = match self.stmt.take() {
            Some(mut stmt) => stmt
                .close()
                .map_err(|e| SqlShimError::CloseFailed(Box::new(e))),
            None => Ok(()),
        };
        match (cursor_result, stmt_result) {
            (Ok(()), r) => r,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stmt_err)) => {
                warn!(error = %stmt_err, "statement close failed after cursor close error");
                Err(e)
            }
        }
    }
}

impl<S, M, T> Iterator for AdhocRows<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    type Item = Result<T, SqlShimError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next()
    }
}

impl<S, M, T> Drop for AdhocRows<S, M, T>
where
    S: Statement,
    M: Fn(&dyn Row) -> Result<T, SqlShimError>,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "ad-hoc row stream close failed on drop");
        }
    }
}
