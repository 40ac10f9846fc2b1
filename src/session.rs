//! The caller-facing wrapper around a backend connection.

use tracing::warn;

use crate::backend::{Connection, Row, Rows, Statement};
use crate::error::SqlShimError;
use crate::params::{Param, bind_params};
use crate::prepared::{
    PreparedExec, PreparedQuery, PreparedReturning, PreparedReturningOne, finish_cursor,
};
use crate::stream::{AdhocRows, RowStream};
use crate::transaction::run_in_transaction;

/// Row mapper for the common single-`i64`-key case.
pub type IdMapper = fn(&dyn Row) -> Result<i64, SqlShimError>;

fn first_column_id(row: &dyn Row) -> Result<i64, SqlShimError> {
    row.get_i64(0)
}

/// Release a one-shot statement, preserving whichever error matters most.
fn finish_statement<S: Statement, T>(
    mut stmt: S,
    result: Result<T, SqlShimError>,
) -> Result<T, SqlShimError> {
    match stmt.close() {
        Ok(()) => result,
        Err(close_err) => match result {
            Ok(_) => Err(SqlShimError::CloseFailed(Box::new(close_err))),
            Err(primary) => {
                warn!(error = %close_err, "statement close failed while handling an earlier error");
                Err(primary)
            }
        },
    }
}

/// Convenience layer over one backend connection.
///
/// The session borrows nothing from the caller: it owns the (cheap, handle-
/// like) backend connection value, while the database session itself stays
/// the caller's responsibility for its whole lifetime. One-shot helpers
/// prepare, run and release per call; the `prepare_*` constructors hand out
/// reusable wrappers that amortize compilation across calls.
pub struct Session<C: Connection> {
    conn: C,
}

impl<C: Connection> Session<C> {
    /// Wrap a backend connection.
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// The wrapped backend connection.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Unwrap the backend connection.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Run DDL. Using this for anything but DDL is a code smell; data
    /// manipulation belongs to [`exec`](Self::exec) or a prepared wrapper.
    ///
    /// # Errors
    /// The backend's database error.
    pub fn ddl(&self, sql: &str) -> Result<(), SqlShimError> {
        self.conn.batch(sql)
    }

    /// One-shot INSERT/UPDATE/DELETE. Prefer [`prepare_exec`](Self::prepare_exec)
    /// when running the same statement repeatedly.
    ///
    /// # Errors
    /// [`SqlShimError::UnsupportedParam`] for a non-bindable value, or the
    /// backend's database error.
    pub fn exec(&self, sql: &str, params: &[Param]) -> Result<u64, SqlShimError> {
        let mut stmt = self.conn.prepare(sql)?;
        let result = bind_params(&mut stmt, params).and_then(|()| stmt.execute_update());
        finish_statement(stmt, result)
    }

    /// One-shot query requiring exactly one row, mapped through `mapper`.
    ///
    /// Rows beyond the first are neither fetched nor rejected.
    ///
    /// # Errors
    /// [`SqlShimError::NoRows`] on an empty result set,
    /// [`SqlShimError::UnsupportedParam`] for a non-bindable value, or the
    /// backend's database error.
    pub fn query_one<M, T>(&self, mapper: M, sql: &str, params: &[Param]) -> Result<T, SqlShimError>
    where
        M: Fn(&dyn Row) -> Result<T, SqlShimError>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let result = (|| {
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.execute_query()?;
            let mapped = match rows.advance() {
                Ok(false) => Err(SqlShimError::NoRows),
                Ok(true) => mapper(&rows),
                Err(e) => Err(e),
            };
            finish_cursor(rows, mapped)
        })();
        finish_statement(stmt, result)
    }

    /// One-shot query returning a lazy stream of mapped rows.
    ///
    /// The stream owns its statement; closing (or dropping) the stream
    /// releases it. Close failures surface from the close step as
    /// [`SqlShimError::CloseFailed`].
    ///
    /// # Errors
    /// [`SqlShimError::UnsupportedParam`] for a non-bindable value, or the
    /// backend's database error.
    pub fn query<M, T>(
        &self,
        mapper: M,
        sql: &str,
        params: &[Param],
    ) -> Result<AdhocRows<C::Stmt, M, T>, SqlShimError>
    where
        M: Fn(&dyn Row) -> Result<T, SqlShimError>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match bind_params(&mut stmt, params).and_then(|()| stmt.execute_query()) {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(close_err) = stmt.close() {
                    warn!(error = %close_err, "statement close failed after query error");
                }
                return Err(e);
            }
        };
        match RowStream::new(rows, mapper) {
            Ok(stream) => Ok(AdhocRows::new(stmt, stream)),
            Err(e) => {
                if let Err(close_err) = stmt.close() {
                    warn!(error = %close_err, "statement close failed after stream error");
                }
                Err(e)
            }
        }
    }

    /// Compile `sql` into a reusable DML statement.
    ///
    /// # Errors
    /// The backend's database error.
    pub fn prepare_exec(&self, sql: &str) -> Result<PreparedExec<C::Stmt>, SqlShimError> {
        Ok(PreparedExec::new(self.conn.prepare(sql)?))
    }

    /// Compile `sql` into a reusable query with `mapper` applied to each
    /// row.
    ///
    /// # Errors
    /// The backend's database error.
    pub fn prepare_query<M, T>(
        &self,
        mapper: M,
        sql: &str,
    ) -> Result<PreparedQuery<C::Stmt, M, T>, SqlShimError>
    where
        M: Fn(&dyn Row) -> Result<T, SqlShimError>,
    {
        Ok(PreparedQuery::new(self.conn.prepare(sql)?, mapper))
    }

    /// Compile `sql` into a reusable key-returning statement (relaxed: no
    /// affected-row-count check, for batch use).
    ///
    /// # Errors
    /// The backend's database error.
    pub fn prepare_returning<M, T>(
        &self,
        mapper: M,
        sql: &str,
    ) -> Result<PreparedReturning<C::Stmt, M, T>, SqlShimError>
    where
        M: Fn(&dyn Row) -> Result<T, SqlShimError>,
    {
        Ok(PreparedReturning::new(
            self.conn.prepare_returning_keys(sql)?,
            mapper,
        ))
    }

    /// Compile `sql` into a strict single-row key-returning statement.
    ///
    /// # Errors
    /// The backend's database error.
    pub fn prepare_returning_one<M, T>(
        &self,
        mapper: M,
        sql: &str,
    ) -> Result<PreparedReturningOne<C::Stmt, M, T>, SqlShimError>
    where
        M: Fn(&dyn Row) -> Result<T, SqlShimError>,
    {
        Ok(PreparedReturningOne::new(
            self.conn.prepare_returning_keys(sql)?,
            mapper,
        ))
    }

    /// [`prepare_returning_one`](Self::prepare_returning_one) specialized
    /// for the common case of a single `i64` generated key.
    ///
    /// # Errors
    /// The backend's database error.
    pub fn prepare_returning_id(
        &self,
        sql: &str,
    ) -> Result<PreparedReturningOne<C::Stmt, IdMapper, i64>, SqlShimError> {
        self.prepare_returning_one(first_column_id as IdMapper, sql)
    }

    /// Run `work` inside a transaction; see
    /// [`run_in_transaction`](crate::transaction::run_in_transaction).
    ///
    /// `work` typically captures this session and issues calls through it.
    ///
    /// # Errors
    /// As [`run_in_transaction`](crate::transaction::run_in_transaction).
    pub fn transaction<W, T>(&self, work: W) -> Result<T, SqlShimError>
    where
        W: FnOnce() -> Result<T, SqlShimError>,
    {
        run_in_transaction(&self.conn, work)
    }
}
