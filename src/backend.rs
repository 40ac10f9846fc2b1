//! The seam between this crate and the underlying database client.
//!
//! A backend supplies three pieces: a [`Connection`] that prepares
//! statements and controls transactions, a [`Statement`] that binds, runs
//! and closes, and a cursor ([`Rows`]) that walks an executed result one row
//! at a time. [`Row`] carries only the column accessors, and is object-safe
//! on purpose: row mappers are plain `Fn(&dyn Row) -> Result<T>` closures,
//! independent of which backend produced the row.
//!
//! Cursors are owned values. A backend whose native cursor borrows its
//! statement (rusqlite does) buffers the result instead — see
//! [`crate::sqlite`].

use crate::error::SqlShimError;
use crate::params::Param;

/// Column accessors for the current row of a cursor.
///
/// Indices are 0-based.
pub trait Row {
    /// Read column `idx` as text.
    ///
    /// # Errors
    /// Fails if the column is absent or not convertible.
    fn get_text(&self, idx: usize) -> Result<String, SqlShimError>;

    /// Read column `idx` as a 32-bit integer.
    ///
    /// # Errors
    /// Fails if the column is absent or not convertible.
    fn get_i32(&self, idx: usize) -> Result<i32, SqlShimError>;

    /// Read column `idx` as a 64-bit integer.
    ///
    /// # Errors
    /// Fails if the column is absent or not convertible.
    fn get_i64(&self, idx: usize) -> Result<i64, SqlShimError>;
}

/// A cursor over an executed statement's result.
///
/// The column accessors of [`Row`] address the row the most recent
/// successful [`advance`](Rows::advance) landed on.
pub trait Rows: Row {
    /// Move to the next row. Returns `true` if a row is now available.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn advance(&mut self) -> Result<bool, SqlShimError>;

    /// Release the cursor. Implementations are expected to tolerate being
    /// called more than once.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn close(&mut self) -> Result<(), SqlShimError>;
}

/// A compiled parameterized statement.
pub trait Statement {
    /// Cursor type produced by queries and key fetches.
    type Rows: Rows;

    /// Bind `value` at 0-based position `index`. Bound values persist until
    /// rebound; an execute does not clear them.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn bind(&mut self, index: usize, value: &Param) -> Result<(), SqlShimError>;

    /// Run the statement as DML, returning the affected-row count.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn execute_update(&mut self) -> Result<u64, SqlShimError>;

    /// Run the statement as a query, yielding a cursor.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn execute_query(&mut self) -> Result<Self::Rows, SqlShimError>;

    /// Cursor over the keys generated by the most recent execute on a
    /// statement prepared with [`Connection::prepare_returning_keys`].
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn generated_keys(&mut self) -> Result<Self::Rows, SqlShimError>;

    /// Release the compiled statement. A second close may fail; callers of
    /// this trait close exactly once.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn close(&mut self) -> Result<(), SqlShimError>;
}

/// A single logical database session.
///
/// The connection is created and destroyed by the caller; this crate only
/// borrows its capabilities. It is not internally synchronized — callers
/// sharing one connection across threads coordinate themselves.
pub trait Connection {
    /// Statement type this backend produces.
    type Stmt: Statement;

    /// Compile `sql` into a reusable parameterized statement.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn prepare(&self, sql: &str) -> Result<Self::Stmt, SqlShimError>;

    /// Compile `sql` so that generated keys are retrievable after each
    /// execute.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn prepare_returning_keys(&self, sql: &str) -> Result<Self::Stmt, SqlShimError>;

    /// Run one or more semicolon-separated statements without parameters.
    /// The ad-hoc path used for DDL.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn batch(&self, sql: &str) -> Result<(), SqlShimError>;

    /// Flip the connection's auto-commit flag. Turning auto-commit back on
    /// while a transaction is open commits it.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn set_auto_commit(&self, enabled: bool) -> Result<(), SqlShimError>;

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn commit(&self) -> Result<(), SqlShimError>;

    /// Roll back the open transaction.
    ///
    /// # Errors
    /// Fails with the backend's database error.
    fn rollback(&self) -> Result<(), SqlShimError>;
}

// Row mappers are not a trait of their own: a caller-supplied
// `Fn(&dyn Row) -> Result<T, SqlShimError>` closure is the whole capability,
// and plain `Fn` bounds let streams borrow an owner's mapper (`&F` is still
// `Fn`) without extra machinery.
