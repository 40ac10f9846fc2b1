//! `SQLite` backend over rusqlite.
//!
//! [`SqliteConnection`] adapts a `rusqlite::Connection` to the
//! [`Connection`](crate::backend::Connection) seam. Statement handles share
//! the connection and reuse compiled statements through rusqlite's
//! `prepare_cached` cache; query results are buffered into owned cursors
//! (rusqlite's native cursor cannot outlive the call that produced it).
//!
//! Auto-commit is emulated JDBC-style on top of `BEGIN`/`COMMIT`: turning
//! auto-commit off opens a transaction, `commit`/`rollback` close it and
//! immediately open the next one while auto-commit stays off, and turning
//! auto-commit back on commits whatever is open.

mod params;
mod rows;
mod statement;

pub use params::param_to_sqlite_value;
pub use rows::SqliteRows;
pub use statement::SqliteStatement;

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crate::backend::Connection;
use crate::error::SqlShimError;

/// A `SQLite` session implementing the backend [`Connection`] seam.
///
/// Single-threaded by construction (statement handles share the connection
/// via `Rc`), which matches rusqlite's own threading model.
pub struct SqliteConnection {
    conn: Rc<rusqlite::Connection>,
    auto_commit: Cell<bool>,
}

impl SqliteConnection {
    /// Wrap an existing rusqlite connection. `SQLite` connections start in
    /// auto-commit mode.
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Rc::new(conn),
            auto_commit: Cell::new(true),
        }
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns the rusqlite error if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, SqlShimError> {
        Ok(Self::new(rusqlite::Connection::open_in_memory()?))
    }

    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns the rusqlite error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqlShimError> {
        Ok(Self::new(rusqlite::Connection::open(path)?))
    }

    /// The underlying rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Whether the session is in auto-commit mode.
    #[must_use]
    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit.get()
    }
}

impl Connection for SqliteConnection {
    type Stmt = SqliteStatement;

    fn prepare(&self, sql: &str) -> Result<Self::Stmt, SqlShimError> {
        // Compile eagerly so bad SQL fails at prepare time; the compiled
        // statement stays in the connection's cache for the handle to use.
        self.conn.prepare_cached(sql)?;
        Ok(SqliteStatement::new(Rc::clone(&self.conn), sql, false))
    }

    fn prepare_returning_keys(&self, sql: &str) -> Result<Self::Stmt, SqlShimError> {
        self.conn.prepare_cached(sql)?;
        Ok(SqliteStatement::new(Rc::clone(&self.conn), sql, true))
    }

    fn batch(&self, sql: &str) -> Result<(), SqlShimError> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn set_auto_commit(&self, enabled: bool) -> Result<(), SqlShimError> {
        if enabled {
            if !self.conn.is_autocommit() {
                self.conn.execute_batch("COMMIT")?;
            }
            self.auto_commit.set(true);
        } else if self.auto_commit.get() {
            if self.conn.is_autocommit() {
                self.conn.execute_batch("BEGIN")?;
            }
            self.auto_commit.set(false);
        }
        Ok(())
    }

    fn commit(&self) -> Result<(), SqlShimError> {
        self.conn.execute_batch("COMMIT")?;
        if !self.auto_commit.get() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), SqlShimError> {
        self.conn.execute_batch("ROLLBACK")?;
        if !self.auto_commit.get() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}
