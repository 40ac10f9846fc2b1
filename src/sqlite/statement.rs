use std::rc::Rc;
use std::sync::Arc;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::backend::Statement;
use crate::error::SqlShimError;
use crate::params::Param;

use super::params::param_to_sqlite_value;
use super::rows::{SqliteRows, build_rows};

/// Compiled statement handle backed by rusqlite's per-connection statement
/// cache.
///
/// The handle keeps the SQL and the bound values; each run borrows the
/// compiled statement from the cache via `prepare_cached`, so repeated
/// executes reuse one compilation. Bound values persist across runs until
/// rebound.
pub struct SqliteStatement {
    conn: Rc<rusqlite::Connection>,
    sql: Arc<str>,
    returning_keys: bool,
    values: Vec<Value>,
    pending_key: Option<i64>,
    closed: bool,
}

impl SqliteStatement {
    pub(crate) fn new(conn: Rc<rusqlite::Connection>, sql: &str, returning_keys: bool) -> Self {
        Self {
            conn,
            sql: Arc::from(sql),
            returning_keys,
            values: Vec::new(),
            pending_key: None,
            closed: false,
        }
    }

    fn guard_open(&self) -> Result<(), SqlShimError> {
        if self.closed {
            Err(SqlShimError::StatementClosed)
        } else {
            Ok(())
        }
    }
}

impl Statement for SqliteStatement {
    type Rows = SqliteRows;

    fn bind(&mut self, index: usize, value: &Param) -> Result<(), SqlShimError> {
        self.guard_open()?;
        if self.values.len() <= index {
            self.values.resize(index + 1, Value::Null);
        }
        self.values[index] = param_to_sqlite_value(value);
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64, SqlShimError> {
        self.guard_open()?;
        let mut stmt = self.conn.prepare_cached(&self.sql)?;
        let affected = stmt.execute(params_from_iter(self.values.iter()))?;
        if self.returning_keys {
            // SQLite has no key result set; surface last_insert_rowid the
            // way embedded JDBC drivers do.
            self.pending_key = (affected > 0).then(|| self.conn.last_insert_rowid());
        }
        Ok(affected as u64)
    }

    fn execute_query(&mut self) -> Result<Self::Rows, SqlShimError> {
        self.guard_open()?;
        let mut stmt = self.conn.prepare_cached(&self.sql)?;
        build_rows(&mut stmt, &self.values)
    }

    fn generated_keys(&mut self) -> Result<Self::Rows, SqlShimError> {
        self.guard_open()?;
        Ok(SqliteRows::generated_key(self.pending_key))
    }

    fn close(&mut self) -> Result<(), SqlShimError> {
        // A second close fails, matching what statement handles in server
        // clients do; callers release exactly once.
        self.guard_open()?;
        self.closed = true;
        self.values = Vec::new();
        self.pending_key = None;
        Ok(())
    }
}
