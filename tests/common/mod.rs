//! Scriptable in-memory backend for exercising guard, laziness and
//! close-failure behavior that an embedded database cannot observe.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use sql_shim::backend::{Connection, Row, Rows, Statement};
use sql_shim::{Param, SqlShimError};

/// Everything the fake backend was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Prepare(String),
    PrepareReturning(String),
    Batch(String),
    Bind {
        stmt: usize,
        index: usize,
        value: Param,
    },
    Execute {
        stmt: usize,
        bound: Vec<Param>,
    },
    Query {
        stmt: usize,
    },
    Advance {
        cursor: usize,
    },
    CursorClose {
        cursor: usize,
    },
    StmtClose {
        stmt: usize,
    },
    SetAutoCommit(bool),
    Commit,
    Rollback,
}

/// Shared scriptable state: canned results, failure knobs, event log.
pub struct FakeDb {
    pub events: Vec<Event>,
    /// Rows every query returns (each query gets a fresh cursor over them).
    pub rows: Vec<Vec<Param>>,
    pub rows_affected: u64,
    /// Key row produced by `generated_keys`; `None` yields an empty cursor.
    pub generated_key: Option<i64>,
    pub fail_cursor_close: bool,
    pub fail_stmt_close: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub fail_restore_auto_commit: bool,
    /// 1-based advance call number that fails, counted globally.
    pub fail_advance_at: Option<usize>,
    /// Pause after each bind, outside the state lock, to widen race windows.
    pub bind_delay: Option<Duration>,
    next_stmt: usize,
    next_cursor: usize,
    advances: usize,
}

impl Default for FakeDb {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            rows: Vec::new(),
            rows_affected: 1,
            generated_key: None,
            fail_cursor_close: false,
            fail_stmt_close: false,
            fail_commit: false,
            fail_rollback: false,
            fail_restore_auto_commit: false,
            fail_advance_at: None,
            bind_delay: None,
            next_stmt: 0,
            next_cursor: 0,
            advances: 0,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeConnection {
    state: Arc<Mutex<FakeDb>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<Param>>) -> Self {
        let conn = Self::default();
        conn.configure(|db| db.rows = rows);
        conn
    }

    /// Tweak the scriptable knobs.
    pub fn configure(&self, f: impl FnOnce(&mut FakeDb)) {
        f(&mut self.state.lock());
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Number of `advance` calls seen so far, across all cursors.
    pub fn advance_count(&self) -> usize {
        self.state.lock().advances
    }
}

fn db_error(message: &str) -> SqlShimError {
    SqlShimError::ExecutionError(message.to_owned())
}

impl Connection for FakeConnection {
    type Stmt = FakeStatement;

    fn prepare(&self, sql: &str) -> Result<Self::Stmt, SqlShimError> {
        let mut db = self.state.lock();
        let id = db.next_stmt;
        db.next_stmt += 1;
        db.events.push(Event::Prepare(sql.to_owned()));
        Ok(FakeStatement {
            state: Arc::clone(&self.state),
            id,
            bound: Vec::new(),
            closed: false,
        })
    }

    fn prepare_returning_keys(&self, sql: &str) -> Result<Self::Stmt, SqlShimError> {
        let mut db = self.state.lock();
        let id = db.next_stmt;
        db.next_stmt += 1;
        db.events.push(Event::PrepareReturning(sql.to_owned()));
        Ok(FakeStatement {
            state: Arc::clone(&self.state),
            id,
            bound: Vec::new(),
            closed: false,
        })
    }

    fn batch(&self, sql: &str) -> Result<(), SqlShimError> {
        self.state.lock().events.push(Event::Batch(sql.to_owned()));
        Ok(())
    }

    fn set_auto_commit(&self, enabled: bool) -> Result<(), SqlShimError> {
        let mut db = self.state.lock();
        if enabled && db.fail_restore_auto_commit {
            return Err(db_error("set_auto_commit refused"));
        }
        db.events.push(Event::SetAutoCommit(enabled));
        Ok(())
    }

    fn commit(&self) -> Result<(), SqlShimError> {
        let mut db = self.state.lock();
        if db.fail_commit {
            return Err(db_error("commit refused"));
        }
        db.events.push(Event::Commit);
        Ok(())
    }

    fn rollback(&self) -> Result<(), SqlShimError> {
        let mut db = self.state.lock();
        if db.fail_rollback {
            return Err(db_error("rollback refused"));
        }
        db.events.push(Event::Rollback);
        Ok(())
    }
}

pub struct FakeStatement {
    state: Arc<Mutex<FakeDb>>,
    id: usize,
    bound: Vec<Param>,
    closed: bool,
}

impl Statement for FakeStatement {
    type Rows = FakeRows;

    fn bind(&mut self, index: usize, value: &Param) -> Result<(), SqlShimError> {
        if self.closed {
            return Err(SqlShimError::StatementClosed);
        }
        if self.bound.len() <= index {
            self.bound.resize(index + 1, Param::Null);
        }
        self.bound[index] = value.clone();
        let delay = {
            let mut db = self.state.lock();
            db.events.push(Event::Bind {
                stmt: self.id,
                index,
                value: value.clone(),
            });
            db.bind_delay
        };
        // Sleep outside the state lock so the fake's own locking cannot
        // serialize callers on the library's behalf.
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64, SqlShimError> {
        if self.closed {
            return Err(SqlShimError::StatementClosed);
        }
        let mut db = self.state.lock();
        db.events.push(Event::Execute {
            stmt: self.id,
            bound: self.bound.clone(),
        });
        Ok(db.rows_affected)
    }

    fn execute_query(&mut self) -> Result<Self::Rows, SqlShimError> {
        if self.closed {
            return Err(SqlShimError::StatementClosed);
        }
        let mut db = self.state.lock();
        let cursor = db.next_cursor;
        db.next_cursor += 1;
        db.events.push(Event::Query { stmt: self.id });
        Ok(FakeRows {
            state: Arc::clone(&self.state),
            id: cursor,
            queue: db.rows.clone().into(),
            current: None,
        })
    }

    fn generated_keys(&mut self) -> Result<Self::Rows, SqlShimError> {
        if self.closed {
            return Err(SqlShimError::StatementClosed);
        }
        let mut db = self.state.lock();
        let cursor = db.next_cursor;
        db.next_cursor += 1;
        let queue: VecDeque<Vec<Param>> = db
            .generated_key
            .map(|key| VecDeque::from(vec![vec![Param::BigInt(key)]]))
            .unwrap_or_default();
        Ok(FakeRows {
            state: Arc::clone(&self.state),
            id: cursor,
            queue,
            current: None,
        })
    }

    fn close(&mut self) -> Result<(), SqlShimError> {
        if self.closed {
            return Err(SqlShimError::StatementClosed);
        }
        let mut db = self.state.lock();
        if db.fail_stmt_close {
            return Err(db_error("statement close refused"));
        }
        self.closed = true;
        db.events.push(Event::StmtClose { stmt: self.id });
        Ok(())
    }
}

pub struct FakeRows {
    state: Arc<Mutex<FakeDb>>,
    id: usize,
    queue: VecDeque<Vec<Param>>,
    current: Option<Vec<Param>>,
}

impl FakeRows {
    fn cell(&self, idx: usize) -> Result<&Param, SqlShimError> {
        self.current
            .as_ref()
            .and_then(|row| row.get(idx))
            .ok_or_else(|| db_error("no value at cursor position"))
    }
}

impl Row for FakeRows {
    fn get_text(&self, idx: usize) -> Result<String, SqlShimError> {
        match self.cell(idx)? {
            Param::Text(s) => Ok(s.clone()),
            other => Err(db_error(&format!("not a text column: {other:?}"))),
        }
    }

    fn get_i32(&self, idx: usize) -> Result<i32, SqlShimError> {
        match self.cell(idx)? {
            Param::Int(i) => Ok(*i),
            other => Err(db_error(&format!("not an i32 column: {other:?}"))),
        }
    }

    fn get_i64(&self, idx: usize) -> Result<i64, SqlShimError> {
        match self.cell(idx)? {
            Param::BigInt(i) => Ok(*i),
            Param::Int(i) => Ok(i64::from(*i)),
            other => Err(db_error(&format!("not an i64 column: {other:?}"))),
        }
    }
}

impl Rows for FakeRows {
    fn advance(&mut self) -> Result<bool, SqlShimError> {
        let mut db = self.state.lock();
        db.advances += 1;
        if db.fail_advance_at == Some(db.advances) {
            return Err(db_error("advance refused"));
        }
        db.events.push(Event::Advance { cursor: self.id });
        drop(db);
        self.current = self.queue.pop_front();
        Ok(self.current.is_some())
    }

    fn close(&mut self) -> Result<(), SqlShimError> {
        let mut db = self.state.lock();
        if db.fail_cursor_close {
            return Err(db_error("cursor close refused"));
        }
        db.events.push(Event::CursorClose { cursor: self.id });
        Ok(())
    }
}
