use std::collections::VecDeque;
use std::sync::Arc;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::backend::{Row, Rows};
use crate::error::SqlShimError;

/// Owned cursor over a buffered `SQLite` result.
///
/// rusqlite's native cursor borrows its statement, so it cannot leave the
/// function that ran the query; the rows are read into memory up front
/// instead and this type walks the buffer. Mapping stays lazy — nothing is
/// converted or mapped until the stream pulls a row.
pub struct SqliteRows {
    column_names: Arc<Vec<String>>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl SqliteRows {
    pub(crate) fn new(column_names: Arc<Vec<String>>, rows: VecDeque<Vec<Value>>) -> Self {
        Self {
            column_names,
            rows,
            current: None,
        }
    }

    /// One-row cursor over the rowid generated by the last keyed execute,
    /// or an empty cursor if there is none.
    pub(crate) fn generated_key(key: Option<i64>) -> Self {
        let rows = key
            .map(|id| VecDeque::from(vec![vec![Value::Integer(id)]]))
            .unwrap_or_default();
        Self::new(Arc::new(vec!["rowid".to_owned()]), rows)
    }

    fn cell(&self, idx: usize) -> Result<&Value, SqlShimError> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| SqlShimError::ExecutionError("no current row in cursor".to_owned()))?;
        row.get(idx).ok_or_else(|| {
            SqlShimError::ExecutionError(format!(
                "column index {idx} out of range ({} columns)",
                self.column_names.len()
            ))
        })
    }

    fn column_name(&self, idx: usize) -> String {
        self.column_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string())
    }
}

impl Row for SqliteRows {
    fn get_text(&self, idx: usize) -> Result<String, SqlShimError> {
        match self.cell(idx)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(rusqlite::Error::InvalidColumnType(
                idx,
                self.column_name(idx),
                other.data_type(),
            )
            .into()),
        }
    }

    fn get_i32(&self, idx: usize) -> Result<i32, SqlShimError> {
        match self.cell(idx)? {
            Value::Integer(i) => i32::try_from(*i)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, *i).into()),
            other => Err(rusqlite::Error::InvalidColumnType(
                idx,
                self.column_name(idx),
                other.data_type(),
            )
            .into()),
        }
    }

    fn get_i64(&self, idx: usize) -> Result<i64, SqlShimError> {
        match self.cell(idx)? {
            Value::Integer(i) => Ok(*i),
            other => Err(rusqlite::Error::InvalidColumnType(
                idx,
                self.column_name(idx),
                other.data_type(),
            )
            .into()),
        }
    }
}

impl Rows for SqliteRows {
    fn advance(&mut self) -> Result<bool, SqlShimError> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn close(&mut self) -> Result<(), SqlShimError> {
        self.rows.clear();
        self.current = None;
        Ok(())
    }
}

/// Run `stmt` and buffer every row into a [`SqliteRows`].
pub(crate) fn build_rows(
    stmt: &mut rusqlite::Statement<'_>,
    values: &[Value],
) -> Result<SqliteRows, SqlShimError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = column_names.len();

    let mut buffered = VecDeque::new();
    let mut rows = stmt.query(params_from_iter(values.iter()))?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(row.get::<usize, Value>(idx)?);
        }
        buffered.push_back(cells);
    }

    Ok(SqliteRows::new(Arc::new(column_names), buffered))
}
