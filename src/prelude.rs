//! Convenient imports for common functionality.

pub use crate::backend::{Connection, Row, Rows, Statement};
pub use crate::error::SqlShimError;
pub use crate::params::Param;
pub use crate::prepared::{
    PreparedExec, PreparedQuery, PreparedReturning, PreparedReturningOne, ReturnedKeys,
};
pub use crate::session::Session;
pub use crate::stream::{AdhocRows, RowStream};
pub use crate::transaction::run_in_transaction;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
