//! Blocking convenience layer for SQL clients.
//!
//! sql-shim sits directly on top of a blocking database client and adds the
//! three things every call site otherwise reinvents: reusable prepared
//! statements that are safe to share (one compiled statement, serialized or
//! timed-out concurrent access), lazy mapped row streams that release their
//! cursor exactly once however consumption ends, and transaction scoping
//! that commits on success, rolls back on failure, and always restores
//! auto-commit.
//!
//! Backends plug in through the [`backend`] traits; the [`sqlite`] module
//! (default feature) adapts rusqlite. Row mappers are plain closures from a
//! row to a value.
//!
//! ```
//! use sql_shim::backend::Row;
//! use sql_shim::sqlite::SqliteConnection;
//! use sql_shim::{Session, SqlShimError};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Session::new(SqliteConnection::open_in_memory()?);
//!     db.ddl("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")?;
//!
//!     // Reusable insert returning the generated id.
//!     let insert = db.prepare_returning_id("INSERT INTO users (name) VALUES (?)")?;
//!     let id_adam = insert.exec(&["Adam".into()])?;
//!     let id_eve = insert.exec(&["Eve".into()])?;
//!     assert_eq!((id_adam, id_eve), (1, 2));
//!     insert.close()?;
//!
//!     // This transaction rolls back: Kain never lands.
//!     let result = db.transaction(|| {
//!         db.exec("INSERT INTO users (name) VALUES (?)", &["Kain".into()])?;
//!         Err::<(), _>(SqlShimError::ExecutionError("changed my mind".into()))
//!     });
//!     assert!(result.is_err());
//!
//!     // Query results stream lazily.
//!     let names = db.query(
//!         |row| row.get_text(0),
//!         "SELECT name FROM users ORDER BY id ASC",
//!         &[],
//!     )?;
//!     let names: Vec<String> = names.collect::<Result<_, _>>()?;
//!     assert_eq!(names, ["Adam", "Eve"]);
//!     Ok(())
//! }
//! ```

pub mod backend;
mod error;
mod params;
pub mod prepared;
mod session;
pub mod stream;
pub mod transaction;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod prelude;

pub use error::SqlShimError;
pub use params::Param;
pub use prepared::{
    DEFAULT_LOCK_TIMEOUT, PreparedExec, PreparedQuery, PreparedReturning, PreparedReturningOne,
    ReturnedKeys, SharedRows,
};
pub use session::{IdMapper, Session};
pub use stream::{AdhocRows, RowStream};
pub use transaction::run_in_transaction;
