///
/// sqlbind: a type-driven value-marshalling layer over SQLite.
///
/// The crate maps host types to SQL parameters and result columns by
/// shape. Binding walks a value recursively (`ToValue` leaves,
/// `BindParams` aggregates) and reading mirrors it (`FromColumn`
/// leaves, `FromRow` aggregates), so a query call site names ordinary
/// Rust types and the dispatch is resolved at compile time. On top of
/// the marshalling sit a lazy multi-statement sequence and a typed
/// cursor that never prepares a statement before iteration reaches
/// it.
///
/// ```no_run
/// use sqlbind::Connection;
///
/// fn demo() -> sqlbind::Result<()> {
///     let db = Connection::open_in_memory()?;
///     db.run(
///         "CREATE TABLE user(id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
///         &(),
///     )?;
///     db.run("INSERT INTO user(id, name) VALUES (?, ?)", &(1i64, "ada"))?;
///     let name: String = db.get("SELECT name FROM user WHERE id = ?", &1i64)?;
///     assert_eq!(name, "ada");
///     Ok(())
/// }
/// ```

pub mod column;
pub mod connection;
pub mod error;
pub mod params;
pub mod row;
pub mod rows;
pub mod sequence;
pub mod statement;
pub mod value;

pub use connection::Connection;
pub use error::{Error, ErrorCode, Result};
pub use params::{bind_value_at, BindParams};
pub use column::FromColumn;
pub use row::{FromRow, Row, RowShape, ShapeSlot};
pub use rows::Rows;
pub use sequence::StatementSequence;
pub use statement::{ColumnType, Statement, StepOutcome};
pub use value::{OwnedValue, ToValue, Value};
