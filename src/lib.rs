//! # pipeline-vtab - SQLite virtual tables in Rust
//!
//! SQLite lets a table's rows come from code instead of storage through its
//! virtual table mechanism. The C interface expects each table and cursor to
//! be a struct that starts with `sqlite3_vtab` / `sqlite3_vtab_cursor`. This
//! crate provides those structs ([`VTabHandle`], [`VTabCursorHandle`]) plus
//! the callbacks that route SQLite's calls into two traits:
//!
//! - [`VirtualTableModule`] - one value per connected table
//! - [`VirtualTableCursor`] - one value per open scan
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeline_vtab::{
//!     register_module, DatabaseValue, ModuleArguments, ModuleOptions, Result,
//!     VirtualTableCursor, VirtualTableModule,
//! };
//! use rusqlite::Connection;
//!
//! struct Numbers;
//!
//! struct NumbersCursor {
//!     current: i64,
//! }
//!
//! impl VirtualTableModule for Numbers {
//!     type Cursor = NumbersCursor;
//!
//!     fn connect(_args: &ModuleArguments, _create: bool) -> Result<Self> {
//!         Ok(Numbers)
//!     }
//!
//!     fn declaration(&self) -> String {
//!         "CREATE TABLE x(value INTEGER)".to_string()
//!     }
//!
//!     fn open_cursor(&self) -> Result<NumbersCursor> {
//!         Ok(NumbersCursor { current: 0 })
//!     }
//! }
//!
//! impl VirtualTableCursor for NumbersCursor {
//!     fn filter(&mut self, _: &[DatabaseValue], _: i32, _: Option<&str>) -> Result<()> {
//!         self.current = 1;
//!         Ok(())
//!     }
//!     fn next(&mut self) -> Result<()> {
//!         self.current += 1;
//!         Ok(())
//!     }
//!     fn eof(&self) -> bool {
//!         self.current > 10
//!     }
//!     fn column(&self, _index: i32) -> Result<DatabaseValue> {
//!         Ok(self.current.into())
//!     }
//!     fn rowid(&self) -> Result<i64> {
//!         Ok(self.current)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let conn = Connection::open_in_memory().unwrap();
//! register_module::<Numbers>(&conn, "numbers", ModuleOptions::default())?;
//! conn.execute_batch("CREATE VIRTUAL TABLE n USING numbers").unwrap();
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod index;
pub mod traits;
pub mod value;
pub mod vtab;

pub use bridge::{RawRef, VTabCursorHandle, VTabHandle};
pub use config::{ModuleBuilder, ModuleKind, ModuleOptions};
pub use error::{Result, VTabError};
pub use index::{ConstraintOp, IndexConstraint, IndexInfo, IndexOrderBy};
pub use traits::{
    BestIndexResult, ModuleArguments, VirtualTableCursor, VirtualTableModule, VirtualTableOptions,
};
pub use value::DatabaseValue;
pub use vtab::{register_module, register_module_raw, unregister_module, unregister_module_raw};
