//! Traits implemented by Rust virtual tables

use crate::error::Result;
use crate::index::IndexInfo;
use crate::value::DatabaseValue;

/// Arguments SQLite passes to `xCreate` / `xConnect`
///
/// For `CREATE VIRTUAL TABLE temp.t USING m(a, b)` the module name is `m`,
/// the schema is `temp`, the table is `t` and the arguments are `["a", "b"]`.
/// Eponymous tables receive no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleArguments {
    pub module_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub arguments: Vec<String>,
}

/// Outcome of query planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BestIndexResult {
    /// The plan described in the [`IndexInfo`] is usable
    #[default]
    Ok,
    /// The offered combination of constraints cannot be used
    Constraint,
}

/// Per-table settings applied through `sqlite3_vtab_config` while connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualTableOptions {
    /// `SQLITE_VTAB_CONSTRAINT_SUPPORT`
    pub constraint_support: bool,
    /// `SQLITE_VTAB_INNOCUOUS`
    pub innocuous: bool,
    /// `SQLITE_VTAB_DIRECTONLY`
    pub direct_only: bool,
}

/// A virtual table implementation
///
/// One value of the implementing type exists per connected table. It is
/// created by [`VirtualTableModule::connect`] and dropped when SQLite
/// disconnects or destroys the table.
pub trait VirtualTableModule: Sized + 'static {
    type Cursor: VirtualTableCursor;

    /// Create (`create == true`) or connect to an existing table
    fn connect(args: &ModuleArguments, create: bool) -> Result<Self>;

    /// `CREATE TABLE` statement declaring the table's columns
    fn declaration(&self) -> String;

    fn options(&self) -> VirtualTableOptions {
        VirtualTableOptions::default()
    }

    /// Choose a query plan. The default is a full scan.
    fn best_index(&self, _info: &mut IndexInfo<'_>) -> BestIndexResult {
        BestIndexResult::Ok
    }

    fn open_cursor(&self) -> Result<Self::Cursor>;

    /// Called on `DROP TABLE` before the table is dropped
    fn destroy(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Row iteration over a virtual table
pub trait VirtualTableCursor: 'static {
    /// Start a new scan with the plan chosen in `best_index`
    fn filter(&mut self, args: &[DatabaseValue], idx_num: i32, idx_str: Option<&str>) -> Result<()>;

    fn next(&mut self) -> Result<()>;

    fn eof(&self) -> bool;

    fn column(&self, index: i32) -> Result<DatabaseValue>;

    fn rowid(&self) -> Result<i64>;
}
