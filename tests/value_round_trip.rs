//! Values passed through xFilter and returned by xColumn
//!
//! `echo(x)` hands its argument to the cursor and yields it back as the only
//! row, so every storage class crosses the bridge in both directions.

use pipeline_vtab::{
    BestIndexResult, ConstraintOp, DatabaseValue, IndexInfo, ModuleArguments, ModuleBuilder,
    Result, VirtualTableCursor, VirtualTableModule,
};
use rusqlite::types::Value;
use rusqlite::Connection;

const COL_INPUT: i32 = 1;

struct Echo;

struct EchoCursor {
    row: Option<DatabaseValue>,
}

impl VirtualTableModule for Echo {
    type Cursor = EchoCursor;

    fn connect(_args: &ModuleArguments, _create: bool) -> Result<Self> {
        Ok(Echo)
    }

    fn declaration(&self) -> String {
        "CREATE TABLE x(v, input HIDDEN)".to_string()
    }

    fn best_index(&self, info: &mut IndexInfo<'_>) -> BestIndexResult {
        let Some(i) = info
            .constraints()
            .iter()
            .position(|c| c.usable && c.column == COL_INPUT && c.op == ConstraintOp::Eq)
        else {
            return BestIndexResult::Constraint;
        };
        info.set_argv_index(i, 1);
        info.set_omit(i, true);
        info.set_estimated_rows(1);
        BestIndexResult::Ok
    }

    fn open_cursor(&self) -> Result<EchoCursor> {
        Ok(EchoCursor { row: None })
    }
}

impl VirtualTableCursor for EchoCursor {
    fn filter(&mut self, args: &[DatabaseValue], _idx_num: i32, _idx_str: Option<&str>) -> Result<()> {
        self.row = Some(args.first().cloned().unwrap_or_default());
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.row = None;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.row.is_none()
    }

    fn column(&self, _index: i32) -> Result<DatabaseValue> {
        Ok(self.row.clone().unwrap_or_default())
    }

    fn rowid(&self) -> Result<i64> {
        Ok(1)
    }
}

fn echo_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    ModuleBuilder::new("echo")
        .eponymous_only()
        .quiet()
        .register::<Echo>(&conn)
        .unwrap();
    conn
}

#[test]
fn test_storage_classes_survive_the_bridge() {
    let conn = echo_connection();
    let cases = vec![
        (Value::Null, "null"),
        (Value::Integer(i64::MIN), "integer"),
        (Value::Integer(i64::MAX), "integer"),
        (Value::Real(1.5), "real"),
        (Value::Text(String::new()), "text"),
        (Value::Text("a\0b".to_string()), "text"),
        (Value::Text("héllo".to_string()), "text"),
        (Value::Blob(vec![0, 1, 2]), "blob"),
        (Value::Blob(Vec::new()), "blob"),
    ];

    for (value, storage) in cases {
        let (got, kind): (Value, String) = conn
            .query_row("SELECT v, typeof(v) FROM echo(?1)", [&value], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap_or_else(|e| panic!("{:?}: {}", value, e));
        assert_eq!(got, value);
        assert_eq!(kind, storage, "{:?}", value);
    }
}

#[test]
fn test_text_length_counts_interior_nul() {
    let conn = echo_connection();

    let len: i64 = conn
        .query_row("SELECT length(CAST(v AS BLOB)) FROM echo(?1)", ["a\0b"], |row| row.get(0))
        .unwrap();
    assert_eq!(len, 3);
}

#[test]
fn test_values_from_expressions() {
    let conn = echo_connection();

    let blob: Vec<u8> = conn
        .query_row("SELECT v FROM echo(x'00ff10')", [], |row| row.get(0))
        .unwrap();
    assert_eq!(blob, vec![0x00, 0xff, 0x10]);

    let real: f64 = conn
        .query_row("SELECT v FROM echo(-0.25 * 4)", [], |row| row.get(0))
        .unwrap();
    assert_eq!(real, -1.0);
}
