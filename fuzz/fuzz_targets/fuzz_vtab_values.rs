#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pipeline_vtab::{
    BestIndexResult, ConstraintOp, DatabaseValue, IndexInfo, ModuleArguments, ModuleBuilder,
    Result, VirtualTableCursor, VirtualTableModule,
};
use rusqlite::types::Value;
use rusqlite::Connection;

// Values go in through xFilter and come back out through xColumn unchanged.

#[derive(Arbitrary, Debug)]
enum Input {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Input {
    fn to_value(&self) -> Value {
        match self {
            Input::Null => Value::Null,
            Input::Integer(i) => Value::Integer(*i),
            // SQLite stores NaN as NULL
            Input::Real(f) if f.is_nan() => Value::Null,
            Input::Real(f) => Value::Real(*f),
            Input::Text(s) => Value::Text(s.clone()),
            Input::Blob(b) => Value::Blob(b.clone()),
        }
    }
}

struct Identity;

struct IdentityCursor {
    value: Option<DatabaseValue>,
}

impl VirtualTableModule for Identity {
    type Cursor = IdentityCursor;

    fn connect(_args: &ModuleArguments, _create: bool) -> Result<Self> {
        Ok(Identity)
    }

    fn declaration(&self) -> String {
        "CREATE TABLE x(value, input HIDDEN)".to_string()
    }

    fn best_index(&self, info: &mut IndexInfo<'_>) -> BestIndexResult {
        let input = info
            .constraints()
            .iter()
            .position(|c| c.usable && c.column == 1 && c.op == ConstraintOp::Eq);
        match input {
            Some(i) => {
                info.set_argv_index(i, 1);
                info.set_omit(i, true);
                BestIndexResult::Ok
            }
            None => BestIndexResult::Constraint,
        }
    }

    fn open_cursor(&self) -> Result<IdentityCursor> {
        Ok(IdentityCursor { value: None })
    }
}

impl VirtualTableCursor for IdentityCursor {
    fn filter(&mut self, args: &[DatabaseValue], _: i32, _: Option<&str>) -> Result<()> {
        self.value = args.first().cloned();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.value = None;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.value.is_none()
    }

    fn column(&self, _index: i32) -> Result<DatabaseValue> {
        Ok(self.value.clone().unwrap_or_default())
    }

    fn rowid(&self) -> Result<i64> {
        Ok(1)
    }
}

fuzz_target!(|input: Input| {
    let conn = Connection::open_in_memory().unwrap();
    ModuleBuilder::new("identity")
        .eponymous_only()
        .quiet()
        .register::<Identity>(&conn)
        .unwrap();

    let expected = input.to_value();
    let got: Option<Value> = conn
        .query_row("SELECT value FROM identity(?1)", [&expected], |row| row.get(0))
        .ok();

    match expected {
        Value::Null => assert!(matches!(got, None | Some(Value::Null))),
        _ => assert_eq!(got, Some(expected)),
    }
});
