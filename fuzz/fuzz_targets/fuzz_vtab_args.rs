#![no_main]
use libfuzzer_sys::fuzz_target;
use pipeline_vtab::{
    DatabaseValue, ModuleArguments, ModuleBuilder, Result, VirtualTableCursor, VirtualTableModule,
};
use rusqlite::Connection;

// Arbitrary text inside `USING echo(...)` must either fail cleanly or come
// back as rows, never crash the callbacks.

struct Echo {
    args: Vec<String>,
}

struct EchoCursor {
    rows: Vec<String>,
    pos: usize,
}

impl VirtualTableModule for Echo {
    type Cursor = EchoCursor;

    fn connect(args: &ModuleArguments, _create: bool) -> Result<Self> {
        Ok(Echo {
            args: args.arguments.clone(),
        })
    }

    fn declaration(&self) -> String {
        "CREATE TABLE x(arg TEXT)".to_string()
    }

    fn open_cursor(&self) -> Result<EchoCursor> {
        Ok(EchoCursor {
            rows: self.args.clone(),
            pos: 0,
        })
    }
}

impl VirtualTableCursor for EchoCursor {
    fn filter(&mut self, _: &[DatabaseValue], _: i32, _: Option<&str>) -> Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.pos += 1;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.pos >= self.rows.len()
    }

    fn column(&self, _index: i32) -> Result<DatabaseValue> {
        Ok(self.rows[self.pos].as_str().into())
    }

    fn rowid(&self) -> Result<i64> {
        Ok(self.pos as i64)
    }
}

fuzz_target!(|args: Vec<String>| {
    let conn = match Connection::open_in_memory() {
        Ok(c) => c,
        Err(_) => return,
    };
    if ModuleBuilder::new("echo").quiet().register::<Echo>(&conn).is_err() {
        return;
    }

    let sql = format!("CREATE VIRTUAL TABLE t USING echo({})", args.join(", "));
    if conn.execute_batch(&sql).is_err() {
        return;
    }

    let count: i64 = conn
        .query_row("SELECT count(*) FROM t", [], |row| row.get(0))
        .unwrap_or(0);
    assert!(count >= 0);
    let _ = conn.execute_batch("DROP TABLE t");
});
