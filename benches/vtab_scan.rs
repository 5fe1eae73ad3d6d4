use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pipeline_vtab::{
    register_module, DatabaseValue, ModuleArguments, ModuleOptions, Result, VTabError,
    VirtualTableCursor, VirtualTableModule,
};
use rusqlite::Connection;

/// `CREATE VIRTUAL TABLE t USING range(n)` yields 0..n with a text column
struct Range {
    n: i64,
}

struct RangeCursor {
    n: i64,
    i: i64,
}

impl VirtualTableModule for Range {
    type Cursor = RangeCursor;

    fn connect(args: &ModuleArguments, _create: bool) -> Result<Self> {
        let n = args
            .arguments
            .first()
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| VTabError::InvalidArgument("range(n) needs a row count".into()))?;
        Ok(Range { n })
    }

    fn declaration(&self) -> String {
        "CREATE TABLE x(i INTEGER, label TEXT)".to_string()
    }

    fn open_cursor(&self) -> Result<RangeCursor> {
        Ok(RangeCursor { n: self.n, i: 0 })
    }
}

impl VirtualTableCursor for RangeCursor {
    fn filter(&mut self, _: &[DatabaseValue], _: i32, _: Option<&str>) -> Result<()> {
        self.i = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.i += 1;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.i >= self.n
    }

    fn column(&self, index: i32) -> Result<DatabaseValue> {
        match index {
            0 => Ok(self.i.into()),
            1 => Ok(format!("row {}", self.i).into()),
            _ => Err(VTabError::ColumnOutOfRange(index)),
        }
    }

    fn rowid(&self) -> Result<i64> {
        Ok(self.i)
    }
}

/// Benchmark full scans through the virtual table callbacks
fn bench_vtab_scan(c: &mut Criterion) {
    let row_counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("vtab_scan");

    for count in row_counts {
        group.throughput(Throughput::Elements(count as u64));

        let conn = Connection::open_in_memory().unwrap();
        register_module::<Range>(&conn, "range", ModuleOptions::default()).unwrap();
        conn.execute_batch(&format!("CREATE VIRTUAL TABLE t USING range({})", count))
            .unwrap();

        group.bench_with_input(BenchmarkId::new("integer", count), &count, |b, _| {
            b.iter(|| {
                let sum: i64 = conn
                    .query_row("SELECT sum(i) FROM t", [], |row| row.get(0))
                    .unwrap();
                black_box(sum);
            });
        });

        group.bench_with_input(BenchmarkId::new("text", count), &count, |b, _| {
            b.iter(|| {
                let total: i64 = conn
                    .query_row("SELECT sum(length(label)) FROM t", [], |row| row.get(0))
                    .unwrap();
                black_box(total);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_vtab_scan);
criterion_main!(benches);
