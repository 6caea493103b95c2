use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use foundation::{
    BoolOp, Connection, OrmResult, Query, QueryCondition, RowSet, SetData, SortDirection,
    SqlHelper, Value,
};

/// Connection that never runs anything; only its quoting is used.
struct QuoteOnly;

impl Connection for QuoteOnly {
    fn query(&self, _sql: &str) -> OrmResult<RowSet> {
        Ok(RowSet::default())
    }

    fn execute(&self, _sql: &str) -> OrmResult<u64> {
        Ok(0)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(Value::Null)
    }
}

/// SELECT col0, ... FROM t JOIN ... WHERE col0 = 0 AND col1 = 1 ...
fn build_query(n: usize) -> Query {
    let mut q = Query::new();
    q.add_from("T t");
    for i in 0..n {
        q.add_field(format!("t.COL{i}"));
        q.add_where(format!("t.COL{i} = {i}"));
    }
    q.add_join("LEFT", "U u", ["u.T_ID = t.ID"], false)
        .add_order_by("t.COL0", Some(SortDirection::Desc))
        .set_limit(20, Some(40));
    q
}

/// A tree `depth` levels deep, alternating AND and OR groups.
fn build_condition(depth: usize) -> QueryCondition {
    let mut cond = QueryCondition::new("A = 0");
    for level in 1..=depth {
        let op = if level % 2 == 0 { BoolOp::And } else { BoolOp::Or };
        let mut group = QueryCondition::empty(op, true);
        group.add_condition(cond, BoolOp::And, true);
        group.add_condition(format!("A = {level}"), op, false);
        cond = group;
    }
    cond
}

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/to_sql");

    for n in [1, 5, 10, 50] {
        let query = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_and_render");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_query(n).to_sql()));
        });
    }

    group.finish();
}

fn bench_nested_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/nested_conditions");

    for depth in [1, 4, 16] {
        let cond = build_condition(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &cond, |b, cond| {
            b.iter(|| black_box(cond.to_sql_string(true)));
        });
    }

    group.finish();
}

fn bench_build_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_update");
    let conn = QuoteOnly;
    let helper = SqlHelper::new(&conn);

    for n in [1, 10, 50] {
        let fields: Vec<(String, Value)> = (0..n)
            .map(|i| (format!("COL{i}"), Value::from(format!("it's {i}"))))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &fields, |b, fields| {
            b.iter(|| {
                black_box(helper.build_update(
                    "T",
                    SetData::Fields(fields.clone()),
                    "ID = 1",
                    true,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_build_and_render,
    bench_nested_conditions,
    bench_build_update
);
criterion_main!(benches);
