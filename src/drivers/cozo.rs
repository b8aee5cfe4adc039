//! CozoDB driver.
//!
//! Runs CozoScript against an embedded `DbInstance`. The data source name is
//! either `mem` (in-memory) or `sqlite:<path>`; a bare path is treated as a
//! SQLite file. Connections opened through the same driver with the same DSN
//! share one instance.
//!
//! Arguments bind as script parameters: a named argument binds to `$name`,
//! a positional one to `$p<ordinal>` (`$p1`, `$p2`, ...).
//!
//! CozoDB has no client-side transactions and does not report affected rows
//! or insert IDs; those calls return errors.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::SecondsFormat;
use cozo::{DataValue, DbInstance, NamedRows, Num, ScriptMutability};

use crate::driver::{
    Conn, Context, Driver, ExecResult, Execer, ExecerContext, NamedValue, Pinger, Queryer,
    QueryerContext, Rows, RowsColumnTypeDatabaseTypeName, RowsColumnTypeScanType, ScanType, Stmt,
    StmtExecContext, StmtQueryContext, Tx, Value, values_to_named_values,
};
use crate::error::{DriverError, DriverResult};

/// Opens CozoDB connections.
#[derive(Default)]
pub struct CozoDriver {
    instances: Mutex<HashMap<String, Arc<DbInstance>>>,
}

impl CozoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn instance(&self, dsn: &str) -> DriverResult<Arc<DbInstance>> {
        let mut instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(db) = instances.get(dsn) {
            return Ok(Arc::clone(db));
        }

        let (engine, path) = parse_dsn(dsn);
        let db = DbInstance::new(engine, path, "")
            .map_err(|e| DriverError::failed(format!("CozoDB open failed: {e:?}")))?;
        let db = Arc::new(db);
        instances.insert(dsn.to_string(), Arc::clone(&db));
        Ok(db)
    }
}

impl Driver for CozoDriver {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn Conn>> {
        let db = self.instance(dsn)?;
        tracing::debug!(dsn, "opened cozo connection");
        Ok(Box::new(CozoConn { db, closed: false }))
    }
}

fn parse_dsn(dsn: &str) -> (&str, &str) {
    match dsn {
        "" | "mem" | "mem:" => ("mem", ""),
        _ => ("sqlite", dsn.strip_prefix("sqlite:").unwrap_or(dsn)),
    }
}

/// A connection to a shared CozoDB instance.
pub struct CozoConn {
    db: Arc<DbInstance>,
    closed: bool,
}

impl CozoConn {
    fn run(&self, script: &str, args: &[NamedValue]) -> DriverResult<NamedRows> {
        if self.closed {
            return Err(DriverError::BadConn);
        }
        run_script(&self.db, script, args)
    }
}

fn run_script(db: &DbInstance, script: &str, args: &[NamedValue]) -> DriverResult<NamedRows> {
    db.run_script(script, bind_params(args), ScriptMutability::Mutable)
        .map_err(|e| DriverError::failed(format!("Query failed: {e:?}")))
}

fn bind_params(args: &[NamedValue]) -> BTreeMap<String, DataValue> {
    args.iter()
        .map(|arg| {
            let key = match &arg.name {
                Some(name) => name.clone(),
                None => format!("p{}", arg.ordinal),
            };
            (key, to_data_value(&arg.value))
        })
        .collect()
}

fn live(ctx: &Context) -> DriverResult<()> {
    match ctx.err() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl Conn for CozoConn {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        if self.closed {
            return Err(DriverError::BadConn);
        }
        Ok(Box::new(CozoStmt {
            db: Arc::clone(&self.db),
            script: query.to_string(),
        }))
    }

    fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        Ok(())
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        Err(DriverError::failed(
            "CozoDB connections do not support transactions; use a chained script",
        ))
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        Some(self)
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        Some(self)
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        Some(self)
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        Some(self)
    }
}

impl Pinger for CozoConn {
    fn ping(&mut self, ctx: &Context) -> DriverResult<()> {
        live(ctx)?;
        self.run("?[x] := x = 1", &[]).map(|_| ())
    }
}

impl Execer for CozoConn {
    fn exec(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.run(query, &values_to_named_values(args))?;
        Ok(Box::new(CozoResult))
    }
}

impl ExecerContext for CozoConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        live(ctx)?;
        self.run(query, args)?;
        Ok(Box::new(CozoResult))
    }
}

impl Queryer for CozoConn {
    fn query(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        let rows = self.run(query, &values_to_named_values(args))?;
        Ok(Box::new(CozoRows::new(rows)))
    }
}

impl QueryerContext for CozoConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        live(ctx)?;
        let rows = self.run(query, args)?;
        Ok(Box::new(CozoRows::new(rows)))
    }
}

/// A stored script. CozoDB compiles on every run, so preparing is free.
pub struct CozoStmt {
    db: Arc<DbInstance>,
    script: String,
}

impl Stmt for CozoStmt {
    fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        None
    }

    fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        run_script(&self.db, &self.script, &values_to_named_values(args))?;
        Ok(Box::new(CozoResult))
    }

    fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        let rows = run_script(&self.db, &self.script, &values_to_named_values(args))?;
        Ok(Box::new(CozoRows::new(rows)))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        Some(self)
    }
}

impl StmtExecContext for CozoStmt {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        live(ctx)?;
        run_script(&self.db, &self.script, args)?;
        Ok(Box::new(CozoResult))
    }
}

impl StmtQueryContext for CozoStmt {
    fn query_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        live(ctx)?;
        let rows = run_script(&self.db, &self.script, args)?;
        Ok(Box::new(CozoRows::new(rows)))
    }
}

/// Exec outcome. CozoDB reports neither count nor ID.
pub struct CozoResult;

impl ExecResult for CozoResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        Err(DriverError::failed("CozoDB does not report insert IDs"))
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        Err(DriverError::failed("CozoDB does not report affected rows"))
    }
}

/// Materialized query output, read one row at a time.
pub struct CozoRows {
    headers: Vec<String>,
    rows: Vec<Vec<DataValue>>,
    cursor: usize,
}

impl CozoRows {
    fn new(named_rows: NamedRows) -> Self {
        Self {
            headers: named_rows.headers,
            rows: named_rows.rows,
            cursor: 0,
        }
    }

    /// Column types are inferred from the first row.
    fn sample(&self, index: usize) -> Option<&DataValue> {
        self.rows.first().and_then(|row| row.get(index))
    }
}

impl Rows for CozoRows {
    fn columns(&self) -> Vec<String> {
        self.headers.clone()
    }

    fn close(&mut self) -> DriverResult<()> {
        self.cursor = self.rows.len();
        Ok(())
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        let Some(row) = self.rows.get(self.cursor) else {
            return Ok(false);
        };
        for (i, slot) in dest.iter_mut().enumerate() {
            *slot = row.get(i).map(to_value).unwrap_or(Value::Null);
        }
        self.cursor += 1;
        Ok(true)
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        Some(self)
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        Some(self)
    }
}

impl RowsColumnTypeScanType for CozoRows {
    fn column_type_scan_type(&self, index: usize) -> ScanType {
        match self.sample(index) {
            Some(DataValue::Bool(_)) => ScanType::Bool,
            Some(DataValue::Num(Num::Int(_))) => ScanType::Int,
            Some(DataValue::Num(Num::Float(_))) => ScanType::Float,
            Some(DataValue::Str(_)) => ScanType::Str,
            Some(DataValue::Bytes(_)) => ScanType::Bytes,
            _ => ScanType::Any,
        }
    }
}

impl RowsColumnTypeDatabaseTypeName for CozoRows {
    fn column_type_database_type_name(&self, index: usize) -> String {
        let name = match self.sample(index) {
            Some(DataValue::Null) => "Null",
            Some(DataValue::Bool(_)) => "Bool",
            Some(DataValue::Num(Num::Int(_))) => "Int",
            Some(DataValue::Num(Num::Float(_))) => "Float",
            Some(DataValue::Str(_)) => "String",
            Some(DataValue::Bytes(_)) => "Bytes",
            Some(DataValue::List(_)) => "List",
            _ => "",
        };
        name.to_string()
    }
}

fn to_data_value(value: &Value) -> DataValue {
    match value {
        Value::Null => DataValue::Null,
        Value::Bool(b) => DataValue::Bool(*b),
        Value::Int(i) => DataValue::Num(Num::Int(*i)),
        Value::Float(f) => DataValue::Num(Num::Float(*f)),
        Value::Bytes(b) => DataValue::Bytes(b.clone()),
        Value::Str(s) => DataValue::Str(s.as_str().into()),
        Value::Time(t) => DataValue::Str(t.to_rfc3339_opts(SecondsFormat::AutoSi, true).into()),
    }
}

fn to_value(value: &DataValue) -> Value {
    match value {
        DataValue::Null => Value::Null,
        DataValue::Bool(b) => Value::Bool(*b),
        DataValue::Num(Num::Int(i)) => Value::Int(*i),
        DataValue::Num(Num::Float(f)) => Value::Float(*f),
        DataValue::Str(s) => Value::Str(s.to_string()),
        DataValue::Bytes(b) => Value::Bytes(b.clone()),
        other => Value::Str(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn conn() -> Box<dyn Conn> {
        let driver = CozoDriver::new();
        let mut conn = driver.open("mem").unwrap();
        conn.as_execer()
            .unwrap()
            .exec(":create users {id: Int => name: String}", &[])
            .unwrap();
        conn
    }

    fn insert(conn: &mut Box<dyn Conn>, id: i64, name: &str) {
        conn.as_execer()
            .unwrap()
            .exec(
                "?[id, name] <- [[$p1, $p2]] :put users {id => name}",
                &[Value::Int(id), Value::from(name)],
            )
            .unwrap();
    }

    fn collect(mut rows: Box<dyn Rows>) -> Vec<Vec<Value>> {
        let width = rows.columns().len();
        let mut out = Vec::new();
        let mut dest = vec![Value::Null; width];
        while rows.next(&mut dest).unwrap() {
            out.push(dest.clone());
        }
        out
    }

    #[rstest]
    #[case("mem", ("mem", ""))]
    #[case("", ("mem", ""))]
    #[case("sqlite:/tmp/a.db", ("sqlite", "/tmp/a.db"))]
    #[case("/tmp/b.db", ("sqlite", "/tmp/b.db"))]
    fn test_parse_dsn(#[case] dsn: &str, #[case] expected: (&str, &str)) {
        assert_eq!(parse_dsn(dsn), expected);
    }

    #[rstest]
    fn test_positional_exec_then_query(mut conn: Box<dyn Conn>) {
        insert(&mut conn, 1, "alice");
        insert(&mut conn, 2, "bob");

        let rows = conn
            .as_queryer()
            .unwrap()
            .query("?[id, name] := *users{id, name}, id > $p1", &[Value::Int(1)])
            .unwrap();
        assert_eq!(rows.columns(), vec!["id".to_string(), "name".to_string()]);
        assert_eq!(collect(rows), vec![vec![Value::Int(2), Value::from("bob")]]);
    }

    #[rstest]
    fn test_named_args_bind_by_name(mut conn: Box<dyn Conn>) {
        insert(&mut conn, 7, "carol");
        let rows = conn
            .as_queryer_context()
            .unwrap()
            .query_context(
                &Context::background(),
                "?[name] := *users{id, name}, id = $wanted",
                &[NamedValue::named("wanted", 1, 7i64)],
            )
            .unwrap();
        assert_eq!(collect(rows), vec![vec![Value::from("carol")]]);
    }

    #[rstest]
    fn test_prepared_statement(mut conn: Box<dyn Conn>) {
        insert(&mut conn, 3, "dave");
        let mut stmt = conn.prepare("?[name] := *users{id: $p1, name}").unwrap();
        assert_eq!(stmt.num_input(), None);
        let rows = stmt.query(&[Value::Int(3)]).unwrap();
        assert_eq!(collect(rows), vec![vec![Value::from("dave")]]);
        stmt.close().unwrap();
    }

    #[rstest]
    fn test_script_error(mut conn: Box<dyn Conn>) {
        let err = conn
            .as_queryer()
            .unwrap()
            .query("?[x] := *missing{x}", &[])
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::Failed { .. }));
    }

    #[rstest]
    fn test_cancelled_context(mut conn: Box<dyn Conn>) {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let err = conn.as_pinger().unwrap().ping(&ctx).unwrap_err();
        assert!(matches!(err, DriverError::Canceled));
    }

    #[rstest]
    fn test_closed_connection(mut conn: Box<dyn Conn>) {
        conn.close().unwrap();
        let err = conn.as_pinger().unwrap().ping(&Context::background()).unwrap_err();
        assert!(matches!(err, DriverError::BadConn));
    }

    #[rstest]
    fn test_begin_unsupported(mut conn: Box<dyn Conn>) {
        assert!(conn.begin().is_err());
    }

    #[rstest]
    fn test_connections_share_instance() {
        let driver = CozoDriver::new();
        let mut first = driver.open("mem").unwrap();
        first
            .as_execer()
            .unwrap()
            .exec(":create kv {k: String => v: Int}", &[])
            .unwrap();

        let mut second = driver.open("mem").unwrap();
        let rows = second
            .as_queryer()
            .unwrap()
            .query("?[k, v] := *kv{k, v}", &[])
            .unwrap();
        assert!(collect(rows).is_empty());
    }

    #[rstest]
    fn test_column_types_from_first_row(mut conn: Box<dyn Conn>) {
        insert(&mut conn, 1, "erin");
        let rows = conn
            .as_queryer()
            .unwrap()
            .query("?[id, name] := *users{id, name}", &[])
            .unwrap();
        let scan = rows.as_column_type_scan_type().unwrap();
        assert_eq!(scan.column_type_scan_type(0), ScanType::Int);
        assert_eq!(scan.column_type_scan_type(1), ScanType::Str);
        assert_eq!(scan.column_type_scan_type(5), ScanType::Any);
        let names = rows.as_column_type_database_type_name().unwrap();
        assert_eq!(names.column_type_database_type_name(1), "String");
    }

    #[rstest]
    fn test_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = format!("sqlite:{}", dir.path().join("test.db").display());
        let mut conn = CozoDriver::new().open(&dsn).unwrap();
        conn.as_pinger().unwrap().ping(&Context::background()).unwrap();
    }

    #[rstest]
    fn test_result_counts_unsupported() {
        assert!(CozoResult.rows_affected().is_err());
        assert!(CozoResult.last_insert_id().is_err());
    }
}
