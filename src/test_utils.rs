//! Shared test utilities: a recording sink and a configurable mock driver.
//!
//! Every test builds its own sink and mocks, nothing is shared between tests.
//! Mock capabilities are declared with the same bitsets the decorators use,
//! and every call that reaches a mock is written to a [`CallLog`], so tests
//! can assert that an absent capability never reaches the driver.

use std::sync::{Arc, Mutex};

use crate::capabilities::{ConnCapabilities, RowsCapabilities, StmtCapabilities};
use crate::driver::{
    ColumnConverter, Conn, ConnBeginTx, ConnPrepareContext, Context, Driver, ExecResult, Execer,
    ExecerContext, NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Rows,
    RowsColumnTypeDatabaseTypeName, RowsColumnTypeLength, RowsColumnTypeNullable,
    RowsColumnTypePrecisionScale, RowsColumnTypeScanType, RowsNextResultSet, ScanType,
    SessionResetter, Stmt, StmtExecContext, StmtQueryContext, Tx, TxOptions, Value,
    ValueConverter,
};
use crate::error::{DriverError, DriverResult};
use crate::level::Level;
use crate::logger::{Fields, LogEvent, LogPolicy, Logger};
use crate::options::Options;
use crate::uid::RandomUid;

// =============================================================================
// Recording sink
// =============================================================================

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<LogEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Logger for RecordingLogger {
    fn log(&self, _ctx: &Context, level: Level, msg: &str, data: Fields) {
        self.events.lock().unwrap().push(LogEvent {
            level,
            message: msg.to_string(),
            fields: data,
        });
    }
}

/// Build a policy over `logger`, with a seeded ID generator unless `opt`
/// brings its own.
pub fn policy_with(logger: Arc<RecordingLogger>, opt: Options) -> Arc<LogPolicy> {
    let opt = if opt.uid_generator.is_none() {
        opt.with_uid_generator(Arc::new(RandomUid::from_seed(1)))
    } else {
        opt
    };
    Arc::new(LogPolicy::new(logger, opt).expect("policy should build"))
}

/// Policy that logs everything down to trace.
pub fn trace_policy(logger: Arc<RecordingLogger>) -> Arc<LogPolicy> {
    policy_with(logger, Options::default().with_minimum_level(Level::Trace))
}

// =============================================================================
// Call log
// =============================================================================

/// Names of the driver methods that were actually invoked.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

type ErrorFactory = fn() -> DriverError;

fn outcome(fail_with: Option<ErrorFactory>) -> DriverResult<()> {
    match fail_with {
        Some(make) => Err(make()),
        None => Ok(()),
    }
}

// =============================================================================
// Mock driver objects
// =============================================================================

pub struct MockDriver {
    pub conn_caps: ConnCapabilities,
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
}

impl MockDriver {
    pub fn new(conn_caps: ConnCapabilities) -> Self {
        Self {
            conn_caps,
            fail_with: None,
            calls: CallLog::default(),
        }
    }

    pub fn failing(mut self, make: ErrorFactory) -> Self {
        self.fail_with = Some(make);
        self
    }
}

impl Driver for MockDriver {
    fn open(&self, _dsn: &str) -> DriverResult<Box<dyn Conn>> {
        self.calls.record("Open");
        outcome(self.fail_with)?;
        let mut conn = MockConn::new(self.conn_caps);
        conn.calls = self.calls.clone();
        Ok(Box::new(conn))
    }
}

pub struct MockConn {
    pub caps: ConnCapabilities,
    pub stmt_caps: StmtCapabilities,
    pub rows_caps: RowsCapabilities,
    pub data: Vec<Vec<Value>>,
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
}

impl MockConn {
    pub fn new(caps: ConnCapabilities) -> Self {
        Self {
            caps,
            stmt_caps: StmtCapabilities::empty(),
            rows_caps: RowsCapabilities::empty(),
            data: vec![vec![Value::Int(1), Value::Str("alice".to_string())]],
            fail_with: None,
            calls: CallLog::default(),
        }
    }

    pub fn failing(mut self, make: ErrorFactory) -> Self {
        self.fail_with = Some(make);
        self
    }

    pub fn with_stmt_caps(mut self, caps: StmtCapabilities) -> Self {
        self.stmt_caps = caps;
        self
    }

    pub fn with_rows_caps(mut self, caps: RowsCapabilities) -> Self {
        self.rows_caps = caps;
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    fn call(&self, name: &str) -> DriverResult<()> {
        self.calls.record(name);
        outcome(self.fail_with)
    }

    fn stmt(&self) -> Box<dyn Stmt> {
        let mut stmt = MockStmt::new(self.stmt_caps);
        stmt.rows_caps = self.rows_caps;
        stmt.data = self.data.clone();
        stmt.calls = self.calls.clone();
        Box::new(stmt)
    }

    fn rows(&self) -> Box<dyn Rows> {
        let mut rows = MockRows::new(self.rows_caps, self.data.clone());
        rows.calls = self.calls.clone();
        Box::new(rows)
    }

    fn tx(&self) -> Box<dyn Tx> {
        Box::new(MockTx {
            fail_with: None,
            calls: self.calls.clone(),
        })
    }
}

impl Conn for MockConn {
    fn prepare(&mut self, _query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.call("Prepare")?;
        Ok(self.stmt())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.call("Close")
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.call("Begin")?;
        Ok(self.tx())
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.caps.contains(ConnCapabilities::BEGIN_TX) { Some(self) } else { None }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.caps.contains(ConnCapabilities::PREPARE_CONTEXT) { Some(self) } else { None }
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        if self.caps.contains(ConnCapabilities::PING) { Some(self) } else { None }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.caps.contains(ConnCapabilities::EXEC) { Some(self) } else { None }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.caps.contains(ConnCapabilities::EXEC_CONTEXT) { Some(self) } else { None }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.caps.contains(ConnCapabilities::QUERY) { Some(self) } else { None }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.caps.contains(ConnCapabilities::QUERY_CONTEXT) { Some(self) } else { None }
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        if self.caps.contains(ConnCapabilities::RESET_SESSION) { Some(self) } else { None }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.caps.contains(ConnCapabilities::CHECK_NAMED_VALUE) { Some(self) } else { None }
    }
}

impl ConnBeginTx for MockConn {
    fn begin_tx(&mut self, _ctx: &Context, _opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        self.call("BeginTx")?;
        Ok(self.tx())
    }
}

impl ConnPrepareContext for MockConn {
    fn prepare_context(&mut self, _ctx: &Context, _query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.call("PrepareContext")?;
        Ok(self.stmt())
    }
}

impl Pinger for MockConn {
    fn ping(&mut self, _ctx: &Context) -> DriverResult<()> {
        self.call("Ping")
    }
}

impl Execer for MockConn {
    fn exec(&mut self, _query: &str, _args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.call("Exec")?;
        Ok(Box::new(MockResult::new(self.calls.clone())))
    }
}

impl ExecerContext for MockConn {
    fn exec_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        _args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        self.call("ExecContext")?;
        Ok(Box::new(MockResult::new(self.calls.clone())))
    }
}

impl Queryer for MockConn {
    fn query(&mut self, _query: &str, _args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        self.call("Query")?;
        Ok(self.rows())
    }
}

impl QueryerContext for MockConn {
    fn query_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        _args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        self.call("QueryContext")?;
        Ok(self.rows())
    }
}

impl SessionResetter for MockConn {
    fn reset_session(&mut self, _ctx: &Context) -> DriverResult<()> {
        self.call("ResetSession")
    }
}

impl NamedValueChecker for MockConn {
    fn check_named_value(&mut self, _value: &mut NamedValue) -> DriverResult<()> {
        self.call("CheckNamedValue")
    }
}

pub struct MockStmt {
    pub caps: StmtCapabilities,
    pub rows_caps: RowsCapabilities,
    pub data: Vec<Vec<Value>>,
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
    /// Last positional arguments the statement received.
    pub received: Arc<Mutex<Vec<Value>>>,
}

impl MockStmt {
    pub fn new(caps: StmtCapabilities) -> Self {
        Self {
            caps,
            rows_caps: RowsCapabilities::empty(),
            data: vec![vec![Value::Int(1)]],
            fail_with: None,
            calls: CallLog::default(),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(mut self, make: ErrorFactory) -> Self {
        self.fail_with = Some(make);
        self
    }

    fn call(&self, name: &str) -> DriverResult<()> {
        self.calls.record(name);
        outcome(self.fail_with)
    }

    fn rows(&self) -> Box<dyn Rows> {
        let mut rows = MockRows::new(self.rows_caps, self.data.clone());
        rows.calls = self.calls.clone();
        Box::new(rows)
    }
}

impl Stmt for MockStmt {
    fn close(&mut self) -> DriverResult<()> {
        self.call("StmtClose")
    }

    fn num_input(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        *self.received.lock().unwrap() = args.to_vec();
        self.call("StmtExec")?;
        Ok(Box::new(MockResult::new(self.calls.clone())))
    }

    fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        *self.received.lock().unwrap() = args.to_vec();
        self.call("StmtQuery")?;
        Ok(self.rows())
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.caps.contains(StmtCapabilities::EXEC_CONTEXT) { Some(self) } else { None }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.caps.contains(StmtCapabilities::QUERY_CONTEXT) { Some(self) } else { None }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.caps.contains(StmtCapabilities::CHECK_NAMED_VALUE) { Some(self) } else { None }
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.caps.contains(StmtCapabilities::COLUMN_CONVERTER) { Some(self) } else { None }
    }
}

impl StmtExecContext for MockStmt {
    fn exec_context(
        &mut self,
        _ctx: &Context,
        _args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        self.call("StmtExecContext")?;
        Ok(Box::new(MockResult::new(self.calls.clone())))
    }
}

impl StmtQueryContext for MockStmt {
    fn query_context(
        &mut self,
        _ctx: &Context,
        _args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        self.call("StmtQueryContext")?;
        Ok(self.rows())
    }
}

impl NamedValueChecker for MockStmt {
    fn check_named_value(&mut self, _value: &mut NamedValue) -> DriverResult<()> {
        self.call("StmtCheckNamedValue")
    }
}

/// Upper-cases string arguments, so tests can tell it apart from the default.
pub struct UpperConverter;

impl ValueConverter for UpperConverter {
    fn convert_value(&self, value: Value) -> DriverResult<Value> {
        match value {
            Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
            other => Ok(other),
        }
    }
}

impl ColumnConverter for MockStmt {
    fn column_converter(&self, _index: usize) -> &dyn ValueConverter {
        self.calls.record("ColumnConverter");
        &UpperConverter
    }
}

pub struct MockTx {
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
}

impl Tx for MockTx {
    fn commit(&mut self) -> DriverResult<()> {
        self.calls.record("Commit");
        outcome(self.fail_with)
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.calls.record("Rollback");
        outcome(self.fail_with)
    }
}

pub struct MockResult {
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
}

impl MockResult {
    pub fn new(calls: CallLog) -> Self {
        Self {
            fail_with: None,
            calls,
        }
    }
}

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        self.calls.record("LastInsertId");
        outcome(self.fail_with).map(|_| 42)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        self.calls.record("RowsAffected");
        outcome(self.fail_with).map(|_| 1)
    }
}

pub struct MockRows {
    pub caps: RowsCapabilities,
    pub data: Vec<Vec<Value>>,
    pub cursor: usize,
    pub extra_sets: usize,
    pub fail_with: Option<ErrorFactory>,
    pub calls: CallLog,
}

impl MockRows {
    pub fn new(caps: RowsCapabilities, data: Vec<Vec<Value>>) -> Self {
        Self {
            caps,
            data,
            cursor: 0,
            extra_sets: 1,
            fail_with: None,
            calls: CallLog::default(),
        }
    }

    pub fn failing(mut self, make: ErrorFactory) -> Self {
        self.fail_with = Some(make);
        self
    }
}

impl Rows for MockRows {
    fn columns(&self) -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn close(&mut self) -> DriverResult<()> {
        self.calls.record("RowsClose");
        outcome(self.fail_with)
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        self.calls.record("RowsNext");
        outcome(self.fail_with)?;
        let Some(row) = self.data.get(self.cursor) else {
            return Ok(false);
        };
        for (slot, value) in dest.iter_mut().zip(row.iter()) {
            *slot = value.clone();
        }
        self.cursor += 1;
        Ok(true)
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        if self.caps.contains(RowsCapabilities::NEXT_RESULT_SET) { Some(self) } else { None }
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        if self.caps.contains(RowsCapabilities::SCAN_TYPE) { Some(self) } else { None }
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        if self.caps.contains(RowsCapabilities::DATABASE_TYPE_NAME) { Some(self) } else { None }
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        if self.caps.contains(RowsCapabilities::LENGTH) { Some(self) } else { None }
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        if self.caps.contains(RowsCapabilities::NULLABLE) { Some(self) } else { None }
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        if self.caps.contains(RowsCapabilities::PRECISION_SCALE) { Some(self) } else { None }
    }
}

impl RowsNextResultSet for MockRows {
    fn has_next_result_set(&mut self) -> bool {
        self.extra_sets > 0
    }

    fn next_result_set(&mut self) -> DriverResult<bool> {
        self.calls.record("NextResultSet");
        outcome(self.fail_with)?;
        if self.extra_sets == 0 {
            return Ok(false);
        }
        self.extra_sets -= 1;
        self.cursor = 0;
        Ok(true)
    }
}

impl RowsColumnTypeScanType for MockRows {
    fn column_type_scan_type(&self, index: usize) -> ScanType {
        if index == 0 { ScanType::Int } else { ScanType::Str }
    }
}

impl RowsColumnTypeDatabaseTypeName for MockRows {
    fn column_type_database_type_name(&self, index: usize) -> String {
        if index == 0 { "BIGINT".to_string() } else { "VARCHAR".to_string() }
    }
}

impl RowsColumnTypeLength for MockRows {
    fn column_type_length(&self, index: usize) -> Option<i64> {
        (index == 1).then_some(255)
    }
}

impl RowsColumnTypeNullable for MockRows {
    fn column_type_nullable(&self, index: usize) -> Option<bool> {
        Some(index == 1)
    }
}

impl RowsColumnTypePrecisionScale for MockRows {
    fn column_type_precision_scale(&self, _index: usize) -> Option<(i64, i64)> {
        Some((10, 2))
    }
}

