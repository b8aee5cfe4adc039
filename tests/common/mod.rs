//! Fixtures shared by the integration tests: an in-memory sink and a driver
//! that implements only the mandatory surface.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sqldb_logger::driver::{Conn, Context, Driver, ExecResult, Rows, Stmt, Tx, Value};
use sqldb_logger::{DriverResult, Fields, Level, LogEvent, Logger};

#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn find(&self, message: &str) -> Option<LogEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, _ctx: &Context, level: Level, msg: &str, data: Fields) {
        self.events.lock().unwrap().push(LogEvent {
            level,
            message: msg.to_string(),
            fields: data,
        });
    }
}

/// Names of driver methods that were reached.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A driver with no optional capabilities at all.
#[derive(Default)]
pub struct LegacyDriver {
    pub calls: Calls,
}

impl Driver for LegacyDriver {
    fn open(&self, _dsn: &str) -> DriverResult<Box<dyn Conn>> {
        self.calls.record("Open");
        Ok(Box::new(LegacyConn {
            calls: self.calls.clone(),
        }))
    }
}

struct LegacyConn {
    calls: Calls,
}

impl Conn for LegacyConn {
    fn prepare(&mut self, _query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.calls.record("Prepare");
        Ok(Box::new(LegacyStmt {
            calls: self.calls.clone(),
        }))
    }

    fn close(&mut self) -> DriverResult<()> {
        self.calls.record("Close");
        Ok(())
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.calls.record("Begin");
        Ok(Box::new(LegacyTx {
            calls: self.calls.clone(),
        }))
    }
}

struct LegacyStmt {
    calls: Calls,
}

impl Stmt for LegacyStmt {
    fn close(&mut self) -> DriverResult<()> {
        self.calls.record("StmtClose");
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(&mut self, _args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.calls.record("StmtExec");
        Ok(Box::new(OneRow))
    }

    fn query(&mut self, _args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        self.calls.record("StmtQuery");
        Ok(Box::new(OneRowRows { done: false }))
    }
}

struct LegacyTx {
    calls: Calls,
}

impl Tx for LegacyTx {
    fn commit(&mut self) -> DriverResult<()> {
        self.calls.record("Commit");
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.calls.record("Rollback");
        Ok(())
    }
}

struct OneRow;

impl ExecResult for OneRow {
    fn last_insert_id(&self) -> DriverResult<i64> {
        Ok(42)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        Ok(1)
    }
}

struct OneRowRows {
    done: bool,
}

impl Rows for OneRowRows {
    fn columns(&self) -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        if self.done {
            return Ok(false);
        }
        self.done = true;
        dest[0] = Value::Int(1);
        dest[1] = Value::from("alice");
        Ok(true)
    }
}
