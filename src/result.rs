//! Exec result decorator. Logs only when reading the result fails.

use std::sync::Arc;

use crate::driver::{Context, ExecResult, Value};
use crate::error::DriverResult;
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;

pub struct LoggedResult {
    inner: Box<dyn ExecResult>,
    policy: Arc<LogPolicy>,
    conn_id: String,
    stmt_id: String,
    query: String,
    args: Vec<Value>,
}

impl LoggedResult {
    pub(crate) fn new(
        inner: Box<dyn ExecResult>,
        policy: Arc<LogPolicy>,
        conn_id: String,
        stmt_id: String,
        query: String,
        args: Vec<Value>,
    ) -> Self {
        Self {
            inner,
            policy,
            conn_id,
            stmt_id,
            query,
            args,
        }
    }

    fn log_data(&self) -> [Field<'_>; 4] {
        [
            Field::ConnId(&self.conn_id),
            Field::StmtId(&self.stmt_id),
            Field::Query(&self.query),
            Field::Args(&self.args),
        ]
    }

    fn observe(&self, msg: Message, start: CallStart, outcome: DriverResult<i64>) -> DriverResult<i64> {
        if outcome.is_err() {
            self.policy
                .log_outcome(&Context::background(), msg, start, &outcome, &self.log_data());
        }
        outcome
    }
}

impl ExecResult for LoggedResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        let start = CallStart::now();
        let outcome = self.inner.last_insert_id();
        self.observe(Message::ResultLastInsertId, start, outcome)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        let start = CallStart::now();
        let outcome = self.inner.rows_affected();
        self.observe(Message::ResultRowsAffected, start, outcome)
    }
}
