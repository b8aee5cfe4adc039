//! Transaction decorator.

use std::sync::Arc;

use crate::driver::{Context, Tx};
use crate::error::DriverResult;
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;

pub struct LoggedTransaction {
    inner: Box<dyn Tx>,
    policy: Arc<LogPolicy>,
    conn_id: String,
    id: String,
}

impl LoggedTransaction {
    pub(crate) fn new(
        inner: Box<dyn Tx>,
        policy: Arc<LogPolicy>,
        conn_id: String,
        id: String,
    ) -> Self {
        Self {
            inner,
            policy,
            conn_id,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn finish(&self, msg: Message, start: CallStart, outcome: &DriverResult<()>) {
        let fields = [Field::ConnId(&self.conn_id), Field::TxId(&self.id)];
        self.policy
            .log_outcome(&Context::background(), msg, start, outcome, &fields);
    }
}

impl Tx for LoggedTransaction {
    fn commit(&mut self) -> DriverResult<()> {
        let start = CallStart::now();
        let outcome = self.inner.commit();
        self.finish(Message::Commit, start, &outcome);
        outcome
    }

    fn rollback(&mut self) -> DriverResult<()> {
        let start = CallStart::now();
        let outcome = self.inner.rollback();
        self.finish(Message::Rollback, start, &outcome);
        outcome
    }
}
