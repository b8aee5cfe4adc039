//! Connection decorator.
//!
//! The widest surface of the crate. Every optional capability is checked
//! against the bitset probed when the connection was wrapped; an absent one
//! answers with [`DriverError::Skip`] and never reaches the driver.
//! Statements and transactions get a fresh ID here, generated before the
//! driver call so the creating event and the child's own events agree.

use std::sync::Arc;

use crate::capabilities::ConnCapabilities;
use crate::driver::{
    named_values_to_values, Conn, ConnBeginTx, ConnPrepareContext, Context, ExecResult, Execer,
    ExecerContext, NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Rows,
    SessionResetter, Stmt, Tx, TxOptions, Value,
};
use crate::error::{DriverError, DriverResult};
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;
use crate::result::LoggedResult;
use crate::rows::LoggedRows;
use crate::statement::LoggedStatement;
use crate::transaction::LoggedTransaction;

pub struct LoggedConnection {
    inner: Box<dyn Conn>,
    caps: ConnCapabilities,
    policy: Arc<LogPolicy>,
    id: String,
}

impl LoggedConnection {
    pub(crate) fn new(mut inner: Box<dyn Conn>, policy: Arc<LogPolicy>, id: String) -> Self {
        let caps = ConnCapabilities::probe(inner.as_mut());
        Self {
            inner,
            caps,
            policy,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Capabilities of the wrapped connection, probed at wrap time.
    pub fn capabilities(&self) -> ConnCapabilities {
        self.caps
    }

    fn skip<T>(&self, ctx: &Context, msg: Message, query: Option<&str>) -> DriverResult<T> {
        match query {
            Some(query) => self
                .policy
                .log_skip(ctx, msg, &[Field::ConnId(&self.id), Field::Query(query)]),
            None => self.policy.log_skip(ctx, msg, &[Field::ConnId(&self.id)]),
        }
        Err(DriverError::Skip)
    }

    fn log_plain<T>(&self, ctx: &Context, msg: Message, start: CallStart, outcome: &DriverResult<T>) {
        self.policy
            .log_outcome(ctx, msg, start, outcome, &[Field::ConnId(&self.id)]);
    }

    fn log_call<T>(
        &self,
        ctx: &Context,
        msg: Message,
        start: CallStart,
        outcome: &DriverResult<T>,
        query: &str,
        args: &[Value],
    ) {
        self.policy.log_outcome(
            ctx,
            msg,
            start,
            outcome,
            &[Field::ConnId(&self.id), Field::Query(query), Field::Args(args)],
        );
    }

    fn log_prepare<T>(
        &self,
        ctx: &Context,
        msg: Message,
        start: CallStart,
        outcome: &DriverResult<T>,
        query: &str,
        stmt_id: &str,
    ) {
        self.policy.log_outcome(
            ctx,
            msg,
            start,
            outcome,
            &[Field::ConnId(&self.id), Field::Query(query), Field::StmtId(stmt_id)],
        );
    }

    fn log_begin<T>(
        &self,
        ctx: &Context,
        msg: Message,
        start: CallStart,
        outcome: &DriverResult<T>,
        tx_id: &str,
    ) {
        self.policy.log_outcome(
            ctx,
            msg,
            start,
            outcome,
            &[Field::ConnId(&self.id), Field::TxId(tx_id)],
        );
    }

    fn wrap_statement(
        &self,
        outcome: DriverResult<Box<dyn Stmt>>,
        query: &str,
        id: String,
    ) -> DriverResult<Box<dyn Stmt>> {
        let stmt = outcome?;
        Ok(Box::new(LoggedStatement::new(
            stmt,
            self.policy.clone(),
            query.to_string(),
            self.id.clone(),
            id,
        )))
    }

    fn wrap_transaction(
        &self,
        outcome: DriverResult<Box<dyn Tx>>,
        id: String,
    ) -> DriverResult<Box<dyn Tx>> {
        let tx = outcome?;
        Ok(Box::new(LoggedTransaction::new(
            tx,
            self.policy.clone(),
            self.id.clone(),
            id,
        )))
    }

    fn wrap_rows(
        &self,
        outcome: DriverResult<Box<dyn Rows>>,
        query: &str,
        args: Vec<Value>,
    ) -> DriverResult<Box<dyn Rows>> {
        let rows = outcome?;
        if !self.policy.options().wrap_result() {
            return Ok(rows);
        }
        Ok(Box::new(LoggedRows::new(
            rows,
            self.policy.clone(),
            self.id.clone(),
            String::new(),
            query.to_string(),
            args,
        )))
    }

    fn wrap_result(
        &self,
        outcome: DriverResult<Box<dyn ExecResult>>,
        query: &str,
        args: Vec<Value>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        let result = outcome?;
        if !self.policy.options().wrap_result() {
            return Ok(result);
        }
        Ok(Box::new(LoggedResult::new(
            result,
            self.policy.clone(),
            self.id.clone(),
            String::new(),
            query.to_string(),
            args,
        )))
    }
}

impl Conn for LoggedConnection {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        let ctx = Context::background();
        let id = self.policy.unique_id();
        let start = CallStart::now();
        let outcome = self.inner.prepare(query);
        self.log_prepare(&ctx, Message::Prepare, start, &outcome, query, &id);
        self.wrap_statement(outcome, query, id)
    }

    fn close(&mut self) -> DriverResult<()> {
        let start = CallStart::now();
        let outcome = self.inner.close();
        self.log_plain(&Context::background(), Message::Close, start, &outcome);
        outcome
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        let ctx = Context::background();
        let id = self.policy.unique_id();
        let start = CallStart::now();
        let outcome = self.inner.begin();
        self.log_begin(&ctx, Message::Begin, start, &outcome, &id);
        self.wrap_transaction(outcome, id)
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        Some(self)
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        Some(self)
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

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        Some(self)
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        Some(self)
    }
}

impl ConnBeginTx for LoggedConnection {
    fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        if !self.caps.contains(ConnCapabilities::BEGIN_TX) {
            return self.skip(ctx, Message::BeginTx, None);
        }
        let id = self.policy.unique_id();
        let start = CallStart::now();
        let outcome = match self.inner.as_begin_tx() {
            Some(conn) => conn.begin_tx(ctx, opts),
            None => Err(DriverError::Skip),
        };
        self.log_begin(ctx, Message::BeginTx, start, &outcome, &id);
        self.wrap_transaction(outcome, id)
    }
}

impl ConnPrepareContext for LoggedConnection {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
        if !self.caps.contains(ConnCapabilities::PREPARE_CONTEXT) {
            return self.skip(ctx, Message::PrepareContext, Some(query));
        }
        let id = self.policy.unique_id();
        let start = CallStart::now();
        let outcome = match self.inner.as_prepare_context() {
            Some(conn) => conn.prepare_context(ctx, query),
            None => Err(DriverError::Skip),
        };
        self.log_prepare(ctx, Message::PrepareContext, start, &outcome, query, &id);
        self.wrap_statement(outcome, query, id)
    }
}

impl Pinger for LoggedConnection {
    fn ping(&mut self, ctx: &Context) -> DriverResult<()> {
        if !self.caps.contains(ConnCapabilities::PING) {
            return self.skip(ctx, Message::Ping, None);
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_pinger() {
            Some(pinger) => pinger.ping(ctx),
            None => Err(DriverError::Skip),
        };
        self.log_plain(ctx, Message::Ping, start, &outcome);
        outcome
    }
}

impl Execer for LoggedConnection {
    fn exec(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        let ctx = Context::background();
        if !self.caps.contains(ConnCapabilities::EXEC) {
            return self.skip(&ctx, Message::Exec, Some(query));
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_execer() {
            Some(execer) => execer.exec(query, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(&ctx, Message::Exec, start, &outcome, query, args);
        self.wrap_result(outcome, query, args.to_vec())
    }
}

impl ExecerContext for LoggedConnection {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        if !self.caps.contains(ConnCapabilities::EXEC_CONTEXT) {
            return self.skip(ctx, Message::ExecContext, Some(query));
        }
        let log_args = named_values_to_values(args);
        let start = CallStart::now();
        let outcome = match self.inner.as_execer_context() {
            Some(execer) => execer.exec_context(ctx, query, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(ctx, Message::ExecContext, start, &outcome, query, &log_args);
        self.wrap_result(outcome, query, log_args)
    }
}

impl Queryer for LoggedConnection {
    fn query(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        let ctx = Context::background();
        if !self.caps.contains(ConnCapabilities::QUERY) {
            return self.skip(&ctx, Message::Query, Some(query));
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_queryer() {
            Some(queryer) => queryer.query(query, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(&ctx, Message::Query, start, &outcome, query, args);
        self.wrap_rows(outcome, query, args.to_vec())
    }
}

impl QueryerContext for LoggedConnection {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        if !self.caps.contains(ConnCapabilities::QUERY_CONTEXT) {
            return self.skip(ctx, Message::QueryContext, Some(query));
        }
        let log_args = named_values_to_values(args);
        let start = CallStart::now();
        let outcome = match self.inner.as_queryer_context() {
            Some(queryer) => queryer.query_context(ctx, query, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(ctx, Message::QueryContext, start, &outcome, query, &log_args);
        self.wrap_rows(outcome, query, log_args)
    }
}

impl SessionResetter for LoggedConnection {
    fn reset_session(&mut self, ctx: &Context) -> DriverResult<()> {
        if !self.caps.contains(ConnCapabilities::RESET_SESSION) {
            return self.skip(ctx, Message::ResetSession, None);
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_session_resetter() {
            Some(resetter) => resetter.reset_session(ctx),
            None => Err(DriverError::Skip),
        };
        self.log_plain(ctx, Message::ResetSession, start, &outcome);
        outcome
    }
}

impl NamedValueChecker for LoggedConnection {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()> {
        let ctx = Context::background();
        if !self.caps.contains(ConnCapabilities::CHECK_NAMED_VALUE) {
            return self.skip(&ctx, Message::CheckNamedValue, None);
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_named_value_checker() {
            Some(checker) => checker.check_named_value(value),
            None => Err(DriverError::Skip),
        };
        self.log_plain(&ctx, Message::CheckNamedValue, start, &outcome);
        outcome
    }
}
