//! Prepared statement decorator.
//!
//! Every event carries the parent connection ID, the statement's own ID and
//! the query text captured at prepare time.

use std::sync::Arc;

use crate::capabilities::StmtCapabilities;
use crate::driver::{
    named_values_to_values, ColumnConverter, Context, DefaultParameterConverter, ExecResult,
    NamedValue, NamedValueChecker, Rows, Stmt, StmtExecContext, StmtQueryContext, Value,
    ValueConverter,
};
use crate::error::{DriverError, DriverResult};
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;
use crate::result::LoggedResult;
use crate::rows::LoggedRows;

pub struct LoggedStatement {
    inner: Box<dyn Stmt>,
    caps: StmtCapabilities,
    policy: Arc<LogPolicy>,
    query: String,
    conn_id: String,
    id: String,
}

impl LoggedStatement {
    pub(crate) fn new(
        mut inner: Box<dyn Stmt>,
        policy: Arc<LogPolicy>,
        query: String,
        conn_id: String,
        id: String,
    ) -> Self {
        let caps = StmtCapabilities::probe(inner.as_mut());
        Self {
            inner,
            caps,
            policy,
            query,
            conn_id,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// SQL text the statement was prepared with.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub fn capabilities(&self) -> StmtCapabilities {
        self.caps
    }

    fn log_data(&self) -> [Field<'_>; 3] {
        [
            Field::ConnId(&self.conn_id),
            Field::StmtId(&self.id),
            Field::Query(&self.query),
        ]
    }

    fn skip<T>(&self, ctx: &Context, msg: Message) -> DriverResult<T> {
        self.policy.log_skip(ctx, msg, &self.log_data());
        Err(DriverError::Skip)
    }

    fn log_call<T>(
        &self,
        ctx: &Context,
        msg: Message,
        start: CallStart,
        outcome: &DriverResult<T>,
        args: &[Value],
    ) {
        let [conn, stmt, query] = self.log_data();
        self.policy
            .log_outcome(ctx, msg, start, outcome, &[conn, stmt, query, Field::Args(args)]);
    }

    fn wrap_rows(
        &self,
        outcome: DriverResult<Box<dyn Rows>>,
        args: Vec<Value>,
    ) -> DriverResult<Box<dyn Rows>> {
        let rows = outcome?;
        if !self.policy.options().wrap_result() {
            return Ok(rows);
        }
        Ok(Box::new(LoggedRows::new(
            rows,
            self.policy.clone(),
            self.conn_id.clone(),
            self.id.clone(),
            self.query.clone(),
            args,
        )))
    }

    fn wrap_result(
        &self,
        outcome: DriverResult<Box<dyn ExecResult>>,
        args: Vec<Value>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        let result = outcome?;
        if !self.policy.options().wrap_result() {
            return Ok(result);
        }
        Ok(Box::new(LoggedResult::new(
            result,
            self.policy.clone(),
            self.conn_id.clone(),
            self.id.clone(),
            self.query.clone(),
            args,
        )))
    }
}

impl Stmt for LoggedStatement {
    fn close(&mut self) -> DriverResult<()> {
        let start = CallStart::now();
        let outcome = self.inner.close();
        self.policy.log_outcome(
            &Context::background(),
            Message::StmtClose,
            start,
            &outcome,
            &self.log_data(),
        );
        outcome
    }

    fn num_input(&self) -> Option<usize> {
        self.inner.num_input()
    }

    fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        let ctx = Context::background();
        let start = CallStart::now();
        let outcome = self.inner.exec(args);
        self.log_call(&ctx, Message::StmtExec, start, &outcome, args);
        self.wrap_result(outcome, args.to_vec())
    }

    fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        let ctx = Context::background();
        let start = CallStart::now();
        let outcome = self.inner.query(args);
        self.log_call(&ctx, Message::StmtQuery, start, &outcome, args);
        self.wrap_rows(outcome, args.to_vec())
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        Some(self)
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        Some(self)
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        Some(self)
    }
}

impl StmtExecContext for LoggedStatement {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        if !self.caps.contains(StmtCapabilities::EXEC_CONTEXT) {
            return self.skip(ctx, Message::StmtExecContext);
        }
        let log_args = named_values_to_values(args);
        let start = CallStart::now();
        let outcome = match self.inner.as_exec_context() {
            Some(execer) => execer.exec_context(ctx, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(ctx, Message::StmtExecContext, start, &outcome, &log_args);
        self.wrap_result(outcome, log_args)
    }
}

impl StmtQueryContext for LoggedStatement {
    fn query_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        if !self.caps.contains(StmtCapabilities::QUERY_CONTEXT) {
            return self.skip(ctx, Message::StmtQueryContext);
        }
        let log_args = named_values_to_values(args);
        let start = CallStart::now();
        let outcome = match self.inner.as_query_context() {
            Some(queryer) => queryer.query_context(ctx, args),
            None => Err(DriverError::Skip),
        };
        self.log_call(ctx, Message::StmtQueryContext, start, &outcome, &log_args);
        self.wrap_rows(outcome, log_args)
    }
}

impl NamedValueChecker for LoggedStatement {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()> {
        let ctx = Context::background();
        if !self.caps.contains(StmtCapabilities::CHECK_NAMED_VALUE) {
            return self.skip(&ctx, Message::StmtCheckNamedValue);
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_named_value_checker() {
            Some(checker) => checker.check_named_value(value),
            None => Err(DriverError::Skip),
        };
        self.policy.log_outcome(
            &ctx,
            Message::StmtCheckNamedValue,
            start,
            &outcome,
            &self.log_data(),
        );
        outcome
    }
}

impl ColumnConverter for LoggedStatement {
    /// Delegates to the driver's converter, or passes values through
    /// unchanged when the driver has none. Not logged.
    fn column_converter(&self, index: usize) -> &dyn ValueConverter {
        match self.inner.as_column_converter() {
            Some(converter) => converter.column_converter(index),
            None => &DefaultParameterConverter,
        }
    }
}
