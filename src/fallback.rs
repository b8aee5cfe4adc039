//! Host-side call helpers that fall back from context-aware to legacy calls.
//!
//! A decorated connection answers an absent capability with
//! [`DriverError::Skip`], the same way a bare driver would. These helpers
//! implement the caller's half of that contract: try the context-aware call,
//! and on `Skip` check the context is still live, convert the named arguments
//! to positional ones and retry through the legacy call. They work on any
//! [`Conn`] or [`Stmt`], decorated or not.

use crate::driver::{Conn, Context, ExecResult, NamedValue, Rows, Stmt, Tx, TxOptions, Value};
use crate::error::{DriverError, DriverResult};

/// Convert named arguments to positional ones for a legacy call.
///
/// # Errors
/// `NamedParamsUnsupported` for the first argument that carries a name,
/// since positional binding would silently drop it.
pub fn named_to_positional(args: &[NamedValue]) -> DriverResult<Vec<Value>> {
    args.iter()
        .map(|nv| match &nv.name {
            Some(name) if !name.is_empty() => Err(DriverError::NamedParamsUnsupported {
                name: name.clone(),
            }),
            _ => Ok(nv.value.clone()),
        })
        .collect()
}

fn live(ctx: &Context) -> DriverResult<()> {
    match ctx.err() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// `Some(outcome)` unless the attempt answered with the skip sentinel.
fn settled<T>(attempt: Option<DriverResult<T>>) -> Option<DriverResult<T>> {
    match attempt {
        Some(Err(err)) if err.is_skip() => None,
        other => other,
    }
}

/// Let the connection validate each argument, if it wants to.
///
/// A checker answering `Skip` leaves the argument as it is.
pub fn check_args(conn: &mut dyn Conn, args: &[NamedValue]) -> DriverResult<Vec<NamedValue>> {
    let mut checked = args.to_vec();
    if let Some(checker) = conn.as_named_value_checker() {
        for arg in &mut checked {
            match checker.check_named_value(arg) {
                Err(err) if err.is_skip() => {}
                other => other?,
            }
        }
    }
    Ok(checked)
}

pub fn prepare(conn: &mut dyn Conn, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
    let attempt = conn
        .as_prepare_context()
        .map(|c| c.prepare_context(ctx, query));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }
    live(ctx)?;
    conn.prepare(query)
}

/// Begin a transaction. The legacy path only accepts default options.
pub fn begin(conn: &mut dyn Conn, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
    let attempt = conn.as_begin_tx().map(|c| c.begin_tx(ctx, opts));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }
    if opts != TxOptions::default() {
        return Err(DriverError::TxOptionsUnsupported);
    }
    live(ctx)?;
    conn.begin()
}

/// Ping the connection. A connection without ping support counts as alive.
pub fn ping(conn: &mut dyn Conn, ctx: &Context) -> DriverResult<()> {
    let attempt = conn.as_pinger().map(|p| p.ping(ctx));
    settled(attempt).unwrap_or(Ok(()))
}

/// Execute directly when the connection can, otherwise through a
/// short-lived prepared statement.
pub fn exec(
    conn: &mut dyn Conn,
    ctx: &Context,
    query: &str,
    args: &[NamedValue],
) -> DriverResult<Box<dyn ExecResult>> {
    let attempt = conn
        .as_execer_context()
        .map(|c| c.exec_context(ctx, query, args));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }

    live(ctx)?;
    let positional = named_to_positional(args)?;
    let attempt = conn.as_execer().map(|c| c.exec(query, &positional));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }

    let mut stmt = prepare(conn, ctx, query)?;
    let outcome = stmt_exec(stmt.as_mut(), ctx, args);
    let closed = stmt.close();
    let result = outcome?;
    closed?;
    Ok(result)
}

/// Query directly when the connection can, otherwise through a prepared
/// statement that stays open for as long as the rows are read.
pub fn query(
    conn: &mut dyn Conn,
    ctx: &Context,
    query: &str,
    args: &[NamedValue],
) -> DriverResult<Box<dyn Rows>> {
    let attempt = conn
        .as_queryer_context()
        .map(|c| c.query_context(ctx, query, args));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }

    live(ctx)?;
    let positional = named_to_positional(args)?;
    let attempt = conn.as_queryer().map(|c| c.query(query, &positional));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }

    let mut stmt = prepare(conn, ctx, query)?;
    match stmt_query(stmt.as_mut(), ctx, args) {
        Ok(rows) => Ok(Box::new(StmtRows { stmt, rows })),
        Err(err) => {
            // query error wins over close error
            if let Err(close_err) = stmt.close() {
                tracing::debug!(error = %close_err, "failed to close statement after query error");
            }
            Err(err)
        }
    }
}

pub fn stmt_exec(
    stmt: &mut dyn Stmt,
    ctx: &Context,
    args: &[NamedValue],
) -> DriverResult<Box<dyn ExecResult>> {
    let attempt = stmt.as_exec_context().map(|s| s.exec_context(ctx, args));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }
    live(ctx)?;
    let positional = named_to_positional(args)?;
    stmt.exec(&positional)
}

pub fn stmt_query(
    stmt: &mut dyn Stmt,
    ctx: &Context,
    args: &[NamedValue],
) -> DriverResult<Box<dyn Rows>> {
    let attempt = stmt.as_query_context().map(|s| s.query_context(ctx, args));
    if let Some(outcome) = settled(attempt) {
        return outcome;
    }
    live(ctx)?;
    let positional = named_to_positional(args)?;
    stmt.query(&positional)
}

/// Rows that own the statement they came from and close it with them.
struct StmtRows {
    stmt: Box<dyn Stmt>,
    rows: Box<dyn Rows>,
}

impl Rows for StmtRows {
    fn columns(&self) -> Vec<String> {
        self.rows.columns()
    }

    fn close(&mut self) -> DriverResult<()> {
        let rows = self.rows.close();
        let stmt = self.stmt.close();
        rows.and(stmt)
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        self.rows.next(dest)
    }
}
