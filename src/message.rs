//! Operation catalog.
//!
//! Every decorated call logs under one of these messages. The catalog maps
//! each message to the level it is logged at on success, unless a per-kind
//! override from [`Options`](crate::Options) applies.

use std::fmt;

use crate::level::Level;

/// Name of a decorated operation, used as the log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    Connect,
    Begin,
    BeginTx,
    Prepare,
    PrepareContext,
    Close,
    Ping,
    Exec,
    ExecContext,
    Query,
    QueryContext,
    ResetSession,
    CheckNamedValue,
    Commit,
    Rollback,
    StmtClose,
    StmtExec,
    StmtExecContext,
    StmtQuery,
    StmtQueryContext,
    StmtCheckNamedValue,
    RowsClose,
    RowsNext,
    RowsNextResultSet,
    ResultLastInsertId,
    ResultRowsAffected,
}

/// Operations whose success level can be overridden as a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Prepare,
    Query,
    Exec,
}

impl Message {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::Begin => "Begin",
            Self::BeginTx => "BeginTx",
            Self::Prepare => "Prepare",
            Self::PrepareContext => "PrepareContext",
            Self::Close => "Close",
            Self::Ping => "Ping",
            Self::Exec => "Exec",
            Self::ExecContext => "ExecContext",
            Self::Query => "Query",
            Self::QueryContext => "QueryContext",
            Self::ResetSession => "ResetSession",
            Self::CheckNamedValue => "CheckNamedValue",
            Self::Commit => "Commit",
            Self::Rollback => "Rollback",
            Self::StmtClose => "StmtClose",
            Self::StmtExec => "StmtExec",
            Self::StmtExecContext => "StmtExecContext",
            Self::StmtQuery => "StmtQuery",
            Self::StmtQueryContext => "StmtQueryContext",
            Self::StmtCheckNamedValue => "StmtCheckNamedValue",
            Self::RowsClose => "RowsClose",
            Self::RowsNext => "RowsNext",
            Self::RowsNextResultSet => "RowsNextResultSet",
            Self::ResultLastInsertId => "ResultLastInsertId",
            Self::ResultRowsAffected => "ResultRowsAffected",
        }
    }

    /// The override group this message belongs to, if any.
    pub fn kind(&self) -> Option<CallKind> {
        match self {
            Self::Prepare | Self::PrepareContext => Some(CallKind::Prepare),
            Self::Query | Self::QueryContext | Self::StmtQuery | Self::StmtQueryContext => {
                Some(CallKind::Query)
            }
            Self::Exec | Self::ExecContext | Self::StmtExec | Self::StmtExecContext => {
                Some(CallKind::Exec)
            }
            _ => None,
        }
    }

    /// Success level when no override applies.
    pub fn default_level(&self) -> Level {
        match self {
            Self::Connect
            | Self::Begin
            | Self::BeginTx
            | Self::Close
            | Self::Ping
            | Self::Commit
            | Self::Rollback
            | Self::StmtClose => Level::Debug,
            Self::Prepare
            | Self::PrepareContext
            | Self::Exec
            | Self::ExecContext
            | Self::Query
            | Self::QueryContext
            | Self::StmtExec
            | Self::StmtExecContext
            | Self::StmtQuery
            | Self::StmtQueryContext => Level::Info,
            Self::ResetSession
            | Self::CheckNamedValue
            | Self::StmtCheckNamedValue
            | Self::RowsClose
            | Self::RowsNext
            | Self::RowsNextResultSet
            | Self::ResultLastInsertId
            | Self::ResultRowsAffected => Level::Trace,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
