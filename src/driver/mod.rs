//! Driver contract consumed by the logging decorators.
//!
//! A driver implements a small mandatory surface (`Driver`, `Conn`, `Stmt`,
//! `Tx`, `Rows`, `ExecResult`) plus any number of optional capabilities. Each
//! optional capability is a separate trait reached through an `as_*` accessor
//! on the mandatory trait; the default accessor returns `None`, so a driver
//! opts in by overriding the accessor to return `Some(self)`.
//!
//! # Example
//!
//! ```ignore
//! impl Conn for MyConn {
//!     // mandatory methods ...
//!     fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
//!         Some(self)
//!     }
//! }
//! ```

mod context;
mod value;

use std::fmt;
use std::sync::Arc;

pub use context::{CancelHandle, Context};
pub use value::{
    named_values_to_values, values_to_named_values, DefaultParameterConverter, NamedValue, Value,
    ValueConverter,
};

use crate::error::DriverResult;

/// Opens connections by data source name.
pub trait Driver: Send + Sync {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn Conn>>;
}

/// Produces connections for a host framework that owns pooling.
pub trait Connector: Send + Sync {
    fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>>;

    /// The undecorated driver behind this connector.
    fn driver(&self) -> Arc<dyn Driver>;
}

/// A live database connection. Not used by two callers at once.
pub trait Conn: Send {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>>;

    fn close(&mut self) -> DriverResult<()>;

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>>;

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        None
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }
}

/// Transaction isolation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

pub trait ConnBeginTx {
    fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>>;
}

pub trait ConnPrepareContext {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>>;
}

pub trait Pinger {
    fn ping(&mut self, ctx: &Context) -> DriverResult<()>;
}

/// Direct execution without a prepared statement, positional arguments.
pub trait Execer {
    fn exec(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>>;
}

pub trait ExecerContext {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>>;
}

/// Direct query without a prepared statement, positional arguments.
pub trait Queryer {
    fn query(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>>;
}

pub trait QueryerContext {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>>;
}

/// Called before a pooled connection is reused.
pub trait SessionResetter {
    fn reset_session(&mut self, ctx: &Context) -> DriverResult<()>;
}

/// Lets the driver validate or rewrite an argument before binding.
pub trait NamedValueChecker {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()>;
}

/// A prepared statement.
pub trait Stmt: Send {
    fn close(&mut self) -> DriverResult<()>;

    /// Number of placeholders, or `None` when the driver cannot tell.
    fn num_input(&self) -> Option<usize>;

    fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>>;

    fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>>;

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        None
    }
}

pub trait StmtExecContext {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>>;
}

pub trait StmtQueryContext {
    fn query_context(&mut self, ctx: &Context, args: &[NamedValue])
    -> DriverResult<Box<dyn Rows>>;
}

/// Per-column argument conversion for a statement.
pub trait ColumnConverter {
    fn column_converter(&self, index: usize) -> &dyn ValueConverter;
}

pub trait Tx: Send {
    fn commit(&mut self) -> DriverResult<()>;

    fn rollback(&mut self) -> DriverResult<()>;
}

/// Outcome of an exec call.
pub trait ExecResult: Send {
    fn last_insert_id(&self) -> DriverResult<i64>;

    fn rows_affected(&self) -> DriverResult<i64>;
}

/// Go-style scan type hint for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// Unknown; the caller scans into a dynamic value.
    Any,
    Bool,
    Int,
    Float,
    Bytes,
    Str,
    Time,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bytes => "bytes",
            Self::Str => "string",
            Self::Time => "time",
        };
        f.write_str(name)
    }
}

/// A cursor over query results.
pub trait Rows: Send {
    fn columns(&self) -> Vec<String>;

    fn close(&mut self) -> DriverResult<()>;

    /// Fill `dest` with the next row. `Ok(false)` once the rows are exhausted.
    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool>;

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        None
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        None
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        None
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        None
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        None
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        None
    }
}

pub trait RowsNextResultSet {
    fn has_next_result_set(&mut self) -> bool;

    /// Advance to the next result set. `Ok(false)` when there is none.
    fn next_result_set(&mut self) -> DriverResult<bool>;
}

pub trait RowsColumnTypeScanType {
    fn column_type_scan_type(&self, index: usize) -> ScanType;
}

pub trait RowsColumnTypeDatabaseTypeName {
    fn column_type_database_type_name(&self, index: usize) -> String;
}

pub trait RowsColumnTypeLength {
    fn column_type_length(&self, index: usize) -> Option<i64>;
}

pub trait RowsColumnTypeNullable {
    fn column_type_nullable(&self, index: usize) -> Option<bool>;
}

pub trait RowsColumnTypePrecisionScale {
    /// `(precision, scale)` for decimal columns.
    fn column_type_precision_scale(&self, index: usize) -> Option<(i64, i64)>;
}
