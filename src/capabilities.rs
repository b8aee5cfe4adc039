//! Optional capabilities of a wrapped driver object.
//!
//! Each decorator probes the `as_*` accessors of the object it wraps exactly
//! once, when it is created, and keeps the answers here. Calls for a
//! capability that is absent return the skip sentinel without touching the
//! driver.

use bitflags::bitflags;

use crate::driver::{Conn, Rows, Stmt};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConnCapabilities: u16 {
        const BEGIN_TX = 1 << 0;
        const PREPARE_CONTEXT = 1 << 1;
        const PING = 1 << 2;
        const EXEC = 1 << 3;
        const EXEC_CONTEXT = 1 << 4;
        const QUERY = 1 << 5;
        const QUERY_CONTEXT = 1 << 6;
        const RESET_SESSION = 1 << 7;
        const CHECK_NAMED_VALUE = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StmtCapabilities: u8 {
        const EXEC_CONTEXT = 1 << 0;
        const QUERY_CONTEXT = 1 << 1;
        const CHECK_NAMED_VALUE = 1 << 2;
        const COLUMN_CONVERTER = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowsCapabilities: u8 {
        const NEXT_RESULT_SET = 1 << 0;
        const SCAN_TYPE = 1 << 1;
        const DATABASE_TYPE_NAME = 1 << 2;
        const LENGTH = 1 << 3;
        const NULLABLE = 1 << 4;
        const PRECISION_SCALE = 1 << 5;
    }
}

impl ConnCapabilities {
    pub fn probe(conn: &mut dyn Conn) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::BEGIN_TX, conn.as_begin_tx().is_some());
        caps.set(Self::PREPARE_CONTEXT, conn.as_prepare_context().is_some());
        caps.set(Self::PING, conn.as_pinger().is_some());
        caps.set(Self::EXEC, conn.as_execer().is_some());
        caps.set(Self::EXEC_CONTEXT, conn.as_execer_context().is_some());
        caps.set(Self::QUERY, conn.as_queryer().is_some());
        caps.set(Self::QUERY_CONTEXT, conn.as_queryer_context().is_some());
        caps.set(Self::RESET_SESSION, conn.as_session_resetter().is_some());
        caps.set(Self::CHECK_NAMED_VALUE, conn.as_named_value_checker().is_some());
        caps
    }
}

impl StmtCapabilities {
    pub fn probe(stmt: &mut dyn Stmt) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::EXEC_CONTEXT, stmt.as_exec_context().is_some());
        caps.set(Self::QUERY_CONTEXT, stmt.as_query_context().is_some());
        caps.set(Self::CHECK_NAMED_VALUE, stmt.as_named_value_checker().is_some());
        caps.set(Self::COLUMN_CONVERTER, stmt.as_column_converter().is_some());
        caps
    }
}

impl RowsCapabilities {
    pub fn probe(rows: &mut dyn Rows) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::NEXT_RESULT_SET, rows.as_next_result_set().is_some());
        caps.set(Self::SCAN_TYPE, rows.as_column_type_scan_type().is_some());
        caps.set(
            Self::DATABASE_TYPE_NAME,
            rows.as_column_type_database_type_name().is_some(),
        );
        caps.set(Self::LENGTH, rows.as_column_type_length().is_some());
        caps.set(Self::NULLABLE, rows.as_column_type_nullable().is_some());
        caps.set(
            Self::PRECISION_SCALE,
            rows.as_column_type_precision_scale().is_some(),
        );
        caps
    }
}
