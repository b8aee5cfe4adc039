//! Rows decorator.
//!
//! Runs on the per-row hot path, so successful calls log at trace. Column
//! introspection is delegated when the wrapped cursor supports it and falls
//! back to neutral answers otherwise.

use std::sync::Arc;

use crate::capabilities::RowsCapabilities;
use crate::driver::{
    Context, Rows, RowsColumnTypeDatabaseTypeName, RowsColumnTypeLength, RowsColumnTypeNullable,
    RowsColumnTypePrecisionScale, RowsColumnTypeScanType, RowsNextResultSet, ScanType, Value,
};
use crate::error::DriverResult;
use crate::logger::{CallStart, Field, LogPolicy};
use crate::message::Message;

pub struct LoggedRows {
    inner: Box<dyn Rows>,
    caps: RowsCapabilities,
    policy: Arc<LogPolicy>,
    conn_id: String,
    stmt_id: String,
    query: String,
    args: Vec<Value>,
}

impl LoggedRows {
    pub(crate) fn new(
        mut inner: Box<dyn Rows>,
        policy: Arc<LogPolicy>,
        conn_id: String,
        stmt_id: String,
        query: String,
        args: Vec<Value>,
    ) -> Self {
        let caps = RowsCapabilities::probe(inner.as_mut());
        Self {
            inner,
            caps,
            policy,
            conn_id,
            stmt_id,
            query,
            args,
        }
    }

    /// Capabilities of the wrapped cursor, probed at wrap time.
    pub fn capabilities(&self) -> RowsCapabilities {
        self.caps
    }

    fn log_data(&self) -> [Field<'_>; 4] {
        [
            Field::ConnId(&self.conn_id),
            Field::StmtId(&self.stmt_id),
            Field::Query(&self.query),
            Field::Args(&self.args),
        ]
    }
}

impl Rows for LoggedRows {
    fn columns(&self) -> Vec<String> {
        self.inner.columns()
    }

    fn close(&mut self) -> DriverResult<()> {
        let start = CallStart::now();
        let outcome = self.inner.close();
        self.policy.log_outcome(
            &Context::background(),
            Message::RowsClose,
            start,
            &outcome,
            &self.log_data(),
        );
        outcome
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        let start = CallStart::now();
        let outcome = self.inner.next(dest);

        let mut data = self.log_data().to_vec();
        if matches!(outcome, Ok(true)) {
            data.push(Field::RowsDest(dest));
        }
        self.policy.log_outcome(
            &Context::background(),
            Message::RowsNext,
            start,
            &outcome,
            &data,
        );
        outcome
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        Some(self)
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        Some(self)
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        Some(self)
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        Some(self)
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        Some(self)
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        Some(self)
    }
}

impl RowsNextResultSet for LoggedRows {
    fn has_next_result_set(&mut self) -> bool {
        self.inner
            .as_next_result_set()
            .is_some_and(|rs| rs.has_next_result_set())
    }

    fn next_result_set(&mut self) -> DriverResult<bool> {
        if !self.caps.contains(RowsCapabilities::NEXT_RESULT_SET) {
            return Ok(false);
        }
        let start = CallStart::now();
        let outcome = match self.inner.as_next_result_set() {
            Some(rs) => rs.next_result_set(),
            None => Ok(false),
        };
        self.policy.log_outcome(
            &Context::background(),
            Message::RowsNextResultSet,
            start,
            &outcome,
            &self.log_data(),
        );
        outcome
    }
}

impl RowsColumnTypeScanType for LoggedRows {
    fn column_type_scan_type(&self, index: usize) -> ScanType {
        self.inner
            .as_column_type_scan_type()
            .map_or(ScanType::Any, |c| c.column_type_scan_type(index))
    }
}

impl RowsColumnTypeDatabaseTypeName for LoggedRows {
    fn column_type_database_type_name(&self, index: usize) -> String {
        self.inner
            .as_column_type_database_type_name()
            .map(|c| c.column_type_database_type_name(index))
            .unwrap_or_default()
    }
}

impl RowsColumnTypeLength for LoggedRows {
    fn column_type_length(&self, index: usize) -> Option<i64> {
        self.inner
            .as_column_type_length()
            .and_then(|c| c.column_type_length(index))
    }
}

impl RowsColumnTypeNullable for LoggedRows {
    fn column_type_nullable(&self, index: usize) -> Option<bool> {
        self.inner
            .as_column_type_nullable()
            .and_then(|c| c.column_type_nullable(index))
    }
}

impl RowsColumnTypePrecisionScale for LoggedRows {
    fn column_type_precision_scale(&self, index: usize) -> Option<(i64, i64)> {
        self.inner
            .as_column_type_precision_scale()
            .and_then(|c| c.column_type_precision_scale(index))
    }
}
