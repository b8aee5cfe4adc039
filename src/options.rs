//! Logging policy options.
//!
//! `Options` is built once, before the handle is opened, and never changes
//! afterwards. Each `with_*` method applies one setting; settings are applied
//! in call order, so a later call wins.
//!
//! # Example
//!
//! ```
//! use sqldb_logger::{DurationUnit, Level, Options};
//!
//! let options = Options::default()
//!     .with_minimum_level(Level::Info)
//!     .with_duration_unit(DurationUnit::Microsecond)
//!     .with_log_arguments(false);
//! assert_eq!(options.minimum_level(), Level::Info);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::level::Level;
use crate::message::{CallKind, Message};
use crate::uid::UidGenerator;

/// Unit for the duration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationUnit {
    Nanosecond,
    Microsecond,
    #[default]
    Millisecond,
}

impl DurationUnit {
    pub fn format(&self, duration: Duration) -> f64 {
        let nanos = duration.as_nanos() as f64;
        match self {
            Self::Nanosecond => nanos,
            Self::Microsecond => nanos / 1_000.0,
            Self::Millisecond => nanos / 1_000_000.0,
        }
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" => Ok(Self::Nanosecond),
            "us" | "µs" | "microsecond" => Ok(Self::Microsecond),
            "ms" | "millisecond" => Ok(Self::Millisecond),
            other => Err(format!("invalid duration unit: {}", other)),
        }
    }
}

impl TryFrom<u8> for DurationUnit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nanosecond),
            1 => Ok(Self::Microsecond),
            2 => Ok(Self::Millisecond),
            other => Err(format!("invalid duration unit: {}", other)),
        }
    }
}

/// Rendering of the timestamp fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    Unix,
    UnixNano,
    Rfc3339,
    Rfc3339Nano,
}

impl TimeFormat {
    pub fn format(&self, time: DateTime<Utc>) -> serde_json::Value {
        match self {
            Self::Unix => time.timestamp().into(),
            Self::UnixNano => time
                .timestamp_nanos_opt()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            Self::Rfc3339 => time.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
            Self::Rfc3339Nano => time.to_rfc3339_opts(SecondsFormat::Nanos, true).into(),
        }
    }
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "unixnano" | "unix_nano" => Ok(Self::UnixNano),
            "rfc3339" => Ok(Self::Rfc3339),
            "rfc3339nano" | "rfc3339_nano" => Ok(Self::Rfc3339Nano),
            other => Err(format!("invalid time format: {}", other)),
        }
    }
}

impl TryFrom<u8> for TimeFormat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unix),
            1 => Ok(Self::UnixNano),
            2 => Ok(Self::Rfc3339),
            3 => Ok(Self::Rfc3339Nano),
            other => Err(format!("invalid time format: {}", other)),
        }
    }
}

/// Field names, levels and formatting for every event of one handle.
#[derive(Clone)]
pub struct Options {
    pub(crate) error_fieldname: String,
    pub(crate) duration_fieldname: String,
    pub(crate) time_fieldname: String,
    pub(crate) start_time_fieldname: String,
    pub(crate) sql_query_fieldname: String,
    pub(crate) sql_args_fieldname: String,
    pub(crate) conn_id_fieldname: String,
    pub(crate) stmt_id_fieldname: String,
    pub(crate) tx_id_fieldname: String,
    pub(crate) minimum_level: Level,
    pub(crate) preparer_level: Option<Level>,
    pub(crate) queryer_level: Option<Level>,
    pub(crate) execer_level: Option<Level>,
    pub(crate) duration_unit: DurationUnit,
    pub(crate) time_format: TimeFormat,
    pub(crate) log_args: bool,
    pub(crate) log_driver_err_skip: bool,
    pub(crate) wrap_result: bool,
    pub(crate) sql_query_as_msg: bool,
    pub(crate) include_start_time: bool,
    pub(crate) uid_generator: Option<Arc<dyn UidGenerator>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            error_fieldname: "error".to_string(),
            duration_fieldname: "duration".to_string(),
            time_fieldname: "timestamp".to_string(),
            start_time_fieldname: "start".to_string(),
            sql_query_fieldname: "query".to_string(),
            sql_args_fieldname: "args".to_string(),
            conn_id_fieldname: "conn_id".to_string(),
            stmt_id_fieldname: "stmt_id".to_string(),
            tx_id_fieldname: "tx_id".to_string(),
            minimum_level: Level::Debug,
            preparer_level: None,
            queryer_level: None,
            execer_level: None,
            duration_unit: DurationUnit::Millisecond,
            time_format: TimeFormat::Unix,
            log_args: true,
            log_driver_err_skip: false,
            wrap_result: true,
            sql_query_as_msg: false,
            include_start_time: false,
            uid_generator: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("error_fieldname", &self.error_fieldname)
            .field("duration_fieldname", &self.duration_fieldname)
            .field("time_fieldname", &self.time_fieldname)
            .field("start_time_fieldname", &self.start_time_fieldname)
            .field("sql_query_fieldname", &self.sql_query_fieldname)
            .field("sql_args_fieldname", &self.sql_args_fieldname)
            .field("conn_id_fieldname", &self.conn_id_fieldname)
            .field("stmt_id_fieldname", &self.stmt_id_fieldname)
            .field("tx_id_fieldname", &self.tx_id_fieldname)
            .field("minimum_level", &self.minimum_level)
            .field("preparer_level", &self.preparer_level)
            .field("queryer_level", &self.queryer_level)
            .field("execer_level", &self.execer_level)
            .field("duration_unit", &self.duration_unit)
            .field("time_format", &self.time_format)
            .field("log_args", &self.log_args)
            .field("log_driver_err_skip", &self.log_driver_err_skip)
            .field("wrap_result", &self.wrap_result)
            .field("sql_query_as_msg", &self.sql_query_as_msg)
            .field("include_start_time", &self.include_start_time)
            .field("custom_uid_generator", &self.uid_generator.is_some())
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_fieldname(mut self, name: impl Into<String>) -> Self {
        self.error_fieldname = name.into();
        self
    }

    pub fn with_duration_fieldname(mut self, name: impl Into<String>) -> Self {
        self.duration_fieldname = name.into();
        self
    }

    pub fn with_time_fieldname(mut self, name: impl Into<String>) -> Self {
        self.time_fieldname = name.into();
        self
    }

    pub fn with_start_time_fieldname(mut self, name: impl Into<String>) -> Self {
        self.start_time_fieldname = name.into();
        self
    }

    pub fn with_sql_query_fieldname(mut self, name: impl Into<String>) -> Self {
        self.sql_query_fieldname = name.into();
        self
    }

    pub fn with_sql_args_fieldname(mut self, name: impl Into<String>) -> Self {
        self.sql_args_fieldname = name.into();
        self
    }

    pub fn with_connection_id_fieldname(mut self, name: impl Into<String>) -> Self {
        self.conn_id_fieldname = name.into();
        self
    }

    pub fn with_statement_id_fieldname(mut self, name: impl Into<String>) -> Self {
        self.stmt_id_fieldname = name.into();
        self
    }

    pub fn with_transaction_id_fieldname(mut self, name: impl Into<String>) -> Self {
        self.tx_id_fieldname = name.into();
        self
    }

    pub fn with_minimum_level(mut self, level: Level) -> Self {
        self.minimum_level = level;
        self
    }

    /// Success level for `Prepare` and `PrepareContext`.
    pub fn with_preparer_level(mut self, level: Level) -> Self {
        self.preparer_level = Some(level);
        self
    }

    /// Success level for connection and statement queries.
    pub fn with_queryer_level(mut self, level: Level) -> Self {
        self.queryer_level = Some(level);
        self
    }

    /// Success level for connection and statement execs.
    pub fn with_execer_level(mut self, level: Level) -> Self {
        self.execer_level = Some(level);
        self
    }

    pub fn with_duration_unit(mut self, unit: DurationUnit) -> Self {
        self.duration_unit = unit;
        self
    }

    pub fn with_time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Whether query arguments (and fetched row values) are logged.
    pub fn with_log_arguments(mut self, flag: bool) -> Self {
        self.log_args = flag;
        self
    }

    /// Whether capability-absent (`DriverError::Skip`) events are logged.
    pub fn with_log_driver_err_skip(mut self, flag: bool) -> Self {
        self.log_driver_err_skip = flag;
        self
    }

    /// Whether rows and exec results are wrapped with logging decorators.
    pub fn with_wrap_result(mut self, flag: bool) -> Self {
        self.wrap_result = flag;
        self
    }

    /// Use the query text as the event message instead of a query field.
    pub fn with_sql_query_as_message(mut self, flag: bool) -> Self {
        self.sql_query_as_msg = flag;
        self
    }

    /// Also log when the call started, under the start time field name.
    pub fn with_include_start_time(mut self, flag: bool) -> Self {
        self.include_start_time = flag;
        self
    }

    pub fn with_uid_generator(mut self, generator: Arc<dyn UidGenerator>) -> Self {
        self.uid_generator = Some(generator);
        self
    }

    pub fn minimum_level(&self) -> Level {
        self.minimum_level
    }

    pub fn duration_unit(&self) -> DurationUnit {
        self.duration_unit
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    pub fn log_arguments(&self) -> bool {
        self.log_args
    }

    pub fn wrap_result(&self) -> bool {
        self.wrap_result
    }

    pub fn error_fieldname(&self) -> &str {
        &self.error_fieldname
    }

    pub fn duration_fieldname(&self) -> &str {
        &self.duration_fieldname
    }

    pub fn time_fieldname(&self) -> &str {
        &self.time_fieldname
    }

    pub fn start_time_fieldname(&self) -> &str {
        &self.start_time_fieldname
    }

    pub fn sql_query_fieldname(&self) -> &str {
        &self.sql_query_fieldname
    }

    pub fn sql_args_fieldname(&self) -> &str {
        &self.sql_args_fieldname
    }

    pub fn connection_id_fieldname(&self) -> &str {
        &self.conn_id_fieldname
    }

    pub fn statement_id_fieldname(&self) -> &str {
        &self.stmt_id_fieldname
    }

    pub fn transaction_id_fieldname(&self) -> &str {
        &self.tx_id_fieldname
    }

    /// Override level configured for a call kind, if any.
    pub fn kind_level(&self, kind: CallKind) -> Option<Level> {
        match kind {
            CallKind::Prepare => self.preparer_level,
            CallKind::Query => self.queryer_level,
            CallKind::Exec => self.execer_level,
        }
    }

    /// Override level for the kind `msg` belongs to.
    pub(crate) fn level_override(&self, msg: Message) -> Option<Level> {
        msg.kind().and_then(|kind| self.kind_level(kind))
    }
}
