//! Log sink contract and the logging policy engine.
//!
//! Decorators never talk to the sink directly. They describe a finished call
//! (message, start time, outcome, extra fields) to a shared [`LogPolicy`],
//! which decides whether the call is logged and builds the payload.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::driver::{Context, Value};
use crate::error::{ConfigError, DriverError, DriverResult};
use crate::level::Level;
use crate::message::Message;
use crate::options::Options;
use crate::uid::{RandomUid, UidGenerator};

/// Structured payload of one event, keyed by configured field names.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// A structured-log sink. Called synchronously after every logged call.
///
/// Implementations must be safe to call from many connections at once.
pub trait Logger: Send + Sync {
    fn log(&self, ctx: &Context, level: Level, msg: &str, data: Fields);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, ctx: &Context, level: Level, msg: &str, data: Fields) {
        (**self).log(ctx, level, msg, data)
    }
}

/// A built event, ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: Level,
    pub message: String,
    pub fields: Fields,
}

/// Strings and byte slices longer than this are truncated in logs.
pub const MAX_ARG_VALUE_LEN: usize = 64;

/// Field name for values fetched by `Rows::next`.
pub const ROWS_DEST_FIELDNAME: &str = "rows_dest";

/// When a call started, on both the monotonic and the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct CallStart {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl CallStart {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

/// Extra data attached to an event. Absent values are dropped.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Field<'a> {
    ConnId(&'a str),
    StmtId(&'a str),
    TxId(&'a str),
    Query(&'a str),
    Args(&'a [Value]),
    RowsDest(&'a [Value]),
}

/// Read-only policy shared by every decorator of one handle.
pub struct LogPolicy {
    logger: Arc<dyn Logger>,
    opt: Options,
    uid: Arc<dyn UidGenerator>,
}

impl LogPolicy {
    /// Resolve the ID generator and freeze the options.
    ///
    /// # Errors
    /// Fails only when no generator is configured and the default one cannot
    /// be seeded.
    pub fn new(logger: Arc<dyn Logger>, opt: Options) -> Result<Self, ConfigError> {
        let uid = match &opt.uid_generator {
            Some(generator) => generator.clone(),
            None => Arc::new(RandomUid::new()?) as Arc<dyn UidGenerator>,
        };
        Ok(Self { logger, opt, uid })
    }

    pub fn options(&self) -> &Options {
        &self.opt
    }

    pub fn unique_id(&self) -> String {
        self.uid.unique_id()
    }

    /// Success level for `msg`: the per-kind override, else the catalog.
    pub fn resolve_level(&self, msg: Message) -> Level {
        self.opt
            .level_override(msg)
            .unwrap_or_else(|| msg.default_level())
    }

    /// Minimum-level and skip filtering. Skip events answer only to their
    /// own toggle.
    pub fn should_log(&self, level: Level, err: Option<&DriverError>) -> bool {
        if err.is_some_and(DriverError::is_skip) {
            return self.opt.log_driver_err_skip;
        }
        level >= self.opt.minimum_level
    }

    pub(crate) fn build_event(
        &self,
        level: Level,
        msg: Message,
        start: CallStart,
        err: Option<&DriverError>,
        fields: &[Field<'_>],
    ) -> LogEvent {
        let opt = &self.opt;
        let mut message = msg.as_str().to_string();
        let mut data = Fields::new();

        data.insert(
            opt.time_fieldname.clone(),
            opt.time_format.format(Utc::now()),
        );
        data.insert(
            opt.duration_fieldname.clone(),
            opt.duration_unit.format(start.instant.elapsed()).into(),
        );
        if opt.include_start_time {
            data.insert(
                opt.start_time_fieldname.clone(),
                opt.time_format.format(start.wall),
            );
        }
        if let Some(err) = err {
            data.insert(opt.error_fieldname.clone(), err.to_string().into());
        }

        for field in fields {
            match *field {
                Field::ConnId(id) => insert_uid(&mut data, &opt.conn_id_fieldname, id),
                Field::StmtId(id) => insert_uid(&mut data, &opt.stmt_id_fieldname, id),
                Field::TxId(id) => insert_uid(&mut data, &opt.tx_id_fieldname, id),
                Field::Query(query) if opt.sql_query_as_msg => message = query.to_string(),
                Field::Query(query) => {
                    data.insert(opt.sql_query_fieldname.clone(), query.into());
                }
                Field::Args(args) => {
                    if opt.log_args && !args.is_empty() {
                        data.insert(opt.sql_args_fieldname.clone(), parse_args(args).into());
                    }
                }
                Field::RowsDest(values) => {
                    if opt.log_args && !values.is_empty() {
                        data.insert(ROWS_DEST_FIELDNAME.to_string(), parse_args(values).into());
                    }
                }
            }
        }

        LogEvent {
            level,
            message,
            fields: data,
        }
    }

    pub(crate) fn log(
        &self,
        ctx: &Context,
        level: Level,
        msg: Message,
        start: CallStart,
        err: Option<&DriverError>,
        fields: &[Field<'_>],
    ) {
        if !self.should_log(level, err) {
            return;
        }
        let event = self.build_event(level, msg, start, err, fields);
        self.logger.log(ctx, event.level, &event.message, event.fields);
    }

    /// Log a completed call: error level on failure, the resolved success
    /// level otherwise.
    pub(crate) fn log_outcome<T>(
        &self,
        ctx: &Context,
        msg: Message,
        start: CallStart,
        outcome: &DriverResult<T>,
        fields: &[Field<'_>],
    ) {
        match outcome {
            Ok(_) => self.log(ctx, self.resolve_level(msg), msg, start, None, fields),
            Err(err) => self.log(ctx, Level::Error, msg, start, Some(err), fields),
        }
    }

    /// Log that the wrapped object lacks the capability behind `msg`.
    pub(crate) fn log_skip(&self, ctx: &Context, msg: Message, fields: &[Field<'_>]) {
        self.log(
            ctx,
            Level::Trace,
            msg,
            CallStart::now(),
            Some(&DriverError::Skip),
            fields,
        );
    }
}

fn insert_uid(data: &mut Fields, key: &str, id: &str) {
    if !id.is_empty() {
        data.insert(key.to_string(), id.into());
    }
}

/// Render arguments for logging, truncating long strings and byte slices.
///
/// Only the logged copy is affected; the driver always receives the
/// original values.
pub fn parse_args(args: &[Value]) -> Vec<serde_json::Value> {
    args.iter().map(value_to_json).collect()
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => (*b).into(),
        Value::Int(i) => (*i).into(),
        Value::Float(f) => (*f).into(),
        Value::Bytes(bytes) => truncate_bytes(bytes).into(),
        Value::Str(s) => truncate_str(s).into(),
        Value::Time(t) => t.to_rfc3339_opts(SecondsFormat::Nanos, true).into(),
    }
}

fn truncate_bytes(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_ARG_VALUE_LEN {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    format!(
        "{} ({} bytes truncated)",
        String::from_utf8_lossy(&bytes[..MAX_ARG_VALUE_LEN]),
        bytes.len() - MAX_ARG_VALUE_LEN
    )
}

fn truncate_str(s: &str) -> String {
    if s.len() <= MAX_ARG_VALUE_LEN {
        return s.to_string();
    }
    // Cut on a char boundary at or below the limit.
    let mut cut = MAX_ARG_VALUE_LEN;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{} ({} bytes truncated)", &s[..cut], s.len() - cut)
}
