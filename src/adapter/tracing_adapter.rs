use crate::driver::Context;
use crate::level::Level;
use crate::logger::{Fields, Logger};

use super::fields_to_json;

/// Emits each event as a `tracing` event with the fields under `data`.
///
/// `tracing` targets must be static, so events always use the
/// `sqldb_logger` target; filter on it in the subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAdapter;

impl TracingAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingAdapter {
    fn log(&self, _ctx: &Context, level: Level, msg: &str, data: Fields) {
        let data = fields_to_json(data);
        match level {
            Level::Trace => ::tracing::trace!(target: "sqldb_logger", %data, "{msg}"),
            Level::Debug => ::tracing::debug!(target: "sqldb_logger", %data, "{msg}"),
            Level::Info => ::tracing::info!(target: "sqldb_logger", %data, "{msg}"),
            Level::Error => ::tracing::error!(target: "sqldb_logger", %data, "{msg}"),
        }
    }
}
