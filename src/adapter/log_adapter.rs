use crate::driver::Context;
use crate::level::Level;
use crate::logger::{Fields, Logger};

use super::{fields_to_json, DEFAULT_TARGET};

/// Forwards events to the `log` facade as `<message> <fields as JSON>`.
#[derive(Debug, Clone)]
pub struct LogAdapter {
    target: String,
}

impl LogAdapter {
    pub fn new() -> Self {
        Self::with_target(DEFAULT_TARGET)
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_log_level(level: Level) -> log::Level {
    match level {
        Level::Trace => log::Level::Trace,
        Level::Debug => log::Level::Debug,
        Level::Info => log::Level::Info,
        Level::Error => log::Level::Error,
    }
}

impl Logger for LogAdapter {
    fn log(&self, _ctx: &Context, level: Level, msg: &str, data: Fields) {
        let level = to_log_level(level);
        if !log::log_enabled!(target: self.target.as_str(), level) {
            return;
        }
        log::log!(target: self.target.as_str(), level, "{} {}", msg, fields_to_json(data));
    }
}
