//! Configuration file handling for logging options.
//!
//! Loads a `.sqldb_logger.json` file and layers it over an [`Options`] value.
//! Every key is optional; keys that are absent keep the value already in the
//! options. Values that do not parse (an unknown level, a misspelled time
//! format) are ignored the same way, with a debug diagnostic.
//!
//! ```json
//! {
//!   "minimum_level": "info",
//!   "levels": { "prepare": "debug", "query": "info", "exec": "info" },
//!   "fields": { "error": "err", "conn_id": "connection" },
//!   "duration_unit": "us",
//!   "time_format": "rfc3339",
//!   "log_arguments": false,
//!   "uid": "null"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::level::Level;
use crate::options::{DurationUnit, Options, TimeFormat};
use crate::uid::NullUid;

/// Default file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".sqldb_logger.json";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub minimum_level: Option<String>,
    pub levels: LevelsConfig,
    pub fields: FieldsConfig,
    pub duration_unit: Option<String>,
    pub time_format: Option<String>,
    pub log_arguments: Option<bool>,
    pub log_driver_err_skip: Option<bool>,
    pub wrap_result: Option<bool>,
    pub sql_query_as_message: Option<bool>,
    pub include_start_time: Option<bool>,
    /// `"random"` (default generator) or `"null"` (no IDs).
    pub uid: Option<String>,
}

/// Per-kind success levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub prepare: Option<String>,
    pub query: Option<String>,
    pub exec: Option<String>,
}

/// Field name overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    pub error: Option<String>,
    pub duration: Option<String>,
    pub time: Option<String>,
    pub start_time: Option<String>,
    pub query: Option<String>,
    pub args: Option<String>,
    pub conn_id: Option<String>,
    pub stmt_id: Option<String>,
    pub tx_id: Option<String>,
}

impl ConfigFile {
    /// Load `.sqldb_logger.json` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not valid JSON.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidJson` if `json` does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson {
            message: e.to_string(),
        })
    }

    /// Layer this file over `opt`.
    pub fn apply(&self, mut opt: Options) -> Options {
        if let Some(level) = parse_setting::<Level>("minimum_level", &self.minimum_level) {
            opt = opt.with_minimum_level(level);
        }
        if let Some(level) = parse_setting::<Level>("levels.prepare", &self.levels.prepare) {
            opt = opt.with_preparer_level(level);
        }
        if let Some(level) = parse_setting::<Level>("levels.query", &self.levels.query) {
            opt = opt.with_queryer_level(level);
        }
        if let Some(level) = parse_setting::<Level>("levels.exec", &self.levels.exec) {
            opt = opt.with_execer_level(level);
        }
        if let Some(unit) = parse_setting::<DurationUnit>("duration_unit", &self.duration_unit) {
            opt = opt.with_duration_unit(unit);
        }
        if let Some(format) = parse_setting::<TimeFormat>("time_format", &self.time_format) {
            opt = opt.with_time_format(format);
        }

        opt = self.fields.apply(opt);

        if let Some(flag) = self.log_arguments {
            opt = opt.with_log_arguments(flag);
        }
        if let Some(flag) = self.log_driver_err_skip {
            opt = opt.with_log_driver_err_skip(flag);
        }
        if let Some(flag) = self.wrap_result {
            opt = opt.with_wrap_result(flag);
        }
        if let Some(flag) = self.sql_query_as_message {
            opt = opt.with_sql_query_as_message(flag);
        }
        if let Some(flag) = self.include_start_time {
            opt = opt.with_include_start_time(flag);
        }

        match self.uid.as_deref() {
            None | Some("random") => {}
            Some("null") => opt = opt.with_uid_generator(Arc::new(NullUid)),
            Some(other) => tracing::debug!(value = other, "ignoring unknown uid generator"),
        }
        opt
    }
}

impl FieldsConfig {
    fn apply(&self, mut opt: Options) -> Options {
        if let Some(name) = non_empty("fields.error", &self.error) {
            opt = opt.with_error_fieldname(name);
        }
        if let Some(name) = non_empty("fields.duration", &self.duration) {
            opt = opt.with_duration_fieldname(name);
        }
        if let Some(name) = non_empty("fields.time", &self.time) {
            opt = opt.with_time_fieldname(name);
        }
        if let Some(name) = non_empty("fields.start_time", &self.start_time) {
            opt = opt.with_start_time_fieldname(name);
        }
        if let Some(name) = non_empty("fields.query", &self.query) {
            opt = opt.with_sql_query_fieldname(name);
        }
        if let Some(name) = non_empty("fields.args", &self.args) {
            opt = opt.with_sql_args_fieldname(name);
        }
        if let Some(name) = non_empty("fields.conn_id", &self.conn_id) {
            opt = opt.with_connection_id_fieldname(name);
        }
        if let Some(name) = non_empty("fields.stmt_id", &self.stmt_id) {
            opt = opt.with_statement_id_fieldname(name);
        }
        if let Some(name) = non_empty("fields.tx_id", &self.tx_id) {
            opt = opt.with_transaction_id_fieldname(name);
        }
        opt
    }
}

fn parse_setting<T>(key: &str, raw: &Option<String>) -> Option<T>
where
    T: FromStr<Err = String>,
{
    let raw = raw.as_deref()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(reason) => {
            tracing::debug!(key, %reason, "ignoring invalid config value");
            None
        }
    }
}

fn non_empty<'a>(key: &str, raw: &'a Option<String>) -> Option<&'a str> {
    match raw.as_deref() {
        Some("") => {
            tracing::debug!(key, "ignoring empty field name");
            None
        }
        other => other,
    }
}
