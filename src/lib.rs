//! sqldb_logger library - logging decorator for database drivers
//!
//! Wraps any implementation of the [`driver`] contract so that every call
//! (connect, prepare, exec, query, begin, commit, row fetch, ...) emits one
//! structured event to a pluggable [`Logger`], with duration, SQL text,
//! arguments and correlation IDs. Results, errors and capabilities of the
//! wrapped driver pass through unchanged.
//!
//! Start with [`open_driver`]; sinks for `tracing`, `log` and JSON lines live
//! in [`adapter`].

pub mod adapter;
pub mod capabilities;
pub mod config;
pub mod connection;
pub mod connector;
pub mod database;
pub mod driver;
pub mod error;
pub mod fallback;
pub mod level;
pub mod logger;
pub mod message;
pub mod options;
pub mod result;
pub mod rows;
pub mod statement;
pub mod transaction;
pub mod uid;

#[cfg(feature = "driver-cozo")]
pub mod drivers;

pub use config::ConfigFile;
pub use connection::LoggedConnection;
pub use connector::LoggingConnector;
pub use database::{open_driver, Database};
pub use error::{ConfigError, DriverError, DriverResult};
pub use level::Level;
pub use logger::{Fields, LogEvent, Logger};
pub use message::{CallKind, Message};
pub use options::{DurationUnit, Options, TimeFormat};
pub use result::LoggedResult;
pub use rows::LoggedRows;
pub use statement::LoggedStatement;
pub use transaction::LoggedTransaction;
pub use uid::{NullUid, RandomUid, UidGenerator};

#[cfg(test)]
pub mod test_utils;
