//! Sink adapters to real logging backends.
//!
//! Each adapter implements [`Logger`](crate::Logger) and maps the four
//! levels onto the backend's own. Backends without a trace level log trace
//! events at debug.

mod json_adapter;
mod log_adapter;
mod tracing_adapter;

pub use json_adapter::JsonAdapter;
pub use log_adapter::LogAdapter;
pub use tracing_adapter::TracingAdapter;

use crate::logger::Fields;

/// Target used by the `tracing` and `log` adapters unless overridden.
pub const DEFAULT_TARGET: &str = "sqldb_logger";

/// Render event fields as one JSON object.
pub(crate) fn fields_to_json(data: Fields) -> serde_json::Value {
    serde_json::Value::Object(data.into_iter().collect())
}
