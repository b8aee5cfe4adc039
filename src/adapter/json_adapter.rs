use std::io::Write;
use std::sync::Mutex;

use crate::driver::Context;
use crate::level::Level;
use crate::logger::{Fields, Logger};

/// Writes one JSON object per event, one event per line.
///
/// The object holds the event fields plus `level` and `message`; those two
/// keys win over event fields of the same name.
pub struct JsonAdapter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonAdapter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Logger for JsonAdapter<W> {
    fn log(&self, _ctx: &Context, level: Level, msg: &str, data: Fields) {
        let mut line: serde_json::Map<String, serde_json::Value> = data.into_iter().collect();
        line.insert("level".to_string(), level.as_str().into());
        line.insert("message".to_string(), msg.into());

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let written = serde_json::to_writer(&mut *writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"));
        if let Err(err) = written {
            tracing::debug!(error = %err, "failed to write log line");
        }
    }
}
