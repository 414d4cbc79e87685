use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// The unit broadcast by a [`crate::LogStreamEndpoint`] and written by a
/// [`crate::FileSink`] — exactly the wire shape consumers of the log stream
/// expect, one record per WebSocket text frame.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
    pub logger_name: String,
    pub module: String,
    pub func_name: String,
    pub line_no: u32,
}

impl LogRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}
