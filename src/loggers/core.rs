use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace, Debug, Info, Warn, Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// One structured log line. `ctx` is ordered so output is stable.
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub msg: String,
    pub component: String,
    pub ctx: BTreeMap<String, Value>,
}

/// Where the worker writes serialized records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSink {
    #[default]
    Stdout,
    Stderr,
}
