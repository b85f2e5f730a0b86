//! Leveled logger that writes one JSON object per line.
//!
//! Each entry looks like
//! `{"time":1700000000,"level":"INFO","message":"...","properties":{...}}`.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
    /// Drops everything.
    Off,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Off => "OFF",
        };
        f.write_str(name)
    }
}

#[derive(Serialize)]
struct Entry<'a> {
    time: u64,
    level: String,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a Map<String, Value>>,
}

/// Cloneable handle; clones share the same writer.
#[derive(Clone)]
pub struct Logger {
    min_level: Level,
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Logger {
    pub fn new(out: Box<dyn Write + Send>, min_level: Level) -> Self {
        Self {
            min_level,
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn stderr(min_level: Level) -> Self {
        Self::new(Box::new(io::stderr()), min_level)
    }

    /// A logger that writes nothing.
    pub fn disabled() -> Self {
        Self::new(Box::new(io::sink()), Level::Off)
    }

    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Off && level >= self.min_level
    }

    pub fn debug(&self, message: &str, properties: Value) {
        self.print(Level::Debug, message, properties);
    }

    pub fn info(&self, message: &str, properties: Value) {
        self.print(Level::Info, message, properties);
    }

    pub fn warning(&self, message: &str, properties: Value) {
        self.print(Level::Warning, message, properties);
    }

    pub fn error(&self, err: &dyn Error, properties: Value) {
        self.print(Level::Error, "an error occurred", with_error(err, properties));
    }

    pub fn fatal(&self, err: &dyn Error, properties: Value) {
        self.print(Level::Fatal, "a fatal error occurred", with_error(err, properties));
    }

    fn print(&self, level: Level, message: &str, properties: Value) {
        if !self.enabled(level) {
            return;
        }

        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let properties = match &properties {
            Value::Object(map) if !map.is_empty() => Some(map),
            _ => None,
        };
        let entry = Entry {
            time,
            level: level.to_string(),
            message,
            properties,
        };

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => format!("{} unable to marshal log message: {e}", Level::Error),
        };

        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{line}");
        }
    }
}

fn with_error(err: &dyn Error, properties: Value) -> Value {
    let mut map = match properties {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("details".to_string(), other);
            map
        }
    };
    map.insert("error".to_string(), Value::String(err.to_string()));
    Value::Object(map)
}
