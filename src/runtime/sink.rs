// SPDX-License-Identifier: MIT

//! Event sink for engine observability
//!
//! The engine and node behaviors report progress as `(level, message)` pairs.
//! Sinks are observers only and never influence control flow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Info => write!(f, "info"),
            EventLevel::Success => write!(f, "success"),
            EventLevel::Warning => write!(f, "warning"),
            EventLevel::Error => write!(f, "error"),
        }
    }
}

/// Receiver for engine events
pub trait EventSink: Send + Sync {
    fn emit(&self, level: EventLevel, message: &str);
}

/// Default sink that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, level: EventLevel, message: &str) {
        match level {
            EventLevel::Info => log::info!("{}", message),
            EventLevel::Success => log::info!("[success] {}", message),
            EventLevel::Warning => log::warn!("{}", message),
            EventLevel::Error => log::error!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(EventLevel::Success.to_string(), "success");
        assert_eq!(EventLevel::Warning.to_string(), "warning");
    }

    #[test]
    fn test_level_serde() {
        let level: EventLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, EventLevel::Error);
        assert_eq!(serde_json::to_string(&EventLevel::Info).unwrap(), "\"info\"");
    }
}
