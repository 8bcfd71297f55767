//! JSON logger configuration
//!
//! ```json
//! {
//!   "loggers": {
//!     "root": { "level": "info" },
//!     "vehicle1": { "level": "warn", "immediate_flush": true }
//!   }
//! }
//! ```
//!
//! Absent or `null` fields leave the corresponding override untouched.

use super::error::{LoggerError, Result};
use super::level::Level;
use super::registry::LoggerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Overrides for one named logger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_flush: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Keyed by dotted logger name, applied parents first.
    pub loggers: BTreeMap<String, LoggerConfig>,
}

impl LoggingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation("reading logging config", path.display().to_string(), e)
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Create every named logger in `registry` and set its overrides.
    pub fn apply(&self, registry: &LoggerRegistry) {
        for (name, config) in &self.loggers {
            let logger = registry.get_logger(name);
            if let Some(level) = config.level {
                logger.set_level(level);
            }
            if let Some(enabled) = config.immediate_flush {
                logger.set_immediate_flush(enabled);
            }
        }
    }
}
