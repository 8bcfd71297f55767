//! Name-to-logger registry
//!
//! Names are dot-segmented. Requesting `"a.b.c"` creates and links `"a"`,
//! `"a.b"` and `"a.b.c"` as needed; every top-level segment hangs off the
//! implicit `"root"` logger.

use super::logger::Logger;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Name of the logger at the top of every hierarchy.
pub const ROOT_LOGGER_NAME: &str = "root";

static GLOBAL_REGISTRY: OnceLock<LoggerRegistry> = OnceLock::new();

/// Canonical form of a logger name: surrounding dots trimmed, empty means root.
fn normalize(name: &str) -> &str {
    let trimmed = name.trim_matches('.');
    if trimmed.is_empty() {
        ROOT_LOGGER_NAME
    } else {
        trimmed
    }
}

/// Parent of an already normalized name, or `None` for the root.
fn parent_name(name: &str) -> Option<&str> {
    if name == ROOT_LOGGER_NAME {
        return None;
    }
    match name.rfind('.') {
        Some(idx) => Some(normalize(&name[..idx])),
        None => Some(ROOT_LOGGER_NAME),
    }
}

/// Owns the one strong reference to every logger it created.
///
/// # Example
///
/// ```
/// use sim_logger::prelude::*;
/// use std::sync::Arc;
///
/// let registry = LoggerRegistry::new();
/// let capture = Arc::new(CaptureDestination::new());
///
/// registry.get_logger("vehicle1").add_destination(capture.clone());
/// registry.get_logger("vehicle1").set_level(Level::Warn);
///
/// let child = registry.get_logger("vehicle1.propulsion");
/// child.info("suppressed");
/// child.error("delivered");
///
/// assert_eq!(capture.len(), 1);
/// ```
pub struct LoggerRegistry {
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// An empty registry, independent of the process-wide one.
    pub fn new() -> Self {
        Self {
            loggers: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static LoggerRegistry {
        GLOBAL_REGISTRY.get_or_init(LoggerRegistry::new)
    }

    /// Return the logger for `name`, creating it and any missing ancestors.
    ///
    /// Concurrent calls with the same name return the same instance.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let name = normalize(name);

        let existing = self.loggers.lock().get(name).cloned();
        if let Some(logger) = existing {
            return logger;
        }

        // Ancestors are resolved without holding the map lock.
        let parent = parent_name(name).map(|p| self.get_logger(p));
        let candidate = Arc::new(match &parent {
            Some(parent) => Logger::child_of(name, parent),
            None => Logger::new(name),
        });

        // Another thread may have won the race; keep its instance.
        let mut loggers = self.loggers.lock();
        Arc::clone(loggers.entry(name.to_string()).or_insert(candidate))
    }

    pub fn root(&self) -> Arc<Logger> {
        self.get_logger(ROOT_LOGGER_NAME)
    }

    /// Whether a logger with this name has been created.
    pub fn contains(&self, name: &str) -> bool {
        self.loggers.lock().contains_key(normalize(name))
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.lock().is_empty()
    }

    /// Names of every registered logger, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every logger. Handles held elsewhere keep working but lose their
    /// parents once nothing else references them.
    pub fn clear(&self) {
        self.loggers.lock().clear();
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
