//! Logging macros for ergonomic log message formatting.
//!
//! These macros format like `format!`, capture `file!()`, `line!()` and
//! `module_path!()` as the record's source location, and skip formatting
//! entirely when the level is filtered out.
//!
//! # Examples
//!
//! ```
//! use sim_logger::prelude::*;
//! use sim_logger::info;
//!
//! let registry = LoggerRegistry::new();
//! let logger = registry.get_logger("vehicle1.propulsion");
//!
//! // Basic logging
//! info!(logger, "Engine armed");
//!
//! // With format arguments
//! let stage = 2;
//! info!(logger, "Stage {} ignition", stage);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use sim_logger::prelude::*;
/// # let logger = Logger::new("nav");
/// use sim_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let __logger = &$logger;
        let __level: $crate::Level = $level;
        if __logger.is_enabled(__level) {
            __logger.emit_enabled(
                __level,
                format!($($arg)+),
                $crate::SourceLocation::new(file!(), line!(), module_path!()),
            );
        } else {
            __logger.record_filtered();
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use sim_logger::prelude::*;
/// # let logger = Logger::new("nav");
/// # logger.set_level(Level::Debug);
/// use sim_logger::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use sim_logger::prelude::*;
/// # let logger = Logger::new("nav");
/// use sim_logger::warn;
/// warn!(logger, "Low fuel");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use sim_logger::prelude::*;
/// # let logger = Logger::new("nav");
/// use sim_logger::fatal;
/// fatal!(logger, "Unable to recover: {}", "guidance lost");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Level, Logger};
    use crate::destinations::CaptureDestination;
    use std::sync::Arc;

    fn logger() -> (Logger, Arc<CaptureDestination>) {
        let logger = Logger::new("macros");
        let capture = Arc::new(CaptureDestination::new());
        logger.add_destination(capture.clone());
        logger.set_level(Level::Debug);
        (logger, capture)
    }

    #[test]
    fn test_log_macro() {
        let (logger, capture) = logger();
        log!(logger, Level::Info, "Test message");
        log!(logger, Level::Info, "Formatted: {}", 42);

        assert_eq!(capture.messages(), vec!["Test message", "Formatted: 42"]);
    }

    #[test]
    fn test_macros_capture_location() {
        let (logger, capture) = logger();
        warn!(logger, "located");

        let record = &capture.snapshot()[0];
        assert!(record.file().ends_with("macros.rs"));
        assert!(record.line() > 0);
        assert!(record.function().contains("macros"));
        assert_eq!(record.logger_name(), "macros");
    }

    #[test]
    fn test_level_macros() {
        let (logger, capture) = logger();
        debug!(logger, "d {}", 1);
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e");
        fatal!(logger, "f");

        let levels: Vec<Level> = capture.snapshot().iter().map(|r| r.level()).collect();
        assert_eq!(levels, Level::ALL.to_vec());
    }

    #[test]
    fn test_filtered_macro_is_counted() {
        let (logger, capture) = logger();
        logger.set_level(Level::Error);
        info!(logger, "never formatted {}", 1);

        assert!(capture.is_empty());
        assert_eq!(logger.dropped_records_count(), 1);
    }

    #[test]
    fn test_macros_accept_arc_logger() {
        let (logger, capture) = logger();
        let shared = Arc::new(logger);
        error!(shared, "through arc");
        assert_eq!(capture.len(), 1);
    }
}
