//! Severity level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record severity, ordered `Debug < Info < Warn < Error < Fatal`.
///
/// Serializes as the uppercase name and deserializes through [`FromStr`], so
/// configuration files may use any case and the `warning` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Level {
    /// All levels in ascending severity.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Map numeric compatibility values used by existing simulation configs.
    ///
    /// `0` and `1` are Info, `2` Warn, `3` Error and `10` Debug. Anything else
    /// is rejected.
    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            0 | 1 => Some(Level::Info),
            2 => Some(Level::Warn),
            3 => Some(Level::Error),
            10 => Some(Level::Debug),
            _ => None,
        }
    }

    /// Inclusive threshold check.
    #[inline]
    pub fn is_at_least(self, threshold: Level) -> bool {
        self >= threshold
    }

    pub fn color_code(&self) -> Option<colored::Color> {
        use colored::Color::*;
        match self {
            Level::Debug => Some(BrightBlack),
            Level::Info => None,
            Level::Warn => Some(Yellow),
            Level::Error | Level::Fatal => Some(Red),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "FATAL" => Ok(Level::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}
