//! Output format configuration for records
//!
//! Provides different renderings for text-oriented destinations:
//! - Pattern: `{token}` substitution (default)
//! - Json: one JSON object per record
//! - Logfmt: key=value pairs compatible with log aggregation tools

use super::pattern::PatternFormatter;
use super::record::Record;

/// How a destination turns a record into one line of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pattern-based text
    ///
    /// Example: `1.500000 INFO [vehicle1] Engine started`
    Pattern(PatternFormatter),

    /// JSON format for machine processing
    ///
    /// Example: `{"level":"INFO","sim_time":10.0,"mission_elapsed":1.5,...,"message":"Engine started"}`
    Json,

    /// Logfmt format (key=value pairs)
    ///
    /// Example: `sim=10.000000 met=1.500000 wall_ns=42 level=INFO logger=vehicle1 thread=main message="Engine started"`
    Logfmt,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Pattern(PatternFormatter::default())
    }
}

impl From<PatternFormatter> for OutputFormat {
    fn from(formatter: PatternFormatter) -> Self {
        OutputFormat::Pattern(formatter)
    }
}

impl OutputFormat {
    /// Shorthand for `OutputFormat::Pattern(PatternFormatter::new(pattern))`.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        OutputFormat::Pattern(PatternFormatter::new(pattern))
    }

    /// Format a record according to this output format
    pub fn format(&self, record: &Record) -> String {
        match self {
            OutputFormat::Pattern(formatter) => formatter.format(record),
            OutputFormat::Json => format_json(record),
            OutputFormat::Logfmt => format_logfmt(record),
        }
    }
}

fn format_json(record: &Record) -> String {
    // Records hold only strings and numbers; serialization cannot fail short
    // of a non-finite float, which serde_json writes as null anyway.
    serde_json::to_string(record).unwrap_or_default()
}

fn format_logfmt(record: &Record) -> String {
    let mut parts = vec![
        format!("sim={:.6}", record.sim_time()),
        format!("met={:.6}", record.mission_elapsed()),
        format!("wall_ns={}", record.wall_time_ns()),
        format!("level={}", record.level().to_str()),
        format!("logger={}", escape_value(record.logger_name())),
        format!("thread={}", escape_value(record.thread_id())),
    ];

    if !record.file().is_empty() {
        parts.push(format!("file={}", escape_value(record.file())));
        parts.push(format!("line={}", record.line()));
    }
    if !record.function().is_empty() {
        parts.push(format!("function={}", escape_value(record.function())));
    }

    // Always quoted for safety
    parts.push(format!("message={}", quote_value(record.message())));

    for tag in record.tags() {
        parts.push(format!("{}={}", escape_key(&tag.key), escape_value(&tag.value)));
    }

    parts.join(" ")
}

/// Remove spaces and special chars from a logfmt key
fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Quote a logfmt value if it contains spaces, quotes, or `=`
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=']) {
        quote_value(value)
    } else {
        value.to_string()
    }
}

fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use crate::core::time_source::Timestamps;

    fn sample() -> Record {
        Record::builder(Level::Warn, "Low \"fuel\"")
            .logger("vehicle1")
            .location("tank.rs", 7, "check")
            .times(Timestamps::new(10.0, 1.5, 42))
            .thread("main", None)
            .tag("tank", "aft 2")
            .build()
    }

    #[test]
    fn test_pattern_format() {
        let format = OutputFormat::pattern("{level} {msg}");
        assert_eq!(format.format(&sample()), "WARN Low \"fuel\"");
    }

    #[test]
    fn test_json_format() {
        let result = OutputFormat::Json.format(&sample());

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["message"], "Low \"fuel\"");
        assert_eq!(parsed["logger_name"], "vehicle1");
        assert_eq!(parsed["mission_elapsed"], 1.5);
        assert_eq!(parsed["wall_time_ns"], 42);
        assert_eq!(parsed["file"], "tank.rs");
        assert_eq!(parsed["line"], 7);
        assert_eq!(parsed["tags"][0]["key"], "tank");
        assert!(!result.contains('\n'));
    }

    #[test]
    fn test_logfmt_format() {
        let result = OutputFormat::Logfmt.format(&sample());

        assert!(result.contains("met=1.500000"));
        assert!(result.contains("level=WARN"));
        assert!(result.contains("logger=vehicle1"));
        assert!(result.contains("file=tank.rs line=7"));
        assert!(result.contains(r#"message="Low \"fuel\"""#));
        assert!(result.contains("tank=\"aft 2\""));
    }

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert_eq!(format, OutputFormat::Pattern(PatternFormatter::default()));
    }
}
