//! Pattern-based text rendering of records
//!
//! Patterns are plain text with `{token}` placeholders:
//!
//! | Token        | Renders                                   |
//! |--------------|-------------------------------------------|
//! | `{level}`    | `DEBUG`, `INFO`, `WARN`, `ERROR`, `FATAL` |
//! | `{sim}`      | simulation time, seconds, 6 decimals      |
//! | `{met}`      | mission-elapsed time, seconds, 6 decimals |
//! | `{wall_ns}`  | monotonic wall time in nanoseconds        |
//! | `{thread}`   | producing thread identity                 |
//! | `{file}`     | source file                               |
//! | `{line}`     | source line                               |
//! | `{function}` | source function or module path            |
//! | `{logger}`   | owning logger name                        |
//! | `{msg}`      | message text                              |
//! | `{tags}`     | tags as space-separated `key=value`       |
//!
//! Unknown tokens and an unmatched `{` are copied to the output verbatim.

use super::error::{LoggerError, Result};
use super::record::Record;
use std::fmt::Write;

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "{met} {level} [{logger}] {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Level,
    Sim,
    Met,
    WallNs,
    Thread,
    File,
    Line,
    Function,
    Logger,
    Msg,
    Tags,
}

impl Token {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "level" => Token::Level,
            "sim" => Token::Sim,
            "met" => Token::Met,
            "wall_ns" => Token::WallNs,
            "thread" => Token::Thread,
            "file" => Token::File,
            "line" => Token::Line,
            "function" => Token::Function,
            "logger" => Token::Logger,
            "msg" => Token::Msg,
            "tags" => Token::Tags,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// Compiled pattern.
///
/// # Example
///
/// ```
/// use sim_logger::prelude::*;
///
/// let formatter = PatternFormatter::new("{met} {level} [{logger}] {msg} {unknown}");
/// let record = Record::builder(Level::Warn, "low fuel")
///     .logger("vehicle1")
///     .times(Timestamps::new(10.0, 1.5, 0))
///     .build();
///
/// assert_eq!(formatter.format(&record), "1.500000 WARN [vehicle1] low fuel {unknown}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    pattern: String,
    segments: Vec<Segment>,
}

impl PatternFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = compile(&pattern);
        Self { pattern, segments }
    }

    /// Like [`new`](Self::new), but rejects patterns without `{met}`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::FormatterError`] if `{met}` is missing.
    pub fn with_required_met(pattern: impl Into<String>) -> Result<Self> {
        let formatter = Self::new(pattern);
        if !formatter.has_met() {
            return Err(LoggerError::formatter(
                "pattern",
                format!("required token '{{met}}' missing from \"{}\"", formatter.pattern),
            ));
        }
        Ok(formatter)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_met(&self) -> bool {
        self.segments.contains(&Segment::Token(Token::Met))
    }

    pub fn format(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message().len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => render(&mut out, *token, record),
            }
        }
        out
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

fn compile(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unmatched '{': the remainder is literal.
            literal.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let name = &after[..close];
        match Token::parse(name) {
            Some(token) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Token(token));
            }
            None => {
                literal.push('{');
                literal.push_str(name);
                literal.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn render(out: &mut String, token: Token, record: &Record) {
    // Writing into a String cannot fail.
    let _ = match token {
        Token::Level => write!(out, "{}", record.level().to_str()),
        Token::Sim => write!(out, "{:.6}", record.sim_time()),
        Token::Met => write!(out, "{:.6}", record.mission_elapsed()),
        Token::WallNs => write!(out, "{}", record.wall_time_ns()),
        Token::Thread => write!(out, "{}", record.thread_id()),
        Token::File => write!(out, "{}", record.file()),
        Token::Line => write!(out, "{}", record.line()),
        Token::Function => write!(out, "{}", record.function()),
        Token::Logger => write!(out, "{}", record.logger_name()),
        Token::Msg => write!(out, "{}", record.message()),
        Token::Tags => {
            for (i, tag) in record.tags().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(&tag.key);
                out.push('=');
                out.push_str(&tag.value);
            }
            Ok(())
        }
    };
}
