//! Console destination implementation

use crate::core::{Destination, LoggerError, OutputFormat, Record, Result};
use colored::Colorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{IsTerminal, Write};

/// Which standard stream a console destination writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// When to color output by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Color only when the stream is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

enum Stream {
    Stdout,
    Stderr,
    Writer(Box<dyn Write + Send>),
}

impl Stream {
    fn is_terminal(&self) -> bool {
        match self {
            Stream::Stdout => std::io::stdout().is_terminal(),
            Stream::Stderr => std::io::stderr().is_terminal(),
            Stream::Writer(_) => false,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Stream::Stdout => std::io::stdout().lock().write_all(bytes),
            Stream::Stderr => std::io::stderr().lock().write_all(bytes),
            Stream::Writer(w) => w.write_all(bytes),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Stream::Stdout => std::io::stdout().flush(),
            Stream::Stderr => std::io::stderr().flush(),
            Stream::Writer(w) => w.flush(),
        }
    }
}

/// Writes one line per record to stdout, stderr, or any writer.
///
/// Lines are colored by severity: warnings yellow, errors and fatals red,
/// debug gray, info uncolored.
///
/// # Example
///
/// ```
/// use sim_logger::destinations::{ColorMode, ConsoleDestination, ConsoleTarget};
/// use sim_logger::OutputFormat;
///
/// let console = ConsoleDestination::new(ConsoleTarget::Stderr)
///     .with_color_mode(ColorMode::Never)
///     .with_output_format(OutputFormat::pattern("{met} {level} {msg}"));
/// ```
pub struct ConsoleDestination {
    output_format: OutputFormat,
    color_mode: ColorMode,
    stream: Mutex<Stream>,
}

impl ConsoleDestination {
    pub fn new(target: ConsoleTarget) -> Self {
        let stream = match target {
            ConsoleTarget::Stdout => Stream::Stdout,
            ConsoleTarget::Stderr => Stream::Stderr,
        };
        Self::with_stream(stream)
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    /// Write to an arbitrary writer. [`ColorMode::Auto`] never colors here.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self::with_stream(Stream::Writer(writer))
    }

    fn with_stream(stream: Stream) -> Self {
        Self {
            output_format: OutputFormat::default(),
            color_mode: ColorMode::default(),
            stream: Mutex::new(stream),
        }
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    fn should_colorize(&self, stream: &Stream) -> bool {
        match self.color_mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stream.is_terminal(),
        }
    }
}

impl Default for ConsoleDestination {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Destination for ConsoleDestination {
    fn deliver(&self, record: &Record) -> Result<()> {
        let line = self.output_format.format(record);
        let line = line.strip_suffix('\n').unwrap_or(&line);

        let mut stream = self.stream.lock();
        let mut output = match record.level().color_code() {
            Some(color) if self.should_colorize(&stream) => line.color(color).to_string(),
            _ => line.to_string(),
        };
        output.push('\n');

        stream
            .write_all(output.as_bytes())
            .map_err(|e| LoggerError::io_operation("writing to console", "write failed", e))
    }

    fn flush(&self) -> Result<()> {
        self.stream
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing console", "flush failed", e))
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Level;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_plain_lines() {
        let buf = SharedBuf::default();
        let console = ConsoleDestination::with_writer(Box::new(buf.clone()))
            .with_output_format(OutputFormat::pattern("{level} {msg}"));

        console.deliver(&Record::builder(Level::Warn, "careful").build()).unwrap();
        console.deliver(&Record::builder(Level::Info, "fine\n").build()).unwrap();
        console.flush().unwrap();

        assert_eq!(buf.text(), "WARN careful\nINFO fine\n");
    }

    #[test]
    fn test_never_mode_has_no_escapes() {
        let buf = SharedBuf::default();
        let console = ConsoleDestination::with_writer(Box::new(buf.clone()))
            .with_color_mode(ColorMode::Never)
            .with_output_format(OutputFormat::pattern("{msg}"));

        console.deliver(&Record::builder(Level::Error, "bad").build()).unwrap();
        assert!(!buf.text().contains('\x1b'));
    }

    #[test]
    fn test_always_mode_keeps_message() {
        let buf = SharedBuf::default();
        let console = ConsoleDestination::with_writer(Box::new(buf.clone()))
            .with_color_mode(ColorMode::Always)
            .with_output_format(OutputFormat::pattern("{msg}"));

        console.deliver(&Record::builder(Level::Fatal, "boom").build()).unwrap();
        let text = buf.text();
        assert!(text.contains("boom"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_color_mode_serde() {
        let mode: ColorMode = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(mode, ColorMode::Always);
        let target: ConsoleTarget = serde_json::from_str("\"stderr\"").unwrap();
        assert_eq!(target, ConsoleTarget::Stderr);
    }
}
