//! File destination implementation

use crate::core::{Destination, LoggerError, OutputFormat, Record, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one newline-terminated line per record to a file.
///
/// With durable flush enabled, `flush` also asks the OS to persist the data
/// (`sync_data`), which makes it much slower.
#[derive(Debug)]
pub struct FileDestination {
    path: PathBuf,
    display_name: String,
    output_format: OutputFormat,
    durable_flush: bool,
    writer: Mutex<BufWriter<File>>,
}

impl FileDestination {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::FileDestinationError`] if the path is empty or
    /// the file cannot be opened.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(LoggerError::file_destination("", "path must not be empty"));
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_destination(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        Ok(Self {
            display_name: format!("file:{}", path.display()),
            path,
            output_format: OutputFormat::default(),
            durable_flush: false,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_durable_flush(mut self, enabled: bool) -> Self {
        self.durable_flush = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, what: &str, e: std::io::Error) -> LoggerError {
        LoggerError::file_destination(self.path.display().to_string(), format!("{}: {}", what, e))
    }
}

impl Destination for FileDestination {
    fn deliver(&self, record: &Record) -> Result<()> {
        let mut line = self.output_format.format(record);
        if !line.ends_with('\n') {
            line.push('\n');
        }

        self.writer
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| self.io_error("write failed", e))
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush().map_err(|e| self.io_error("flush failed", e))?;
        if self.durable_flush {
            writer
                .get_ref()
                .sync_data()
                .map_err(|e| self.io_error("sync failed", e))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.display_name
    }
}

impl Drop for FileDestination {
    fn drop(&mut self) {
        // Ensure all buffered data reaches the file
        let _ = self.writer.get_mut().flush();
    }
}
