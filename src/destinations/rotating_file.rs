//! Rotating file destination
//!
//! Writes to a base file and, when the rotation strategy triggers, shifts it
//! into numbered backups: `app.log.1` is always the most recent, up to
//! `app.log.<max_backups>`. Backups may be gzip-compressed (`app.log.1.gz`).

use crate::core::{Destination, LoggerError, OutputFormat, Record, Result};
use chrono::{DateTime, Local, Timelike};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// When to rotate
///
/// # Examples
///
/// ```
/// use sim_logger::destinations::RotationStrategy;
///
/// // Rotate when the file reaches 100 MB
/// let by_size = RotationStrategy::size(100 * 1024 * 1024);
///
/// // Rotate once per day, at the first write after 02:00 local time
/// let daily = RotationStrategy::daily(2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStrategy {
    /// Rotate when file reaches size in bytes
    Size { max_bytes: u64 },

    /// Rotate on the first write of a new local day at or after `hour` (0-23)
    Daily { hour: u8 },

    /// No rotation (useful when external rotation is used)
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl RotationStrategy {
    #[must_use]
    pub fn size(max_bytes: u64) -> Self {
        RotationStrategy::Size { max_bytes }
    }

    /// Hours above 23 are clamped to 23.
    #[must_use]
    pub fn daily(hour: u8) -> Self {
        RotationStrategy::Daily { hour: hour.min(23) }
    }

    #[must_use]
    pub fn never() -> Self {
        RotationStrategy::Never
    }
}

/// Rotation configuration
///
/// # Examples
///
/// ```
/// use sim_logger::destinations::{RotationPolicy, RotationStrategy};
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::daily(0))
///     .with_max_backups(7)
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub strategy: RotationStrategy,
    /// Number of numbered backups to keep; 0 discards the old file
    pub max_backups: usize,
    /// Gzip backups after rotation
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            max_backups: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Equivalent to `with_strategy(RotationStrategy::size(max_bytes))`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

struct State {
    writer: Option<BufWriter<File>>,
    current_size: u64,
    last_rotation: SystemTime,
}

/// File destination that rotates by size or by day.
///
/// # Examples
///
/// ```no_run
/// use sim_logger::destinations::{RotatingFileDestination, RotationPolicy};
///
/// let policy = RotationPolicy::new().with_max_size(50 * 1024 * 1024).with_compression(true);
/// let dest = RotatingFileDestination::with_policy("/var/log/sim/run.log", policy).unwrap();
/// ```
pub struct RotatingFileDestination {
    base_path: PathBuf,
    display_name: String,
    policy: RotationPolicy,
    output_format: OutputFormat,
    state: Mutex<State>,
}

impl RotatingFileDestination {
    /// Create with the default policy (10 MB, 5 backups, uncompressed)
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be opened.
    pub fn with_policy(path: impl AsRef<Path>, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size, last_rotation) = open_base(&base_path)?;

        Ok(Self {
            display_name: format!("rotating_file:{}", base_path.display()),
            base_path,
            policy,
            output_format: OutputFormat::default(),
            state: Mutex::new(State {
                writer: Some(BufWriter::new(file)),
                current_size,
                last_rotation,
            }),
        })
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes written to the current base file
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    /// Path of backup number `index` (1 is the newest), without `.gz`
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Rotate immediately regardless of the strategy.
    pub fn rotate_now(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.rotate(&mut state)
    }

    fn should_rotate(&self, state: &State) -> bool {
        match self.policy.strategy {
            RotationStrategy::Never => false,

            RotationStrategy::Size { max_bytes } => state.current_size >= max_bytes,

            RotationStrategy::Daily { hour } => {
                let now: DateTime<Local> = SystemTime::now().into();
                let last: DateTime<Local> = state.last_rotation.into();
                now.date_naive() != last.date_naive() && now.hour() >= u32::from(hour)
            }
        }
    }

    fn rotate(&self, state: &mut State) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| self.rotation_error("flush before rotation", e))?;
        }

        let result = self.shift_backups();

        // Reopen even if shifting failed so records keep flowing.
        let (file, size, _) = open_base(&self.base_path)?;
        state.writer = Some(BufWriter::new(file));
        state.current_size = size;
        state.last_rotation = SystemTime::now();

        result
    }

    fn shift_backups(&self) -> Result<()> {
        let max = self.policy.max_backups;

        if max == 0 {
            if self.base_path.exists() {
                fs::remove_file(&self.base_path)
                    .map_err(|e| self.rotation_error("discard current log", e))?;
            }
            return Ok(());
        }

        // Oldest backup falls off the end
        for path in [self.backup_path(max), gz_path(&self.backup_path(max))] {
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove oldest backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        for i in (1..max).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            for (from, to) in [(gz_path(&from), gz_path(&to)), (from, to)] {
                if from.exists() {
                    fs::rename(&from, &to).map_err(|e| self.rotation_error("shift backup", e))?;
                }
            }
        }

        if self.base_path.exists() {
            let newest = self.backup_path(1);
            fs::rename(&self.base_path, &newest)
                .map_err(|e| self.rotation_error("move current log to backup", e))?;

            if self.policy.compress {
                compress_file(&newest)?;
            }
        }

        Ok(())
    }

    fn rotation_error(&self, what: &str, e: std::io::Error) -> LoggerError {
        LoggerError::file_rotation(self.base_path.display().to_string(), format!("{}: {}", what, e))
    }
}

impl Destination for RotatingFileDestination {
    fn deliver(&self, record: &Record) -> Result<()> {
        let mut line = self.output_format.format(record);
        if !line.ends_with('\n') {
            line.push('\n');
        }

        let mut state = self.state.lock();

        if self.should_rotate(&state) {
            if let Err(e) = self.rotate(&mut state) {
                // Keep writing to whatever file is open rather than losing records
                eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);
            }
        }

        let writer = state.writer.as_mut().ok_or_else(|| {
            LoggerError::file_destination(self.base_path.display().to_string(), "no open file")
        })?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_destination(self.base_path.display().to_string(), format!("write failed: {}", e))
        })?;
        state.current_size += line.len() as u64;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::file_destination(self.base_path.display().to_string(), format!("flush failed: {}", e))
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.display_name
    }
}

impl Drop for RotatingFileDestination {
    fn drop(&mut self) {
        if let Some(writer) = self.state.get_mut().writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

fn open_base(path: &Path) -> Result<(File, u64, SystemTime)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggerError::file_destination(path.display().to_string(), format!("Failed to open: {}", e)))?;

    let metadata = file.metadata().map_err(|e| {
        LoggerError::file_destination(
            path.display().to_string(),
            format!("Cannot access file metadata: {}", e),
        )
    })?;
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    Ok((file, metadata.len(), modified))
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` into `path.gz` through a temporary file, removing the original
/// only once the compressed copy is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz = gz_path(path);
    let mut tmp = gz.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let compress = || -> std::io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());

        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            encoder.write_all(&buffer[..n])?;
        }
        encoder.finish()?.flush()?;
        fs::rename(&tmp, &gz)
    };

    if let Err(e) = compress() {
        let _ = fs::remove_file(&tmp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Level;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn record(msg: &str) -> Record {
        Record::builder(Level::Info, msg).build()
    }

    fn destination(dir: &TempDir, policy: RotationPolicy) -> RotatingFileDestination {
        RotatingFileDestination::with_policy(dir.path().join("run.log"), policy)
            .unwrap()
            .with_output_format(OutputFormat::pattern("{msg}"))
    }

    #[test]
    fn test_strategy_constructors() {
        assert_eq!(RotationStrategy::size(10), RotationStrategy::Size { max_bytes: 10 });
        assert_eq!(RotationStrategy::daily(99), RotationStrategy::Daily { hour: 23 });
        assert_eq!(RotationStrategy::never(), RotationStrategy::Never);
        assert_eq!(
            RotationStrategy::default(),
            RotationStrategy::Size { max_bytes: 10 * 1024 * 1024 }
        );
    }

    #[test]
    fn test_size_rotation_keeps_newest_first() {
        let dir = TempDir::new().unwrap();
        let dest = destination(&dir, RotationPolicy::new().with_max_size(4).with_max_backups(2));

        // Each line is 5 bytes, so every write after the first rotates.
        for msg in ["aaaa", "bbbb", "cccc", "dddd"] {
            dest.deliver(&record(msg)).unwrap();
        }
        dest.flush().unwrap();

        assert_eq!(fs::read_to_string(dest.path()).unwrap(), "dddd\n");
        assert_eq!(fs::read_to_string(dest.backup_path(1)).unwrap(), "cccc\n");
        assert_eq!(fs::read_to_string(dest.backup_path(2)).unwrap(), "bbbb\n");
        assert!(!dest.backup_path(3).exists());
    }

    #[test]
    fn test_never_strategy() {
        let dir = TempDir::new().unwrap();
        let dest = destination(&dir, RotationPolicy::new().with_strategy(RotationStrategy::Never));

        for _ in 0..100 {
            dest.deliver(&record("line")).unwrap();
        }
        dest.flush().unwrap();

        assert_eq!(dest.current_size(), 500);
        assert!(!dest.backup_path(1).exists());
    }

    #[test]
    fn test_zero_backups_discards() {
        let dir = TempDir::new().unwrap();
        let dest = destination(&dir, RotationPolicy::new().with_max_size(1).with_max_backups(0));

        dest.deliver(&record("old")).unwrap();
        dest.deliver(&record("new")).unwrap();
        dest.flush().unwrap();

        assert_eq!(fs::read_to_string(dest.path()).unwrap(), "new\n");
        assert!(!dest.backup_path(1).exists());
    }

    #[test]
    fn test_compressed_backups() {
        let dir = TempDir::new().unwrap();
        let dest = destination(
            &dir,
            RotationPolicy::new()
                .with_strategy(RotationStrategy::Never)
                .with_max_backups(3)
                .with_compression(true),
        );

        dest.deliver(&record("first")).unwrap();
        dest.rotate_now().unwrap();
        dest.deliver(&record("second")).unwrap();
        dest.rotate_now().unwrap();

        let newest = gz_path(&dest.backup_path(1));
        let older = gz_path(&dest.backup_path(2));
        assert!(newest.exists());
        assert!(older.exists());
        assert!(!dest.backup_path(1).exists());

        let mut text = String::new();
        GzDecoder::new(File::open(&newest).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "second\n");
    }

    #[test]
    fn test_resumes_size_of_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("run.log"), "12345").unwrap();

        let dest = destination(&dir, RotationPolicy::default());
        assert_eq!(dest.current_size(), 5);
        assert!(dest.name().starts_with("rotating_file:"));
    }
}
