//! Hierarchical logger node
//!
//! Each logger carries optional overrides for its severity threshold,
//! destination list, and immediate-flush mode. Anything not overridden is
//! inherited from the nearest ancestor that sets it. Resolution locks one node
//! at a time and releases it before moving to the parent, so no thread ever
//! holds two logger locks at once.

use super::destination::{guarded_deliver, guarded_flush, DestinationRef};
use super::error::LoggerError;
use super::level::Level;
use super::metrics::should_alert;
use super::record::{Record, RecordBuilder, SourceLocation};
use super::time_source;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Threshold used when no logger in the chain overrides the level.
pub const DEFAULT_LEVEL: Level = Level::Info;

#[derive(Default)]
struct Overrides {
    level: Option<Level>,
    destinations: Option<Vec<DestinationRef>>,
    immediate_flush: Option<bool>,
}

pub struct Logger {
    name: String,
    /// Set once at construction; the registry owns the strong reference.
    parent: Weak<Logger>,
    overrides: Mutex<Overrides>,
    dropped_records: AtomicU64,
    destination_failures: AtomicU64,
}

impl Logger {
    /// Create a logger with no parent.
    ///
    /// Loggers obtained from a [`LoggerRegistry`](crate::core::LoggerRegistry)
    /// are linked into the hierarchy automatically; a standalone logger only
    /// sees its own overrides and the process defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parent_link(name.into(), Weak::new())
    }

    /// Create a logger that inherits from `parent`.
    #[must_use]
    pub fn child_of(name: impl Into<String>, parent: &Arc<Logger>) -> Self {
        Self::with_parent_link(name.into(), Arc::downgrade(parent))
    }

    fn with_parent_link(name: String, parent: Weak<Logger>) -> Self {
        Self {
            name,
            parent,
            overrides: Mutex::new(Overrides::default()),
            dropped_records: AtomicU64::new(0),
            destination_failures: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent logger, if any is still alive.
    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.parent.upgrade()
    }

    /// Walk from this node upward and return the first override `pick` finds.
    fn resolve<T>(&self, pick: impl Fn(&Overrides) -> Option<T>) -> Option<T> {
        let found = pick(&self.overrides.lock());
        if found.is_some() {
            return found;
        }

        let mut next = self.parent.upgrade();
        while let Some(node) = next {
            let found = pick(&node.overrides.lock());
            if found.is_some() {
                return found;
            }
            next = node.parent.upgrade();
        }
        None
    }

    // ---- severity threshold ----

    pub fn set_level(&self, level: Level) {
        self.overrides.lock().level = Some(level);
    }

    pub fn clear_level_override(&self) {
        self.overrides.lock().level = None;
    }

    /// This logger's own override, ignoring ancestors.
    pub fn level_override(&self) -> Option<Level> {
        self.overrides.lock().level
    }

    pub fn effective_level(&self) -> Level {
        self.resolve(|o| o.level).unwrap_or(DEFAULT_LEVEL)
    }

    /// Whether a record at `level` would pass this logger's threshold.
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    // ---- destinations ----

    /// Replace the destination list and mark it overridden.
    pub fn set_destinations(&self, destinations: Vec<DestinationRef>) {
        self.overrides.lock().destinations = Some(destinations);
    }

    /// Append one destination, starting an override if none was active.
    ///
    /// An empty override list is started even if an ancestor has
    /// destinations; inherited ones are not copied in.
    pub fn add_destination(&self, destination: DestinationRef) {
        self.overrides
            .lock()
            .destinations
            .get_or_insert_with(Vec::new)
            .push(destination);
    }

    pub fn clear_destination_override(&self) {
        self.overrides.lock().destinations = None;
    }

    /// Snapshot of the resolved destination list.
    pub fn effective_destinations(&self) -> Vec<DestinationRef> {
        self.resolve(|o| o.destinations.clone()).unwrap_or_default()
    }

    // ---- immediate flush ----

    pub fn set_immediate_flush(&self, enabled: bool) {
        self.overrides.lock().immediate_flush = Some(enabled);
    }

    pub fn clear_immediate_flush_override(&self) {
        self.overrides.lock().immediate_flush = None;
    }

    pub fn effective_immediate_flush(&self) -> bool {
        self.resolve(|o| o.immediate_flush).unwrap_or(false)
    }

    // ---- logging ----

    /// Route `record` to every effective destination.
    ///
    /// Never fails: records below the threshold are counted in
    /// [`dropped_records_count`](Self::dropped_records_count), and each
    /// destination error or panic is counted without stopping delivery to the
    /// rest of the list.
    pub fn log(&self, record: &Record) {
        if record.level() < self.effective_level() {
            self.dropped_records.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.dispatch(record);
    }

    /// Deliver to every effective destination; the threshold was already checked.
    fn dispatch(&self, record: &Record) {
        let destinations = self.effective_destinations();
        let immediate_flush = self.effective_immediate_flush();

        for destination in &destinations {
            let result = guarded_deliver(destination.as_ref(), record).and_then(|()| {
                if immediate_flush {
                    guarded_flush(destination.as_ref())
                } else {
                    Ok(())
                }
            });
            if let Err(e) = result {
                self.destination_failed(destination, &e);
            }
        }
    }

    /// Flush every effective destination, counting failures.
    pub fn flush(&self) {
        for destination in &self.effective_destinations() {
            if let Err(e) = guarded_flush(destination.as_ref()) {
                self.destination_failed(destination, &e);
            }
        }
    }

    fn destination_failed(&self, destination: &DestinationRef, error: &LoggerError) {
        let previous = self.destination_failures.fetch_add(1, Ordering::Relaxed);
        if should_alert(previous) {
            eprintln!(
                "[LOGGER ERROR] Logger '{}': destination '{}' failed ({} failures so far): {}",
                self.name,
                destination.name(),
                previous + 1,
                error
            );
        }
    }

    /// Start a record owned by this logger, stamped from the process-wide
    /// time source and located at the caller.
    #[track_caller]
    pub fn record(&self, level: Level, message: impl Into<String>) -> RecordBuilder {
        Record::builder(level, message)
            .logger(self.name.as_str())
            .source_location(SourceLocation::caller())
            .stamp(time_source::current().as_ref())
    }

    /// Build and log a record at `location`.
    ///
    /// Filtered records are counted without being materialized.
    pub fn emit(&self, level: Level, message: impl Into<String>, location: SourceLocation) {
        if !self.is_enabled(level) {
            self.record_filtered();
            return;
        }
        self.emit_enabled(level, message, location);
    }

    /// Build and deliver a record whose level the caller has already checked
    /// with [`is_enabled`](Self::is_enabled). Used by the logging macros.
    #[doc(hidden)]
    pub fn emit_enabled(&self, level: Level, message: impl Into<String>, location: SourceLocation) {
        let record = Record::builder(level, message)
            .logger(self.name.as_str())
            .source_location(location)
            .stamp(time_source::current().as_ref())
            .build();
        self.dispatch(&record);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Level::Debug, message, SourceLocation::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message, SourceLocation::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Level::Warn, message, SourceLocation::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message, SourceLocation::caller());
    }

    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.emit(Level::Fatal, message, SourceLocation::caller());
    }

    // ---- counters ----

    /// Count one record suppressed before it was built. Used by the logging
    /// macros, which skip formatting for disabled levels.
    #[doc(hidden)]
    pub fn record_filtered(&self) {
        self.dropped_records.fetch_add(1, Ordering::Relaxed);
    }

    /// Records suppressed by the severity threshold.
    pub fn dropped_records_count(&self) -> u64 {
        self.dropped_records.load(Ordering::Relaxed)
    }

    /// Failed or panicking destination calls made by this logger.
    pub fn destination_failures_count(&self) -> u64 {
        self.destination_failures.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overrides = self.overrides.lock();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("parent", &self.parent.upgrade().map(|p| p.name.clone()))
            .field("level", &overrides.level)
            .field(
                "destinations",
                &overrides.destinations.as_ref().map(Vec::len),
            )
            .field("immediate_flush", &overrides.immediate_flush)
            .finish()
    }
}
