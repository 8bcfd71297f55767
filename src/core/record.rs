//! Immutable log record

use super::level::Level;
use super::time_source::{TimeSource, Timestamps};
use serde::Serialize;
use std::cell::RefCell;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Key/value tag attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Where in the source a record was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// Location of the caller of a `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line(), "")
    }
}

/// A fully materialized log event.
///
/// Fields are fixed at construction. Records move between threads by
/// cloning; nothing downstream can mutate one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    level: Level,
    sim_time: f64,
    mission_elapsed: f64,
    wall_time_ns: i64,
    thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<String>,
    #[serde(flatten)]
    location: SourceLocation,
    logger_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    message: String,
}

impl Record {
    /// Start building a record. Thread identity defaults to the calling thread.
    pub fn builder(level: Level, message: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(level, message)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn mission_elapsed(&self) -> f64 {
        self.mission_elapsed
    }

    pub fn wall_time_ns(&self) -> i64 {
        self.wall_time_ns
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn file(&self) -> &str {
        &self.location.file
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn function(&self) -> &str {
        &self.location.function
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builder for [`Record`].
///
/// # Example
///
/// ```
/// use sim_logger::core::{Level, ManualTimeSource, Record};
///
/// let clock = ManualTimeSource::new(12.0, 3.5, 42);
/// let record = Record::builder(Level::Warn, "thruster saturated")
///     .logger("vehicle1.propulsion")
///     .location("gnc.rs", 88, "update")
///     .tag("axis", "z")
///     .stamp(&clock)
///     .build();
///
/// assert_eq!(record.mission_elapsed(), 3.5);
/// assert_eq!(record.tags().len(), 1);
/// ```
#[derive(Debug, Clone)]
#[must_use = "a record builder does nothing until `build` is called"]
pub struct RecordBuilder {
    level: Level,
    message: String,
    times: Timestamps,
    thread_id: Option<String>,
    thread_name: Option<String>,
    location: SourceLocation,
    logger_name: String,
    tags: Vec<Tag>,
}

impl RecordBuilder {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            times: Timestamps::default(),
            thread_id: None,
            thread_name: None,
            location: SourceLocation::default(),
            logger_name: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn logger(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    pub fn location(mut self, file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        self.location = SourceLocation::new(file, line, function);
        self
    }

    pub fn source_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Capture the current clocks from `source`.
    pub fn stamp(mut self, source: &dyn TimeSource) -> Self {
        self.times = Timestamps::capture(source);
        self
    }

    pub fn times(mut self, times: Timestamps) -> Self {
        self.times = times;
        self
    }

    /// Override the producing thread identity (for records relayed from
    /// another runtime).
    pub fn thread(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.thread_id = Some(id.into());
        self.thread_name = name;
        self
    }

    pub fn build(self) -> Record {
        let (thread_id, thread_name) = match self.thread_id {
            Some(id) => (id, self.thread_name),
            None => (current_thread_id(), current_thread_name()),
        };

        Record {
            level: self.level,
            sim_time: self.times.sim_time,
            mission_elapsed: self.times.mission_elapsed,
            wall_time_ns: self.times.wall_time_ns,
            thread_id,
            thread_name,
            location: self.location,
            logger_name: self.logger_name,
            tags: self.tags,
            message: self.message,
        }
    }
}
