//! Core logger types and traits

pub mod config;
pub mod destination;
pub mod error;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod overflow_policy;
pub mod pattern;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod registry;
pub mod time_source;

pub use config::{LoggerConfig, LoggingConfig};
pub use destination::{Destination, DestinationRef};
pub use error::{LoggerError, Result};
pub use level::Level;
pub use logger::{Logger, DEFAULT_LEVEL};
pub use metrics::PipelineMetrics;
pub use output_format::OutputFormat;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use pattern::{PatternFormatter, DEFAULT_PATTERN};
pub use pipeline::{AsyncPipeline, AsyncPipelineBuilder, PipelineOptions, DEFAULT_SHUTDOWN_TIMEOUT};
pub use queue::{EnqueueOutcome, RecordQueue, RejectReason, RingBufferQueue, WaitOutcome};
pub use record::{Record, RecordBuilder, SourceLocation, Tag};
pub use registry::{LoggerRegistry, ROOT_LOGGER_NAME};
pub use time_source::{ManualTimeSource, MonotonicTimeSource, TimeSource, Timestamps};
