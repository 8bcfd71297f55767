//! # Sim Logger
//!
//! A hierarchical logging core for latency-sensitive simulation software.
//!
//! ## Features
//!
//! - **Hierarchical Loggers**: dotted names, per-node overrides for level,
//!   destinations and immediate flush, inherited from the nearest ancestor
//! - **Async Delivery**: bounded queue with Block, DropNewest and DropOldest
//!   overflow policies, one drain thread, and a synchronous flush barrier
//! - **Simulation Time**: every record carries simulation time,
//!   mission-elapsed time and a monotonic wall clock
//! - **Failure Isolation**: destination errors and panics become counters,
//!   never errors at the call site
//!
//! ## Example
//!
//! ```
//! use sim_logger::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = LoggerRegistry::new();
//! let capture = Arc::new(CaptureDestination::new());
//! let pipeline = Arc::new(AsyncPipeline::new(capture.clone(), PipelineOptions::default()).unwrap());
//!
//! let root = registry.root();
//! root.set_level(Level::Warn);
//! root.add_destination(pipeline.clone());
//!
//! let engine = registry.get_logger("vehicle1.propulsion");
//! engine.info("suppressed");
//! engine.error("delivered");
//!
//! pipeline.flush();
//! assert_eq!(capture.len(), 1);
//! ```

pub mod core;
pub mod destinations;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        AsyncPipeline, AsyncPipelineBuilder, Destination, DestinationRef, Level, Logger,
        LoggerError, LoggerRegistry, LoggingConfig, ManualTimeSource, MonotonicTimeSource,
        OutputFormat, OverflowCallback, OverflowPolicy, PatternFormatter, PipelineMetrics,
        PipelineOptions, Record, RecordBuilder, Result, SourceLocation, Tag, TimeSource,
        Timestamps, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::destinations::{
        CaptureDestination, ColorMode, ConsoleDestination, FileDestination,
        RotatingFileDestination, RotationPolicy, RotationStrategy,
    };
}

pub use crate::core::time_source;
pub use crate::core::{
    AsyncPipeline, AsyncPipelineBuilder, Destination, DestinationRef, EnqueueOutcome, Level,
    Logger, LoggerConfig, LoggerError, LoggerRegistry, LoggingConfig, ManualTimeSource,
    MonotonicTimeSource, OutputFormat, OverflowCallback, OverflowPolicy, PatternFormatter,
    PipelineMetrics, PipelineOptions, Record, RecordBuilder, RecordQueue, RejectReason, Result,
    RingBufferQueue, SourceLocation, Tag, TimeSource, Timestamps, WaitOutcome, DEFAULT_LEVEL,
    DEFAULT_PATTERN, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use destinations::{CaptureDestination, ConsoleDestination, FileDestination, RotatingFileDestination};
