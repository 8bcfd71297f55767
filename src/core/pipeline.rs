//! Asynchronous delivery pipeline
//!
//! Producers copy records into a bounded queue; one dedicated drain thread
//! delivers them to the wrapped destination. `flush()` is a synchronous
//! barrier built on two generation counters: callers bump the requested
//! generation and wait until the drain thread publishes a completed
//! generation at least as large, which it only does after draining the queue
//! and flushing the destination.

use super::destination::{guarded_deliver, guarded_flush, panic_message, Destination, DestinationRef};
use super::error::{LoggerError, Result};
use super::metrics::{should_alert, PipelineMetrics};
use super::overflow_policy::{OverflowCallback, OverflowPolicy};
use super::queue::{EnqueueOutcome, RecordQueue, RejectReason, RingBufferQueue, WaitOutcome};
use super::record::Record;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Default shutdown timeout for pipeline cleanup (5 seconds)
///
/// Used when the pipeline is dropped without explicit shutdown. For custom
/// timeout control, use [`AsyncPipeline::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_THREAD_NAME: &str = "sim-logger-drain";

/// Sizing and overflow behavior of an [`AsyncPipeline`].
///
/// # Example
///
/// ```
/// use sim_logger::{OverflowPolicy, PipelineOptions};
///
/// let options = PipelineOptions::new()
///     .with_capacity(4096)
///     .with_overflow_policy(OverflowPolicy::DropOldest)
///     .with_max_batch(128);
///
/// let from_config: PipelineOptions =
///     serde_json::from_str(r#"{"capacity": 4096, "overflow_policy": "drop_oldest"}"#).unwrap();
/// assert_eq!(from_config.capacity, options.capacity);
/// assert_eq!(from_config.max_batch, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Maximum number of queued records
    pub capacity: usize,
    /// Behavior when the queue is full
    pub overflow_policy: OverflowPolicy,
    /// Maximum number of records drained per dequeue
    pub max_batch: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            capacity: 1024,
            overflow_policy: OverflowPolicy::Block,
            max_batch: 256,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Zero capacity and zero batch size are both clamped to 1.
    fn normalized(self) -> Self {
        Self {
            capacity: self.capacity.max(1),
            max_batch: self.max_batch.max(1),
            ..self
        }
    }
}

struct FlushState {
    completed: u64,
    terminated: bool,
}

/// State shared between the pipeline handle and its drain thread.
struct Shared {
    queue: Box<dyn RecordQueue>,
    destination: DestinationRef,
    max_batch: usize,
    flush_requested: AtomicU64,
    flush_state: Mutex<FlushState>,
    flush_done: Condvar,
    metrics: PipelineMetrics,
    on_overflow: Option<OverflowCallback>,
}

impl Shared {
    fn drain_loop(&self) {
        let mut batch = Vec::with_capacity(self.max_batch);
        let mut last_seen = 0u64;

        loop {
            if self.queue.wait_for_work() == WaitOutcome::Stopped {
                break;
            }

            // Read the requested generation before draining: every record
            // enqueued ahead of that flush call is already in the queue.
            let wanted = self.flush_requested.load(Ordering::Acquire);

            self.drain(&mut batch);

            if wanted != last_seen {
                self.flush_destination();
                last_seen = wanted;
                self.publish(wanted, false);
            }
        }

        // Final best-effort drain; stop guarantees no new records arrive.
        self.drain(&mut batch);
        self.flush_destination();
        let wanted = self.flush_requested.load(Ordering::Acquire);
        self.publish(wanted, true);
    }

    fn drain(&self, batch: &mut Vec<Record>) {
        while self.queue.dequeue_batch(batch, self.max_batch) > 0 {
            for record in batch.drain(..) {
                match guarded_deliver(self.destination.as_ref(), &record) {
                    Ok(()) => {
                        self.metrics.record_delivered();
                    }
                    Err(e) => self.destination_failed("deliver", &e),
                }
            }
        }
    }

    fn flush_destination(&self) {
        if let Err(e) = guarded_flush(self.destination.as_ref()) {
            self.destination_failed("flush", &e);
        }
    }

    fn destination_failed(&self, op: &str, error: &LoggerError) {
        let previous = self.metrics.record_destination_failure();
        if should_alert(previous) {
            eprintln!(
                "[LOGGER ERROR] Async pipeline {} to '{}' failed ({} failures so far): {}",
                op,
                self.destination.name(),
                previous + 1,
                error
            );
        }
    }

    /// Publish a completed generation. Only ever moves forward.
    fn publish(&self, generation: u64, terminated: bool) {
        let mut state = self.flush_state.lock();
        if generation > state.completed {
            state.completed = generation;
            self.metrics.record_flush();
        }
        state.terminated |= terminated;
        self.flush_done.notify_all();
    }

    fn record_drop(&self, outcome: EnqueueOutcome) {
        if matches!(
            outcome,
            EnqueueOutcome::EnqueuedWithEviction | EnqueueOutcome::Rejected(RejectReason::Full)
        ) {
            self.metrics.record_overflow();
        }

        let dropped = u64::from(outcome.dropped());
        if dropped == 0 {
            return;
        }

        let previous = self.metrics.record_dropped(dropped);
        if should_alert(previous) {
            let total = previous + dropped;
            let reason = match outcome {
                EnqueueOutcome::Rejected(RejectReason::Stopped) => "pipeline stopping",
                _ => "queue full",
            };
            eprintln!(
                "[LOGGER WARNING] Async pipeline to '{}' dropped {} records ({}). \
                 Consider increasing capacity or using a different overflow policy.",
                self.destination.name(),
                total,
                reason
            );
            if let Some(ref callback) = self.on_overflow {
                // Runs on the producer thread; a panic must not reach `write`.
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(total))) {
                    eprintln!(
                        "[LOGGER ERROR] Overflow callback for '{}' panicked: {}",
                        self.destination.name(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

/// Wraps a destination so producers never wait on its I/O.
///
/// Producers only wait under [`OverflowPolicy::Block`] with a full queue, or
/// inside [`flush`](AsyncPipeline::flush). Records from one producer reach the
/// destination in the order they were written.
///
/// # Example
///
/// ```
/// use sim_logger::prelude::*;
/// use std::sync::Arc;
///
/// let capture = Arc::new(CaptureDestination::new());
/// let pipeline = AsyncPipeline::new(capture.clone(), PipelineOptions::default()).unwrap();
///
/// pipeline.write(&Record::builder(Level::Info, "queued").build());
/// pipeline.flush();
///
/// assert_eq!(capture.len(), 1);
/// assert!(capture.flush_count() >= 1);
/// ```
pub struct AsyncPipeline {
    shared: Arc<Shared>,
    options: PipelineOptions,
    name: String,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl AsyncPipeline {
    /// Start a pipeline backed by a ring buffer sized from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::WorkerSpawn`] if the drain thread cannot start.
    pub fn new(destination: DestinationRef, options: PipelineOptions) -> Result<Self> {
        Self::builder(destination).options(options).build()
    }

    /// Create a builder for a pipeline around `destination`.
    #[must_use]
    pub fn builder(destination: DestinationRef) -> AsyncPipelineBuilder {
        AsyncPipelineBuilder::new(destination)
    }

    /// Copy `record` onto the queue.
    ///
    /// Never fails; drops (overflow, eviction, shutdown) are counted in
    /// [`dropped_records_count`](Self::dropped_records_count).
    pub fn write(&self, record: &Record) {
        let outcome = self.shared.queue.enqueue(record.clone());
        self.shared.record_drop(outcome);
    }

    /// Wait until everything written before this call has been delivered and
    /// the wrapped destination has been flushed.
    ///
    /// Returns immediately once the pipeline has shut down (its final drain
    /// already ran), and when called from the drain thread itself.
    pub fn flush(&self) {
        if thread::current().id() == self.worker_id {
            return;
        }

        let target = self.shared.flush_requested.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.queue.kick();

        let mut state = self.shared.flush_state.lock();
        while state.completed < target && !state.terminated {
            self.shared.flush_done.wait(&mut state);
        }
    }

    /// Stop accepting records, let the drain thread deliver what is queued,
    /// and wait up to `timeout` for it to finish.
    ///
    /// Returns `true` if the drain thread finished within the timeout. After
    /// a timeout the thread keeps draining in the background.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.shared.queue.request_stop();

        if thread::current().id() == self.worker_id {
            return false;
        }

        // A concurrent caller may already hold the handle; everyone waits
        // for the drain thread to terminate, only the holder joins it.
        let handle = self.worker.lock().take();

        if !self.wait_terminated(Instant::now() + timeout) {
            eprintln!(
                "[LOGGER WARNING] Drain thread for '{}' did not finish within {:?}. \
                 Some records may be delivered late.",
                self.name, timeout
            );
            if let Some(handle) = handle {
                *self.worker.lock() = Some(handle);
            }
            return false;
        }

        let Some(handle) = handle else {
            return true;
        };

        if handle.join().is_err() {
            eprintln!("[LOGGER ERROR] Drain thread for '{}' panicked during shutdown", self.name);
            return false;
        }

        let dropped = self.shared.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Pipeline '{}' shut down with {} dropped records (drop rate: {:.2}%)",
                self.name,
                dropped,
                self.shared.metrics.drop_rate()
            );
        }

        true
    }

    fn wait_terminated(&self, deadline: Instant) -> bool {
        let mut state = self.shared.flush_state.lock();
        while !state.terminated {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.shared.flush_done.wait_for(&mut state, deadline - now);
        }
        true
    }

    /// Records dropped by overflow policy or because the pipeline was stopping.
    pub fn dropped_records_count(&self) -> u64 {
        self.shared.metrics.dropped_count()
    }

    /// Failed or panicking calls to the wrapped destination.
    pub fn destination_failures_count(&self) -> u64 {
        self.shared.metrics.destination_failures()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.shared.metrics
    }

    /// Records currently queued (approximate).
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.queue.is_stop_requested()
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }
}

impl Destination for AsyncPipeline {
    fn deliver(&self, record: &Record) -> Result<()> {
        self.write(record);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        AsyncPipeline::flush(self);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AsyncPipeline {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Builder for [`AsyncPipeline`]
///
/// # Example
/// ```
/// use sim_logger::prelude::*;
/// use std::sync::Arc;
///
/// let pipeline = AsyncPipeline::builder(Arc::new(CaptureDestination::new()))
///     .capacity(64)
///     .overflow_policy(OverflowPolicy::DropNewest)
///     .max_batch(16)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} records dropped", count);
///     }))
///     .thread_name("telemetry-drain")
///     .build()
///     .unwrap();
/// assert_eq!(pipeline.options().capacity, 64);
/// ```
pub struct AsyncPipelineBuilder {
    destination: DestinationRef,
    options: PipelineOptions,
    queue: Option<Box<dyn RecordQueue>>,
    on_overflow: Option<OverflowCallback>,
    thread_name: Option<String>,
}

impl AsyncPipelineBuilder {
    pub fn new(destination: DestinationRef) -> Self {
        Self {
            destination,
            options: PipelineOptions::default(),
            queue: None,
            on_overflow: None,
            thread_name: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.options.overflow_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_batch(mut self, max_batch: usize) -> Self {
        self.options.max_batch = max_batch;
        self
    }

    /// Use a custom queue backend instead of the default ring buffer.
    ///
    /// Capacity and overflow policy then come from the queue itself.
    #[must_use = "builder methods return a new value"]
    pub fn queue(mut self, queue: Box<dyn RecordQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set a callback invoked with the running drop total when the
    /// rate-limited overflow alert fires.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Spawn the drain thread and return the running pipeline.
    pub fn build(self) -> Result<AsyncPipeline> {
        let options = self.options.normalized();
        let queue = self.queue.unwrap_or_else(|| {
            Box::new(RingBufferQueue::new(options.capacity, options.overflow_policy))
        });
        let options = PipelineOptions {
            capacity: queue.capacity(),
            ..options
        };
        let name = format!("async({})", self.destination.name());

        let shared = Arc::new(Shared {
            queue,
            destination: self.destination,
            max_batch: options.max_batch,
            flush_requested: AtomicU64::new(0),
            flush_state: Mutex::new(FlushState {
                completed: 0,
                terminated: false,
            }),
            flush_done: Condvar::new(),
            metrics: PipelineMetrics::new(),
            on_overflow: self.on_overflow,
        });

        let thread_name = self
            .thread_name
            .unwrap_or_else(|| DEFAULT_THREAD_NAME.to_string());
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || worker_shared.drain_loop())
            .map_err(|source| LoggerError::WorkerSpawn {
                name: thread_name,
                source,
            })?;
        let worker_id = handle.thread().id();

        Ok(AsyncPipeline {
            shared,
            options,
            name,
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use crate::destinations::CaptureDestination;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Weak;

    fn record(msg: impl Into<String>) -> Record {
        Record::builder(Level::Info, msg).logger("root").build()
    }

    /// Blocks every delivery until the gate opens, so tests can fill the
    /// queue deterministically.
    struct Gated {
        inner: CaptureDestination,
        open: Mutex<bool>,
        opened: Condvar,
        entered: AtomicUsize,
    }

    impl Gated {
        fn new() -> Self {
            Self {
                inner: CaptureDestination::new(),
                open: Mutex::new(false),
                opened: Condvar::new(),
                entered: AtomicUsize::new(0),
            }
        }

        fn release(&self) {
            *self.open.lock() = true;
            self.opened.notify_all();
        }

        fn wait_entered(&self) {
            while self.entered.load(Ordering::SeqCst) == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    impl Destination for Gated {
        fn deliver(&self, record: &Record) -> Result<()> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            let mut open = self.open.lock();
            while !*open {
                self.opened.wait(&mut open);
            }
            drop(open);
            self.inner.deliver(record)
        }

        fn flush(&self) -> Result<()> {
            self.inner.flush()
        }
    }

    /// Takes a fixed time per record, long enough to observe shutdown races.
    struct Slow {
        inner: CaptureDestination,
        per_record: Duration,
    }

    impl Destination for Slow {
        fn deliver(&self, record: &Record) -> Result<()> {
            thread::sleep(self.per_record);
            self.inner.deliver(record)
        }

        fn flush(&self) -> Result<()> {
            self.inner.flush()
        }
    }

    /// Flushes the pipeline it is attached to from inside `deliver`.
    struct FlushesOwnPipeline {
        inner: CaptureDestination,
        pipeline: Mutex<Weak<AsyncPipeline>>,
    }

    impl Destination for FlushesOwnPipeline {
        fn deliver(&self, record: &Record) -> Result<()> {
            self.inner.deliver(record)?;
            let pipeline = self.pipeline.lock().upgrade();
            if let Some(pipeline) = pipeline {
                pipeline.flush();
            }
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.inner.flush()
        }
    }

    struct AlwaysFails;

    impl Destination for AlwaysFails {
        fn deliver(&self, _record: &Record) -> Result<()> {
            Err(LoggerError::destination("always_fails", "boom"))
        }

        fn flush(&self) -> Result<()> {
            panic!("flush boom");
        }

        fn name(&self) -> &str {
            "always_fails"
        }
    }

    #[test]
    fn test_flush_delivers_everything_written_before_it() {
        let capture = Arc::new(CaptureDestination::new());
        let pipeline = AsyncPipeline::builder(capture.clone())
            .capacity(16)
            .overflow_policy(OverflowPolicy::Block)
            .max_batch(4)
            .build()
            .unwrap();

        for i in 0..100 {
            pipeline.write(&record(format!("m{}", i)));
        }
        pipeline.flush();

        let messages: Vec<String> = capture
            .snapshot()
            .iter()
            .map(|r| r.message().to_string())
            .collect();
        let expected: Vec<String> = (0..100).map(|i| format!("m{}", i)).collect();
        assert_eq!(messages, expected);
        assert!(capture.flush_count() >= 1);
        assert_eq!(pipeline.dropped_records_count(), 0);
        assert_eq!(pipeline.metrics().delivered_count(), 100);
    }

    #[test]
    fn test_flush_on_empty_queue_returns() {
        let capture = Arc::new(CaptureDestination::new());
        let pipeline = AsyncPipeline::new(capture.clone(), PipelineOptions::default()).unwrap();

        pipeline.flush();
        pipeline.flush();

        assert!(capture.is_empty());
        assert!(capture.flush_count() >= 1);
        assert!(pipeline.metrics().flushes_completed() >= 1);
    }

    #[test]
    fn test_concurrent_flushers_all_return() {
        let capture = Arc::new(CaptureDestination::new());
        let pipeline = Arc::new(
            AsyncPipeline::new(capture.clone(), PipelineOptions::new().with_capacity(8)).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pipeline = Arc::clone(&pipeline);
                thread::spawn(move || {
                    for i in 0..50 {
                        pipeline.write(&record(format!("t{}-{}", t, i)));
                        if i % 10 == 0 {
                            pipeline.flush();
                        }
                    }
                    pipeline.flush();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(capture.len(), 200);
    }

    #[test]
    fn test_drop_newest_counts_rejections() {
        let gated = Arc::new(Gated::new());
        let pipeline = AsyncPipeline::builder(gated.clone())
            .capacity(2)
            .overflow_policy(OverflowPolicy::DropNewest)
            .build()
            .unwrap();

        pipeline.write(&record("in-flight"));
        gated.wait_entered();

        pipeline.write(&record("q1"));
        pipeline.write(&record("q2"));
        pipeline.write(&record("rejected"));

        assert_eq!(pipeline.dropped_records_count(), 1);
        assert_eq!(pipeline.metrics().overflow_events(), 1);

        gated.release();
        pipeline.flush();

        let messages: Vec<String> = gated
            .inner
            .snapshot()
            .iter()
            .map(|r| r.message().to_string())
            .collect();
        assert_eq!(messages, vec!["in-flight", "q1", "q2"]);
    }

    #[test]
    fn test_drop_oldest_counts_evictions() {
        let gated = Arc::new(Gated::new());
        let pipeline = AsyncPipeline::builder(gated.clone())
            .capacity(2)
            .overflow_policy(OverflowPolicy::DropOldest)
            .build()
            .unwrap();

        pipeline.write(&record("in-flight"));
        gated.wait_entered();

        for msg in ["a", "b", "c", "d"] {
            pipeline.write(&record(msg));
        }
        assert_eq!(pipeline.dropped_records_count(), 2);

        gated.release();
        pipeline.flush();

        let messages: Vec<String> = gated
            .inner
            .snapshot()
            .iter()
            .map(|r| r.message().to_string())
            .collect();
        assert_eq!(messages, vec!["in-flight", "c", "d"]);
    }

    #[test]
    fn test_overflow_callback_receives_total() {
        let gated = Arc::new(Gated::new());
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);

        let pipeline = AsyncPipeline::builder(gated.clone())
            .capacity(1)
            .overflow_policy(OverflowPolicy::DropNewest)
            .on_overflow(Arc::new(move |total| {
                seen_clone.store(total, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        pipeline.write(&record("in-flight"));
        gated.wait_entered();
        pipeline.write(&record("queued"));
        pipeline.write(&record("dropped"));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        gated.release();
    }

    #[test]
    fn test_panicking_overflow_callback_is_contained() {
        let gated = Arc::new(Gated::new());
        let pipeline = AsyncPipeline::builder(gated.clone())
            .capacity(1)
            .overflow_policy(OverflowPolicy::DropNewest)
            .on_overflow(Arc::new(|_| panic!("callback boom")))
            .build()
            .unwrap();

        pipeline.write(&record("in-flight"));
        gated.wait_entered();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            for i in 0..5 {
                pipeline.write(&record(format!("w{}", i)));
            }
        }));

        assert!(result.is_ok(), "callback panic escaped write");
        assert_eq!(pipeline.dropped_records_count(), 4);

        gated.release();
        pipeline.flush();
        assert_eq!(gated.inner.len(), 2);
    }

    #[test]
    fn test_flush_from_drain_thread_returns() {
        let dest = Arc::new(FlushesOwnPipeline {
            inner: CaptureDestination::new(),
            pipeline: Mutex::new(Weak::new()),
        });
        let pipeline = Arc::new(AsyncPipeline::new(dest.clone(), PipelineOptions::default()).unwrap());
        *dest.pipeline.lock() = Arc::downgrade(&pipeline);

        pipeline.write(&record("reentrant"));
        pipeline.flush();

        assert_eq!(dest.inner.len(), 1);
        assert_eq!(pipeline.destination_failures_count(), 0);

        *dest.pipeline.lock() = Weak::new();
        assert!(pipeline.shutdown(Duration::from_secs(5)));
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_drain() {
        let slow = Arc::new(Slow {
            inner: CaptureDestination::new(),
            per_record: Duration::from_millis(5),
        });
        let pipeline = Arc::new(AsyncPipeline::new(slow.clone(), PipelineOptions::default()).unwrap());
        for i in 0..100 {
            pipeline.write(&record(format!("m{}", i)));
        }

        let first = {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || pipeline.shutdown(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(20));

        assert!(pipeline.shutdown(Duration::from_secs(10)));
        assert_eq!(slow.inner.len(), 100);
        assert!(first.join().unwrap());
    }

    #[test]
    fn test_concurrent_shutdown_times_out_while_draining() {
        let slow = Arc::new(Slow {
            inner: CaptureDestination::new(),
            per_record: Duration::from_millis(5),
        });
        let pipeline = Arc::new(AsyncPipeline::new(slow.clone(), PipelineOptions::default()).unwrap());
        for i in 0..100 {
            pipeline.write(&record(format!("m{}", i)));
        }

        let first = {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || pipeline.shutdown(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(20));

        assert!(!pipeline.shutdown(Duration::from_millis(1)));
        assert!(first.join().unwrap());
        assert_eq!(slow.inner.len(), 100);
    }

    #[test]
    fn test_failing_destination_is_contained() {
        let pipeline = AsyncPipeline::new(Arc::new(AlwaysFails), PipelineOptions::default()).unwrap();

        pipeline.write(&record("x"));
        pipeline.flush();

        // One failed deliver plus one panicking flush.
        assert!(pipeline.destination_failures_count() >= 2);

        // The drain thread survived and keeps serving barriers.
        pipeline.write(&record("y"));
        pipeline.flush();
        assert!(pipeline.destination_failures_count() >= 4);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let capture = Arc::new(CaptureDestination::new());
        {
            let pipeline = AsyncPipeline::new(capture.clone(), PipelineOptions::default()).unwrap();
            for i in 0..500 {
                pipeline.write(&record(format!("m{}", i)));
            }
        }
        assert_eq!(capture.len(), 500);
        assert!(capture.flush_count() >= 1);
    }

    #[test]
    fn test_writes_after_shutdown_are_dropped() {
        let capture = Arc::new(CaptureDestination::new());
        let pipeline = AsyncPipeline::new(capture.clone(), PipelineOptions::default()).unwrap();

        pipeline.write(&record("before"));
        assert!(pipeline.shutdown(Duration::from_secs(5)));
        assert!(pipeline.is_stopped());

        pipeline.write(&record("after"));
        assert_eq!(pipeline.dropped_records_count(), 1);

        // Flush after shutdown must not hang.
        pipeline.flush();
        assert_eq!(capture.len(), 1);
        assert!(pipeline.shutdown(Duration::from_secs(1)));
    }

    #[test]
    fn test_options_are_normalized() {
        let pipeline = AsyncPipeline::new(
            Arc::new(CaptureDestination::new()),
            PipelineOptions::new().with_capacity(0).with_max_batch(0),
        )
        .unwrap();
        assert_eq!(pipeline.options().capacity, 1);
        assert_eq!(pipeline.options().max_batch, 1);
        assert_eq!(pipeline.name(), "async(capture)");
    }

    #[test]
    fn test_custom_queue_backend() {
        let capture = Arc::new(CaptureDestination::new());
        let pipeline = AsyncPipeline::builder(capture.clone())
            .queue(Box::new(RingBufferQueue::new(3, OverflowPolicy::DropOldest)))
            .build()
            .unwrap();

        assert_eq!(pipeline.options().capacity, 3);
        pipeline.write(&record("a"));
        pipeline.flush();
        assert_eq!(capture.len(), 1);
    }
}
