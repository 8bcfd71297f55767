//! Bounded record queue between producers and a drain thread
//!
//! [`RecordQueue`] is the contract an async pipeline relies on: policy-driven
//! enqueue, non-blocking batched dequeue, an explicit wait, stop, and a "kick"
//! that wakes the consumer without new data. [`RingBufferQueue`] is the
//! mutex + condvar ring buffer backend.

use super::overflow_policy::OverflowPolicy;
use super::record::Record;
use parking_lot::{Condvar, Mutex};

/// Why an enqueue was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Queue at capacity under [`OverflowPolicy::DropNewest`].
    Full,
    /// Stop was requested before or while the producer waited.
    Stopped,
}

/// Result of one enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Stored without loss.
    Enqueued,
    /// Stored after evicting the oldest queued record.
    EnqueuedWithEviction,
    /// Not stored.
    Rejected(RejectReason),
}

impl EnqueueOutcome {
    pub fn is_enqueued(&self) -> bool {
        matches!(
            self,
            EnqueueOutcome::Enqueued | EnqueueOutcome::EnqueuedWithEviction
        )
    }

    /// Records lost by this attempt: the evicted one, or the rejected one.
    ///
    /// A rejection during shutdown is a drop like any other, so callers never
    /// have to add their own accounting on top of this value.
    pub fn dropped(&self) -> u32 {
        match self {
            EnqueueOutcome::Enqueued => 0,
            EnqueueOutcome::EnqueuedWithEviction | EnqueueOutcome::Rejected(_) => 1,
        }
    }
}

/// What woke a waiting consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Records are queued, a kick arrived, or stop was requested with records
    /// still queued. The consumer should drain and check for flush requests.
    Ready,
    /// Stop was requested and the queue is empty.
    Stopped,
}

/// Bounded multi-producer, single-consumer record queue.
pub trait RecordQueue: Send + Sync {
    /// Store `record` according to the overflow policy.
    fn enqueue(&self, record: Record) -> EnqueueOutcome;

    /// Move up to `max` records into `out` in FIFO order without waiting.
    /// Returns how many were moved.
    fn dequeue_batch(&self, out: &mut Vec<Record>, max: usize) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Refuse further enqueues and wake every blocked producer and consumer.
    /// Idempotent.
    fn request_stop(&self);

    fn is_stop_requested(&self) -> bool;

    /// Wake the consumer so it re-evaluates pending flush requests even when
    /// nothing is queued.
    fn kick(&self);

    /// Block until records are queued, a kick arrives, or stop is requested.
    fn wait_for_work(&self) -> WaitOutcome;
}

struct Ring {
    slots: Box<[Option<Record>]>,
    head: usize,
    tail: usize,
    count: usize,
    stop_requested: bool,
    kicked: bool,
}

impl Ring {
    fn push(&mut self, record: Record) {
        let capacity = self.slots.len();
        self.slots[self.tail] = Some(record);
        self.tail = (self.tail + 1) % capacity;
        self.count += 1;
    }

    fn pop(&mut self) -> Option<Record> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.slots.len();
        let record = self.slots[self.head].take();
        self.head = (self.head + 1) % capacity;
        self.count -= 1;
        record
    }
}

/// Fixed-capacity circular buffer guarded by one mutex.
///
/// `count` never exceeds the capacity; every mutation of the buffer happens
/// with the mutex held.
///
/// # Example
///
/// ```
/// use sim_logger::core::{Level, OverflowPolicy, Record, RecordQueue, RingBufferQueue};
///
/// let queue = RingBufferQueue::new(1, OverflowPolicy::DropOldest);
/// queue.enqueue(Record::builder(Level::Info, "a").build());
/// let outcome = queue.enqueue(Record::builder(Level::Info, "b").build());
/// assert!(outcome.is_enqueued());
/// assert_eq!(outcome.dropped(), 1);
///
/// let mut out = Vec::new();
/// queue.dequeue_batch(&mut out, 10);
/// assert_eq!(out[0].message(), "b");
/// ```
pub struct RingBufferQueue {
    state: Mutex<Ring>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
}

impl RingBufferQueue {
    /// Create a queue holding at most `capacity` records (clamped to 1).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();

        Self {
            state: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                stop_requested: false,
                kicked: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            policy,
        }
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

impl RecordQueue for RingBufferQueue {
    fn enqueue(&self, record: Record) -> EnqueueOutcome {
        let mut ring = self.state.lock();

        if ring.stop_requested {
            return EnqueueOutcome::Rejected(RejectReason::Stopped);
        }

        let mut outcome = EnqueueOutcome::Enqueued;

        if ring.count >= self.capacity {
            match self.policy {
                OverflowPolicy::Block => {
                    while !ring.stop_requested && ring.count >= self.capacity {
                        self.not_full.wait(&mut ring);
                    }
                    if ring.stop_requested {
                        return EnqueueOutcome::Rejected(RejectReason::Stopped);
                    }
                }
                OverflowPolicy::DropNewest => {
                    return EnqueueOutcome::Rejected(RejectReason::Full);
                }
                OverflowPolicy::DropOldest => {
                    ring.pop();
                    outcome = EnqueueOutcome::EnqueuedWithEviction;
                }
            }
        }

        ring.push(record);
        self.not_empty.notify_one();
        outcome
    }

    fn dequeue_batch(&self, out: &mut Vec<Record>, max: usize) -> usize {
        let mut ring = self.state.lock();
        let n = ring.count.min(max);
        out.reserve(n);
        for _ in 0..n {
            if let Some(record) = ring.pop() {
                out.push(record);
            }
        }
        if n > 0 {
            self.not_full.notify_all();
        }
        n
    }

    fn len(&self) -> usize {
        self.state.lock().count
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn request_stop(&self) {
        self.state.lock().stop_requested = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn is_stop_requested(&self) -> bool {
        self.state.lock().stop_requested
    }

    fn kick(&self) {
        self.state.lock().kicked = true;
        self.not_empty.notify_all();
    }

    fn wait_for_work(&self) -> WaitOutcome {
        let mut ring = self.state.lock();
        while !ring.stop_requested && ring.count == 0 && !ring.kicked {
            self.not_empty.wait(&mut ring);
        }
        ring.kicked = false;

        if ring.stop_requested && ring.count == 0 {
            WaitOutcome::Stopped
        } else {
            WaitOutcome::Ready
        }
    }
}
