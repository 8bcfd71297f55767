//! Overflow policies for the bounded record queue
//!
//! When the queue of an async pipeline is full, the policy decides whether the
//! producer waits, the incoming record is rejected, or the oldest queued record
//! is evicted to make room.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Policy for handling queue overflow in async delivery
///
/// # Example
///
/// ```
/// use sim_logger::OverflowPolicy;
///
/// // Default behavior: producers wait for space
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
///
/// let policy: OverflowPolicy = serde_json::from_str("\"drop_oldest\"").unwrap();
/// assert_eq!(policy, OverflowPolicy::DropOldest);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Block until space is available
    ///
    /// The producer waits until the drain thread frees a slot or the pipeline
    /// stops. Nothing is dropped while the pipeline is running.
    #[default]
    Block,

    /// Reject the incoming record when the queue is full
    ///
    /// Queued records are untouched; the rejected record counts as one drop.
    DropNewest,

    /// Evict the oldest queued record to make room for the incoming one
    ///
    /// The incoming record is always enqueued; the evicted one counts as one
    /// drop.
    DropOldest,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::DropOldest => write!(f, "DropOldest"),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when records are dropped by a pipeline. The parameter is the total
/// count of dropped records so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_default() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "DropNewest");
        assert_eq!(OverflowPolicy::DropOldest.to_string(), "DropOldest");
    }

    #[test]
    fn test_overflow_policy_serde() {
        let json = serde_json::to_string(&OverflowPolicy::DropNewest).unwrap();
        assert_eq!(json, "\"drop_newest\"");
        let policy: OverflowPolicy = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(policy, OverflowPolicy::Block);
        assert!(serde_json::from_str::<OverflowPolicy>("\"alert_and_drop\"").is_err());
    }
}
