//! Destination trait for log output
//!
//! Destinations are shared between loggers (and the drain thread of an
//! [`AsyncPipeline`](crate::core::AsyncPipeline)), so both operations take
//! `&self` and implementations synchronize internally.

use super::error::{LoggerError, Result};
use super::record::Record;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub trait Destination: Send + Sync {
    /// Consume one record.
    fn deliver(&self, record: &Record) -> Result<()>;

    /// Push any buffered output through.
    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str {
        "destination"
    }
}

/// Shared handle used in logger destination lists.
pub type DestinationRef = Arc<dyn Destination>;

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run one destination call with panic isolation.
///
/// A returned `Err` passes through; a panic becomes
/// [`LoggerError::DestinationPanicked`]. Either way the caller only has to
/// count the failure and move on to the next destination.
pub(crate) fn guarded<F>(destination: &dyn Destination, op: F) -> Result<()>
where
    F: FnOnce(&dyn Destination) -> Result<()>,
{
    match catch_unwind(AssertUnwindSafe(|| op(destination))) {
        Ok(result) => result,
        Err(payload) => Err(LoggerError::DestinationPanicked {
            destination: destination.name().to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

pub(crate) fn guarded_deliver(destination: &dyn Destination, record: &Record) -> Result<()> {
    guarded(destination, |d| d.deliver(record))
}

pub(crate) fn guarded_flush(destination: &dyn Destination) -> Result<()> {
    guarded(destination, |d| d.flush())
}
