//! In-memory destination for tests and diagnostics

use crate::core::{Destination, Record, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keeps every delivered record in memory.
///
/// # Example
///
/// ```
/// use sim_logger::prelude::*;
///
/// let capture = CaptureDestination::new();
/// capture.deliver(&Record::builder(Level::Info, "hello").build()).unwrap();
/// capture.flush().unwrap();
///
/// assert_eq!(capture.snapshot()[0].message(), "hello");
/// assert_eq!(capture.flush_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CaptureDestination {
    records: Mutex<Vec<Record>>,
    flushes: AtomicUsize,
}

impl CaptureDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far, in delivery order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Messages delivered so far, in delivery order.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forget captured records. The flush count is kept.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Destination for CaptureDestination {
    fn deliver(&self, record: &Record) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Level;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_capture_and_clear() {
        let capture = CaptureDestination::new();
        assert!(capture.is_empty());

        capture.deliver(&Record::builder(Level::Info, "a").build()).unwrap();
        capture.deliver(&Record::builder(Level::Warn, "b").build()).unwrap();
        assert_eq!(capture.messages(), vec!["a", "b"]);

        capture.flush().unwrap();
        capture.clear();
        assert!(capture.is_empty());
        assert_eq!(capture.flush_count(), 1);
    }

    #[test]
    fn test_concurrent_delivery() {
        let capture = Arc::new(CaptureDestination::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let capture = Arc::clone(&capture);
                thread::spawn(move || {
                    for _ in 0..100 {
                        capture.deliver(&Record::builder(Level::Info, "x").build()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(capture.len(), 400);
    }
}
