//! Time values stamped onto records
//!
//! A record carries three clocks: simulation time, mission-elapsed time (MET)
//! and a monotonic wall timestamp. The core only reads them at record
//! construction, through a [`TimeSource`] handed to
//! [`RecordBuilder::stamp`](crate::core::RecordBuilder::stamp).
//!
//! For call sites that do not thread a source through (the logging macros and
//! the `Logger::info`-style shorthands) there is a process-wide default. It is
//! explicit: it starts as a zeroed [`ManualTimeSource`], is replaced with
//! [`install`], and is put back with [`reset`] (normally only in test teardown).

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Supplies the clocks captured into each record.
pub trait TimeSource: Send + Sync {
    /// Simulation time in seconds.
    fn sim_time(&self) -> f64;

    /// Mission-elapsed time in seconds.
    fn mission_elapsed(&self) -> f64;

    /// Monotonic timestamp in nanoseconds.
    fn wall_time_ns(&self) -> i64;
}

/// Snapshot of the three clocks at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timestamps {
    pub sim_time: f64,
    pub mission_elapsed: f64,
    pub wall_time_ns: i64,
}

impl Timestamps {
    pub fn new(sim_time: f64, mission_elapsed: f64, wall_time_ns: i64) -> Self {
        Self {
            sim_time,
            mission_elapsed,
            wall_time_ns,
        }
    }

    /// Read all three clocks from `source`.
    pub fn capture(source: &dyn TimeSource) -> Self {
        Self {
            sim_time: source.sim_time(),
            mission_elapsed: source.mission_elapsed(),
            wall_time_ns: source.wall_time_ns(),
        }
    }
}

/// Deterministic, caller-driven time source.
///
/// # Example
///
/// ```
/// use sim_logger::core::{ManualTimeSource, TimeSource};
///
/// let clock = ManualTimeSource::new(10.0, 2.5, 1_000);
/// clock.advance(1.0, 1.0, 500);
/// assert_eq!(clock.sim_time(), 11.0);
/// assert_eq!(clock.wall_time_ns(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: Mutex<Timestamps>,
}

impl ManualTimeSource {
    pub fn new(sim_time: f64, mission_elapsed: f64, wall_time_ns: i64) -> Self {
        Self {
            now: Mutex::new(Timestamps::new(sim_time, mission_elapsed, wall_time_ns)),
        }
    }

    /// Replace all three values.
    pub fn set(&self, sim_time: f64, mission_elapsed: f64, wall_time_ns: i64) {
        *self.now.lock() = Timestamps::new(sim_time, mission_elapsed, wall_time_ns);
    }

    /// Move all three clocks forward by the given deltas.
    pub fn advance(&self, sim_delta: f64, met_delta: f64, wall_delta_ns: i64) {
        let mut now = self.now.lock();
        now.sim_time += sim_delta;
        now.mission_elapsed += met_delta;
        now.wall_time_ns = now.wall_time_ns.saturating_add(wall_delta_ns);
    }
}

impl TimeSource for ManualTimeSource {
    fn sim_time(&self) -> f64 {
        self.now.lock().sim_time
    }

    fn mission_elapsed(&self) -> f64 {
        self.now.lock().mission_elapsed
    }

    fn wall_time_ns(&self) -> i64 {
        self.now.lock().wall_time_ns
    }
}

/// Real-time source for runs without a simulation clock.
///
/// Simulation time and MET both report seconds since construction; the wall
/// timestamp is nanoseconds on the same monotonic clock.
#[derive(Debug)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn sim_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn mission_elapsed(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn wall_time_ns(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

struct DefaultSource {
    installed: RwLock<Option<Arc<dyn TimeSource>>>,
    fallback: Arc<ManualTimeSource>,
}

fn default_source() -> &'static DefaultSource {
    static SOURCE: OnceLock<DefaultSource> = OnceLock::new();
    SOURCE.get_or_init(|| DefaultSource {
        installed: RwLock::new(None),
        fallback: Arc::new(ManualTimeSource::default()),
    })
}

/// Install the process-wide default time source.
pub fn install(source: Arc<dyn TimeSource>) {
    *default_source().installed.write() = Some(source);
}

/// Drop any installed source and return to the zeroed fallback.
pub fn reset() {
    *default_source().installed.write() = None;
}

/// The process-wide default time source (never absent).
pub fn current() -> Arc<dyn TimeSource> {
    let state = default_source();
    match state.installed.read().as_ref() {
        Some(source) => Arc::clone(source),
        None => Arc::clone(&state.fallback) as Arc<dyn TimeSource>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_source_advance() {
        let clock = ManualTimeSource::new(1.0, 2.0, 3);
        clock.advance(0.5, 0.25, 7);
        assert_eq!(
            Timestamps::capture(&clock),
            Timestamps::new(1.5, 2.25, 10)
        );

        clock.set(0.0, 0.0, 0);
        assert_eq!(Timestamps::capture(&clock), Timestamps::default());
    }

    #[test]
    fn test_monotonic_source_never_goes_backwards() {
        let clock = MonotonicTimeSource::new();
        let first = clock.wall_time_ns();
        let second = clock.wall_time_ns();
        assert!(second >= first);
        assert!(clock.sim_time() >= 0.0);
    }
}
