//! Per-code-point execution statistics.
//!
//! Each code point owns one [`PointStats`]: a monotonically increasing run
//! count, the summed duration of all runs, and a fixed-size circular window
//! of the most recent run durations used for a short-term moving average.
//!
//! # Thread Safety
//!
//! - Run count and total duration are relaxed atomics. They are purely
//!   additive and commutative, so no ordering between points is needed.
//! - The recent window couples a cursor with a slot write, so each
//!   recording takes a short critical section on a `parking_lot` mutex.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of recent run durations kept per code point.
pub const RECENT_WINDOW: usize = 10;

/// Circular buffer of the last [`RECENT_WINDOW`] run durations.
struct RecentWindow {
    slots: [u64; RECENT_WINDOW],
    cursor: usize,
}

impl RecentWindow {
    fn push(&mut self, nanos: u64) {
        self.slots[self.cursor % RECENT_WINDOW] = nanos;
        self.cursor += 1;
    }

    fn sum(&self) -> u64 {
        self.slots.iter().sum()
    }
}

/// Aggregated execution statistics for a single code point.
///
/// Counters only grow while a point is being traced; [`PointStats::reset`]
/// zeroes the run count and total duration but deliberately leaves the
/// recent window untouched, so the short-term average survives a reset.
pub struct PointStats {
    /// Number of completed runs of this code point.
    runs: AtomicU64,

    /// Sum of the duration of every completed run, in nanoseconds.
    total_nanos: AtomicU64,

    /// Durations of the most recent runs.
    recent: Mutex<RecentWindow>,
}

impl PointStats {
    /// Create an empty recorder.
    pub fn new() -> Self {
        PointStats {
            runs: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            recent: Mutex::new(RecentWindow {
                slots: [0; RECENT_WINDOW],
                cursor: 0,
            }),
        }
    }

    /// Record one completed execution.
    pub fn record(&self, elapsed: Duration) {
        let nanos = elapsed.as_nanos() as u64;
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.recent.lock().push(nanos);
    }

    /// Zero the run count and total duration.
    ///
    /// The recent window is intentionally kept: a reset clears the
    /// long-running aggregates while the short-term moving average keeps
    /// reflecting the latest activity.
    pub fn reset(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }

    /// Number of completed runs.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Sum of all recorded run durations, in nanoseconds.
    pub fn total_nanos(&self) -> u64 {
        self.total_nanos.load(Ordering::Relaxed)
    }

    /// Average run duration in nanoseconds, 0 when nothing was recorded.
    pub fn average_nanos(&self) -> u64 {
        let runs = self.runs();
        if runs == 0 {
            return 0;
        }
        self.total_nanos() / runs
    }

    /// Average of the recent window, in nanoseconds.
    ///
    /// The sum is always divided by [`RECENT_WINDOW`], even before that
    /// many runs have been recorded, so early readings are deflated by the
    /// zero-filled slots.
    pub fn recent_average_nanos(&self) -> u64 {
        self.recent.lock().sum() / RECENT_WINDOW as u64
    }
}

impl Default for PointStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PointStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointStats")
            .field("runs", &self.runs())
            .field("total_nanos", &self.total_nanos())
            .field("recent_average_nanos", &self.recent_average_nanos())
            .finish()
    }
}
