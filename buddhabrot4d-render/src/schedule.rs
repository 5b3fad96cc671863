use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Value reported by [`ScanControl::progress`] while no scan is running.
pub const IDLE_PROGRESS: f64 = -1.0;

// ---------------------------------------------------------------------------
// Yield budget
// ---------------------------------------------------------------------------

/// Wall-clock budget for one slice of cooperative work.
///
/// Long-running passes check [`expired`](Self::expired) at row boundaries
/// and hand control back to the host once it returns `true`.
#[derive(Debug, Clone, Copy)]
pub struct YieldClock {
    interval: Duration,
    started: Instant,
}

impl YieldClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
        }
    }

    /// A budget that never runs out, for blocking callers.
    pub fn unbounded() -> Self {
        Self::new(Duration::MAX)
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.interval
    }
}

// ---------------------------------------------------------------------------
// Cancellation & progress
// ---------------------------------------------------------------------------

/// Cancellation flag and row progress shared between the scan and its host.
///
/// The scan only reads the flag at row boundaries, so a cancel request
/// always lets the row in flight finish.
#[derive(Debug, Default)]
pub struct ScanControl {
    cancel: AtomicBool,
    active: AtomicBool,
    rows_done: AtomicUsize,
    rows_total: AtomicUsize,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for a new scan over `rows` rows.
    pub fn begin(&self, rows: usize) {
        self.cancel.store(false, Ordering::SeqCst);
        self.rows_total.store(rows, Ordering::Relaxed);
        self.rows_done.store(0, Ordering::Relaxed);
        self.active.store(true, Ordering::SeqCst);
    }

    /// Mark the scan finished; progress reads as idle again.
    pub fn finish(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Ask the running scan to stop after its current row.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_rows_done(&self, rows: usize) {
        self.rows_done.store(rows, Ordering::Relaxed);
    }

    pub fn rows(&self) -> (usize, usize) {
        (
            self.rows_done.load(Ordering::Relaxed),
            self.rows_total.load(Ordering::Relaxed),
        )
    }

    /// Fraction of rows completed, or [`IDLE_PROGRESS`] when no scan runs.
    pub fn progress(&self) -> f64 {
        if !self.is_active() {
            return IDLE_PROGRESS;
        }
        match self.rows() {
            (_, 0) => 0.0,
            (done, total) => done as f64 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_idle_until_begun() {
        let control = ScanControl::new();
        assert_eq!(control.progress(), IDLE_PROGRESS);
        control.begin(4);
        assert_eq!(control.progress(), 0.0);
        control.set_rows_done(1);
        assert_eq!(control.progress(), 0.25);
        control.finish();
        assert_eq!(control.progress(), IDLE_PROGRESS);
    }

    #[test]
    fn begin_clears_a_stale_cancel() {
        let control = ScanControl::new();
        control.request_cancel();
        assert!(control.is_cancel_requested());
        control.begin(10);
        assert!(!control.is_cancel_requested());
    }

    #[test]
    fn zero_interval_expires_immediately() {
        let clock = YieldClock::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(clock.expired());
        assert!(!YieldClock::unbounded().expired());
    }
}
