use std::sync::Arc;
use std::task::Poll;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use buddhabrot4d_core::{AxisProjector, ChannelThresholds, Complex, Orbit};

use crate::accumulator::Accumulator;
use crate::mask::BoundaryMask;
use crate::schedule::{ScanControl, YieldClock};

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every row was processed.
    Done { rows: u32, elapsed: Duration },
    /// A cancel request was observed at a row boundary.
    Canceled { rows: u32, elapsed: Duration },
}

impl ScanOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn rows(&self) -> u32 {
        match *self {
            Self::Done { rows, .. } | Self::Canceled { rows, .. } => rows,
        }
    }
}

/// One Buddhabrot sampling pass, resumable at row boundaries.
///
/// For every marked pixel an `oversampling²` grid of `c` values inside the
/// pixel cell is iterated. Orbits that escape with `min_escape ≤ n < cap`
/// deposit every recorded iterate, projected through the
/// [`AxisProjector`], into the [`Accumulator`].
#[derive(Debug)]
pub struct ScanTask {
    projector: AxisProjector,
    thresholds: ChannelThresholds,
    min_escape: u32,
    oversampling: u32,
    orbit: Orbit,
    control: Arc<ScanControl>,
    next_row: u32,
    started: Instant,
    samples: u64,
}

impl ScanTask {
    /// Arms `control` for a fresh scan. The iteration cap is the largest of
    /// the three channel thresholds.
    pub fn new(
        projector: AxisProjector,
        thresholds: ChannelThresholds,
        min_escape: u32,
        oversampling: u32,
        control: Arc<ScanControl>,
    ) -> Self {
        let cap = thresholds.global_cap();
        let height = projector.view().height;
        control.begin(height as usize);
        debug!(cap, oversampling, min_escape, rows = height, "Starting scan");
        Self {
            projector,
            thresholds,
            min_escape,
            oversampling: oversampling.max(1),
            orbit: Orbit::with_cap(cap),
            control,
            next_row: 0,
            started: Instant::now(),
            samples: 0,
        }
    }

    pub fn rows_done(&self) -> u32 {
        self.next_row
    }

    /// Process whole rows until the clock runs out (yield) or the mask is
    /// exhausted. A cancel request is honoured before starting a row.
    pub fn step(
        &mut self,
        mask: &BoundaryMask,
        acc: &mut Accumulator,
        clock: &YieldClock,
    ) -> Poll<ScanOutcome> {
        let height = self.projector.view().height;
        while self.next_row < height {
            if self.control.is_cancel_requested() {
                return Poll::Ready(self.finish(false));
            }
            self.scan_row(self.next_row, mask, acc);
            self.next_row += 1;
            self.control.set_rows_done(self.next_row as usize);
            if clock.expired() && self.next_row < height {
                return Poll::Pending;
            }
        }
        let success = !self.control.is_cancel_requested();
        Poll::Ready(self.finish(success))
    }

    fn finish(&self, success: bool) -> ScanOutcome {
        self.control.finish();
        let elapsed = self.started.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis(),
            rows = self.next_row,
            samples = self.samples,
            success,
            "Scan finished"
        );
        if success {
            ScanOutcome::Done {
                rows: self.next_row,
                elapsed,
            }
        } else {
            ScanOutcome::Canceled {
                rows: self.next_row,
                elapsed,
            }
        }
    }

    fn scan_row(&mut self, row: u32, mask: &BoundaryMask, acc: &mut Accumulator) {
        let view = *self.projector.view();
        let s = self.oversampling;
        let inc = view.scale / s as f64;
        let cap = self.orbit.cap();

        for col in 0..view.width {
            if !mask.get(row, col) {
                continue;
            }
            let corner = view.cell_corner(row, col);
            for i in 0..s {
                let cr = corner.re + i as f64 * inc;
                for j in 0..s {
                    let c = Complex::new(cr, corner.im + j as f64 * inc);
                    let n = self.orbit.trace(c);
                    if n < self.min_escape || n >= cap {
                        continue;
                    }
                    for &z in self.orbit.points() {
                        if let Some(index) = self.projector.project_index(z, c) {
                            acc.deposit(index, n, &self.thresholds);
                            self.samples += 1;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::classify;
    use buddhabrot4d_core::{RotationMatrix, ViewRect, VolumeSelection};

    fn task(view: ViewRect, thresholds: ChannelThresholds, control: Arc<ScanControl>) -> ScanTask {
        let projector =
            AxisProjector::new(VolumeSelection::default(), RotationMatrix::IDENTITY, view);
        ScanTask::new(projector, thresholds, 1, 1, control)
    }

    fn thresholds() -> ChannelThresholds {
        ChannelThresholds {
            red: 200,
            green: 20,
            blue: 5,
        }
    }

    #[test]
    fn full_scan_succeeds_and_deposits() {
        let view = ViewRect::fit(24, 24).unwrap();
        let mask = classify(view, 200);
        let mut acc = Accumulator::new(24, 24);
        let control = Arc::new(ScanControl::new());
        let mut t = task(view, thresholds(), Arc::clone(&control));

        let outcome = match t.step(&mask, &mut acc, &YieldClock::unbounded()) {
            Poll::Ready(o) => o,
            Poll::Pending => panic!("unbounded clock must not yield"),
        };
        assert!(outcome.success());
        assert_eq!(outcome.rows(), 24);
        assert!(acc.max(crate::Channel::Red) > 0);
        assert!(!control.is_active());
    }

    #[test]
    fn channels_nest_by_threshold() {
        // red ≥ green ≥ blue everywhere because the thresholds are ordered.
        let view = ViewRect::fit(16, 16).unwrap();
        let mask = classify(view, 200);
        let mut acc = Accumulator::new(16, 16);
        let mut t = task(view, thresholds(), Arc::new(ScanControl::new()));
        while t.step(&mask, &mut acc, &YieldClock::unbounded()).is_pending() {}
        for i in 0..acc.pixel_count() {
            let [r, g, b] = acc.counts(i);
            assert!(r >= g && g >= b);
        }
    }

    #[test]
    fn empty_mask_deposits_nothing() {
        let view = ViewRect::fit(8, 8).unwrap();
        let mask = BoundaryMask::new(8, 8);
        let mut acc = Accumulator::new(8, 8);
        let mut t = task(view, thresholds(), Arc::new(ScanControl::new()));
        assert!(t.step(&mask, &mut acc, &YieldClock::unbounded()).is_ready());
        assert_eq!(acc.total(crate::Channel::Red), 0);
    }

    #[test]
    fn cancel_stops_at_row_boundary() {
        let view = ViewRect::fit(16, 16).unwrap();
        let mask = classify(view, 100);
        let mut acc = Accumulator::new(16, 16);
        let control = Arc::new(ScanControl::new());
        let mut t = task(view, thresholds(), Arc::clone(&control));

        let clock = YieldClock::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(t.step(&mask, &mut acc, &clock).is_pending());
        assert_eq!(t.rows_done(), 1);

        control.request_cancel();
        let outcome = match t.step(&mask, &mut acc, &clock) {
            Poll::Ready(o) => o,
            Poll::Pending => panic!("cancel must end the scan"),
        };
        assert!(!outcome.success());
        assert_eq!(outcome.rows(), 1, "no row may start after the cancel");
        assert_eq!(control.progress(), crate::IDLE_PROGRESS);
    }

    #[test]
    fn progress_is_monotonic() {
        let view = ViewRect::fit(12, 12).unwrap();
        let mask = classify(view, 100);
        let mut acc = Accumulator::new(12, 12);
        let control = Arc::new(ScanControl::new());
        let mut t = task(view, thresholds(), Arc::clone(&control));
        let clock = YieldClock::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));

        let mut last = 0.0;
        while t.step(&mask, &mut acc, &clock).is_pending() {
            let p = control.progress();
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
        assert_eq!(control.progress(), crate::IDLE_PROGRESS);
    }
}
