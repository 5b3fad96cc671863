use std::task::Poll;
use std::time::Instant;

use tracing::{debug, info};

use buddhabrot4d_core::{escape_count, ViewRect};

use crate::schedule::YieldClock;

// ---------------------------------------------------------------------------
// BoundaryMask
// ---------------------------------------------------------------------------

/// One flag per pixel marking parameters worth super-sampling: those whose
/// orbit escapes before the boundary iteration cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMask {
    pub width: u32,
    pub height: u32,
    cells: Vec<bool>,
}

impl BoundaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32) -> bool {
        self.cells[row as usize * self.width as usize + col as usize]
    }

    #[inline]
    pub fn set(&mut self, row: u32, col: u32, value: bool) {
        self.cells[row as usize * self.width as usize + col as usize] = value;
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Grow the mask by one ring: a pixel is set iff it or any of its (up
    /// to eight) in-grid neighbours is set.
    pub fn dilate(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for row in 0..self.height {
            let r0 = row.saturating_sub(1);
            let r1 = (row + 2).min(self.height);
            for col in 0..self.width {
                let c0 = col.saturating_sub(1);
                let c1 = (col + 2).min(self.width);
                let hit = (r0..r1).any(|r| (c0..c1).any(|c| self.get(r, c)));
                out.set(row, col, hit);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Incremental classifier
// ---------------------------------------------------------------------------

/// Builds a [`BoundaryMask`] a few rows at a time.
///
/// Each pixel centre is iterated up to `cap` steps; pixels that escape
/// are marked. When the view is centred on the real axis only the left
/// half of every row is iterated and mirrored, using conjugate symmetry.
/// The finished coarse mask is dilated once to catch thin filaments the
/// per-pixel test misses.
#[derive(Debug, Clone)]
pub struct MaskBuilder {
    view: ViewRect,
    cap: u32,
    next_row: u32,
    coarse: BoundaryMask,
    started: Instant,
}

impl MaskBuilder {
    pub fn new(view: ViewRect, cap: u32) -> Self {
        debug!(
            width = view.width,
            height = view.height,
            cap,
            symmetric = view.is_conjugate_symmetric(),
            "Starting boundary classification"
        );
        Self {
            view,
            cap,
            next_row: 0,
            coarse: BoundaryMask::new(view.width, view.height),
            started: Instant::now(),
        }
    }

    /// Rows classified so far, as a fraction of the canvas.
    pub fn progress(&self) -> f64 {
        self.next_row as f64 / self.view.height as f64
    }

    /// The undilated mask as far as it has been built.
    pub fn partial(&self) -> &BoundaryMask {
        &self.coarse
    }

    /// Classify rows until the clock runs out, then yield.
    pub fn step(&mut self, clock: &YieldClock) -> Poll<BoundaryMask> {
        while self.next_row < self.view.height {
            self.classify_row(self.next_row);
            self.next_row += 1;
            if clock.expired() && self.next_row < self.view.height {
                return Poll::Pending;
            }
        }

        let mask = self.coarse.dilate();
        info!(
            elapsed_ms = self.started.elapsed().as_millis(),
            coarse = self.coarse.count(),
            dilated = mask.count(),
            "Boundary classification complete"
        );
        Poll::Ready(mask)
    }

    fn classify_row(&mut self, row: u32) {
        let width = self.view.width;
        let mirror = self.view.is_conjugate_symmetric();
        let cols = if mirror { width.div_ceil(2) } else { width };
        for col in 0..cols {
            let c = self.view.cell_center(row, col);
            let escaped = escape_count(c, self.cap) < self.cap;
            self.coarse.set(row, col, escaped);
            if mirror {
                self.coarse.set(row, width - col - 1, escaped);
            }
        }
    }
}

/// Build the full mask in one blocking call.
pub fn classify(view: ViewRect, cap: u32) -> BoundaryMask {
    let mut builder = MaskBuilder::new(view, cap);
    loop {
        if let Poll::Ready(mask) = builder.step(&YieldClock::unbounded()) {
            return mask;
        }
    }
}
