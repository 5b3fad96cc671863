use crate::complex::Complex;
use crate::error::CoreError;

/// Side length, in complex-plane units, of the square that the default
/// view fits inside the canvas.
pub const INITIAL_SIDE: f64 = 4.0;

/// Maps the raster onto a rectangle of the `c` plane.
///
/// Rows run along the real axis (`cr`) and columns along the imaginary
/// axis (`ci`); a pixel is the square cell whose corner is
/// [`cell_corner`](Self::cell_corner) and whose side is `scale`. The same
/// mapping, inverted, turns projected model-space coordinates back into
/// raster positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    /// Centre of the view: `re` along rows, `im` along columns.
    pub center: Complex,

    /// Complex-plane units per pixel.
    pub scale: f64,

    /// Canvas width in pixels (columns).
    pub width: u32,

    /// Canvas height in pixels (rows).
    pub height: u32,
}

impl ViewRect {
    /// Default view: centred on the origin, fitting an
    /// [`INITIAL_SIDE`]-wide square along the canvas' shorter side.
    pub fn fit(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            center: Complex::ZERO,
            scale: INITIAL_SIDE / width.min(height) as f64,
            width,
            height,
        })
    }

    /// Create a view with explicit parameters.
    pub fn new(center: Complex, scale: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidScale(scale));
        }
        Ok(Self {
            center,
            scale,
            width,
            height,
        })
    }

    /// `c` at the top-left corner of pixel `(0, 0)`.
    #[inline]
    pub fn origin(&self) -> Complex {
        Complex::new(
            self.center.re - self.height as f64 * self.scale / 2.0,
            self.center.im - self.width as f64 * self.scale / 2.0,
        )
    }

    #[inline]
    pub fn cell_corner(&self, row: u32, col: u32) -> Complex {
        let o = self.origin();
        Complex::new(o.re + row as f64 * self.scale, o.im + col as f64 * self.scale)
    }

    #[inline]
    pub fn cell_center(&self, row: u32, col: u32) -> Complex {
        let half = self.scale / 2.0;
        let corner = self.cell_corner(row, col);
        Complex::new(corner.re + half, corner.im + half)
    }

    /// Round a model-space `(u, v)` pair to the nearest raster position.
    ///
    /// The result may lie outside the canvas; see [`index`](Self::index).
    #[inline]
    pub fn to_raster(&self, u: f64, v: f64) -> (i64, i64) {
        let o = self.origin();
        (
            ((u - o.re) / self.scale).round() as i64,
            ((v - o.im) / self.scale).round() as i64,
        )
    }

    /// Row-major buffer index, or `None` when off-canvas.
    #[inline]
    pub fn index(&self, row: i64, col: i64) -> Option<usize> {
        if row < 0 || col < 0 || row >= self.height as i64 || col >= self.width as i64 {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether columns mirror around the centre line, i.e. the view is
    /// centred on the real axis and conjugate symmetry can be exploited.
    pub fn is_conjugate_symmetric(&self) -> bool {
        self.center.im.abs() <= f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn fit_spans_initial_side_on_short_edge() {
        let wide = ViewRect::fit(800, 400).unwrap();
        assert!((wide.height as f64 * wide.scale - INITIAL_SIDE).abs() < EPSILON);
        assert!((wide.width as f64 * wide.scale - 2.0 * INITIAL_SIDE).abs() < EPSILON);

        let tall = ViewRect::fit(300, 600).unwrap();
        assert!((tall.width as f64 * tall.scale - INITIAL_SIDE).abs() < EPSILON);
    }

    #[test]
    fn origin_is_top_left_corner() {
        let v = ViewRect::fit(4, 4).unwrap();
        let o = v.origin();
        assert!((o.re + 2.0).abs() < EPSILON);
        assert!((o.im + 2.0).abs() < EPSILON);
        let c = v.cell_center(0, 3);
        assert!((c.re + 1.5).abs() < EPSILON);
        assert!((c.im - 1.5).abs() < EPSILON);
    }

    #[test]
    fn raster_round_trip_on_corners() {
        let v = ViewRect::fit(64, 48).unwrap();
        for (row, col) in [(0, 0), (47, 63), (10, 20)] {
            let c = v.cell_corner(row, col);
            assert_eq!(v.to_raster(c.re, c.im), (row as i64, col as i64));
        }
    }

    #[test]
    fn index_rejects_off_canvas() {
        let v = ViewRect::fit(10, 5).unwrap();
        assert_eq!(v.index(0, 0), Some(0));
        assert_eq!(v.index(4, 9), Some(49));
        assert_eq!(v.index(5, 0), None);
        assert_eq!(v.index(0, 10), None);
        assert_eq!(v.index(-1, 3), None);
    }

    #[test]
    fn invalid_views() {
        assert!(ViewRect::fit(0, 10).is_err());
        assert!(ViewRect::new(Complex::ZERO, 0.0, 10, 10).is_err());
        assert!(ViewRect::new(Complex::ZERO, f64::NAN, 10, 10).is_err());
    }

    #[test]
    fn symmetry_only_on_real_axis() {
        assert!(ViewRect::fit(10, 10).unwrap().is_conjugate_symmetric());
        let off = ViewRect::new(Complex::new(0.0, 0.1), 0.1, 10, 10).unwrap();
        assert!(!off.is_conjugate_symmetric());
    }
}
