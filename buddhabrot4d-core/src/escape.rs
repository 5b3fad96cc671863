use crate::complex::Complex;

/// An orbit has escaped once `|z|²` exceeds this bound.
pub const BAILOUT_NORM_SQ: f64 = 4.0;

/// Count iterations of `z ← z² + c` from `z = 0` until `|z|² > 4` or `cap`
/// steps have elapsed.
///
/// The point escaped iff the returned count is strictly below `cap`.
#[inline]
pub fn escape_count(c: Complex, cap: u32) -> u32 {
    let mut z = Complex::ZERO;
    let mut n = 0;
    while n < cap && z.norm_sq() <= BAILOUT_NORM_SQ {
        z = z.step(c);
        n += 1;
    }
    n
}

/// Reusable trajectory buffer for Buddhabrot sampling.
///
/// Holds every intermediate iterate of the last traced orbit. Capacity is
/// reserved once for the iteration cap, so tracing never reallocates.
#[derive(Debug, Clone)]
pub struct Orbit {
    cap: u32,
    points: Vec<Complex>,
}

impl Orbit {
    pub fn with_cap(cap: u32) -> Self {
        Self {
            cap,
            points: Vec::with_capacity(cap as usize),
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Iterate `c` exactly like [`escape_count`], recording each iterate.
    ///
    /// Returns the iteration count; [`points`](Self::points) then holds
    /// `z₁ … zₙ`, the last of which lies outside the bailout circle when the
    /// orbit escaped.
    pub fn trace(&mut self, c: Complex) -> u32 {
        self.points.clear();
        let mut z = Complex::ZERO;
        let mut n = 0;
        while n < self.cap && z.norm_sq() <= BAILOUT_NORM_SQ {
            z = z.step(c);
            self.points.push(z);
            n += 1;
        }
        n
    }

    pub fn points(&self) -> &[Complex] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_count(Complex::ZERO, 50), 50);
        assert_eq!(escape_count(Complex::ZERO, 5000), 5000);
    }

    #[test]
    fn two_escapes_quickly() {
        // z₁ = 2 (|z|² = 4, still bounded), z₂ = 6 → escapes after 2 steps.
        let n = escape_count(Complex::new(2.0, 0.0), 50);
        assert!(n <= 3, "c = 2 should escape within 3 steps, took {n}");
        assert_eq!(n, 2);
    }

    #[test]
    fn far_point_escapes_after_one_step() {
        assert_eq!(escape_count(Complex::new(10.0, 0.0), 100), 1);
    }

    #[test]
    fn zero_cap_does_nothing() {
        assert_eq!(escape_count(Complex::new(10.0, 0.0), 0), 0);
    }

    #[test]
    fn escape_count_is_deterministic() {
        let points = [
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-2.0, 0.0),
            Complex::new(0.2501, 0.0),
        ];
        for c in points {
            let a = escape_count(c, 1000);
            let b = escape_count(c, 1000);
            assert_eq!(a, b, "escape count for {c:?} must be repeatable");
        }
    }

    #[test]
    fn orbit_agrees_with_escape_count() {
        let mut orbit = Orbit::with_cap(200);
        for c in [Complex::new(0.3, 0.5), Complex::new(-1.0, 0.0), Complex::new(1.0, 1.0)] {
            let n = orbit.trace(c);
            assert_eq!(n, escape_count(c, 200));
            assert_eq!(orbit.points().len(), n as usize);
        }
    }

    #[test]
    fn orbit_records_iterates_in_order() {
        let mut orbit = Orbit::with_cap(10);
        let n = orbit.trace(Complex::new(1.0, 0.0));
        // 1, 2, 5 → escapes on the third step.
        assert_eq!(n, 3);
        let re: Vec<f64> = orbit.points().iter().map(|z| z.re).collect();
        assert_eq!(re, vec![1.0, 2.0, 5.0]);
        assert!(orbit.points()[2].norm_sq() > BAILOUT_NORM_SQ);
    }

    #[test]
    fn orbit_buffer_is_reused() {
        let mut orbit = Orbit::with_cap(64);
        orbit.trace(Complex::ZERO);
        assert_eq!(orbit.points().len(), 64);
        orbit.trace(Complex::new(10.0, 0.0));
        assert_eq!(orbit.points().len(), 1);
    }
}
