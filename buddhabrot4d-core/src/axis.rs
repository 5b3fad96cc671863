//! The four real axes of the Buddhabrot parameter space and the machinery
//! for collapsing them to three.
//!
//! A trajectory sample is a [`Point4D`] `(zr, zi, cr, ci)`. A
//! [`VolumeTriple`] picks three of those components positionally as
//! X/Y/Z; a [`VolumeSelection`] holds two triples and a per-axis
//! [`Blend`] that sweeps continuously from the first to the second.

use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// One real dimension of the `(z, c)` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Zr,
    Zi,
    Cr,
    Ci,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Zr, Axis::Zi, Axis::Cr, Axis::Ci];

    /// Position of this axis inside [`Point4D::components`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Zr => 0,
            Self::Zi => 1,
            Self::Cr => 2,
            Self::Ci => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Zr => "zr",
            Self::Zi => "zi",
            Self::Cr => "cr",
            Self::Ci => "ci",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zr" => Ok(Self::Zr),
            "zi" => Ok(Self::Zi),
            "cr" => Ok(Self::Cr),
            "ci" => Ok(Self::Ci),
            _ => Err(CoreError::UnknownAxis(s.to_string())),
        }
    }
}

/// A transient trajectory sample: the iterate `z` together with its `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point4D {
    pub zr: f64,
    pub zi: f64,
    pub cr: f64,
    pub ci: f64,
}

impl Point4D {
    #[inline]
    pub fn new(z: Complex, c: Complex) -> Self {
        Self {
            zr: z.re,
            zi: z.im,
            cr: c.re,
            ci: c.im,
        }
    }

    /// Components in [`Axis::index`] order.
    #[inline]
    pub fn components(&self) -> [f64; 4] {
        [self.zr, self.zi, self.cr, self.ci]
    }
}

/// An ordered choice of three axes, used positionally as X, Y and Z.
///
/// Repeating an axis inside one triple is allowed; it simply collapses the
/// volume onto a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTriple(pub [Axis; 3]);

impl VolumeTriple {
    pub const fn new(x: Axis, y: Axis, z: Axis) -> Self {
        Self([x, y, z])
    }

    /// Pick this triple's three components out of a 4D point.
    #[inline]
    pub fn select(&self, p: &Point4D) -> [f64; 3] {
        let coords = p.components();
        [
            coords[self.0[0].index()],
            coords[self.0[1].index()],
            coords[self.0[2].index()],
        ]
    }
}

impl fmt::Display for VolumeTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for VolumeTriple {
    type Err = CoreError;

    /// Parses `"zr,zi,cr"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(CoreError::InvalidVolume(s.to_string()));
        }
        Ok(Self([parts[0].parse()?, parts[1].parse()?, parts[2].parse()?]))
    }
}

/// Per-axis interpolation factor from volume A (`0`) toward volume B (`1`).
///
/// Values are not clamped; anything outside `[0, 1]` extrapolates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blend(pub [f64; 3]);

impl Blend {
    pub const ZERO: Self = Self([0.0; 3]);
    pub const ONE: Self = Self([1.0; 3]);

    pub const fn uniform(t: f64) -> Self {
        Self([t, t, t])
    }

    /// Map a linear slider position in `[0, max]` to a uniform blend of
    /// `sin(π·position / (2·max))`, which eases in near volume B.
    pub fn from_slider(position: f64, max: f64) -> Self {
        if max <= 0.0 {
            return Self::ZERO;
        }
        Self::uniform((FRAC_PI_2 * position / max).sin())
    }

    /// Inverse of [`from_slider`](Self::from_slider), using the X factor.
    pub fn slider_position(&self, max: f64) -> f64 {
        self.0[0].clamp(-1.0, 1.0).asin() / FRAC_PI_2 * max
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        // Written so that t = 0 and t = 1 reproduce the endpoints exactly.
        a * (1.0 - t) + b * t
    }
}

impl Default for Blend {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Two volume triples and the blend between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSelection {
    pub a: VolumeTriple,
    pub b: VolumeTriple,
    pub blend: Blend,
}

impl VolumeSelection {
    /// Collapse a 4D point to 3D by interpolating each output axis
    /// independently between the two volumes.
    #[inline]
    pub fn blend_point(&self, p: &Point4D) -> [f64; 3] {
        let pa = self.a.select(p);
        let pb = self.b.select(p);
        let t = self.blend.0;
        [
            Blend::lerp(pa[0], pb[0], t[0]),
            Blend::lerp(pa[1], pb[1], t[1]),
            Blend::lerp(pa[2], pb[2], t[2]),
        ]
    }
}

impl Default for VolumeSelection {
    fn default() -> Self {
        Self {
            a: VolumeTriple::new(Axis::Zr, Axis::Zi, Axis::Cr),
            b: VolumeTriple::new(Axis::Cr, Axis::Ci, Axis::Zi),
            blend: Blend::ZERO,
        }
    }
}
