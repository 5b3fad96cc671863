use std::f64::consts::{PI, TAU};

/// Wrap an angle in radians into `[0, 2π)`.
pub fn wrap_angle(a: f64) -> f64 {
    let w = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if w >= TAU {
        0.0
    } else {
        w
    }
}

/// Rotation applied to the blended 3D point before the orthographic drop.
///
/// Built from a longitude (`b`) and latitude (`c`) pair. The Y row has no X
/// term, so only eight coefficients are stored:
///
/// ```text
/// | cos b   sin b·sin c   sin b·cos c |
/// |   0        cos c         −sin c   |
/// | −sin b  cos b·sin c   cos b·cos c |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yy: f64,
    pub yz: f64,
    pub zx: f64,
    pub zy: f64,
    pub zz: f64,
}

/// One axis of the orientation overlay, in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoAxis {
    /// 0, 1, 2 for the view's X, Y and Z axes.
    pub axis: usize,
    pub row: f64,
    pub col: f64,
    pub depth: f64,
}

impl RotationMatrix {
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        xy: 0.0,
        xz: 0.0,
        yy: 1.0,
        yz: 0.0,
        zx: 0.0,
        zy: 0.0,
        zz: 1.0,
    };

    pub fn from_angles(latitude: f64, longitude: f64) -> Self {
        let (sinb, cosb) = longitude.sin_cos();
        let (sinc, cosc) = latitude.sin_cos();
        Self {
            xx: cosb,
            xy: sinb * sinc,
            xz: sinb * cosc,
            yy: cosc,
            yz: -sinc,
            zx: -sinb,
            zy: cosb * sinc,
            zz: cosb * cosc,
        }
    }

    #[inline]
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        [
            self.xx * p[0] + self.xy * p[1] + self.xz * p[2],
            self.yy * p[1] + self.yz * p[2],
            self.zx * p[0] + self.zy * p[1] + self.zz * p[2],
        ]
    }

    /// Endpoints of the three unit axes for an orientation overlay on a
    /// `width × height` canvas, sorted back-to-front by depth.
    ///
    /// Axes start at the canvas centre and are `0.75 · min(w, h) / 2` long.
    pub fn axis_gizmo(&self, width: u32, height: u32) -> [GizmoAxis; 3] {
        let col0 = width as f64 / 2.0;
        let row0 = height as f64 / 2.0;
        let len = -0.75 * col0.min(row0);
        let mut axes = [
            GizmoAxis {
                axis: 0,
                row: (len * self.xx + row0).round(),
                col: col0.round(),
                depth: len * self.zx,
            },
            GizmoAxis {
                axis: 1,
                row: (len * self.xy + row0).round(),
                col: (len * self.yy + col0).round(),
                depth: len * self.zy,
            },
            GizmoAxis {
                axis: 2,
                row: (len * self.xz + row0).round(),
                col: (len * self.yz + col0).round(),
                depth: len * self.zz,
            },
        ];
        axes.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        axes
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Latitude/longitude pair with its derived matrix kept in sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationModel {
    latitude: f64,
    longitude: f64,
    matrix: RotationMatrix,
}

impl RotationModel {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let latitude = wrap_angle(latitude);
        let longitude = wrap_angle(longitude);
        Self {
            latitude,
            longitude,
            matrix: RotationMatrix::from_angles(latitude, longitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn matrix(&self) -> &RotationMatrix {
        &self.matrix
    }

    pub fn set(&mut self, latitude: f64, longitude: f64) {
        *self = Self::new(latitude, longitude);
    }

    /// Turn a pointer drag of `(dx, dy)` pixels into a rotation. A drag of
    /// `half_max_dim` pixels is half a turn.
    pub fn drag(&mut self, dx: f64, dy: f64, half_max_dim: f64) {
        if half_max_dim <= 0.0 {
            return;
        }
        let lat = self.latitude - dx * PI / half_max_dim;
        let lon = self.longitude + dy * PI / half_max_dim;
        self.set(lat, lon);
    }
}

impl Default for RotationModel {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
