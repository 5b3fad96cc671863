use crate::axis::{Point4D, VolumeSelection};
use crate::complex::Complex;
use crate::rotation::RotationMatrix;
use crate::view::ViewRect;

/// 4D → 3D → 2D projection of trajectory samples onto the raster.
///
/// The 4D sample is collapsed to 3D by the [`VolumeSelection`], rotated by
/// the [`RotationMatrix`], and the rotated Z is dropped (orthographic). The
/// remaining X and Y are model-space `cr`/`ci` coordinates of the view.
#[derive(Debug, Clone, Copy)]
pub struct AxisProjector {
    selection: VolumeSelection,
    rotation: RotationMatrix,
    view: ViewRect,
}

impl AxisProjector {
    pub fn new(selection: VolumeSelection, rotation: RotationMatrix, view: ViewRect) -> Self {
        Self {
            selection,
            rotation,
            view,
        }
    }

    pub fn view(&self) -> &ViewRect {
        &self.view
    }

    /// Raster `(row, col)` for the iterate `z` of the orbit of `c`. Not
    /// clamped to the canvas.
    #[inline]
    pub fn project(&self, z: Complex, c: Complex) -> (i64, i64) {
        let p = self.selection.blend_point(&Point4D::new(z, c));
        let r = &self.rotation;
        // Only the first two rotated rows are needed.
        let u = r.xx * p[0] + r.xy * p[1] + r.xz * p[2];
        let v = r.yy * p[1] + r.yz * p[2];
        self.view.to_raster(u, v)
    }

    /// Buffer index of the projected sample, or `None` when it lands off the
    /// canvas.
    #[inline]
    pub fn project_index(&self, z: Complex, c: Complex) -> Option<usize> {
        let (row, col) = self.project(z, c);
        self.view.index(row, col)
    }
}
