pub mod axis;
pub mod complex;
pub mod config;
pub mod error;
pub mod escape;
pub mod projector;
pub mod rotation;
pub mod view;

// Re-export primary types for convenience.
pub use axis::{Axis, Blend, Point4D, VolumeSelection, VolumeTriple};
pub use complex::Complex;
pub use config::{BuddhabrotConfig, ChannelThresholds, Density};
pub use error::CoreError;
pub use escape::{escape_count, Orbit, BAILOUT_NORM_SQ};
pub use projector::AxisProjector;
pub use rotation::{wrap_angle, GizmoAxis, RotationMatrix, RotationModel};
pub use view::ViewRect;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
