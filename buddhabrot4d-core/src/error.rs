use thiserror::Error;

/// Errors originating from configuration and geometry in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid canvas dimensions: {width}×{height} (both must be >= 1)")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid {channel} threshold: {value} (must be >= 1)")]
    InvalidThreshold { channel: &'static str, value: u32 },

    #[error("invalid boundary iteration cap: {0} (must be >= 1)")]
    InvalidBoundaryCap(u32),

    #[error("invalid oversampling factor: {0} (must be >= 1)")]
    InvalidOversampling(u32),

    #[error("invalid colour cap: {0} (must be >= 1)")]
    InvalidColorCap(u32),

    #[error("invalid brightness: {0} (must be finite and >= 0)")]
    InvalidBrightness(f64),

    #[error("invalid view scale: {0} (must be positive and finite)")]
    InvalidScale(f64),

    #[error("unknown axis {0:?} (expected one of zr, zi, cr, ci)")]
    UnknownAxis(String),

    #[error("invalid volume {0:?} (expected three comma-separated axes)")]
    InvalidVolume(String),
}
