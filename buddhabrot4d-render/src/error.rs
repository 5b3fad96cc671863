use thiserror::Error;

use crate::engine::ScanState;

/// Errors originating from the engine and its output paths.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("a scan is in flight; cancel it first")]
    ScanInFlight,

    #[error("invalid state transition: {from:?} → {to:?}")]
    InvalidTransition { from: ScanState, to: ScanState },

    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] buddhabrot4d_core::CoreError),
}
