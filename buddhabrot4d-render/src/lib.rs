pub mod accumulator;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod events;
pub mod export;
pub mod mask;
pub mod scan;
pub mod schedule;
pub mod tone;

pub use accumulator::{Accumulator, Channel};
pub use buffer::RenderBuffer;
pub use engine::{Buddhabrot, ScanState};
pub use error::RenderError;
pub use events::{ScanEvent, ScanEventKind};
pub use export::export_png;
pub use mask::{classify, BoundaryMask, MaskBuilder};
pub use scan::{ScanOutcome, ScanTask};
pub use schedule::{ScanControl, YieldClock, IDLE_PROGRESS};
pub use tone::{cumulative_histogram, ToneMapper};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
