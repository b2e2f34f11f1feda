//! Silence detection.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Audio Input  │───►│ Window volume│───►│ Segmenter    │───► non-silent Intervals
//! │ (16kHz mono) │    │ (mean |x|)   │    │ (spans)      │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! The resulting intervals feed the renderer's trim operations; [`should_trim`]
//! decides whether trimming is worth doing at all.

mod config;
mod detector;
mod segmenter;
mod stats;

pub use config::SilenceConfig;
pub use detector::detect_non_silent;
pub use segmenter::SilenceSegmenter;
pub use stats::{should_trim, KeepStats};
