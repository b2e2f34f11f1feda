//! Decoded media sources.
//!
//! A [`MediaHandle`] exposes a container as a restartable, lazily decoded
//! sequence of RGB frames plus its audio track at a requested sample rate.
//! Handles are shared read-only between extractors through `Arc<dyn MediaHandle>`.

mod ffmpeg;
mod memory;

pub use ffmpeg::FfmpegSource;
pub use memory::MemorySource;

use std::sync::Arc;

use crate::error::MediaResult;
use crate::frame::{AudioBuffer, Frame};
use crate::probe::MediaInfo;

/// Lazy frame sequence. Dropping it stops decoding.
pub type FrameStream = Box<dyn Iterator<Item = MediaResult<Frame>> + Send>;

/// Read-only access to a decoded source.
///
/// All methods are blocking and are meant to be called from `spawn_blocking`.
pub trait MediaHandle: Send + Sync {
    fn info(&self) -> &MediaInfo;

    /// Start a fresh pass over every frame, from the first.
    fn frames(&self) -> MediaResult<FrameStream>;

    /// Decode the single frame at `timestamp` seconds.
    fn seek(&self, timestamp: f64) -> MediaResult<Frame>;

    /// Audio resampled to `rate` (`None` keeps the native rate).
    ///
    /// Buffers are cached per requested rate for the lifetime of the handle.
    fn audio(&self, rate: Option<u32>) -> MediaResult<Arc<AudioBuffer>>;
}
