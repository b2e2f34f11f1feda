//! Media decoding, signal analysis and rendering for short-form reels.
//!
//! This crate provides:
//! - Frame and audio access through [`MediaHandle`] (FFmpeg-backed or in-memory)
//! - Face localization, visual style, effect and audio style estimation
//! - Silence detection over decoded audio
//! - Face-guided portrait cropping and interval trimming

pub mod audio_style;
pub mod command;
pub mod effects;
pub mod error;
pub mod faces;
pub mod frame;
pub mod probe;
pub mod render;
pub mod silence;
pub mod source;
pub mod visual_style;

pub use audio_style::{estimate_audio_style, AudioThresholds};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use effects::{detect_effects, EffectDetector, EffectThresholds};
pub use error::{MediaError, MediaResult, RenderError, RenderResult};
pub use faces::{locate_faces, FaceDetector, Rect};
#[cfg(feature = "opencv")]
pub use faces::{HaarCascadeDetector, DEFAULT_CASCADE_PATH};
pub use frame::{AudioBuffer, Frame};
pub use probe::{probe_media, MediaInfo};
pub use render::{
    extract_subclip, portrait_target, render_crop, trim_file, trim_frames, CropPlan, CropWindow,
    FfmpegEncoder, FrameSink, MemorySink, RenderConfig, RenderSummary,
};
pub use silence::{detect_non_silent, should_trim, KeepStats, SilenceConfig, SilenceSegmenter};
pub use source::{FfmpegSource, FrameStream, MediaHandle, MemorySource};
pub use visual_style::{estimate_visual_style, StyleThresholds, VisualStyleEstimator};
