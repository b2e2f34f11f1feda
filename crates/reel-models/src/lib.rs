//! Shared data models for the reel analysis pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Time intervals and timestamp parsing
//! - Face regions observed during detection
//! - Visual/audio style profiles and detected effects
//! - Transcripts, caption tags, and the persisted analysis record

pub mod effect;
pub mod face;
pub mod interval;
pub mod record;
pub mod style;
pub mod tags;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use effect::{EffectLabel, EffectSet};
pub use face::{FaceRegion, FaceSet, MAX_FACE_REGIONS};
pub use interval::{Interval, IntervalError};
pub use record::{AnalysisRecord, SourceRef};
pub use style::{
    AudioProfile, BrightnessClass, FrequencyClass, MotionClass, StyleProfile, VolumeClass,
};
pub use tags::Tags;
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};
pub use transcript::{Transcript, TranscriptSegment};
