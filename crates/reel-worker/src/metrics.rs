//! Pipeline metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SOURCES_PROCESSED_TOTAL: &str = "reel_sources_processed_total";
    pub const STAGE_DURATION_SECONDS: &str = "reel_stage_duration_seconds";
    pub const CLIPS_RENDERED_TOTAL: &str = "reel_clips_rendered_total";
    pub const TRANSCRIPTION_FALLBACKS_TOTAL: &str = "reel_transcription_fallbacks_total";
}

/// Record the outcome of one source ("ok" or an error kind).
pub fn record_source(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SOURCES_PROCESSED_TOTAL, &labels).increment(1);
}

pub fn record_stage(stage: &'static str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_clip_rendered() {
    counter!(names::CLIPS_RENDERED_TOTAL).increment(1);
}

pub fn record_transcription_fallback() {
    counter!(names::TRANSCRIPTION_FALLBACKS_TOTAL).increment(1);
}
