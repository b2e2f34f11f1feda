//! Configuration for silence detection and trimming.

use serde::{Deserialize, Serialize};

/// Parameters for the windowed-volume silence detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Rate the audio is decoded at before analysis.
    pub sample_rate: u32,

    /// Volume windows per second. A window spans `sample_rate / window_rate` samples.
    pub window_rate: u32,

    /// Normalized mean absolute amplitude above which a window is non-silent.
    pub threshold: f32,

    /// Minimum silence run that closes a speech span (seconds).
    ///
    /// Shorter pauses stay inside the surrounding span.
    pub min_silence_secs: f64,

    /// Minimum fraction of the source that must be cut for trimming to be worth it.
    pub min_cut_ratio: f64,

    /// Minimum fraction of the source that must survive trimming.
    ///
    /// If less than this would be kept, trimming is skipped entirely to avoid
    /// producing unusable output.
    pub min_keep_ratio: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_rate: 100,
            threshold: 0.01,
            min_silence_secs: 0.5,
            min_cut_ratio: 0.1,
            min_keep_ratio: 0.1,
        }
    }
}

impl SilenceConfig {
    /// Samples per volume window (never zero).
    pub fn window_len(&self) -> usize {
        (self.sample_rate / self.window_rate.max(1)).max(1) as usize
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_silence_secs(mut self, secs: f64) -> Self {
        self.min_silence_secs = secs.max(0.0);
        self
    }

    pub fn with_min_keep_ratio(mut self, ratio: f64) -> Self {
        self.min_keep_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}
