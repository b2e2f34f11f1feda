//! Windowed-volume silence detection over decoded audio.

use reel_models::Interval;
use tracing::debug;

use super::config::SilenceConfig;
use super::segmenter::SilenceSegmenter;
use crate::error::{MediaError, MediaResult};
use crate::frame::AudioBuffer;

/// Find the non-silent spans of `audio`.
///
/// Multi-channel input is downmixed first. The returned intervals are strictly
/// increasing and never overlap.
pub fn detect_non_silent(audio: &AudioBuffer, config: &SilenceConfig) -> MediaResult<Vec<Interval>> {
    if audio.is_empty() || audio.sample_rate == 0 {
        return Err(MediaError::AudioTooShort);
    }

    let mono = audio.downmix();
    let rate = mono.sample_rate as f64;
    let window_len = (mono.sample_rate / config.window_rate.max(1)).max(1) as usize;

    let mut segmenter = SilenceSegmenter::new(config.min_silence_secs);
    let mut silent_windows = 0usize;
    let mut windows = 0usize;

    for (i, window) in mono.samples.chunks(window_len).enumerate() {
        let volume = window
            .iter()
            .map(|&s| (s as f32 / 32768.0).abs())
            .sum::<f32>()
            / window.len() as f32;
        let silent = volume <= config.threshold;

        let start = (i * window_len) as f64 / rate;
        let end = (i * window_len + window.len()) as f64 / rate;
        segmenter.ingest_window(start, end, silent);

        windows += 1;
        if silent {
            silent_windows += 1;
        }
    }

    let intervals = segmenter.finalize(mono.duration());

    debug!(
        windows,
        silent_windows,
        spans = intervals.len(),
        duration_secs = mono.duration(),
        "Silence detection finished"
    );

    Ok(intervals)
}
