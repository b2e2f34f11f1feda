//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_media::{AudioThresholds, EffectThresholds, RenderConfig, SilenceConfig, StyleThresholds};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum sources analyzed at once in a batch
    pub max_concurrent_sources: usize,
    /// Limit on probing/opening one source
    pub open_timeout: Duration,
    /// Limit on the whole analysis of one source
    pub source_timeout: Duration,
    /// Limit on one transcription call
    pub transcription_timeout: Duration,
    /// Limit on each blocking decode/render stage outside analysis
    pub stage_timeout: Duration,
    /// Retries for retryable failures (not counting the first attempt)
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,
    /// Work directory for temporary files
    pub work_dir: PathBuf,
    /// Where analysis records and rendered clips are written
    pub output_dir: PathBuf,
    pub style: StyleThresholds,
    pub effects: EffectThresholds,
    pub audio: AudioThresholds,
    pub silence: SilenceConfig,
    pub render: RenderConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 2,
            open_timeout: Duration::from_secs(60),
            source_timeout: Duration::from_secs(1800),
            transcription_timeout: Duration::from_secs(300),
            stage_timeout: Duration::from_secs(600),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            work_dir: PathBuf::from("/tmp/reel"),
            output_dir: PathBuf::from("reel-output"),
            style: StyleThresholds::default(),
            effects: EffectThresholds::default(),
            audio: AudioThresholds::default(),
            silence: SilenceConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut render = defaults.render.clone();
        if let Some(crf) = env_parse("REEL_RENDER_CRF") {
            render = render.with_crf(crf);
        }
        if let Ok(codec) = std::env::var("REEL_RENDER_CODEC") {
            render = render.with_video_codec(codec);
        }

        let mut silence = defaults.silence.clone();
        if let Some(threshold) = env_parse("REEL_SILENCE_THRESHOLD") {
            silence = silence.with_threshold(threshold);
        }
        if let Some(secs) = env_parse("REEL_MIN_SILENCE_SECS") {
            silence = silence.with_min_silence_secs(secs);
        }

        Self {
            max_concurrent_sources: env_parse::<usize>("REEL_MAX_CONCURRENT_SOURCES")
                .unwrap_or(defaults.max_concurrent_sources)
                .max(1),
            open_timeout: Duration::from_secs(env_parse("REEL_OPEN_TIMEOUT_SECS").unwrap_or(60)),
            source_timeout: Duration::from_secs(
                env_parse("REEL_SOURCE_TIMEOUT_SECS").unwrap_or(1800),
            ),
            transcription_timeout: Duration::from_secs(
                env_parse("REEL_TRANSCRIPTION_TIMEOUT_SECS").unwrap_or(300),
            ),
            stage_timeout: Duration::from_secs(
                env_parse("REEL_STAGE_TIMEOUT_SECS").unwrap_or(600),
            ),
            max_retries: env_parse("REEL_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_base_delay: Duration::from_millis(
                env_parse("REEL_RETRY_BASE_DELAY_MS").unwrap_or(500),
            ),
            work_dir: std::env::var("REEL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("REEL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            style: defaults.style,
            effects: defaults.effects,
            audio: defaults.audio,
            silence,
            render,
        }
    }
}
