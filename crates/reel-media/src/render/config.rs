//! Encoder settings for rendered clips.

use serde::{Deserialize, Serialize};

pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_PRESET: &str = "veryfast";
pub const DEFAULT_CRF: u8 = 20;
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Video/audio encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Upper bound for a single FFmpeg invocation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_timeout_secs() -> u64 {
    600
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: DEFAULT_CRF,
            pixel_format: default_pixel_format(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RenderConfig {
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(51);
        self
    }

    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self
    }

    /// FFmpeg output arguments for the video stream.
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.video_codec.clone()];
        if self.video_codec.starts_with("lib") {
            args.extend(["-preset".to_string(), self.preset.clone()]);
            args.extend(["-crf".to_string(), self.crf.to_string()]);
        }
        args.extend(["-pix_fmt".to_string(), self.pixel_format.clone()]);
        args
    }

    /// FFmpeg output arguments for the audio stream.
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.video_codec, "libx264");
        assert_eq!(config.crf, 20);
    }

    #[test]
    fn test_video_args() {
        let args = RenderConfig::default().video_args();
        assert_eq!(
            args,
            vec!["-c:v", "libx264", "-preset", "veryfast", "-crf", "20", "-pix_fmt", "yuv420p"]
        );
    }

    #[test]
    fn test_non_x264_codec_skips_crf() {
        let args = RenderConfig::default().with_video_codec("mpeg4").video_args();
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"crf": 28}"#).unwrap();
        assert_eq!(config.crf, 28);
        assert_eq!(config.audio_codec, "aac");
    }
}
