//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Stream information for a decoded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Number of video frames
    pub frame_count: u64,
    /// Frame rate (fps)
    pub fps: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
    /// Native audio sample rate, if the source has audio
    pub audio_sample_rate: Option<u32>,
    /// Audio channel count, if the source has audio
    pub audio_channels: Option<u16>,
}

impl MediaInfo {
    pub fn has_audio(&self) -> bool {
        self.audio_sample_rate.is_some()
    }

    /// Integer frame rate used for frame-stride sampling (never zero).
    pub fn frame_stride(&self) -> usize {
        frame_stride(self.fps)
    }
}

/// `max(1, fps)` with integer truncation.
pub fn frame_stride(fps: f64) -> usize {
    if fps.is_finite() && fps >= 1.0 {
        fps as usize
    } else {
        1
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
}

/// Probe a media file for stream information.
///
/// Fails with [`MediaError::InvalidVideo`] when the file has no video stream,
/// no usable dimensions, or zero frames.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::invalid_video(format!(
            "ffprobe could not read {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(json: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;

    let width = video.width.unwrap_or(0);
    let height = video.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(MediaError::invalid_video("Video stream has no dimensions"));
    }

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    let duration = video
        .duration
        .as_deref()
        .or(probe.format.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (duration * fps).round() as u64);

    if frame_count == 0 {
        return Err(MediaError::invalid_video("Video stream has zero frames"));
    }

    let audio = probe.streams.iter().find(|s| s.codec_type == "audio");
    let audio_sample_rate = audio
        .and_then(|a| a.sample_rate.as_deref())
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|r| *r > 0);
    let audio_channels = audio_sample_rate.and(audio.and_then(|a| a.channels));

    Ok(MediaInfo {
        frame_count,
        fps,
        width,
        height,
        duration: if duration > 0.0 {
            duration
        } else {
            frame_count as f64 / fps
        },
        audio_sample_rate,
        audio_channels,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
pub(crate) fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den > 0.0 && num > 0.0).then(|| num / den);
    }
    s.parse().ok().filter(|v: &f64| *v > 0.0)
}
