//! Frame sinks: where rendered frames go.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;
use tracing::{debug, info};

use super::config::RenderConfig;
use super::ensure_destination;
use crate::command::check_ffmpeg;
use crate::error::{RenderError, RenderResult};

/// Consumer of rendered RGB frames.
pub trait FrameSink: Send {
    fn write_frame(&mut self, image: &RgbImage) -> RenderResult<()>;

    /// Flush and close. Called exactly once after the last frame.
    fn finish(&mut self) -> RenderResult<()>;
}

/// Collects frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, image: &RgbImage) -> RenderResult<()> {
        if self.finished {
            return Err(RenderError::Encode("sink already finished".to_string()));
        }
        self.frames.push(image.clone());
        Ok(())
    }

    fn finish(&mut self) -> RenderResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Pipes rgb24 frames into an `ffmpeg` encoder process.
pub struct FfmpegEncoder {
    output: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frames_written: u64,
}

impl FfmpegEncoder {
    /// Start an encoder writing `width` x `height` frames at `fps` to `output`.
    ///
    /// When `audio_from` is set, its first audio stream (if any) is muxed in.
    pub fn create(
        output: impl AsRef<Path>,
        width: u32,
        height: u32,
        fps: f64,
        config: &RenderConfig,
        audio_from: Option<&Path>,
    ) -> RenderResult<Self> {
        let output = output.as_ref().to_path_buf();
        ensure_destination(&output)?;
        check_ffmpeg().map_err(|e| RenderError::EncoderInit(e.to_string()))?;
        if width == 0 || height == 0 || !(fps.is_finite() && fps > 0.0) {
            return Err(RenderError::EncoderInit(format!(
                "invalid output geometry {width}x{height} @ {fps} fps"
            )));
        }

        let mut args: Vec<String> = [
            "-y", "-hide_banner", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend([
            "-s".to_string(),
            format!("{width}x{height}"),
            "-r".to_string(),
            format!("{fps:.3}"),
            "-i".to_string(),
            "pipe:0".to_string(),
        ]);
        if let Some(audio) = audio_from {
            args.extend([
                "-i".to_string(),
                audio.to_string_lossy().to_string(),
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "1:a:0?".to_string(),
                "-shortest".to_string(),
            ]);
            args.extend(config.audio_args());
        }
        args.extend(config.video_args());
        args.push(output.to_string_lossy().to_string());

        debug!("Starting encoder: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::EncoderInit(e.to_string()))?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        Ok(Self {
            output,
            width,
            height,
            child,
            stdin,
            stderr,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, image: &RgbImage) -> RenderResult<()> {
        if image.dimensions() != (self.width, self.height) {
            return Err(RenderError::Encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| RenderError::Encode("encoder already finished".to_string()))?;
        if let Err(e) = stdin.write_all(image.as_raw()) {
            self.stdin = None;
            let _ = self.child.wait();
            let stderr = self.collect_stderr();
            return Err(RenderError::Encode(format!("{e}: {}", stderr.trim())));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> RenderResult<()> {
        // Closing stdin signals end of stream.
        self.stdin = None;
        let status = self.child.wait()?;
        let stderr = self.collect_stderr();
        if !status.success() {
            return Err(RenderError::Encode(format!(
                "encoder exited with {:?}: {}",
                status.code(),
                stderr.trim()
            )));
        }
        info!(
            output = %self.output.display(),
            frames = self.frames_written,
            "Encoder finished"
        );
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            self.stdin = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
