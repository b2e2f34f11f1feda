use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbImage;
use tracing::{debug, info};

use super::{FrameStream, MediaHandle};
use crate::command::check_ffmpeg;
use crate::error::{MediaError, MediaResult};
use crate::frame::{AudioBuffer, Frame};
use crate::probe::{probe_media, MediaInfo};

/// Source decoded on demand by the `ffmpeg` CLI.
pub struct FfmpegSource {
    path: PathBuf,
    info: MediaInfo,
    audio_cache: Mutex<HashMap<Option<u32>, Arc<AudioBuffer>>>,
}

impl FfmpegSource {
    /// Probe `path` and open it for decoding.
    pub async fn open(path: impl AsRef<Path>, timeout: Duration) -> MediaResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(MediaError::FileNotFound(path));
        }
        check_ffmpeg()?;

        let info = tokio::time::timeout(timeout, probe_media(&path))
            .await
            .map_err(|_| MediaError::Timeout(timeout.as_secs()))??;

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            frames = info.frame_count,
            has_audio = info.has_audio(),
            "Opened media source"
        );

        Ok(Self {
            path,
            info,
            audio_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn frame_bytes(&self) -> usize {
        self.info.width as usize * self.info.height as usize * 3
    }

    fn decode_audio(&self, rate: Option<u32>) -> MediaResult<AudioBuffer> {
        let native_rate = self.info.audio_sample_rate.ok_or(MediaError::NoAudioTrack)?;
        let channels = self.info.audio_channels.unwrap_or(1).max(1);
        let sample_rate = rate.unwrap_or(native_rate);

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-v", "error", "-i"])
            .arg(&self.path)
            .args(["-vn", "-f", "s16le", "-acodec", "pcm_s16le"])
            .args(["-ar", &sample_rate.to_string()])
            .args(["-ac", &channels.to_string()])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffmpeg_failed(
                "Audio decode failed",
                Some(stderr),
                output.status.code(),
            ));
        }

        let buffer = AudioBuffer::from_s16le(&output.stdout, sample_rate, channels);
        debug!(
            path = %self.path.display(),
            sample_rate,
            channels,
            samples = buffer.samples.len(),
            "Decoded audio"
        );
        Ok(buffer)
    }
}

impl MediaHandle for FfmpegSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn frames(&self) -> MediaResult<FrameStream> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-v", "error", "-i"])
            .arg(&self.path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stdout not captured"))?;

        Ok(Box::new(RawFrameReader {
            child,
            stdout,
            width: self.info.width,
            height: self.info.height,
            fps: self.info.fps,
            frame_bytes: self.frame_bytes(),
            next_index: 0,
            finished: false,
        }))
    }

    fn seek(&self, timestamp: f64) -> MediaResult<Frame> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(MediaError::invalid_video(format!(
                "Cannot seek to {timestamp}"
            )));
        }

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-v", "error"])
            .args(["-ss", &format!("{:.3}", timestamp), "-i"])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffmpeg_failed(
                "Seek decode failed",
                Some(stderr),
                output.status.code(),
            ));
        }

        let expected = self.frame_bytes();
        if output.stdout.len() < expected {
            return Err(MediaError::TruncatedFrame {
                expected,
                actual: output.stdout.len(),
            });
        }

        let mut data = output.stdout;
        data.truncate(expected);
        let image = RgbImage::from_raw(self.info.width, self.info.height, data)
            .ok_or_else(|| MediaError::internal("Frame buffer size mismatch"))?;
        let index = (timestamp * self.info.fps).round() as u64;
        Ok(Frame::new(index, timestamp, image))
    }

    fn audio(&self, rate: Option<u32>) -> MediaResult<Arc<AudioBuffer>> {
        if !self.info.has_audio() {
            return Err(MediaError::NoAudioTrack);
        }

        let mut cache = self
            .audio_cache
            .lock()
            .map_err(|_| MediaError::internal("audio cache lock poisoned"))?;
        if let Some(buffer) = cache.get(&rate) {
            return Ok(Arc::clone(buffer));
        }
        let buffer = Arc::new(self.decode_audio(rate)?);
        cache.insert(rate, Arc::clone(&buffer));
        Ok(buffer)
    }
}

/// Reads fixed-size rgb24 frames from a running decoder.
struct RawFrameReader {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    fps: f64,
    frame_bytes: usize,
    next_index: u64,
    finished: bool,
}

impl RawFrameReader {
    /// Fill `buf` completely. Returns the number of bytes read before EOF.
    fn fill(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl Iterator for RawFrameReader {
    type Item = MediaResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut data = vec![0u8; self.frame_bytes];
        let read = match self.fill(&mut data) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        };

        if read == 0 {
            self.finished = true;
            return match self.child.wait() {
                Ok(status) if status.success() => None,
                Ok(status) if self.next_index > 0 => {
                    debug!(code = ?status.code(), "Decoder exited with error after frames");
                    None
                }
                Ok(status) => Some(Err(MediaError::ffmpeg_failed(
                    "Video decode produced no frames",
                    None,
                    status.code(),
                ))),
                Err(e) => Some(Err(e.into())),
            };
        }

        if read < self.frame_bytes {
            self.finished = true;
            return Some(Err(MediaError::TruncatedFrame {
                expected: self.frame_bytes,
                actual: read,
            }));
        }

        let index = self.next_index;
        self.next_index += 1;
        let image = RgbImage::from_raw(self.width, self.height, data)?;
        Some(Ok(Frame::new(index, index as f64 / self.fps, image)))
    }
}

impl Drop for RawFrameReader {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
