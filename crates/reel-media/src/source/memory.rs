use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use image::RgbImage;

use super::{FrameStream, MediaHandle};
use crate::error::{MediaError, MediaResult};
use crate::frame::{AudioBuffer, Frame};
use crate::probe::MediaInfo;

/// Source backed by frames and audio held in memory.
///
/// Used for synthetic inputs and tests.
pub struct MemorySource {
    info: MediaInfo,
    frames: Arc<Vec<Frame>>,
    audio: Option<Arc<AudioBuffer>>,
    resampled: Mutex<HashMap<u32, Arc<AudioBuffer>>>,
}

impl MemorySource {
    /// Build from images at a fixed frame rate. Timestamps are `index / fps`.
    pub fn from_images(images: Vec<RgbImage>, fps: f64) -> MediaResult<Self> {
        let first = images
            .first()
            .ok_or_else(|| MediaError::invalid_video("Memory source has no frames"))?;
        if !(fps.is_finite() && fps > 0.0) {
            return Err(MediaError::invalid_video(format!("Invalid frame rate {fps}")));
        }
        let (width, height) = first.dimensions();
        if images.iter().any(|img| img.dimensions() != (width, height)) {
            return Err(MediaError::invalid_video("Frames differ in size"));
        }

        let frame_count = images.len() as u64;
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| Frame::new(i as u64, i as f64 / fps, image))
            .collect();

        Ok(Self {
            info: MediaInfo {
                frame_count,
                fps,
                width,
                height,
                duration: frame_count as f64 / fps,
                audio_sample_rate: None,
                audio_channels: None,
            },
            frames: Arc::new(frames),
            audio: None,
            resampled: Mutex::new(HashMap::new()),
        })
    }

    /// Attach an audio track.
    pub fn with_audio(mut self, audio: AudioBuffer) -> Self {
        self.info.audio_sample_rate = Some(audio.sample_rate);
        self.info.audio_channels = Some(audio.channels);
        self.audio = Some(Arc::new(audio));
        self
    }
}

impl MediaHandle for MemorySource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn frames(&self) -> MediaResult<FrameStream> {
        let frames = Arc::clone(&self.frames);
        Ok(Box::new(
            (0..frames.len()).map(move |i| Ok(frames[i].clone())),
        ))
    }

    fn seek(&self, timestamp: f64) -> MediaResult<Frame> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(MediaError::invalid_video(format!(
                "Cannot seek to {timestamp}"
            )));
        }
        let index = ((timestamp * self.info.fps).floor() as usize).min(self.frames.len() - 1);
        Ok(self.frames[index].clone())
    }

    fn audio(&self, rate: Option<u32>) -> MediaResult<Arc<AudioBuffer>> {
        let native = self.audio.as_ref().ok_or(MediaError::NoAudioTrack)?;
        let rate = match rate {
            Some(r) if r != native.sample_rate => r,
            _ => return Ok(Arc::clone(native)),
        };

        let mut cache = self
            .resampled
            .lock()
            .map_err(|_| MediaError::internal("audio cache lock poisoned"))?;
        let buffer = cache
            .entry(rate)
            .or_insert_with(|| Arc::new(native.resample(rate)));
        Ok(Arc::clone(buffer))
    }
}
