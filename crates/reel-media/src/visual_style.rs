//! Dominant-color, brightness and motion estimation.

use image::GrayImage;
use reel_models::{BrightnessClass, MotionClass, StyleProfile};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{MediaError, MediaResult};
use crate::frame::{mean_abs_diff, Frame};
use crate::probe::frame_stride;

/// Classification cut-offs for [`StyleProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleThresholds {
    /// Mean channel value above which a source is bright
    pub brightness: f64,
    /// Mean gray difference above which a source is high motion
    pub motion: f64,
}

impl Default for StyleThresholds {
    fn default() -> Self {
        Self {
            brightness: 127.0,
            motion: 10.0,
        }
    }
}

/// Single-pass estimator fed one frame at a time.
pub struct VisualStyleEstimator {
    stride: u64,
    thresholds: StyleThresholds,
    color_sum: [f64; 3],
    color_samples: u64,
    prev_gray: Option<GrayImage>,
    motion_sum: f64,
    motion_samples: u64,
    frames_seen: u64,
}

impl VisualStyleEstimator {
    pub fn new(fps: f64, thresholds: StyleThresholds) -> Self {
        Self {
            stride: frame_stride(fps) as u64,
            thresholds,
            color_sum: [0.0; 3],
            color_samples: 0,
            prev_gray: None,
            motion_sum: 0.0,
            motion_samples: 0,
            frames_seen: 0,
        }
    }

    pub fn observe(&mut self, frame: &Frame) {
        self.frames_seen += 1;

        if frame.index % self.stride == 0 {
            let mean = frame.mean_color();
            for (sum, m) in self.color_sum.iter_mut().zip(mean) {
                *sum += m;
            }
            self.color_samples += 1;
        }

        let gray = frame.gray();
        if let Some(prev) = &self.prev_gray {
            self.motion_sum += mean_abs_diff(prev, &gray);
            self.motion_samples += 1;
        }
        self.prev_gray = Some(gray);
    }

    pub fn finish(self) -> MediaResult<StyleProfile> {
        if self.frames_seen == 0 || self.color_samples == 0 {
            return Err(MediaError::invalid_video("No frames to estimate style from"));
        }

        let n = self.color_samples as f64;
        let dominant_color = self.color_sum.map(|s| s / n);
        let brightness_value = dominant_color.iter().sum::<f64>() / 3.0;
        let motion_value = if self.motion_samples == 0 {
            0.0
        } else {
            self.motion_sum / self.motion_samples as f64
        };

        Ok(StyleProfile {
            brightness: if brightness_value > self.thresholds.brightness {
                BrightnessClass::Bright
            } else {
                BrightnessClass::Dark
            },
            motion: if motion_value > self.thresholds.motion {
                MotionClass::HighMotion
            } else {
                MotionClass::LowMotion
            },
            dominant_color,
            brightness_value,
            motion_value,
        })
    }
}

/// Run the estimator over a whole frame sequence.
pub fn estimate_visual_style<I>(
    frames: I,
    fps: f64,
    thresholds: StyleThresholds,
    cancel: &CancellationToken,
) -> MediaResult<StyleProfile>
where
    I: IntoIterator<Item = MediaResult<Frame>>,
{
    let mut estimator = VisualStyleEstimator::new(fps, thresholds);
    for frame in frames {
        if cancel.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        estimator.observe(&frame?);
    }
    estimator.finish()
}
