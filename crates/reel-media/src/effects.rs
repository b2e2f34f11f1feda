//! Transition, filter, overlay and slow-motion effect detection.
//!
//! Frames are sampled every half second. Each sampled frame is checked for:
//! - a large gray-level jump from the previous sample (rapid transitions)
//! - a dominant 8x8x8 RGB histogram bin (color filters)
//! - a high Canny edge density (text overlay)
//! - a near-identical 64-bit average hash to the previous sample (slow motion)

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::edges::canny;
use reel_models::{EffectLabel, EffectSet};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{MediaError, MediaResult};
use crate::frame::{mean_abs_diff, Frame};
use crate::probe::frame_stride;

/// Named cut-offs for every effect rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectThresholds {
    /// Mean gray difference between samples above which a transition is rapid
    pub transition_diff: f64,
    /// Fraction of the total frame count a histogram bin must exceed
    pub histogram_bin_ratio: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Fraction of the frame area that must be edge pixels
    pub edge_density: f64,
    /// Hamming distance below which consecutive samples count as slow motion
    pub hash_distance: u32,
}

impl Default for EffectThresholds {
    fn default() -> Self {
        Self {
            transition_diff: 30.0,
            histogram_bin_ratio: 0.1,
            canny_low: 100.0,
            canny_high: 200.0,
            edge_density: 0.1,
            hash_distance: 5,
        }
    }
}

/// Streaming effect detector.
pub struct EffectDetector {
    stride: u64,
    total_frames: u64,
    thresholds: EffectThresholds,
    effects: EffectSet,
    prev_gray: Option<GrayImage>,
    prev_hash: Option<u64>,
    sampled: u64,
}

impl EffectDetector {
    /// `total_frames` is the source's frame count, used by the histogram rule.
    pub fn new(fps: f64, total_frames: u64, thresholds: EffectThresholds) -> Self {
        Self {
            stride: (frame_stride(fps) / 2).max(1) as u64,
            total_frames,
            thresholds,
            effects: EffectSet::new(),
            prev_gray: None,
            prev_hash: None,
            sampled: 0,
        }
    }

    /// Effects found so far. Only ever grows.
    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    pub fn observe(&mut self, frame: &Frame) {
        if frame.index % self.stride != 0 {
            return;
        }
        self.sampled += 1;

        let gray = frame.gray();

        if let Some(prev) = &self.prev_gray {
            if mean_abs_diff(prev, &gray) > self.thresholds.transition_diff {
                self.effects.insert(EffectLabel::RapidTransitions);
            }
        }

        let bin_limit = self.total_frames as f64 * self.thresholds.histogram_bin_ratio;
        if max_histogram_bin(frame) as f64 > bin_limit {
            self.effects.insert(EffectLabel::ColorFilters);
        }

        let area = gray.width() as f64 * gray.height() as f64;
        if edge_pixel_count(&gray, self.thresholds.canny_low, self.thresholds.canny_high) as f64
            > area * self.thresholds.edge_density
        {
            self.effects.insert(EffectLabel::TextOverlay);
        }

        let hash = average_hash(frame);
        if let Some(prev) = self.prev_hash {
            if (hash ^ prev).count_ones() < self.thresholds.hash_distance {
                self.effects.insert(EffectLabel::SlowMotion);
            }
        }

        trace!(
            index = frame.index,
            sampled = self.sampled,
            effects = self.effects.len(),
            "Sampled frame for effects"
        );
        self.prev_gray = Some(gray);
        self.prev_hash = Some(hash);
    }

    pub fn finish(self) -> EffectSet {
        self.effects
    }
}

/// Run the detector over a whole frame sequence.
pub fn detect_effects<I>(
    frames: I,
    fps: f64,
    total_frames: u64,
    thresholds: EffectThresholds,
    cancel: &CancellationToken,
) -> MediaResult<EffectSet>
where
    I: IntoIterator<Item = MediaResult<Frame>>,
{
    let mut detector = EffectDetector::new(fps, total_frames, thresholds);
    for frame in frames {
        if cancel.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        detector.observe(&frame?);
    }
    Ok(detector.finish())
}

/// Largest bin count of an 8x8x8 RGB histogram with 32-level bins.
fn max_histogram_bin(frame: &Frame) -> u32 {
    let mut bins = [0u32; 512];
    for px in frame.image.pixels() {
        let idx = ((px[0] >> 5) as usize) << 6 | ((px[1] >> 5) as usize) << 3 | (px[2] >> 5) as usize;
        bins[idx] += 1;
    }
    bins.into_iter().max().unwrap_or(0)
}

fn edge_pixel_count(gray: &GrayImage, low: f32, high: f32) -> usize {
    canny(gray, low, high).pixels().filter(|p| p[0] > 0).count()
}

/// 64-bit average hash: 8x8 luma thumbnail, one bit per pixel above the mean.
fn average_hash(frame: &Frame) -> u64 {
    let luma = imageops::grayscale(&frame.image);
    let thumb = imageops::resize(&luma, 8, 8, FilterType::Lanczos3);
    let mean = thumb.pixels().map(|p| p[0] as u32).sum::<u32>() as f64 / 64.0;
    thumb
        .pixels()
        .enumerate()
        .filter(|(_, p)| p[0] as f64 > mean)
        .fold(0u64, |acc, (i, _)| acc | (1u64 << i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame(index: u64, image: RgbImage) -> Frame {
        Frame::new(index, index as f64 / 30.0, image)
    }

    fn noise(seed: u32, w: u32, h: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2654435761).max(1);
        RgbImage::from_fn(w, h, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let v = (state & 0xff) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_mul(7)])
        })
    }

    #[test]
    fn test_thresholds_pinned() {
        let t = EffectThresholds::default();
        assert_eq!(t.transition_diff, 30.0);
        assert_eq!(t.histogram_bin_ratio, 0.1);
        assert_eq!((t.canny_low, t.canny_high), (100.0, 200.0));
        assert_eq!(t.edge_density, 0.1);
        assert_eq!(t.hash_distance, 5);
    }

    #[test]
    fn test_stride_is_half_second() {
        assert_eq!(EffectDetector::new(30.0, 100, EffectThresholds::default()).stride, 15);
        assert_eq!(EffectDetector::new(1.0, 100, EffectThresholds::default()).stride, 1);
    }

    #[test]
    fn test_identical_samples_are_slow_motion_and_color_filtered() {
        let img = RgbImage::from_pixel(32, 32, Rgb([40, 80, 120]));
        let frames: Vec<_> = (0..4).map(|i| Ok(frame(i, img.clone()))).collect();
        let effects =
            detect_effects(frames, 2.0, 4, EffectThresholds::default(), &CancellationToken::new())
                .unwrap();
        assert!(effects.contains(EffectLabel::SlowMotion));
        assert!(effects.contains(EffectLabel::ColorFilters));
        assert!(!effects.contains(EffectLabel::RapidTransitions));
        assert!(!effects.contains(EffectLabel::TextOverlay));
    }

    #[test]
    fn test_black_white_cut_is_rapid_transition() {
        let black = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        let frames = vec![Ok(frame(0, black)), Ok(frame(1, white))];
        let effects =
            detect_effects(frames, 2.0, 2, EffectThresholds::default(), &CancellationToken::new())
                .unwrap();
        assert!(effects.contains(EffectLabel::RapidTransitions));
    }

    #[test]
    fn test_dense_stripes_are_text_overlay() {
        let stripes = RgbImage::from_fn(64, 64, |x, _| {
            if (x / 4) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let mut detector = EffectDetector::new(2.0, 1_000_000, EffectThresholds::default());
        detector.observe(&frame(0, stripes));
        assert!(detector.effects().contains(EffectLabel::TextOverlay));
    }

    #[test]
    fn test_effect_set_is_monotone() {
        let mut detector = EffectDetector::new(2.0, 10, EffectThresholds::default());
        let mut previous = EffectSet::new();
        for i in 0..12 {
            let img = if i % 3 == 0 {
                RgbImage::from_pixel(32, 32, Rgb([200, 10, 10]))
            } else {
                noise(i as u32 + 1, 32, 32)
            };
            detector.observe(&frame(i, img));
            assert!(detector.effects().is_superset(&previous));
            previous = detector.effects().clone();
        }
    }

    #[test]
    fn test_histogram_bins() {
        let img = RgbImage::from_pixel(4, 4, Rgb([31, 32, 255]));
        assert_eq!(max_histogram_bin(&frame(0, img)), 16);
    }

    #[test]
    fn test_average_hash_identical_images() {
        let a = frame(0, noise(7, 40, 40));
        let b = frame(1, noise(7, 40, 40));
        assert_eq!(average_hash(&a), average_hash(&b));
    }
}
