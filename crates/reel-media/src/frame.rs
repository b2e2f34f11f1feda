//! Decoded frames and audio buffers.

use std::io::Cursor;

use image::{GrayImage, RgbImage};

use crate::error::{MediaError, MediaResult};

/// A decoded RGB video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position in the source
    pub index: u64,
    /// Presentation time in seconds
    pub timestamp: f64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, timestamp: f64, image: RgbImage) -> Self {
        Self {
            index,
            timestamp,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Luma plane using the BT.601 fixed-point weights OpenCV applies for RGB2GRAY.
    pub fn gray(&self) -> GrayImage {
        to_gray(&self.image)
    }

    /// Per-channel mean in R, G, B order.
    pub fn mean_color(&self) -> [f64; 3] {
        let mut sums = [0u64; 3];
        for px in self.image.pixels() {
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
        }
        let n = (self.image.width() as u64 * self.image.height() as u64).max(1) as f64;
        [sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n]
    }
}

const GRAY_SHIFT: u32 = 14;
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;

pub(crate) fn to_gray(image: &RgbImage) -> GrayImage {
    let round = 1u32 << (GRAY_SHIFT - 1);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let y = (p[0] as u32 * R_WEIGHT + p[1] as u32 * G_WEIGHT + p[2] as u32 * B_WEIGHT + round)
            >> GRAY_SHIFT;
        image::Luma([y.min(255) as u8])
    })
}

/// Mean absolute per-pixel difference between two equally sized gray planes.
pub(crate) fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() || a.is_empty() {
        return 0.0;
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    total as f64 / a.as_raw().len() as f64
}

/// Interleaved 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Build from little-endian `s16le` bytes as produced by FFmpeg.
    pub fn from_s16le(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Self::new(samples, sample_rate, channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples scaled to -1.0..1.0.
    pub fn normalized(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }

    /// Average all channels into a mono buffer.
    pub fn downmix(&self) -> AudioBuffer {
        if self.channels == 1 {
            return self.clone();
        }
        let ch = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(ch)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / ch as i32) as i16
            })
            .collect();
        AudioBuffer::new(samples, self.sample_rate, 1)
    }

    /// Linear-interpolation resample, channel layout preserved.
    pub fn resample(&self, target_rate: u32) -> AudioBuffer {
        if target_rate == self.sample_rate || self.sample_rate == 0 || self.is_empty() {
            return AudioBuffer::new(self.samples.clone(), target_rate.max(1), self.channels);
        }
        let ch = self.channels as usize;
        let in_frames = self.frame_count();
        let out_frames =
            ((in_frames as u64 * target_rate as u64) / self.sample_rate as u64).max(1) as usize;
        let step = self.sample_rate as f64 / target_rate as f64;

        let mut out = Vec::with_capacity(out_frames * ch);
        for i in 0..out_frames {
            let pos = i as f64 * step;
            let left = (pos.floor() as usize).min(in_frames - 1);
            let right = (left + 1).min(in_frames - 1);
            let frac = pos - left as f64;
            for c in 0..ch {
                let a = self.samples[left * ch + c] as f64;
                let b = self.samples[right * ch + c] as f64;
                out.push((a + (b - a) * frac).round() as i16);
            }
        }
        AudioBuffer::new(out, target_rate, self.channels)
    }

    /// Encode as a 16-bit PCM WAV file.
    pub fn to_wav_bytes(&self) -> MediaResult<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wav_err = |e: hound::Error| MediaError::internal(format!("WAV encode failed: {e}"));

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_err)?;
        let mut samples = writer.get_i16_writer(self.samples.len() as u32);
        for &s in &self.samples {
            samples.write_sample(s);
        }
        samples.flush().map_err(wav_err)?;
        writer.finalize().map_err(wav_err)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_matches_opencv_weights() {
        let img = RgbImage::from_pixel(1, 1, image::Rgb([255, 0, 0]));
        assert_eq!(to_gray(&img).get_pixel(0, 0)[0], 76);
        let img = RgbImage::from_pixel(1, 1, image::Rgb([0, 255, 0]));
        assert_eq!(to_gray(&img).get_pixel(0, 0)[0], 150);
        let img = RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        assert_eq!(to_gray(&img).get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_mean_color_rgb_order() {
        let frame = Frame::new(0, 0.0, RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30])));
        assert_eq!(frame.mean_color(), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_mean_abs_diff() {
        let a = GrayImage::from_pixel(2, 2, image::Luma([10]));
        let b = GrayImage::from_pixel(2, 2, image::Luma([40]));
        assert_eq!(mean_abs_diff(&a, &b), 30.0);
        assert_eq!(mean_abs_diff(&a, &a), 0.0);
    }

    #[test]
    fn test_downmix_and_duration() {
        let buf = AudioBuffer::new(vec![100, 300, -100, -300], 2, 2);
        assert_eq!(buf.frame_count(), 2);
        assert_eq!(buf.duration(), 1.0);
        assert_eq!(buf.downmix().samples, vec![200, -200]);
    }

    #[test]
    fn test_resample_linear() {
        let buf = AudioBuffer::new(vec![0, 100, 200, 300], 4, 1);
        let up = buf.resample(8);
        assert_eq!(up.sample_rate, 8);
        assert_eq!(up.frame_count(), 8);
        assert_eq!(&up.samples[..4], &[0, 50, 100, 150]);
        let down = buf.resample(2);
        assert_eq!(down.samples, vec![0, 200]);
    }

    #[test]
    fn test_wav_round_trip() {
        let buf = AudioBuffer::new(vec![1, -1, 300, -300], 16000, 2);
        let wav = buf.to_wav_bytes().unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(wav.len(), 44 + 8);

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 2);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, buf.samples);
    }

    #[test]
    fn test_from_s16le() {
        let buf = AudioBuffer::from_s16le(&[0x01, 0x00, 0xff, 0xff], 8000, 1);
        assert_eq!(buf.samples, vec![1, -1]);
    }
}
