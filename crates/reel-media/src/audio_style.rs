//! Volume and bass/treble balance estimation.

use reel_models::{AudioProfile, FrequencyClass, VolumeClass};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::frame::AudioBuffer;

/// Cut-offs for [`AudioProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioThresholds {
    /// Mean absolute sample value (16-bit scale) above which audio is loud
    pub loud_amplitude: f64,
    /// Fraction of positive bins counted as bass, from the bottom
    pub bass_fraction: f64,
    /// Fraction of positive bins where the treble band starts
    pub treble_start: f64,
}

impl Default for AudioThresholds {
    fn default() -> Self {
        Self {
            loud_amplitude: 10_000.0,
            bass_fraction: 0.1,
            treble_start: 0.6,
        }
    }
}

/// Classify a whole audio buffer.
///
/// The FFT runs over the buffer exactly as stored (interleaved when multi-channel).
pub fn estimate_audio_style(
    audio: &AudioBuffer,
    thresholds: AudioThresholds,
) -> MediaResult<AudioProfile> {
    if audio.is_empty() {
        return Err(MediaError::AudioTooShort);
    }

    let mean_amplitude = audio
        .samples
        .iter()
        .map(|&s| (s as f64).abs())
        .sum::<f64>()
        / audio.samples.len() as f64;

    let magnitudes = spectrum_magnitudes(&audio.samples);
    let bins = magnitudes.len() / 2;
    let bass_end = (thresholds.bass_fraction * bins as f64).floor() as usize;
    let treble_begin = (thresholds.treble_start * bins as f64).floor() as usize;

    let bass_energy = band_mean(&magnitudes[..bass_end.min(bins)]);
    let treble_energy = band_mean(&magnitudes[treble_begin.min(bins)..bins]);

    debug!(
        samples = audio.samples.len(),
        mean_amplitude,
        bass_energy,
        treble_energy,
        "Estimated audio style"
    );

    Ok(AudioProfile {
        volume: if mean_amplitude > thresholds.loud_amplitude {
            VolumeClass::Loud
        } else {
            VolumeClass::Quiet
        },
        frequency: if bass_energy > treble_energy {
            FrequencyClass::BassHeavy
        } else {
            FrequencyClass::TrebleHeavy
        },
        mean_amplitude,
        bass_energy,
        treble_energy,
    })
}

fn spectrum_magnitudes(samples: &[i16]) -> Vec<f64> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(samples.len());

    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    fft.process(&mut buffer);

    buffer.iter().map(|c| c.norm()).collect()
}

fn band_mean(band: &[f64]) -> f64 {
    if band.is_empty() {
        0.0
    } else {
        band.iter().sum::<f64>() / band.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, amplitude: f64, rate: u32, secs: f64) -> AudioBuffer {
        let n = (rate as f64 * secs) as usize;
        let samples = (0..n)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / rate as f64).sin()) as i16)
            .collect();
        AudioBuffer::new(samples, rate, 1)
    }

    #[test]
    fn test_thresholds_pinned() {
        let t = AudioThresholds::default();
        assert_eq!(t.loud_amplitude, 10_000.0);
        assert_eq!(t.bass_fraction, 0.1);
        assert_eq!(t.treble_start, 0.6);
    }

    #[test]
    fn test_loud_low_tone_is_bass_heavy() {
        let profile =
            estimate_audio_style(&tone(100.0, 20_000.0, 8000, 1.0), AudioThresholds::default())
                .unwrap();
        assert_eq!(profile.volume, VolumeClass::Loud);
        assert_eq!(profile.frequency, FrequencyClass::BassHeavy);
        assert!((profile.mean_amplitude - 20_000.0 * 2.0 / PI).abs() < 50.0);
    }

    #[test]
    fn test_quiet_high_tone_is_treble_heavy() {
        let profile =
            estimate_audio_style(&tone(3500.0, 5_000.0, 8000, 1.0), AudioThresholds::default())
                .unwrap();
        assert_eq!(profile.volume, VolumeClass::Quiet);
        assert_eq!(profile.frequency, FrequencyClass::TrebleHeavy);
        assert!(profile.treble_energy > profile.bass_energy);
    }

    #[test]
    fn test_empty_buffer_is_too_short() {
        let empty = AudioBuffer::new(Vec::new(), 16000, 1);
        assert!(matches!(
            estimate_audio_style(&empty, AudioThresholds::default()),
            Err(MediaError::AudioTooShort)
        ));
    }

    #[test]
    fn test_tiny_buffer_has_empty_bands() {
        let profile =
            estimate_audio_style(&AudioBuffer::new(vec![100, -100, 100], 8000, 1), AudioThresholds::default())
                .unwrap();
        assert_eq!(profile.bass_energy, 0.0);
        assert_eq!(profile.frequency, FrequencyClass::TrebleHeavy);
    }
}
