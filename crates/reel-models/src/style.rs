//! Visual and audio style profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall brightness of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessClass {
    Bright,
    Dark,
}

impl BrightnessClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrightnessClass::Bright => "bright",
            BrightnessClass::Dark => "dark",
        }
    }
}

/// Amount of frame-to-frame change in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MotionClass {
    HighMotion,
    LowMotion,
}

impl MotionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionClass::HighMotion => "high motion",
            MotionClass::LowMotion => "low motion",
        }
    }
}

/// Loudness of the audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VolumeClass {
    Loud,
    Quiet,
}

impl VolumeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeClass::Loud => "loud",
            VolumeClass::Quiet => "quiet",
        }
    }
}

/// Spectral balance of the audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyClass {
    BassHeavy,
    TrebleHeavy,
}

impl FrequencyClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyClass::BassHeavy => "bass-heavy",
            FrequencyClass::TrebleHeavy => "treble-heavy",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(BrightnessClass, MotionClass, VolumeClass, FrequencyClass);

/// Visual style derived once per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleProfile {
    pub brightness: BrightnessClass,
    pub motion: MotionClass,
    /// Mean color of the sampled frames, in R, G, B order (0-255 scale)
    pub dominant_color: [f64; 3],
    /// Mean of the three dominant-color channels
    pub brightness_value: f64,
    /// Average mean-absolute gray difference between consecutive frames
    pub motion_value: f64,
}

/// Audio style derived once per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioProfile {
    pub volume: VolumeClass,
    pub frequency: FrequencyClass,
    /// Mean absolute sample value (16-bit PCM scale)
    pub mean_amplitude: f64,
    /// Mean spectral magnitude of the lowest bins
    pub bass_energy: f64,
    /// Mean spectral magnitude of the highest bins
    pub treble_energy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_labels() {
        assert_eq!(BrightnessClass::Bright.to_string(), "bright");
        assert_eq!(MotionClass::HighMotion.to_string(), "high motion");
        assert_eq!(VolumeClass::Quiet.to_string(), "quiet");
        assert_eq!(FrequencyClass::BassHeavy.to_string(), "bass-heavy");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&FrequencyClass::TrebleHeavy).unwrap();
        assert_eq!(json, "\"treble_heavy\"");
        let parsed: MotionClass = serde_json::from_str("\"low_motion\"").unwrap();
        assert_eq!(parsed, MotionClass::LowMotion);
    }
}
