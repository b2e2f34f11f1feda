//! The persisted per-source analysis record.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::effect::EffectSet;
use crate::style::{AudioProfile, StyleProfile};
use crate::tags::Tags;
use crate::transcript::Transcript;

/// Where an analyzed source came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRef {
    /// Local path of the decoded container
    pub path: String,
    /// Caption published with the reel, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl SourceRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Complete analysis of one source.
///
/// Every part is required at construction, so a record can never be partial.
/// Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisRecord {
    id: Uuid,
    source: SourceRef,
    duration_secs: f64,
    style: StyleProfile,
    audio: AudioProfile,
    tags: Tags,
    effects: EffectSet,
    transcript: Transcript,
    created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: SourceRef,
        duration_secs: f64,
        style: StyleProfile,
        audio: AudioProfile,
        tags: Tags,
        effects: EffectSet,
        transcript: Transcript,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            duration_secs,
            style,
            audio,
            tags,
            effects,
            transcript,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn style(&self) -> &StyleProfile {
        &self.style
    }

    pub fn audio(&self) -> &AudioProfile {
        &self.audio
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectLabel;
    use crate::style::{BrightnessClass, FrequencyClass, MotionClass, VolumeClass};

    fn sample() -> AnalysisRecord {
        AnalysisRecord::new(
            SourceRef::new("/tmp/reel.mp4").with_caption("#tag"),
            42.0,
            StyleProfile {
                brightness: BrightnessClass::Dark,
                motion: MotionClass::LowMotion,
                dominant_color: [10.0, 20.0, 30.0],
                brightness_value: 20.0,
                motion_value: 0.5,
            },
            AudioProfile {
                volume: VolumeClass::Quiet,
                frequency: FrequencyClass::BassHeavy,
                mean_amplitude: 100.0,
                bass_energy: 5.0,
                treble_energy: 1.0,
            },
            Tags::from_caption("#tag"),
            [EffectLabel::SlowMotion].into_iter().collect(),
            Transcript::placeholder(),
        )
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(sample().id(), sample().id());
    }

    #[test]
    fn test_json_roundtrip_preserves_record() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("\"slow_motion\""));
    }
}
