//! Analysis record assembly.

use reel_models::{
    AnalysisRecord, AudioProfile, EffectSet, SourceRef, StyleProfile, Tags, Transcript,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Analysis record is missing {0}")]
    Missing(&'static str),
}

/// Collects every part of an [`AnalysisRecord`] and refuses to build a partial one.
#[derive(Debug, Default)]
pub struct AnalysisRecordBuilder {
    source: Option<SourceRef>,
    duration_secs: Option<f64>,
    style: Option<StyleProfile>,
    audio: Option<AudioProfile>,
    tags: Option<Tags>,
    effects: Option<EffectSet>,
    transcript: Option<Transcript>,
}

impl AnalysisRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn duration_secs(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    pub fn style(mut self, style: StyleProfile) -> Self {
        self.style = Some(style);
        self
    }

    pub fn audio(mut self, audio: AudioProfile) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn effects(mut self, effects: EffectSet) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn build(self) -> Result<AnalysisRecord, AssemblyError> {
        Ok(AnalysisRecord::new(
            self.source.ok_or(AssemblyError::Missing("source"))?,
            self.duration_secs.ok_or(AssemblyError::Missing("duration"))?,
            self.style.ok_or(AssemblyError::Missing("style"))?,
            self.audio.ok_or(AssemblyError::Missing("audio"))?,
            self.tags.ok_or(AssemblyError::Missing("tags"))?,
            self.effects.ok_or(AssemblyError::Missing("effects"))?,
            self.transcript.ok_or(AssemblyError::Missing("transcript"))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{BrightnessClass, EffectLabel, FrequencyClass, MotionClass, VolumeClass};

    fn style() -> StyleProfile {
        StyleProfile {
            brightness: BrightnessClass::Bright,
            motion: MotionClass::LowMotion,
            dominant_color: [200.0, 150.0, 100.0],
            brightness_value: 150.0,
            motion_value: 1.5,
        }
    }

    fn audio() -> AudioProfile {
        AudioProfile {
            volume: VolumeClass::Quiet,
            frequency: FrequencyClass::BassHeavy,
            mean_amplitude: 900.0,
            bass_energy: 10.0,
            treble_energy: 1.0,
        }
    }

    fn complete() -> AnalysisRecordBuilder {
        AnalysisRecordBuilder::new()
            .source(SourceRef::new("reel.mp4").with_caption("#surf with @kai"))
            .duration_secs(12.5)
            .style(style())
            .audio(audio())
            .tags(Tags::from_caption("#surf with @kai"))
            .effects([EffectLabel::SlowMotion].into_iter().collect())
            .transcript(Transcript::placeholder())
    }

    #[test]
    fn test_builds_complete_record() {
        let record = complete().build().unwrap();
        assert_eq!(record.duration_secs(), 12.5);
        assert_eq!(record.tags().hashtags, vec!["surf"]);
        assert!(record.effects().contains(EffectLabel::SlowMotion));
        assert!(record.transcript().placeholder);
    }

    #[test]
    fn test_refuses_partial_records() {
        assert_eq!(
            AnalysisRecordBuilder::new().build().unwrap_err(),
            AssemblyError::Missing("source")
        );
        let mut builder = complete();
        builder.style = None;
        assert_eq!(builder.build().unwrap_err(), AssemblyError::Missing("style"));
        let mut builder = complete();
        builder.transcript = None;
        assert_eq!(builder.build().unwrap_err(), AssemblyError::Missing("transcript"));
    }

    #[test]
    fn test_record_ids_unique() {
        let a = complete().build().unwrap();
        let b = complete().build().unwrap();
        assert_ne!(a.id(), b.id());
    }
}
