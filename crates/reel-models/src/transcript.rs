//! Transcripts produced by the transcription provider.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// A timed span of transcribed speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
    /// Top keyphrases for this segment
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            keywords: Vec::new(),
        }
    }

    /// The segment's time span, if it is a valid interval.
    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start, self.end).ok()
    }
}

/// Full transcript of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    /// Set when transcription was unavailable and this is a stand-in.
    #[serde(default)]
    pub placeholder: bool,
}

impl Transcript {
    pub fn new(text: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            text: text.into(),
            segments,
            placeholder: false,
        }
    }

    /// Stand-in used when the provider could not transcribe the audio.
    pub fn placeholder() -> Self {
        Self {
            text: String::new(),
            segments: Vec::new(),
            placeholder: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.segments.is_empty()
    }

    /// Render segments as timestamped lines for prompting.
    pub fn to_prompt_text(&self) -> String {
        if self.segments.is_empty() {
            return self.text.clone();
        }
        self.segments
            .iter()
            .map(|s| {
                format!(
                    "[{} - {}] {}",
                    crate::timestamp::format_seconds(s.start),
                    crate::timestamp::format_seconds(s.end),
                    s.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
