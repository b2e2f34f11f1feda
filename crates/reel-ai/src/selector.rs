//! Highlight selection from a summarization provider.
//!
//! The provider is asked for the most viral sections of a transcript and its
//! answer is parsed leniently: a bare JSON list or an object holding the list
//! under `sections`, `segments` or `highlights`, optionally wrapped in a
//! markdown code fence. Each entry is validated on its own; bad entries are
//! reported, not fatal.

use std::sync::Arc;
use std::time::Duration;

use reel_models::{parse_timestamp, Interval, Transcript};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::SelectionError;
use crate::summarization::SummarizationProvider;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant and a master at reading \
video transcripts and identifying the most interesting and viral content.";

const LIST_KEYS: [&str; 3] = ["sections", "segments", "highlights"];

/// Selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Maximum number of highlights returned
    pub top_n: usize,
    /// Shortest acceptable highlight in seconds
    pub min_duration_secs: f64,
    /// Limit on a single provider call
    #[serde(skip, default = "default_timeout")]
    pub timeout: Duration,
    pub system_prompt: String,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            min_duration_secs: 30.0,
            timeout: default_timeout(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl SelectionConfig {
    /// Instruction sent ahead of the transcript.
    pub fn instruction(&self) -> String {
        format!(
            "This is a transcript of a video. Please identify the {} most viral sections \
             from the whole, make sure each is at least {} seconds long. Respond in JSON \
             as an object with a \"sections\" list giving start_time, end_time, and \
             description for each section.",
            self.top_n, self.min_duration_secs
        )
    }
}

/// One accepted highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub interval: Interval,
    pub description: Option<String>,
}

/// A provider entry that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Position of the entry in the provider's list
    pub index: usize,
    pub reason: String,
}

/// Validated selection result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Accepted highlights in provider order, at most `top_n`
    pub highlights: Vec<Highlight>,
    pub rejected: Vec<Rejection>,
}

impl Selection {
    pub fn intervals(&self) -> Vec<Interval> {
        self.highlights.iter().map(|h| h.interval).collect()
    }
}

/// Picks highlight intervals from a transcript.
pub struct SegmentSelector {
    provider: Arc<dyn SummarizationProvider>,
    config: SelectionConfig,
}

impl SegmentSelector {
    pub fn new(provider: Arc<dyn SummarizationProvider>, config: SelectionConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Ask the provider for highlights and validate its answer.
    ///
    /// `source_duration` clamps intervals when known. An empty transcript
    /// yields [`SelectionError::NoValidIntervals`] without calling the provider.
    pub async fn select(
        &self,
        transcript: &Transcript,
        source_duration: Option<f64>,
    ) -> Result<Selection, SelectionError> {
        if transcript.is_empty() {
            warn!("Transcript is empty, no highlights to select");
            return Err(SelectionError::NoValidIntervals { rejected: 0 });
        }

        let prompt_text = transcript.to_prompt_text();
        let instruction = self.config.instruction();
        let call = self.provider.summarize(
            &self.config.system_prompt,
            &instruction,
            &prompt_text,
        );
        let raw = tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| SelectionError::Timeout(self.config.timeout.as_secs()))??;

        let selection = parse_selection(&raw, source_duration, &self.config)?;
        info!(
            accepted = selection.highlights.len(),
            rejected = selection.rejected.len(),
            "Highlight selection completed"
        );
        Ok(selection)
    }
}

/// Parse and validate a raw provider answer.
pub fn parse_selection(
    raw: &str,
    source_duration: Option<f64>,
    config: &SelectionConfig,
) -> Result<Selection, SelectionError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| SelectionError::Unparseable(e.to_string()))?;
    let entries = entry_list(value)?;

    let mut selection = Selection::default();
    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry, source_duration, config.min_duration_secs) {
            Ok(highlight) => selection.highlights.push(highlight),
            Err(reason) => {
                warn!(index, %reason, "Dropping invalid highlight");
                selection.rejected.push(Rejection { index, reason });
            }
        }
    }

    if selection.highlights.is_empty() {
        return Err(SelectionError::NoValidIntervals {
            rejected: selection.rejected.len(),
        });
    }
    if selection.highlights.len() > config.top_n {
        debug!(
            valid = selection.highlights.len(),
            top_n = config.top_n,
            "Truncating highlights to top_n"
        );
        selection.highlights.truncate(config.top_n);
    }
    Ok(selection)
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn entry_list(value: Value) -> Result<Vec<Value>, SelectionError> {
    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(entries)) => Some(entries),
                _ => None,
            })
            .ok_or_else(|| {
                SelectionError::Unparseable(format!(
                    "expected a list under one of {:?}",
                    LIST_KEYS
                ))
            }),
        other => Err(SelectionError::Unparseable(format!(
            "expected a JSON list or object, got {}",
            json_kind(&other)
        ))),
    }
}

fn validate_entry(
    entry: &Value,
    source_duration: Option<f64>,
    min_duration_secs: f64,
) -> Result<Highlight, String> {
    let obj = entry
        .as_object()
        .ok_or_else(|| format!("entry is {}, not an object", json_kind(entry)))?;

    let mut start = time_field(obj, &["start_time", "start"])?;
    let mut end = time_field(obj, &["end_time", "end"])?;
    if let Some(duration) = source_duration {
        start = start.clamp(0.0, duration);
        end = end.clamp(0.0, duration);
    }

    let interval = Interval::new(start, end).map_err(|e| e.to_string())?;
    if interval.duration() < min_duration_secs {
        return Err(format!(
            "{interval} is {:.1}s, shorter than {min_duration_secs}s",
            interval.duration()
        ));
    }

    Ok(Highlight {
        interval,
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
    })
}

fn time_field(obj: &Map<String, Value>, keys: &[&str]) -> Result<f64, String> {
    let (key, value) = keys
        .iter()
        .find_map(|k| obj.get(*k).map(|v| (*k, v)))
        .ok_or_else(|| format!("missing {}", keys[0]))?;
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{key} is not a number")),
        Value::String(s) => parse_timestamp(s).map_err(|e| format!("{key}: {e}")),
        other => Err(format!("{key} is {}", json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
