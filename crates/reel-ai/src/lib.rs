//! AI provider clients for reel analysis.
//!
//! This crate provides:
//! - Speech-to-text through an OpenAI-compatible transcription endpoint
//! - Transcript summarization through an OpenAI-compatible chat endpoint
//! - Keyphrase extraction for transcript segments
//! - Validated highlight selection from a summarization response

pub mod config;
pub mod error;
pub mod keywords;
pub mod selector;
pub mod summarization;
pub mod transcription;

mod http;

pub use config::ProviderConfig;
pub use error::{AiResult, ProviderError, SelectionError, TranscriptionError};
pub use keywords::{annotate_keywords, FrequencyKeywordExtractor, KeywordExtractor};
pub use selector::{
    parse_selection, Highlight, Rejection, SegmentSelector, Selection, SelectionConfig,
};
pub use summarization::{ChatCompletionsProvider, SummarizationProvider};
pub use transcription::{TranscriptionProvider, WhisperApiTranscriber};
