//! Pipeline error types.

use std::fmt;

use reel_ai::{SelectionError, TranscriptionError};
use reel_media::{MediaError, RenderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assembler::AssemblyError;
use crate::sink::SinkError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Persistence error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Media,
    Timeout,
    TranscriptionUnavailable,
    Selection,
    Render,
    Persistence,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Media => "media",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TranscriptionUnavailable => "transcription_unavailable",
            ErrorKind::Selection => "selection",
            ErrorKind::Render => "render",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl PipelineError {
    pub fn timeout(stage: &'static str, secs: u64) -> Self {
        Self::Timeout { stage, secs }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Media(MediaError::Cancelled)
            | PipelineError::Render(RenderError::Media(MediaError::Cancelled))
            | PipelineError::Cancelled => ErrorKind::Cancelled,
            PipelineError::Media(MediaError::Timeout(_))
            | PipelineError::Render(RenderError::Media(MediaError::Timeout(_)))
            | PipelineError::Selection(SelectionError::Timeout(_))
            | PipelineError::Timeout { .. } => ErrorKind::Timeout,
            PipelineError::Media(_) => ErrorKind::Media,
            PipelineError::Render(_) => ErrorKind::Render,
            PipelineError::Transcription(_) => ErrorKind::TranscriptionUnavailable,
            PipelineError::Selection(_) => ErrorKind::Selection,
            PipelineError::Sink(_) => ErrorKind::Persistence,
            PipelineError::Assembly(_) | PipelineError::Io(_) | PipelineError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Timeouts and provider transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Selection(e) => e.is_retryable(),
            other => other.kind() == ErrorKind::Timeout,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Serializable error shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}
