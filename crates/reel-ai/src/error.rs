//! Provider and selection error types.

use thiserror::Error;

pub type AiResult<T> = Result<T, ProviderError>;

/// Failure talking to a remote provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider call timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transport failures, timeouts, throttling and server errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(0)
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Speech-to-text could not produce a transcript.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription unavailable: {0}")]
    Unavailable(String),
}

impl From<ProviderError> for TranscriptionError {
    fn from(e: ProviderError) -> Self {
        TranscriptionError::Unavailable(e.to_string())
    }
}

/// Highlight selection failure.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Selection response is not parseable: {0}")]
    Unparseable(String),

    #[error("No valid intervals in selection ({rejected} rejected)")]
    NoValidIntervals { rejected: usize },

    #[error("Summarization provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Selection timed out after {0}s")]
    Timeout(u64),
}

impl SelectionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SelectionError::Timeout(_) => true,
            SelectionError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let throttled = ProviderError::Status {
            status: 429,
            body: String::new(),
        };
        let bad_request = ProviderError::Status {
            status: 400,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(ProviderError::Timeout(5).is_retryable());
        assert!(!ProviderError::invalid_response("x").is_retryable());
    }

    #[test]
    fn test_selection_retryable() {
        assert!(SelectionError::Timeout(30).is_retryable());
        assert!(!SelectionError::Unparseable("x".into()).is_retryable());
        assert!(!SelectionError::NoValidIntervals { rejected: 2 }.is_retryable());
        assert!(SelectionError::from(ProviderError::Transport("reset".into())).is_retryable());
    }
}
