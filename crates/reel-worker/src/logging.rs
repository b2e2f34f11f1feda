//! Structured per-source logging.

use tracing::{error, info, warn, Span};

/// Logger carrying the source id and operation on every event.
#[derive(Debug, Clone)]
pub struct SourceLogger {
    source_id: String,
    operation: String,
}

impl SourceLogger {
    /// # Arguments
    /// * `source_id` - identifier of the source (usually its path)
    /// * `operation` - pipeline operation, e.g. "analyze" or "highlights"
    pub fn new(source_id: impl Into<String>, operation: &str) -> Self {
        Self {
            source_id: source_id.into(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            operation = %self.operation,
            "Source started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            operation = %self.operation,
            "Source progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            source_id = %self.source_id,
            operation = %self.operation,
            "Source warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            source_id = %self.source_id,
            operation = %self.operation,
            "Source error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            operation = %self.operation,
            "Source completed: {}", message
        );
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span to attach to the source's async work.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "source",
            source_id = %self.source_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_logger_fields() {
        let logger = SourceLogger::new("/videos/reel.mp4", "analyze");
        assert_eq!(logger.source_id(), "/videos/reel.mp4");
        assert_eq!(logger.operation(), "analyze");
    }
}
