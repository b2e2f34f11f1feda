//! Provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings shared by the transcription and summarization clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API, without trailing slash
    pub base_url: String,
    /// Bearer token; requests are sent unauthenticated when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub transcription_model: String,
    pub chat_model: String,
    /// Language hint passed to the transcription endpoint
    pub language: Option<String>,
    /// Per-request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            transcription_model: "whisper-1".to_string(),
            chat_model: "gpt-4".to_string(),
            language: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    ///
    /// `REEL_PROVIDER_API_KEY` falls back to `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REEL_PROVIDER_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: std::env::var("REEL_PROVIDER_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            transcription_model: std::env::var("REEL_TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            chat_model: std::env::var("REEL_CHAT_MODEL").unwrap_or(defaults.chat_model),
            language: std::env::var("REEL_TRANSCRIPTION_LANGUAGE").ok(),
            timeout: Duration::from_secs(
                std::env::var("REEL_PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    /// Point at a different API root (tests, self-hosted gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
