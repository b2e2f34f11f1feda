//! Speech-to-text providers.

use async_trait::async_trait;
use reel_media::AudioBuffer;
use reel_models::{Transcript, TranscriptSegment};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{AiResult, ProviderError, TranscriptionError};
use crate::http;

/// Sample rate the audio is converted to before upload.
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;

/// Turns decoded audio into a timed transcript.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, TranscriptionError>;
}

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// Audio is downmixed, resampled to 16 kHz and uploaded as a WAV file with
/// `response_format=verbose_json` so segment timings come back.
pub struct WhisperApiTranscriber {
    config: ProviderConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperApiTranscriber {
    pub fn new(config: ProviderConfig) -> AiResult<Self> {
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }

    async fn request(&self, audio: &AudioBuffer) -> AiResult<Transcript> {
        let mono = audio.downmix().resample(TRANSCRIPTION_SAMPLE_RATE);
        let wav = mono
            .to_wav_bytes()
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        debug!(
            bytes = wav.len(),
            duration_secs = mono.duration(),
            model = %self.config.transcription_model,
            "Uploading audio for transcription"
        );

        let file = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::Config(format!("Invalid upload mime type: {e}")))?;
        let mut form = Form::new()
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "verbose_json")
            .part("file", file);
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let request = http::authorize(
            self.client
                .post(self.config.endpoint("/audio/transcriptions"))
                .multipart(form),
            &self.config,
        );
        let body: VerboseTranscription = http::send(request, &self.config).await?.json().await?;

        let segments = body
            .segments
            .into_iter()
            .filter(|s| s.end > s.start)
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
            .collect();
        Ok(Transcript::new(body.text.trim(), segments))
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperApiTranscriber {
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::Unavailable("audio is empty".to_string()));
        }
        let transcript = self.request(audio).await?;
        info!(
            segments = transcript.segments.len(),
            chars = transcript.text.len(),
            "Transcription completed"
        );
        Ok(transcript)
    }
}
