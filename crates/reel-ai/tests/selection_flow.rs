//! Transcription through selection against mocked HTTP providers.

use std::sync::Arc;

use reel_ai::{
    annotate_keywords, ChatCompletionsProvider, FrequencyKeywordExtractor, ProviderConfig,
    SegmentSelector, SelectionConfig, SelectionError, TranscriptionProvider,
    WhisperApiTranscriber,
};
use reel_media::AudioBuffer;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_transcription(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Welcome to the surf report. Huge waves at the point today.",
            "segments": [
                {"start": 0.0, "end": 40.0, "text": "Welcome to the surf report."},
                {"start": 40.0, "end": 95.0, "text": "Huge waves at the point today. Huge waves."}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn transcript_to_highlights() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;
    mount_chat(
        &server,
        "```json\n{\"highlights\": [\
            {\"start_time\": \"00:00:20\", \"end_time\": \"00:01:30\", \"description\": \"waves\"},\
            {\"start_time\": \"00:01:30\", \"end_time\": \"00:01:40\", \"description\": \"outro\"}\
        ]}\n```",
    )
    .await;

    let config = ProviderConfig::default().with_base_url(server.uri());
    let transcriber = WhisperApiTranscriber::new(config.clone()).unwrap();
    let audio = AudioBuffer::new(vec![500; 48_000 * 2], 48_000, 2);

    let mut transcript = transcriber.transcribe(&audio).await.unwrap();
    annotate_keywords(&mut transcript, &FrequencyKeywordExtractor::default());
    assert_eq!(transcript.segments[1].keywords[0], "huge");

    let selector = SegmentSelector::new(
        Arc::new(ChatCompletionsProvider::new(config).unwrap()),
        SelectionConfig::default(),
    );
    let selection = tokio_test::assert_ok!(selector.select(&transcript, Some(95.0)).await);
    assert_eq!(selection.highlights.len(), 1);
    assert_eq!(selection.intervals()[0].start(), 20.0);
    assert_eq!(selection.intervals()[0].end(), 90.0);
    assert_eq!(selection.rejected.len(), 1);
}

#[tokio::test]
async fn all_highlights_too_short() {
    let server = MockServer::start().await;
    mount_transcription(&server).await;
    mount_chat(&server, r#"[{"start_time": 0, "end_time": 25}]"#).await;

    let config = ProviderConfig::default().with_base_url(server.uri());
    let transcript = WhisperApiTranscriber::new(config.clone())
        .unwrap()
        .transcribe(&AudioBuffer::new(vec![1; 16_000], 16_000, 1))
        .await
        .unwrap();

    let selector = SegmentSelector::new(
        Arc::new(ChatCompletionsProvider::new(config).unwrap()),
        SelectionConfig::default(),
    );
    let err = tokio_test::assert_err!(selector.select(&transcript, None).await);
    assert!(matches!(err, SelectionError::NoValidIntervals { rejected: 1 }));
}
