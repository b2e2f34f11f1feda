//! Per-source analysis, highlight rendering and silence trimming.
//!
//! Extractors run as blocking tasks over one shared [`MediaHandle`]. Each source
//! gets a child cancellation token; the first failing extractor cancels its
//! siblings, and nothing is persisted unless every part of the record is present.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reel_ai::transcription::TRANSCRIPTION_SAMPLE_RATE;
use reel_ai::{
    annotate_keywords, FrequencyKeywordExtractor, KeywordExtractor, SegmentSelector,
    SelectionError, TranscriptionProvider,
};
use reel_media::{
    detect_effects, detect_non_silent, estimate_audio_style, estimate_visual_style,
    extract_subclip, locate_faces, render_crop, should_trim, trim_file, CropPlan, FaceDetector,
    FfmpegEncoder, KeepStats, MediaHandle, MediaResult, RenderSummary,
};
use reel_models::{
    AnalysisRecord, AudioProfile, EffectSet, Interval, SourceRef, StyleProfile, Tags, Transcript,
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

use crate::assembler::AnalysisRecordBuilder;
use crate::config::WorkerConfig;
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::logging::SourceLogger;
use crate::metrics;
use crate::opener::{FfmpegOpener, MediaOpener};
use crate::retry::{retry_async, retry_async_if, RetryConfig};
use crate::sink::AnalysisSink;

/// Builds a fresh face detector for each scan.
pub type DetectorFactory = Arc<dyn Fn() -> MediaResult<Box<dyn FaceDetector>> + Send + Sync>;

/// A rendered highlight clip.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedClip {
    pub path: PathBuf,
    pub interval: Interval,
    pub description: Option<String>,
    pub frames_written: u64,
}

/// Result of a silence-trim request.
#[derive(Debug, Clone)]
pub enum SilenceOutcome {
    Trimmed { output: PathBuf, stats: KeepStats },
    /// Trimming would cut too little or keep too little; nothing was written.
    Skipped { stats: KeepStats },
}

pub struct Pipeline {
    config: WorkerConfig,
    opener: Arc<dyn MediaOpener>,
    transcriber: Arc<dyn TranscriptionProvider>,
    keywords: Arc<dyn KeywordExtractor>,
    sink: Arc<dyn AnalysisSink>,
    selector: Option<Arc<SegmentSelector>>,
    face_detector: Option<DetectorFactory>,
}

impl Pipeline {
    pub fn new(
        config: WorkerConfig,
        transcriber: Arc<dyn TranscriptionProvider>,
        sink: Arc<dyn AnalysisSink>,
    ) -> Self {
        Self {
            config,
            opener: Arc::new(FfmpegOpener),
            transcriber,
            keywords: Arc::new(FrequencyKeywordExtractor::default()),
            sink,
            selector: None,
            face_detector: None,
        }
    }

    pub fn with_opener(mut self, opener: Arc<dyn MediaOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn with_keyword_extractor(mut self, keywords: Arc<dyn KeywordExtractor>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_selector(mut self, selector: Arc<SegmentSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Without a detector, highlight clips fall back to a center crop.
    pub fn with_face_detector(mut self, factory: DetectorFactory) -> Self {
        self.face_detector = Some(factory);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn retry_config(&self, operation: &str) -> RetryConfig {
        RetryConfig::new(operation)
            .with_max_retries(self.config.max_retries)
            .with_base_delay(self.config.retry_base_delay)
    }

    /// Analyze every source with bounded concurrency.
    ///
    /// Results come back in input order; one source failing never affects another.
    pub async fn process_batch(
        self: &Arc<Self>,
        sources: Vec<SourceRef>,
        cancel: &CancellationToken,
    ) -> Vec<PipelineResult<AnalysisRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_sources.max(1)));
        debug!(
            sources = sources.len(),
            max_concurrent = self.config.max_concurrent_sources,
            "Starting batch"
        );

        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let pipeline = Arc::clone(self);
                let semaphore = Arc::clone(&semaphore);
                let cancel = cancel.child_token();
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| PipelineError::Cancelled)?;
                    pipeline.process_source(source, &cancel).await
                })
            })
            .collect();

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(PipelineError::internal(format!("source task failed: {e}")))
                })
            })
            .collect()
    }

    /// Open, analyze and persist one source, retrying retryable failures.
    pub async fn process_source(
        &self,
        source: SourceRef,
        cancel: &CancellationToken,
    ) -> PipelineResult<AnalysisRecord> {
        let retry = self.retry_config("analyze_source");
        let result = retry_async_if(&retry, PipelineError::is_retryable, || {
            self.analyze_source(source.clone(), cancel)
        })
        .await;

        let outcome = match &result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.kind().to_string(),
        };
        metrics::record_source(&outcome);
        result
    }

    /// Single analysis attempt: open the source, then [`Pipeline::analyze_handle`].
    pub async fn analyze_source(
        &self,
        source: SourceRef,
        cancel: &CancellationToken,
    ) -> PipelineResult<AnalysisRecord> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let started = Instant::now();
        let handle = self
            .opener
            .open(Path::new(&source.path), self.config.open_timeout)
            .await?;
        metrics::record_stage("open", started.elapsed().as_secs_f64());
        self.analyze_handle(handle, source, cancel).await
    }

    /// Run every extractor and the transcription over an open handle, then
    /// assemble and persist the record.
    pub async fn analyze_handle(
        &self,
        handle: Arc<dyn MediaHandle>,
        source: SourceRef,
        cancel: &CancellationToken,
    ) -> PipelineResult<AnalysisRecord> {
        let logger = SourceLogger::new(source.path.clone(), "analyze");
        let child = cancel.child_token();
        let timeout = self.config.source_timeout;

        let work = self.run_analysis(handle, source, &child, &logger);
        let result = match tokio::time::timeout(timeout, work)
            .instrument(logger.create_span())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::timeout("analysis", timeout.as_secs())),
        };

        if let Err(e) = &result {
            child.cancel();
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn run_analysis(
        &self,
        handle: Arc<dyn MediaHandle>,
        source: SourceRef,
        cancel: &CancellationToken,
        logger: &SourceLogger,
    ) -> PipelineResult<AnalysisRecord> {
        let info = handle.info().clone();
        logger.log_start(&format!(
            "{}x{} @ {:.2} fps, {} frames, {:.1}s",
            info.width, info.height, info.fps, info.frame_count, info.duration
        ));

        let extractors = self.run_extractors(Arc::clone(&handle), cancel.clone());
        let transcription =
            async { Ok::<_, PipelineError>(self.transcribe(Arc::clone(&handle), logger).await) };
        let ((style, effects, audio), transcript) = tokio::try_join!(extractors, transcription)?;
        logger.log_progress(&format!(
            "{} / {}, {} / {}, {} effects",
            style.brightness,
            style.motion,
            audio.volume,
            audio.frequency,
            effects.len()
        ));

        let tags = source
            .caption
            .as_deref()
            .map(Tags::from_caption)
            .unwrap_or_default();

        let record = AnalysisRecordBuilder::new()
            .source(source)
            .duration_secs(info.duration)
            .style(style)
            .audio(audio)
            .tags(tags)
            .effects(effects)
            .transcript(transcript)
            .build()?;

        let store_retry = self.retry_config("store_record");
        retry_async(&store_retry, || self.sink.store(&record)).await?;

        logger.log_completion(&format!("record {}", record.id()));
        Ok(record)
    }

    async fn run_extractors(
        &self,
        handle: Arc<dyn MediaHandle>,
        cancel: CancellationToken,
    ) -> PipelineResult<(StyleProfile, EffectSet, AudioProfile)> {
        let info = handle.info().clone();
        let style_thresholds = self.config.style;
        let effect_thresholds = self.config.effects;
        let audio_thresholds = self.config.audio;

        let visual = run_blocking("visual_style", {
            let handle = Arc::clone(&handle);
            let cancel = cancel.clone();
            move || estimate_visual_style(handle.frames()?, info.fps, style_thresholds, &cancel)
        });
        let effects = run_blocking("effects", {
            let handle = Arc::clone(&handle);
            let cancel = cancel.clone();
            move || {
                detect_effects(
                    handle.frames()?,
                    info.fps,
                    info.frame_count,
                    effect_thresholds,
                    &cancel,
                )
            }
        });
        let audio = run_blocking("audio_style", {
            let handle = Arc::clone(&handle);
            move || {
                let buffer = handle.audio(None)?;
                estimate_audio_style(&buffer, audio_thresholds)
            }
        });

        let result = tokio::try_join!(visual, effects, audio);
        if result.is_err() {
            cancel.cancel();
        }
        result
    }

    /// Transcribe the source audio. Never fails: any problem yields a placeholder.
    async fn transcribe(&self, handle: Arc<dyn MediaHandle>, logger: &SourceLogger) -> Transcript {
        let started = Instant::now();
        let fallback = |reason: String| {
            logger.log_warning(&format!("{reason}; using placeholder transcript"));
            metrics::record_transcription_fallback();
            Transcript::placeholder()
        };

        let audio = match run_blocking("transcription_audio", move || {
            handle.audio(Some(TRANSCRIPTION_SAMPLE_RATE))
        })
        .await
        {
            Ok(audio) => audio,
            Err(e) => return fallback(format!("audio unavailable for transcription: {e}")),
        };

        let timeout = self.config.transcription_timeout;
        let transcript =
            match tokio::time::timeout(timeout, self.transcriber.transcribe(&audio)).await {
                Ok(Ok(mut transcript)) => {
                    annotate_keywords(&mut transcript, self.keywords.as_ref());
                    transcript
                }
                Ok(Err(e)) => fallback(e.to_string()),
                Err(_) => fallback(format!(
                    "transcription timed out after {}s",
                    timeout.as_secs()
                )),
            };
        metrics::record_stage("transcription", started.elapsed().as_secs_f64());
        transcript
    }

    /// Select highlights from `transcript` and render each as a portrait clip.
    ///
    /// Clips are written to `<output_dir>/<stem>_clip_NN.mp4` in selection order.
    pub async fn extract_highlights(
        &self,
        input: &Path,
        transcript: &Transcript,
        cancel: &CancellationToken,
    ) -> PipelineResult<Vec<RenderedClip>> {
        let selector = self
            .selector
            .as_ref()
            .ok_or_else(|| PipelineError::internal("no segment selector configured"))?;
        let logger = SourceLogger::new(input.display().to_string(), "highlights");
        let result = self
            .render_highlights(selector, input, transcript, cancel, &logger)
            .instrument(logger.create_span())
            .await;
        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn render_highlights(
        &self,
        selector: &SegmentSelector,
        input: &Path,
        transcript: &Transcript,
        cancel: &CancellationToken,
        logger: &SourceLogger,
    ) -> PipelineResult<Vec<RenderedClip>> {
        let source = self.opener.open(input, self.config.open_timeout).await?;
        let duration = source.info().duration;

        let retry = self.retry_config("select_highlights");
        let selection = retry_async_if(&retry, SelectionError::is_retryable, || {
            selector.select(transcript, Some(duration))
        })
        .await?;
        logger.log_progress(&format!(
            "{} highlights selected, {} rejected",
            selection.highlights.len(),
            selection.rejected.len()
        ));

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("reel-highlights-")
            .tempdir_in(&self.config.work_dir)?;
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());

        // Render failures get one more attempt unless cancelled.
        let render_retry = RetryConfig::new("render_clip")
            .with_max_retries(1)
            .with_base_delay(self.config.retry_base_delay);

        let mut clips = Vec::with_capacity(selection.highlights.len());
        for (i, highlight) in selection.highlights.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let subclip = scratch.path().join(format!("sub_{:02}.mp4", i + 1));
            let output = self
                .config
                .output_dir
                .join(format!("{stem}_clip_{:02}.mp4", i + 1));

            let summary = retry_async_if(
                &render_retry,
                |e: &PipelineError| e.kind() != ErrorKind::Cancelled,
                || self.render_clip(input, &subclip, &output, &highlight.interval, cancel),
            )
            .await?;

            metrics::record_clip_rendered();
            logger.log_progress(&format!(
                "clip {} rendered: {} ({} frames)",
                i + 1,
                output.display(),
                summary.frames_written
            ));
            clips.push(RenderedClip {
                path: output,
                interval: highlight.interval,
                description: highlight.description.clone(),
                frames_written: summary.frames_written,
            });
        }

        logger.log_completion(&format!("{} clips", clips.len()));
        Ok(clips)
    }

    async fn render_clip(
        &self,
        input: &Path,
        subclip: &Path,
        output: &Path,
        interval: &Interval,
        cancel: &CancellationToken,
    ) -> PipelineResult<RenderSummary> {
        extract_subclip(input, subclip, interval, &self.config.render, cancel).await?;
        let clip = self.opener.open(subclip, self.config.open_timeout).await?;

        let faces = match &self.face_detector {
            Some(factory) => {
                let factory = Arc::clone(factory);
                let clip = Arc::clone(&clip);
                let stage = cancel.child_token();
                let token = stage.clone();
                run_blocking_timeout("face_scan", self.config.stage_timeout, &stage, move || {
                    let mut detector = factory()?;
                    locate_faces(clip.frames()?, detector.as_mut(), &token)
                })
                .await?
            }
            None => None,
        };

        let info = clip.info().clone();
        let plan = CropPlan::new(info.width, info.height, faces);
        let (width, height) = plan.target();
        let render = self.config.render.clone();
        let output = output.to_path_buf();
        let subclip = subclip.to_path_buf();
        let stage = cancel.child_token();
        let token = stage.clone();

        run_blocking_timeout("crop_render", self.config.stage_timeout, &stage, move || {
            let mut encoder = FfmpegEncoder::create(
                &output,
                width,
                height,
                info.fps,
                &render,
                Some(subclip.as_path()),
            )?;
            render_crop(clip.frames()?, &plan, info.fps, &mut encoder, &token)
        })
        .await
    }

    /// Cut the silent stretches out of `input`, writing the result to `output`.
    pub async fn remove_silence(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> PipelineResult<SilenceOutcome> {
        let logger = SourceLogger::new(input.display().to_string(), "remove_silence");
        let source = self.opener.open(input, self.config.open_timeout).await?;
        let duration = source.info().duration;
        let config = self.config.silence.clone();

        let stage = cancel.child_token();
        let intervals = run_blocking_timeout("silence", self.config.stage_timeout, &stage, {
            let config = config.clone();
            move || {
                let audio = source.audio(Some(config.sample_rate))?;
                detect_non_silent(&audio, &config)
            }
        })
        .await?;

        let stats = KeepStats::compute(&intervals, duration);
        if !should_trim(&intervals, duration, &config) {
            logger.log_progress(&format!(
                "keeping source as is ({:.1}% non-silent)",
                stats.kept_ratio * 100.0
            ));
            return Ok(SilenceOutcome::Skipped { stats });
        }

        trim_file(input, output, &intervals, &self.config.render, cancel).await?;
        logger.log_completion(&format!(
            "kept {:.1}s of {:.1}s in {} spans",
            stats.kept_secs, duration, stats.interval_count
        ));
        Ok(SilenceOutcome::Trimmed {
            output: output.to_path_buf(),
            stats,
        })
    }
}

/// Run blocking media work on the blocking pool and time it.
async fn run_blocking<T, E, F>(stage: &'static str, work: F) -> PipelineResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<PipelineError> + Send + 'static,
{
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::internal(format!("{stage} task failed: {e}")))?;
    let elapsed = started.elapsed().as_secs_f64();
    metrics::record_stage(stage, elapsed);
    debug!(stage, elapsed_secs = elapsed, ok = result.is_ok(), "Stage finished");
    result.map_err(Into::into)
}

/// [`run_blocking`] under a deadline. On expiry `stage` is cancelled so frame
/// loops stop; a decode that ignores the token finishes on its own.
async fn run_blocking_timeout<T, E, F>(
    name: &'static str,
    limit: Duration,
    stage: &CancellationToken,
    work: F,
) -> PipelineResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<PipelineError> + Send + 'static,
{
    match tokio::time::timeout(limit, run_blocking(name, work)).await {
        Ok(result) => result,
        Err(_) => {
            stage.cancel();
            warn!(stage = name, limit_secs = limit.as_secs_f64(), "Stage timed out");
            Err(PipelineError::timeout(name, limit.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use reel_ai::TranscriptionError;
    use reel_media::{AudioBuffer, MediaError, MediaInfo, MemorySource};
    use reel_models::TranscriptSegment;

    use crate::sink::MemoryAnalysisSink;

    struct MemoryOpener {
        sources: HashMap<String, Arc<dyn MediaHandle>>,
    }

    #[async_trait]
    impl MediaOpener for MemoryOpener {
        async fn open(
            &self,
            path: &Path,
            _timeout: Duration,
        ) -> MediaResult<Arc<dyn MediaHandle>> {
            self.sources
                .get(path.to_string_lossy().as_ref())
                .cloned()
                .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))
        }
    }

    /// Blocks on every frame pass, for timeout tests.
    struct SlowHandle(MemorySource);

    impl MediaHandle for SlowHandle {
        fn info(&self) -> &MediaInfo {
            self.0.info()
        }

        fn frames(&self) -> MediaResult<reel_media::FrameStream> {
            std::thread::sleep(Duration::from_millis(400));
            self.0.frames()
        }

        fn seek(&self, timestamp: f64) -> MediaResult<reel_media::Frame> {
            self.0.seek(timestamp)
        }

        fn audio(&self, rate: Option<u32>) -> MediaResult<Arc<AudioBuffer>> {
            self.0.audio(rate)
        }
    }

    /// Audio decode that stalls well past any stage limit.
    struct StalledAudioHandle(MemorySource);

    impl MediaHandle for StalledAudioHandle {
        fn info(&self) -> &MediaInfo {
            self.0.info()
        }

        fn frames(&self) -> MediaResult<reel_media::FrameStream> {
            self.0.frames()
        }

        fn seek(&self, timestamp: f64) -> MediaResult<reel_media::Frame> {
            self.0.seek(timestamp)
        }

        fn audio(&self, rate: Option<u32>) -> MediaResult<Arc<AudioBuffer>> {
            std::thread::sleep(Duration::from_secs(2));
            self.0.audio(rate)
        }
    }

    enum Behavior {
        Text,
        Fail,
        Hang,
    }

    struct ScriptedTranscriber(Behavior);

    #[async_trait]
    impl TranscriptionProvider for ScriptedTranscriber {
        async fn transcribe(&self, _audio: &AudioBuffer) -> Result<Transcript, TranscriptionError> {
            match self.0 {
                Behavior::Text => Ok(Transcript::new(
                    "rocket launch countdown",
                    vec![TranscriptSegment::new(0.0, 1.5, "rocket launch countdown rocket")],
                )),
                Behavior::Fail => Err(TranscriptionError::Unavailable("provider down".into())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Transcript::placeholder())
                }
            }
        }
    }

    fn tone_source(with_audio: bool) -> MemorySource {
        let images = (0..20)
            .map(|i| RgbImage::from_pixel(64, 36, Rgb([150, 120 + i as u8, 90])))
            .collect();
        let source = MemorySource::from_images(images, 10.0).unwrap();
        if !with_audio {
            return source;
        }
        let rate = 16_000u32;
        let samples = (0..rate * 2)
            .map(|i| {
                (15_000.0 * (2.0 * std::f64::consts::PI * 220.0 * i as f64 / rate as f64).sin())
                    as i16
            })
            .collect();
        source.with_audio(AudioBuffer::new(samples, rate, 1))
    }

    fn handle(source: impl MediaHandle + 'static) -> Arc<dyn MediaHandle> {
        Arc::new(source)
    }

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            max_retries: 0,
            retry_base_delay: Duration::from_millis(1),
            ..WorkerConfig::default()
        }
    }

    fn pipeline(
        config: WorkerConfig,
        behavior: Behavior,
        sources: Vec<(&str, Arc<dyn MediaHandle>)>,
    ) -> (Arc<Pipeline>, Arc<MemoryAnalysisSink>) {
        let sink = Arc::new(MemoryAnalysisSink::new());
        let opener = MemoryOpener {
            sources: sources
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };
        let pipeline = Pipeline::new(
            config,
            Arc::new(ScriptedTranscriber(behavior)),
            sink.clone(),
        )
        .with_opener(Arc::new(opener));
        (Arc::new(pipeline), sink)
    }

    #[tokio::test]
    async fn test_analyze_source_builds_and_stores_record() {
        let (pipeline, sink) = pipeline(
            test_config(),
            Behavior::Text,
            vec![("reel.mp4", handle(tone_source(true)))],
        );
        let source = SourceRef::new("reel.mp4").with_caption("liftoff #space with @nasa");

        let record = tokio_test::assert_ok!(
            pipeline
                .process_source(source, &CancellationToken::new())
                .await
        );

        assert_eq!(record.source().path, "reel.mp4");
        assert!((record.duration_secs() - 2.0).abs() < 1e-9);
        assert_eq!(record.tags().hashtags, vec!["space"]);
        assert_eq!(record.tags().mentions, vec!["nasa"]);
        assert!(!record.transcript().placeholder);
        assert!(record.transcript().segments[0]
            .keywords
            .contains(&"rocket".to_string()));
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].id(), record.id());
    }

    #[tokio::test]
    async fn test_transcription_failure_uses_placeholder() {
        let (pipeline, _sink) = pipeline(
            test_config(),
            Behavior::Fail,
            vec![("reel.mp4", handle(tone_source(true)))],
        );
        let record = pipeline
            .process_source(SourceRef::new("reel.mp4"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(record.transcript().placeholder);
        assert!(record.tags().is_empty());
    }

    #[tokio::test]
    async fn test_transcription_timeout_uses_placeholder() {
        let config = WorkerConfig {
            transcription_timeout: Duration::from_millis(50),
            ..test_config()
        };
        let (pipeline, _sink) = pipeline(
            config,
            Behavior::Hang,
            vec![("reel.mp4", handle(tone_source(true)))],
        );
        let record = pipeline
            .process_source(SourceRef::new("reel.mp4"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(record.transcript().placeholder);
    }

    #[tokio::test]
    async fn test_missing_audio_track_fails_without_storing() {
        let (pipeline, sink) = pipeline(
            test_config(),
            Behavior::Text,
            vec![("silent.mp4", handle(tone_source(false)))],
        );
        let err = pipeline
            .process_source(SourceRef::new("silent.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Media(MediaError::NoAudioTrack)));
        assert_eq!(err.kind(), ErrorKind::Media);
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_isolates_failures() {
        let config = WorkerConfig {
            max_concurrent_sources: 2,
            ..test_config()
        };
        let (pipeline, sink) = pipeline(
            config,
            Behavior::Text,
            vec![
                ("a.mp4", handle(tone_source(true))),
                ("c.mp4", handle(tone_source(true))),
            ],
        );
        let sources = vec![
            SourceRef::new("a.mp4"),
            SourceRef::new("b.mp4"),
            SourceRef::new("c.mp4"),
        ];

        let results = pipeline
            .process_batch(sources, &CancellationToken::new())
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().source().path, "a.mp4");
        assert!(matches!(
            results[1],
            Err(PipelineError::Media(MediaError::FileNotFound(_)))
        ));
        assert_eq!(results[2].as_ref().unwrap().source().path, "c.mp4");
        assert_eq!(sink.records().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (pipeline, sink) = pipeline(
            test_config(),
            Behavior::Text,
            vec![("reel.mp4", handle(tone_source(true)))],
        );
        let token = CancellationToken::new();
        token.cancel();
        let err = pipeline
            .process_source(SourceRef::new("reel.mp4"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_source_timeout() {
        let config = WorkerConfig {
            source_timeout: Duration::from_millis(100),
            ..test_config()
        };
        let (pipeline, sink) = pipeline(
            config,
            Behavior::Text,
            vec![("slow.mp4", handle(SlowHandle(tone_source(true))))],
        );
        let err = pipeline
            .process_source(SourceRef::new("slow.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { stage: "analysis", .. }));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_remove_silence_skips_constant_tone() {
        let (pipeline, _sink) = pipeline(
            test_config(),
            Behavior::Text,
            vec![("tone.mp4", handle(tone_source(true)))],
        );
        let dir = tempfile::tempdir().unwrap();
        let outcome = pipeline
            .remove_silence(
                Path::new("tone.mp4"),
                &dir.path().join("out.mp4"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        match outcome {
            SilenceOutcome::Skipped { stats } => assert!(stats.kept_ratio > 0.9),
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(!dir.path().join("out.mp4").exists());
    }

    #[tokio::test]
    async fn test_remove_silence_times_out_on_stalled_decode() {
        let config = WorkerConfig {
            stage_timeout: Duration::from_millis(100),
            ..test_config()
        };
        let (pipeline, _sink) = pipeline(
            config,
            Behavior::Text,
            vec![("stalled.mp4", handle(StalledAudioHandle(tone_source(true))))],
        );
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let started = Instant::now();
        let err = pipeline
            .remove_silence(Path::new("stalled.mp4"), &dir.path().join("out.mp4"), &cancel)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(err, PipelineError::Timeout { stage: "silence", .. }));
        assert!(err.is_retryable());
        assert!(!cancel.is_cancelled());
        assert!(!dir.path().join("out.mp4").exists());
    }

    #[tokio::test]
    async fn test_highlights_require_selector() {
        let (pipeline, _sink) = pipeline(test_config(), Behavior::Text, Vec::new());
        let err = pipeline
            .extract_highlights(
                Path::new("reel.mp4"),
                &Transcript::placeholder(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
