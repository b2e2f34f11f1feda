//! Reel analysis pipeline.
//!
//! This crate provides:
//! - Per-source analysis: visual style, effects, audio style and transcript
//!   assembled into one [`AnalysisRecord`](reel_models::AnalysisRecord)
//! - Bounded-concurrency batch processing with per-source cancellation
//! - Highlight clip rendering and silence trimming
//! - Record persistence, retry, metrics and structured logging

pub mod assembler;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod opener;
pub mod pipeline;
pub mod retry;
pub mod sink;

pub use assembler::{AnalysisRecordBuilder, AssemblyError};
pub use config::WorkerConfig;
pub use error::{ErrorKind, ErrorReport, PipelineError, PipelineResult};
pub use logging::SourceLogger;
pub use opener::{FfmpegOpener, MediaOpener};
pub use pipeline::{DetectorFactory, Pipeline, RenderedClip, SilenceOutcome};
pub use retry::{retry_async, retry_async_if, RetryConfig};
pub use sink::{AnalysisSink, JsonFileSink, MemoryAnalysisSink, SinkError};
