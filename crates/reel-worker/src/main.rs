//! Reel analysis worker binary.
//!
//! ```text
//! reel-worker [--highlights] [--trim-silence] <video>...
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_ai::{
    ChatCompletionsProvider, ProviderConfig, SegmentSelector, SelectionConfig,
    WhisperApiTranscriber,
};
use reel_models::SourceRef;
use reel_worker::{JsonFileSink, Pipeline, SilenceOutcome, WorkerConfig};

struct Args {
    paths: Vec<String>,
    highlights: bool,
    trim_silence: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        paths: Vec::new(),
        highlights: false,
        trim_silence: false,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--highlights" => args.highlights = true,
            "--trim-silence" => args.trim_silence = true,
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag {flag}"),
            _ => args.paths.push(arg),
        }
    }
    if args.paths.is_empty() {
        anyhow::bail!("usage: reel-worker [--highlights] [--trim-silence] <video>...");
    }
    Ok(args)
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["reel_worker=info", "reel_media=info", "reel_ai=info"] {
        if let Ok(d) = directive.parse() {
            env_filter = env_filter.add_directive(d);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn init_metrics() -> anyhow::Result<()> {
    let Ok(addr) = std::env::var("REEL_METRICS_ADDR") else {
        return Ok(());
    };
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid REEL_METRICS_ADDR {addr}"))?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    info!(%addr, "Serving Prometheus metrics");
    Ok(())
}

#[cfg(feature = "opencv")]
fn face_detector() -> Option<reel_worker::DetectorFactory> {
    use reel_media::{FaceDetector, HaarCascadeDetector, DEFAULT_CASCADE_PATH};

    let cascade = std::env::var("REEL_FACE_CASCADE")
        .unwrap_or_else(|_| DEFAULT_CASCADE_PATH.to_string());
    Some(Arc::new(move || {
        let detector: Box<dyn FaceDetector> = Box::new(HaarCascadeDetector::new(&cascade)?);
        Ok(detector)
    }))
}

#[cfg(not(feature = "opencv"))]
fn face_detector() -> Option<reel_worker::DetectorFactory> {
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing();
    init_metrics()?;

    let args = parse_args()?;
    let config = WorkerConfig::from_env();
    info!(sources = args.paths.len(), "Starting reel-worker");
    info!("Worker config: {:?}", config);

    let provider = ProviderConfig::from_env();
    let transcriber = WhisperApiTranscriber::new(provider.clone())
        .context("failed to build transcription client")?;
    let sink = JsonFileSink::new(config.output_dir.join("records"));

    let mut pipeline = Pipeline::new(config.clone(), Arc::new(transcriber), Arc::new(sink));
    if args.highlights {
        let chat = ChatCompletionsProvider::new(provider)
            .context("failed to build summarization client")?;
        let selector = SegmentSelector::new(Arc::new(chat), SelectionConfig::default());
        pipeline = pipeline.with_selector(Arc::new(selector));
    }
    if let Some(factory) = face_detector() {
        pipeline = pipeline.with_face_detector(factory);
    }
    let pipeline = Arc::new(pipeline);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received shutdown signal, cancelling");
                cancel.cancel();
            }
        }
    });

    let sources: Vec<SourceRef> = args.paths.iter().map(SourceRef::new).collect();
    let results = pipeline.process_batch(sources, &cancel).await;

    let mut failed = 0usize;
    for (path, result) in args.paths.iter().zip(results) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                failed += 1;
                error!(path = %path, error = %e, "Source failed");
                println!("{}", json!({ "path": path, "error": e.report() }));
                continue;
            }
        };

        let mut line = json!({ "path": path, "record_id": record.id() });
        let input = Path::new(path);

        if args.highlights {
            match pipeline
                .extract_highlights(input, record.transcript(), &cancel)
                .await
            {
                Ok(clips) => line["clips"] = json!(clips),
                Err(e) => {
                    failed += 1;
                    line["highlights_error"] = json!(e.report());
                }
            }
        }

        if args.trim_silence {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "source".to_string());
            let output = config.output_dir.join(format!("{stem}_trimmed.mp4"));
            match pipeline.remove_silence(input, &output, &cancel).await {
                Ok(SilenceOutcome::Trimmed { output, stats }) => {
                    line["trimmed"] = json!({ "output": output, "kept_secs": stats.kept_secs });
                }
                Ok(SilenceOutcome::Skipped { stats }) => {
                    line["trimmed"] = json!({ "skipped": true, "kept_ratio": stats.kept_ratio });
                }
                Err(e) => {
                    failed += 1;
                    line["trim_error"] = json!(e.report());
                }
            }
        }

        println!("{line}");
    }

    info!(failed, "Worker finished");
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
