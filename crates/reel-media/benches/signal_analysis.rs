//! Signal analysis benchmarks.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package reel-media --bench signal_analysis
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgb, RgbImage};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use reel_media::{
    detect_effects, detect_non_silent, estimate_audio_style, estimate_visual_style, AudioBuffer,
    AudioThresholds, EffectThresholds, Frame, MediaResult, SilenceConfig, StyleThresholds,
};

/// Synthetic frame with a moving gradient so consecutive frames differ.
fn create_test_frame(index: u64, width: u32, height: u32) -> Frame {
    let shift = (index * 7) as u32;
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 11 + shift) % 256) as u8,
            ((x * 13 + y * 17) % 256) as u8,
            ((x * 19 + y * 23 + shift) % 256) as u8,
        ])
    });
    Frame::new(index, index as f64 / 30.0, image)
}

fn frames(count: u64, width: u32, height: u32) -> Vec<Frame> {
    (0..count).map(|i| create_test_frame(i, width, height)).collect()
}

/// Speech-like bursts separated by silence.
fn bursty_audio(secs: f64, rate: u32) -> AudioBuffer {
    let n = (secs * rate as f64) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f64 / rate as f64;
            if (t as u64) % 3 == 2 {
                0
            } else {
                (8000.0 * (2.0 * std::f64::consts::PI * 220.0 * t).sin()) as i16
            }
        })
        .collect();
    AudioBuffer::new(samples, rate, 1)
}

fn bench_visual_style(c: &mut Criterion) {
    let mut group = c.benchmark_group("visual_style");
    group.measurement_time(Duration::from_secs(5));

    for (width, height) in [(640, 360), (1280, 720)] {
        let input = frames(60, width, height);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("estimate", format!("{width}x{height}")),
            &input,
            |b, input| {
                b.iter(|| {
                    let stream = input.iter().cloned().map(MediaResult::Ok);
                    estimate_visual_style(
                        black_box(stream),
                        30.0,
                        StyleThresholds::default(),
                        &CancellationToken::new(),
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("effects");
    group.measurement_time(Duration::from_secs(5));

    let input = frames(60, 640, 360);
    group.throughput(Throughput::Elements(input.len() as u64));
    group.bench_function("detect_640x360", |b| {
        b.iter(|| {
            let stream = input.iter().cloned().map(MediaResult::Ok);
            detect_effects(
                black_box(stream),
                30.0,
                input.len() as u64,
                EffectThresholds::default(),
                &CancellationToken::new(),
            )
        })
    });
    group.finish();
}

fn bench_audio(c: &mut Criterion) {
    let mut group = c.benchmark_group("audio");
    group.measurement_time(Duration::from_secs(5));

    for secs in [10.0, 60.0] {
        let audio = bursty_audio(secs, 16_000);
        group.throughput(Throughput::Elements(audio.samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("style", secs as u64), &audio, |b, audio| {
            b.iter(|| estimate_audio_style(black_box(audio), AudioThresholds::default()))
        });
        group.bench_with_input(BenchmarkId::new("silence", secs as u64), &audio, |b, audio| {
            b.iter(|| detect_non_silent(black_box(audio), &SilenceConfig::default()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_visual_style, bench_effects, bench_audio);
criterion_main!(benches);
