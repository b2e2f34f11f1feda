//! Interval trimming at frame level and file level.

use std::path::Path;

use reel_models::Interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::RenderConfig;
use super::sink::FrameSink;
use super::{ensure_destination, RenderSummary};
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, RenderError, RenderResult};
use crate::source::MediaHandle;

/// Keep the frames whose timestamp falls in any interval, in interval order.
///
/// Each interval restarts the handle's frame stream, so overlapping or
/// unordered intervals are honored as given. The sink is finished on success.
pub fn trim_frames(
    handle: &dyn MediaHandle,
    intervals: &[Interval],
    sink: &mut dyn FrameSink,
    cancel: &CancellationToken,
) -> RenderResult<RenderSummary> {
    if intervals.is_empty() {
        return Err(RenderError::NoIntervals);
    }

    let mut written = 0u64;
    for interval in intervals {
        for frame in handle.frames()? {
            if cancel.is_cancelled() {
                return Err(MediaError::Cancelled.into());
            }
            let frame = frame?;
            if frame.timestamp >= interval.end() {
                break;
            }
            if interval.contains(frame.timestamp) {
                sink.write_frame(&frame.image)?;
                written += 1;
            }
        }
        debug!(%interval, written, "Trimmed interval");
    }

    if written == 0 {
        return Err(RenderError::EmptySource);
    }
    sink.finish()?;

    let summary = RenderSummary::new(written, handle.info().fps);
    info!(
        intervals = intervals.len(),
        frames = summary.frames_written,
        duration_secs = summary.duration_secs,
        "Frame trim finished"
    );
    Ok(summary)
}

/// Cut one interval out of `input` with frame-accurate seeking.
pub async fn extract_subclip(
    input: &Path,
    output: &Path,
    interval: &Interval,
    config: &RenderConfig,
    cancel: &CancellationToken,
) -> RenderResult<()> {
    ensure_destination(output)?;

    // Fast keyframe seek to get close, then an accurate output seek from there.
    let start = interval.start();
    let fast_seek = if start > 5.0 { start - 5.0 } else { 0.0 };

    let cmd = FfmpegCommand::new(input, output)
        .seek(fast_seek)
        .accurate_seek(start - fast_seek)
        .duration(interval.duration())
        .encode_with(config)
        .output_args(["-avoid_negative_ts", "make_zero"]);

    debug!(
        input = %input.display(),
        output = %output.display(),
        %interval,
        "Extracting sub-clip"
    );

    FfmpegRunner::new()
        .with_cancel(cancel.clone())
        .with_timeout(config.timeout_secs)
        .run(&cmd)
        .await?;
    Ok(())
}

/// Keep only `intervals` of `input`, writing the result to `output`.
///
/// Each interval is extracted and re-encoded, then the pieces are joined with
/// the concat demuxer and stream copy.
pub async fn trim_file(
    input: &Path,
    output: &Path,
    intervals: &[Interval],
    config: &RenderConfig,
    cancel: &CancellationToken,
) -> RenderResult<()> {
    if intervals.is_empty() {
        return Err(RenderError::NoIntervals);
    }
    ensure_destination(output)?;

    info!(
        input = %input.display(),
        intervals = intervals.len(),
        kept_secs = Interval::total_duration(intervals),
        "Trimming file with extract + concat"
    );

    let temp_dir = tempfile::tempdir()?;
    let mut pieces = Vec::with_capacity(intervals.len());
    for (i, interval) in intervals.iter().enumerate() {
        let piece = temp_dir.path().join(format!("seg_{:04}.mp4", i));
        extract_subclip(input, &piece, interval, config, cancel).await?;
        pieces.push(piece);
    }

    let concat_list = temp_dir.path().join("concat.txt");
    tokio::fs::write(&concat_list, concat_list_content(&pieces)).await?;

    let cmd = FfmpegCommand::new(&concat_list, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy", "-movflags", "+faststart"]);

    FfmpegRunner::new()
        .with_cancel(cancel.clone())
        .with_timeout(config.timeout_secs)
        .run(&cmd)
        .await?;

    info!(output = %output.display(), pieces = pieces.len(), "Trim concat completed");
    Ok(())
}

fn concat_list_content(pieces: &[std::path::PathBuf]) -> String {
    pieces
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}
