//! Crop and trim rendering.
//!
//! Frame-level renderers write through a [`FrameSink`], so they run the same
//! against an in-memory sink or a piped encoder. [`trim_file`] works on whole
//! files with the extract + concat approach and never decodes frames itself.

mod config;
mod crop;
mod geometry;
mod sink;
mod trim;

use std::path::Path;

pub use config::RenderConfig;
pub use crop::render_crop;
pub use geometry::{portrait_target, CropPlan, CropWindow};
pub use sink::{FfmpegEncoder, FrameSink, MemorySink};
pub use trim::{extract_subclip, trim_file, trim_frames};

use crate::error::{RenderError, RenderResult};

/// What a frame-level render produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub frames_written: u64,
    /// `frames_written / fps`
    pub duration_secs: f64,
}

impl RenderSummary {
    pub(crate) fn new(frames_written: u64, fps: f64) -> Self {
        let duration_secs = if fps > 0.0 {
            frames_written as f64 / fps
        } else {
            0.0
        };
        metrics::counter!("reel_render_frames_total").increment(frames_written);
        Self {
            frames_written,
            duration_secs,
        }
    }
}

/// Fail early when the output's parent directory is missing.
pub(crate) fn ensure_destination(output: &Path) -> RenderResult<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(RenderError::destination(
            output,
            format!("directory {} does not exist", parent.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_checks() {
        assert!(ensure_destination(Path::new("out.mp4")).is_ok());
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_destination(&dir.path().join("out.mp4")).is_ok());
        assert!(matches!(
            ensure_destination(Path::new("/definitely/not/here/out.mp4")),
            Err(RenderError::Destination { .. })
        ));
    }

    #[test]
    fn test_summary_duration() {
        let s = RenderSummary::new(45, 15.0);
        assert_eq!(s.duration_secs, 3.0);
        assert_eq!(RenderSummary::new(3, 0.0).duration_secs, 0.0);
    }
}
