//! Face-guided portrait crop.

use image::imageops::{self, FilterType};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::geometry::CropPlan;
use super::sink::FrameSink;
use super::RenderSummary;
use crate::error::{MediaError, MediaResult, RenderError, RenderResult};
use crate::frame::Frame;

/// Crop every frame to the plan's 9:16 window and write it to `sink`.
///
/// One output frame is written per input frame; the sink is finished on success.
pub fn render_crop<I>(
    frames: I,
    plan: &CropPlan,
    fps: f64,
    sink: &mut dyn FrameSink,
    cancel: &CancellationToken,
) -> RenderResult<RenderSummary>
where
    I: IntoIterator<Item = MediaResult<Frame>>,
{
    let (tw, th) = plan.target();
    let mut written = 0u64;

    for frame in frames {
        if cancel.is_cancelled() {
            return Err(MediaError::Cancelled.into());
        }
        let frame = frame?;
        let window = plan.window_for(frame.index);

        let cropped =
            imageops::crop_imm(&frame.image, window.x, window.y, window.width, window.height)
                .to_image();
        let out = if cropped.dimensions() == (tw, th) {
            cropped
        } else {
            imageops::resize(&cropped, tw, th, FilterType::Triangle)
        };

        sink.write_frame(&out)?;
        written += 1;
    }

    if written == 0 {
        return Err(RenderError::EmptySource);
    }
    sink.finish()?;

    let summary = RenderSummary::new(written, fps);
    info!(
        frames = summary.frames_written,
        width = tw,
        height = th,
        "Crop render finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sink::MemorySink;
    use image::{Rgb, RgbImage};
    use reel_models::{FaceRegion, FaceSet};

    fn frames(n: u64, w: u32, h: u32) -> Vec<MediaResult<Frame>> {
        (0..n)
            .map(|i| {
                // Left half red, right half blue.
                let img = RgbImage::from_fn(w, h, |x, _| {
                    if x < w / 2 {
                        Rgb([255, 0, 0])
                    } else {
                        Rgb([0, 0, 255])
                    }
                });
                Ok(Frame::new(i, i as f64 / 10.0, img))
            })
            .collect()
    }

    #[test]
    fn test_output_size_and_count() {
        let plan = CropPlan::new(320, 180, None);
        let mut sink = MemorySink::new();
        let summary =
            render_crop(frames(7, 320, 180), &plan, 10.0, &mut sink, &CancellationToken::new())
                .unwrap();
        assert_eq!(summary.frames_written, 7);
        assert!(sink.finished);
        let (tw, th) = plan.target();
        assert!(sink.frames.iter().all(|f| f.dimensions() == (tw, th)));
        assert_eq!(plan.target(), (90, 162));
    }

    #[test]
    fn test_crop_follows_face() {
        let faces = FaceSet::from_observations(vec![FaceRegion::new(260, 60, 40, 40, 0)]);
        let plan = CropPlan::new(320, 180, faces);
        let mut sink = MemorySink::new();
        render_crop(frames(1, 320, 180), &plan, 10.0, &mut sink, &CancellationToken::new())
            .unwrap();
        // Face sits in the blue half; the crop must be entirely blue.
        assert!(sink.frames[0].pixels().all(|p| p[2] == 255 && p[0] == 0));
    }

    #[test]
    fn test_narrow_source_is_resized_to_target() {
        let plan = CropPlan::new(40, 400, None);
        let mut sink = MemorySink::new();
        render_crop(frames(2, 40, 400), &plan, 10.0, &mut sink, &CancellationToken::new())
            .unwrap();
        assert_eq!(sink.frames[0].dimensions(), plan.target());
    }

    #[test]
    fn test_empty_source() {
        let plan = CropPlan::new(320, 180, None);
        let mut sink = MemorySink::new();
        let result = render_crop(
            Vec::<MediaResult<Frame>>::new(),
            &plan,
            10.0,
            &mut sink,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RenderError::EmptySource)));
    }
}
