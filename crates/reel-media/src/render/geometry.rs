//! Portrait crop geometry.

use reel_models::FaceSet;

/// Pixel rectangle to cut out of a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Output size for a 9:16 crop of a `frame_width` x `frame_height` source.
///
/// Height is 90% of the source height and width follows the 9:16 ratio, both
/// rounded down to even values for yuv420p encoders.
pub fn portrait_target(frame_height: u32) -> (u32, u32) {
    let height = even(frame_height as u64 * 9 / 10);
    let width = even(height as u64 * 9 / 16);
    (width.max(2), height.max(2))
}

fn even(v: u64) -> u32 {
    (v as u32) & !1
}

impl CropWindow {
    /// Window of `target` size centered on `center`, shifted to stay inside the
    /// frame and intersected with it when larger.
    pub fn centered(frame: (u32, u32), target: (u32, u32), center: (f64, f64)) -> Self {
        let (fw, fh) = frame;
        let width = target.0.min(fw).max(1);
        let height = target.1.min(fh).max(1);
        Self {
            x: clamp_axis(center.0, width, fw),
            y: clamp_axis(center.1, height, fh),
            width,
            height,
        }
    }
}

fn clamp_axis(center: f64, size: u32, limit: u32) -> u32 {
    let max_start = (limit - size) as f64;
    let start = (center - size as f64 / 2.0).round();
    start.clamp(0.0, max_start) as u32
}

/// Per-frame crop planning for one source.
#[derive(Debug, Clone)]
pub struct CropPlan {
    frame: (u32, u32),
    target: (u32, u32),
    faces: Option<FaceSet>,
}

impl CropPlan {
    pub fn new(frame_width: u32, frame_height: u32, faces: Option<FaceSet>) -> Self {
        Self {
            frame: (frame_width, frame_height),
            target: portrait_target(frame_height),
            faces,
        }
    }

    /// Output dimensions, identical for every frame.
    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    /// Window for frame `index`: around the last detected face, or the frame center.
    ///
    /// The same face frames every frame, including frames before it was detected.
    pub fn window_for(&self, _index: u64) -> CropWindow {
        let center = match &self.faces {
            Some(faces) => faces.framing_region().centroid(),
            None => (self.frame.0 as f64 / 2.0, self.frame.1 as f64 / 2.0),
        };
        CropWindow::centered(self.frame, self.target, center)
    }
}
