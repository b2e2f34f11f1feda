//! Face localization over a frame sequence.

use reel_models::{FaceRegion, FaceSet, MAX_FACE_REGIONS};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Per-frame face detector.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> MediaResult<Vec<Rect>>;
}

/// Scan frames until five distinct face regions are found or frames run out.
///
/// Frames are pulled lazily, so a full set stops decoding early. Returns
/// `Ok(None)` when no face was seen.
pub fn locate_faces<I>(
    frames: I,
    detector: &mut dyn FaceDetector,
    cancel: &CancellationToken,
) -> MediaResult<Option<FaceSet>>
where
    I: IntoIterator<Item = MediaResult<Frame>>,
{
    let mut regions: Vec<FaceRegion> = Vec::with_capacity(MAX_FACE_REGIONS);
    let mut scanned = 0u64;

    for frame in frames {
        if cancel.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        let frame = frame?;
        scanned += 1;

        for rect in detector.detect(&frame)? {
            let region = FaceRegion::new(rect.x, rect.y, rect.width, rect.height, frame.index);
            if !regions.iter().any(|r| r.same_rect(&region)) {
                regions.push(region);
                if regions.len() >= MAX_FACE_REGIONS {
                    break;
                }
            }
        }

        if regions.len() >= MAX_FACE_REGIONS {
            break;
        }
    }

    debug!(frames = scanned, faces = regions.len(), "Face scan finished");
    Ok(FaceSet::from_observations(regions))
}

#[cfg(feature = "opencv")]
pub use haar::{HaarCascadeDetector, DEFAULT_CASCADE_PATH};

#[cfg(feature = "opencv")]
mod haar {
    use opencv::{
        core::{Mat, Rect as CvRect, Scalar, Size, Vector, CV_8UC1},
        objdetect::CascadeClassifier,
        prelude::*,
    };
    use std::path::Path;

    use super::{FaceDetector, Rect};
    use crate::error::{MediaError, MediaResult};
    use crate::frame::Frame;

    /// Frontal-face cascade shipped with most OpenCV packages.
    pub const DEFAULT_CASCADE_PATH: &str =
        "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml";

    const SCALE_FACTOR: f64 = 1.1;
    const MIN_NEIGHBORS: i32 = 5;
    const MIN_SIZE: i32 = 30;

    /// OpenCV Haar cascade detector over the grayscale frame.
    pub struct HaarCascadeDetector {
        classifier: CascadeClassifier,
    }

    impl HaarCascadeDetector {
        pub fn new(cascade_path: impl AsRef<Path>) -> MediaResult<Self> {
            let path = cascade_path.as_ref();
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
            let classifier = CascadeClassifier::new(&path.to_string_lossy())
                .map_err(|e| MediaError::detection_failed(format!("load cascade: {e}")))?;
            if classifier
                .empty()
                .map_err(|e| MediaError::detection_failed(format!("cascade state: {e}")))?
            {
                return Err(MediaError::detection_failed(format!(
                    "cascade {} is empty",
                    path.display()
                )));
            }
            Ok(Self { classifier })
        }
    }

    impl FaceDetector for HaarCascadeDetector {
        fn detect(&mut self, frame: &Frame) -> MediaResult<Vec<Rect>> {
            let gray = frame.gray();
            let mut mat = Mat::new_rows_cols_with_default(
                gray.height() as i32,
                gray.width() as i32,
                CV_8UC1,
                Scalar::all(0.0),
            )
            .map_err(|e| MediaError::detection_failed(format!("alloc gray mat: {e}")))?;
            mat.data_bytes_mut()
                .map_err(|e| MediaError::detection_failed(format!("gray mat data: {e}")))?
                .copy_from_slice(gray.as_raw());

            let mut faces: Vector<CvRect> = Vector::new();
            self.classifier
                .detect_multi_scale(
                    &mat,
                    &mut faces,
                    SCALE_FACTOR,
                    MIN_NEIGHBORS,
                    0,
                    Size::new(MIN_SIZE, MIN_SIZE),
                    Size::new(0, 0),
                )
                .map_err(|e| MediaError::detection_failed(format!("detect_multi_scale: {e}")))?;

            Ok(faces
                .iter()
                .filter(|r| r.x >= 0 && r.y >= 0 && r.width > 0 && r.height > 0)
                .map(|r| Rect::new(r.x as u32, r.y as u32, r.width as u32, r.height as u32))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Emits a scripted list of rectangles per frame.
    struct ScriptedDetector {
        script: Vec<Vec<Rect>>,
        calls: usize,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> MediaResult<Vec<Rect>> {
            let out = self.script.get(self.calls).cloned().unwrap_or_default();
            self.calls += 1;
            Ok(out)
        }
    }

    fn frames(n: u64) -> impl Iterator<Item = MediaResult<Frame>> {
        (0..n).map(|i| Ok(Frame::new(i, i as f64 / 30.0, RgbImage::new(64, 64))))
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_haar_detector_requires_cascade_file() {
        let err = HaarCascadeDetector::new("/nonexistent/haarcascade.xml").err().unwrap();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_caps_at_five_and_stops_early() {
        // Twenty distinct placements, one per frame.
        let script = (0..20).map(|i| vec![Rect::new(i * 3, 0, 30, 30)]).collect();
        let mut detector = ScriptedDetector { script, calls: 0 };
        let set = locate_faces(frames(20), &mut detector, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(detector.calls, 5);
    }

    #[test]
    fn test_multiple_faces_in_one_frame_respect_cap() {
        let script = vec![(0..8).map(|i| Rect::new(i * 10, 0, 30, 30)).collect()];
        let mut detector = ScriptedDetector { script, calls: 0 };
        let set = locate_faces(frames(3), &mut detector, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(detector.calls, 1);
    }

    #[test]
    fn test_duplicates_ignored() {
        let same = Rect::new(5, 5, 40, 40);
        let script = vec![vec![same], vec![same], vec![Rect::new(6, 5, 40, 40)]];
        let mut detector = ScriptedDetector { script, calls: 0 };
        let set = locate_faces(frames(3), &mut detector, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.regions()[1].frame_index, 2);
    }

    #[test]
    fn test_no_faces_is_none() {
        let mut detector = ScriptedDetector {
            script: Vec::new(),
            calls: 0,
        };
        let result = locate_faces(frames(10), &mut detector, &CancellationToken::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let mut detector = ScriptedDetector {
            script: Vec::new(),
            calls: 0,
        };
        let result = locate_faces(frames(10), &mut detector, &token);
        assert!(matches!(result, Err(MediaError::Cancelled)));
    }
}
