//! Face regions observed during detection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of distinct regions a detection run keeps.
pub const MAX_FACE_REGIONS: usize = 5;

/// A detected face rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaceRegion {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Box width
    pub width: u32,
    /// Box height
    pub height: u32,
    /// Index of the frame the face was observed in
    pub frame_index: u64,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32, frame_index: u64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            frame_index,
        }
    }

    /// Center point of the rectangle.
    #[inline]
    pub fn centroid(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Exact-coordinate match, ignoring the frame the region came from.
    #[inline]
    pub fn same_rect(&self, other: &FaceRegion) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
    }
}

/// Bounded, deduplicated, non-empty set of face regions in observation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FaceRegion>", into = "Vec<FaceRegion>")]
pub struct FaceSet {
    regions: Vec<FaceRegion>,
}

impl TryFrom<Vec<FaceRegion>> for FaceSet {
    type Error = &'static str;

    fn try_from(regions: Vec<FaceRegion>) -> Result<Self, Self::Error> {
        FaceSet::from_observations(regions).ok_or("face set must contain at least one region")
    }
}

impl From<FaceSet> for Vec<FaceRegion> {
    fn from(set: FaceSet) -> Self {
        set.regions
    }
}

impl FaceSet {
    /// Build a set from observations, dropping exact duplicates and anything past the cap.
    ///
    /// Returns `None` when no region survives.
    pub fn from_observations(observations: impl IntoIterator<Item = FaceRegion>) -> Option<Self> {
        let mut regions: Vec<FaceRegion> = Vec::with_capacity(MAX_FACE_REGIONS);
        for region in observations {
            if regions.len() >= MAX_FACE_REGIONS {
                break;
            }
            if !regions.iter().any(|r| r.same_rect(&region)) {
                regions.push(region);
            }
        }
        if regions.is_empty() {
            None
        } else {
            Some(Self { regions })
        }
    }

    pub fn regions(&self) -> &[FaceRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.regions.len() >= MAX_FACE_REGIONS
    }

    /// Region that drives framing: the last one in the set, for every frame.
    pub fn framing_region(&self) -> &FaceRegion {
        &self.regions[self.regions.len() - 1]
    }
}
