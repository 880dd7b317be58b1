//! Normalized landmark positions in the 33-point body layout.

use serde::{Deserialize, Serialize};

/// Number of landmarks in a full body pose.
pub const LANDMARK_COUNT: usize = 33;

/// Indices of the landmarks used for measurements.
pub mod index {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE: usize = 2;
    pub const RIGHT_EYE: usize = 5;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}

/// A single landmark estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0.0 (left edge) to 1.0 (right edge).
    pub x: f32,
    /// Vertical position, 0.0 (top edge) to 1.0 (bottom edge).
    pub y: f32,
    /// Relative depth. Not used for drawing.
    #[serde(default)]
    pub z: f32,
    /// Confidence that the landmark is visible, 0.0 to 1.0.
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Whether the landmark's visibility is strictly above `threshold`.
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    /// Scale the normalized position to pixel coordinates.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Ordered landmark sequence. The position of each entry is its anatomical index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(Vec<Landmark>);

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    /// A full-length set with every landmark invisible at the origin.
    pub fn invisible() -> Self {
        Self(vec![Landmark::default(); LANDMARK_COUNT])
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    /// The landmark at `index` if it exists and is visible.
    pub fn visible(&self, index: usize, threshold: f32) -> Option<&Landmark> {
        self.0.get(index).filter(|lm| lm.is_visible(threshold))
    }

    /// Replace the landmark at `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = landmark;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_is_strictly_greater() {
        let lm = Landmark::new(0.5, 0.5, 0.5);
        assert!(!lm.is_visible(0.5));
        assert!(Landmark::new(0.5, 0.5, 0.51).is_visible(0.5));
    }

    #[test]
    fn test_to_pixel_scales_by_surface() {
        let lm = Landmark::new(0.25, 0.5, 1.0);
        assert_eq!(lm.to_pixel(640, 480), (160.0, 240.0));
    }

    #[test]
    fn test_set_ignores_out_of_range() {
        let mut set = LandmarkSet::new(vec![Landmark::default(); 2]);
        set.set(5, Landmark::new(1.0, 1.0, 1.0));
        assert_eq!(set.len(), 2);
        set.set(1, Landmark::new(1.0, 1.0, 1.0));
        assert!(set.visible(1, 0.5).is_some());
    }

    #[test]
    fn test_deserializes_without_depth() {
        let set: LandmarkSet =
            serde_json::from_str(r#"[{"x":0.1,"y":0.2,"visibility":0.9}]"#).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().z, 0.0);
    }
}
