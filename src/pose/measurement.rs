//! Named body dimensions derived from landmarks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::landmark::{index, LandmarkSet};

/// Waist width estimated as a fraction of shoulder width.
pub const WAIST_TO_SHOULDER_RATIO: f64 = 0.75;

/// Body dimensions the session knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    ShoulderWidth,
    ChestWidth,
    WaistWidth,
    HipWidth,
    TorsoLength,
    ArmLength,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::ShoulderWidth,
        Dimension::ChestWidth,
        Dimension::WaistWidth,
        Dimension::HipWidth,
        Dimension::TorsoLength,
        Dimension::ArmLength,
    ];

    /// Wire name of the dimension.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::ShoulderWidth => "shoulder_width",
            Dimension::ChestWidth => "chest_width",
            Dimension::WaistWidth => "waist_width",
            Dimension::HipWidth => "hip_width",
            Dimension::TorsoLength => "torso_length",
            Dimension::ArmLength => "arm_length",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mapping from dimension name to a pixel length.
///
/// Partial by nature: dimensions whose landmarks were not visible are absent.
/// Names the session does not know are kept so they reach the estimator intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementSet(BTreeMap<String, f64>);

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        self.0.get(dimension.key()).copied()
    }

    pub fn get_named(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn insert(&mut self, dimension: Dimension, value: f64) {
        self.0.insert(dimension.key().to_string(), value);
    }

    pub fn with(mut self, dimension: Dimension, value: f64) -> Self {
        self.insert(dimension, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Derive pixel measurements from a landmark set captured at `width`x`height`.
///
/// Only landmarks with visibility above `threshold` contribute. Returns an
/// empty set when the landmark set is not a full body layout.
pub fn derive_measurements(
    landmarks: &LandmarkSet,
    width: u32,
    height: u32,
    threshold: f32,
) -> MeasurementSet {
    let mut set = MeasurementSet::new();
    if landmarks.len() < super::LANDMARK_COUNT || width == 0 || height == 0 {
        return set;
    }

    let w = width as f64;
    let h = height as f64;
    let point = |i: usize| landmarks.visible(i, threshold).map(|lm| (lm.x as f64, lm.y as f64));

    if let (Some(l), Some(r)) = (point(index::LEFT_SHOULDER), point(index::RIGHT_SHOULDER)) {
        set.insert(Dimension::ShoulderWidth, (l.0 - r.0).abs() * w);
    }
    if let (Some(l), Some(r)) = (point(index::LEFT_HIP), point(index::RIGHT_HIP)) {
        set.insert(Dimension::HipWidth, (l.0 - r.0).abs() * w);
    }
    if let (Some(s), Some(hip)) = (point(index::LEFT_SHOULDER), point(index::LEFT_HIP)) {
        set.insert(Dimension::TorsoLength, (s.1 - hip.1).abs() * h);
    }
    if let (Some(s), Some(wr)) = (point(index::LEFT_SHOULDER), point(index::LEFT_WRIST)) {
        let dx = (s.0 - wr.0) * w;
        let dy = (s.1 - wr.1) * h;
        set.insert(Dimension::ArmLength, (dx * dx + dy * dy).sqrt());
    }
    if let (Some(shoulder), Some(_)) = (
        set.get(Dimension::ShoulderWidth),
        set.get(Dimension::HipWidth),
    ) {
        set.insert(Dimension::WaistWidth, shoulder * WAIST_TO_SHOULDER_RATIO);
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    fn body() -> LandmarkSet {
        let mut set = LandmarkSet::invisible();
        set.set(index::LEFT_SHOULDER, Landmark::new(0.6, 0.3, 0.9));
        set.set(index::RIGHT_SHOULDER, Landmark::new(0.4, 0.3, 0.9));
        set.set(index::LEFT_HIP, Landmark::new(0.58, 0.6, 0.9));
        set.set(index::RIGHT_HIP, Landmark::new(0.42, 0.6, 0.9));
        set.set(index::LEFT_WRIST, Landmark::new(0.6, 0.7, 0.9));
        set
    }

    #[test]
    fn test_derives_all_dimensions_for_visible_body() {
        let m = derive_measurements(&body(), 100, 200, 0.5);
        assert!((m.get(Dimension::ShoulderWidth).unwrap() - 20.0).abs() < 1e-4);
        assert!((m.get(Dimension::HipWidth).unwrap() - 16.0).abs() < 1e-4);
        assert!((m.get(Dimension::TorsoLength).unwrap() - 60.0).abs() < 1e-4);
        assert!((m.get(Dimension::ArmLength).unwrap() - 80.0).abs() < 1e-4);
        assert!((m.get(Dimension::WaistWidth).unwrap() - 15.0).abs() < 1e-4);
        assert!(m.get(Dimension::ChestWidth).is_none());
    }

    #[test]
    fn test_hidden_hip_drops_hip_torso_and_waist() {
        let mut set = body();
        set.set(index::LEFT_HIP, Landmark::new(0.58, 0.6, 0.2));
        let m = derive_measurements(&set, 100, 200, 0.5);
        assert!(m.get(Dimension::ShoulderWidth).is_some());
        assert!(m.get(Dimension::HipWidth).is_none());
        assert!(m.get(Dimension::TorsoLength).is_none());
        assert!(m.get(Dimension::WaistWidth).is_none());
    }

    #[test]
    fn test_short_landmark_set_yields_nothing() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 1.0); 12]);
        assert!(derive_measurements(&set, 640, 480, 0.5).is_empty());
    }

    #[test]
    fn test_unknown_names_survive_serde() {
        let m: MeasurementSet =
            serde_json::from_str(r#"{"shoulder_width":120.4,"neck_width":30.0}"#).unwrap();
        assert_eq!(m.get(Dimension::ShoulderWidth), Some(120.4));
        assert_eq!(m.get_named("neck_width"), Some(30.0));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["neck_width"], 30.0);
    }

    #[test]
    fn test_dimension_keys_round_trip() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_key(d.key()), Some(d));
        }
        assert_eq!(Dimension::from_key("inseam"), None);
    }
}
