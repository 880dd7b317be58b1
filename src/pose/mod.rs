//! Pose data returned by the detection service.
//!
//! - Landmarks and landmark sets via [`Landmark`] and [`LandmarkSet`]
//! - The static skeleton edge list via [`POSE_CONNECTIONS`]
//! - Named body dimensions via [`MeasurementSet`] and [`derive_measurements`]

pub mod landmark;
mod measurement;
mod skeleton;

pub use landmark::{Landmark, LandmarkSet, LANDMARK_COUNT};
pub use measurement::{derive_measurements, Dimension, MeasurementSet, WAIST_TO_SHOULDER_RATIO};
pub use skeleton::{Connection, POSE_CONNECTIONS};

/// Visibility a landmark must exceed to be drawn or measured.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;
