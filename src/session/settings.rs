//! Runtime settings for one session.

use std::time::Duration;

use crate::capture::{DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLE_RATE_HZ};
use crate::overlay::{OverlayStyle, DEFAULT_TRYON_OPACITY};
use crate::pose::DEFAULT_VISIBILITY_THRESHOLD;

/// Fit preference sent with size estimates when none is configured.
pub const DEFAULT_PREFERRED_FIT: &str = "regular";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Sampling ticks per second.
    pub sample_rate_hz: u32,
    pub jpeg_quality: u8,
    /// Minimum detection confidence forwarded to the service.
    pub confidence_threshold: f32,
    pub detection_enabled: bool,
    pub estimation_enabled: bool,
    pub preferred_fit: String,
    pub tryon_enabled: bool,
    pub tryon_opacity: f32,
    pub style: OverlayStyle,
}

impl SessionSettings {
    /// Time between sampling ticks.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate_hz.max(1) as f64)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            confidence_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            detection_enabled: true,
            estimation_enabled: true,
            preferred_fit: DEFAULT_PREFERRED_FIT.to_string(),
            tryon_enabled: false,
            tryon_opacity: DEFAULT_TRYON_OPACITY,
            style: OverlayStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period_is_100ms() {
        assert_eq!(
            SessionSettings::default().sample_period(),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_zero_rate_does_not_divide_by_zero() {
        let settings = SessionSettings {
            sample_rate_hz: 0,
            ..SessionSettings::default()
        };
        assert_eq!(settings.sample_period(), Duration::from_secs(1));
    }
}
