//! Size estimates and their presentation tier.

use std::fmt;

/// Presentation bucket for an estimate's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// Confidence above 0.8.
    High,
    /// Confidence above 0.6.
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.8 {
            ConfidenceTier::High
        } else if confidence > 0.6 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A predicted garment size.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeEstimate {
    pub size: String,
    /// 0.0 to 1.0.
    pub confidence: f32,
    pub tier: ConfidenceTier,
}

impl SizeEstimate {
    pub fn new(size: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            size: size.into(),
            confidence,
            tier: ConfidenceTier::from_confidence(confidence),
        }
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0}% confidence, {})",
            self.size,
            self.confidence * 100.0,
            self.tier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_exclusive() {
        assert_eq!(ConfidenceTier::from_confidence(0.81), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.8), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.61), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.6), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_confidence(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn test_estimate_clamps_confidence() {
        assert_eq!(SizeEstimate::new("M", 1.7).confidence, 1.0);
        assert_eq!(SizeEstimate::new("M", f32::NAN).tier, ConfidenceTier::Low);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SizeEstimate::new("L", 0.9).to_string(),
            "L (90% confidence, high)"
        );
    }
}
