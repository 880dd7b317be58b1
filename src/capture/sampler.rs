//! Per-tick capture decisions.

use super::{CaptureError, Frame, FrameSource, InFlightGuard, DEFAULT_JPEG_QUALITY};

/// Default sampling cadence (ticks per second).
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 10;

/// What a sampling tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// A frame was captured and should be submitted for detection.
    Captured(Frame),
    /// The session is stopped.
    Inactive,
    /// Detection is switched off; the ticker keeps running.
    Disabled,
    /// A detection request is still outstanding.
    Busy,
    /// The video has no decoded dimensions yet.
    NotReady,
    /// Grabbing or encoding the frame failed.
    Failed(CaptureError),
}

impl TickOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, TickOutcome::Captured(_))
    }
}

/// Decides on each tick whether to grab a frame, and encodes it.
#[derive(Debug)]
pub struct CaptureSampler {
    detection_enabled: bool,
    jpeg_quality: u8,
    ticks: u64,
}

impl CaptureSampler {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            detection_enabled: true,
            jpeg_quality,
            ticks: 0,
        }
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_enabled
    }

    pub fn set_detection_enabled(&mut self, enabled: bool) {
        if self.detection_enabled != enabled {
            log::info!(
                "Detection {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.detection_enabled = enabled;
    }

    /// Number of ticks seen so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Handle one timer tick.
    ///
    /// Checks run cheapest first and nothing is grabbed unless every check
    /// passes. The guard is only inspected here; the caller acquires it right
    /// before submitting the returned frame.
    pub fn tick(
        &mut self,
        active: bool,
        guard: &InFlightGuard,
        source: &mut dyn FrameSource,
    ) -> TickOutcome {
        self.ticks += 1;

        if !active {
            return TickOutcome::Inactive;
        }
        if !self.detection_enabled {
            return TickOutcome::Disabled;
        }
        if guard.is_busy() {
            return TickOutcome::Busy;
        }
        if source.dimensions().is_none() {
            return TickOutcome::NotReady;
        }

        match self.capture_now(source) {
            Ok(frame) => TickOutcome::Captured(frame),
            Err(e) => TickOutcome::Failed(e),
        }
    }

    /// Capture a frame outside the regular cadence.
    pub fn capture_now(&self, source: &mut dyn FrameSource) -> Result<Frame, CaptureError> {
        if source.dimensions().is_none() {
            return Err(CaptureError::NotReady);
        }
        let image = source.grab()?;
        Frame::encode(&image, self.ticks, self.jpeg_quality)
    }
}

impl Default for CaptureSampler {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}
