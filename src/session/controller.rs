//! TryOnController - reacts to ticks, service events and user selections.

use image::RgbaImage;

use super::{GarmentSelection, SessionSettings, SessionState, SessionUpdate, SizeEstimate};
use crate::capture::{CaptureSampler, FrameSource, InFlightGuard, TickOutcome};
use crate::channel::{
    ClientMessage, DetectPoseRequest, EstimateSizeRequest, MessageSink, PoseDetection,
    RequestKind, RequestSequencer, ServerEvent, SizeEstimation, TryOnResult, VirtualTryOnRequest,
};
use crate::overlay::{DecodeError, DrawingSurface, OverlayRenderer};
use crate::pose::derive_measurements;

/// Why a tick did not submit a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    Disabled,
    Busy,
    NotReady,
    CameraUnavailable,
    CaptureFailed,
    SendFailed,
}

/// Result of one sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReport {
    Submitted { tick: u64, seq: u64 },
    Skipped(SkipReason),
}

/// A try-on image waiting to be decoded before it can be composited.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeJob {
    pub seq: Option<u64>,
    pub payload: String,
}

/// Owns the session state and is the only thing that mutates it.
///
/// Every method runs to completion without awaiting; the event loop decides
/// when each one is called.
pub struct TryOnController<K: MessageSink, S: DrawingSurface> {
    settings: SessionSettings,
    state: SessionState,
    guard: InFlightGuard,
    sampler: CaptureSampler,
    sequencer: RequestSequencer,
    sink: K,
    renderer: OverlayRenderer<S>,
    camera_denied: bool,
    updates: Vec<SessionUpdate>,
}

impl<K: MessageSink, S: DrawingSurface> TryOnController<K, S> {
    /// Create a stopped session. Call [`TryOnController::start`] to begin sampling.
    pub fn new(settings: SessionSettings, sink: K, surface: S) -> Self {
        let mut sampler = CaptureSampler::new(settings.jpeg_quality);
        sampler.set_detection_enabled(settings.detection_enabled);
        let renderer =
            OverlayRenderer::with_opacity(surface, settings.style.clone(), settings.tryon_opacity);

        Self {
            settings,
            state: SessionState::new(),
            guard: InFlightGuard::new(),
            sampler,
            sequencer: RequestSequencer::new(),
            sink,
            renderer,
            camera_denied: false,
            updates: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn guard(&self) -> &InFlightGuard {
        &self.guard
    }

    pub fn renderer(&self) -> &OverlayRenderer<S> {
        &self.renderer
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Take the updates published since the last call.
    pub fn drain_updates(&mut self) -> Vec<SessionUpdate> {
        std::mem::take(&mut self.updates)
    }

    // --- lifecycle ---

    pub fn start(&mut self) {
        if self.state.is_active() {
            return;
        }
        self.state.activate();
        self.updates.push(SessionUpdate::Started);
        log::info!("Try-on session started");
    }

    /// Stop sampling and wipe the overlay.
    ///
    /// A detection request already in flight is not cancelled; its response
    /// still releases the guard but changes nothing else.
    pub fn stop(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.state.deactivate();
        self.renderer.clear();
        self.updates.push(SessionUpdate::Stopped);
        log::info!(
            "Try-on session stopped{}",
            if self.guard.is_busy() {
                " (detection request still in flight)"
            } else {
                ""
            }
        );
    }

    /// The service connection is gone; nothing will answer the outstanding request.
    pub fn on_channel_closed(&mut self) {
        self.guard.release();
        log::warn!("Detection channel closed");
    }

    // --- toggles ---

    pub fn set_detection_enabled(&mut self, enabled: bool) {
        self.settings.detection_enabled = enabled;
        self.sampler.set_detection_enabled(enabled);
    }

    pub fn set_estimation_enabled(&mut self, enabled: bool) {
        self.settings.estimation_enabled = enabled;
    }

    pub fn set_tryon_enabled(&mut self, enabled: bool) {
        self.settings.tryon_enabled = enabled;
    }

    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.settings.confidence_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn set_preferred_fit(&mut self, fit: impl Into<String>) {
        self.settings.preferred_fit = fit.into();
    }

    pub fn set_tryon_opacity(&mut self, opacity: f32) {
        self.renderer.set_opacity(opacity);
        self.settings.tryon_opacity = self.renderer.opacity();
    }

    // --- sampling ---

    /// Handle one sampling tick: capture and submit a frame if the session
    /// is active, detection is enabled and no request is outstanding.
    pub fn on_tick(&mut self, source: &mut dyn FrameSource) -> TickReport {
        if self.camera_denied {
            return TickReport::Skipped(SkipReason::CameraUnavailable);
        }

        let frame = match self
            .sampler
            .tick(self.state.is_active(), &self.guard, source)
        {
            TickOutcome::Captured(frame) => frame,
            TickOutcome::Inactive => return TickReport::Skipped(SkipReason::Inactive),
            TickOutcome::Disabled => return TickReport::Skipped(SkipReason::Disabled),
            TickOutcome::Busy => return TickReport::Skipped(SkipReason::Busy),
            TickOutcome::NotReady => return TickReport::Skipped(SkipReason::NotReady),
            TickOutcome::Failed(e) if e.is_capability_denial() => {
                self.camera_denied = true;
                log::error!("{}", e);
                self.updates
                    .push(SessionUpdate::CameraUnavailable(e.to_string()));
                return TickReport::Skipped(SkipReason::CameraUnavailable);
            }
            TickOutcome::Failed(e) => {
                log::debug!("Frame capture failed: {}", e);
                return TickReport::Skipped(SkipReason::CaptureFailed);
            }
        };

        let seq = self.sequencer.next(RequestKind::Detect);
        let tick = frame.tick;
        self.state.note_frame_size(frame.width, frame.height);
        log::debug!(
            "Submitting frame {} ({}x{}, {} bytes) as detect #{}",
            tick,
            frame.width,
            frame.height,
            frame.encoded_len(),
            seq
        );

        self.guard.acquire();
        let request = ClientMessage::DetectPose(DetectPoseRequest {
            image: frame.data_url,
            confidence_threshold: self.settings.confidence_threshold,
            seq,
        });
        if let Err(e) = self.sink.send(request) {
            log::warn!("Detect request not sent: {}", e);
            self.guard.release();
            return TickReport::Skipped(SkipReason::SendFailed);
        }

        TickReport::Submitted { tick, seq }
    }

    // --- service events ---

    /// Route a service event. Returns a decode job when a try-on image
    /// needs decoding before it can be drawn.
    pub fn on_event(&mut self, event: ServerEvent) -> Option<DecodeJob> {
        match event {
            ServerEvent::PoseDetected(result) => {
                self.on_pose_detected(result);
                None
            }
            ServerEvent::SizeEstimated(result) => {
                self.on_size_estimated(result);
                None
            }
            ServerEvent::TryOnResult(result) => self.on_tryon_result(result),
        }
    }

    /// Handle a detection result.
    ///
    /// Order within the cycle: release the guard, redraw, replace the
    /// measurements, then request a size estimate.
    pub fn on_pose_detected(&mut self, result: PoseDetection) {
        self.guard.release();

        if !self.state.is_active() {
            log::debug!("Ignoring pose result after stop");
            return;
        }
        if !self.sequencer.is_current(RequestKind::Detect, result.seq) {
            log::debug!("Dropping stale pose result {:?}", result.seq);
            return;
        }
        if !result.success {
            log::debug!("No pose this cycle");
            return;
        }

        if let Some(landmarks) = &result.landmarks {
            let stats = self.renderer.draw_landmarks(landmarks);
            self.updates.push(SessionUpdate::LandmarksDrawn(stats));
        }

        let measurements = match (result.measurements, &result.landmarks) {
            (Some(measurements), _) => measurements,
            (None, Some(landmarks)) => {
                let (width, height) = self.state.last_frame_size().unwrap_or((0, 0));
                derive_measurements(
                    landmarks,
                    width,
                    height,
                    self.settings.style.visibility_threshold,
                )
            }
            (None, None) => return,
        };
        if measurements.is_empty() {
            return;
        }

        self.state.replace_measurements(measurements.clone());
        self.updates
            .push(SessionUpdate::MeasurementsUpdated(measurements));

        if self.settings.estimation_enabled {
            self.request_size_estimate();
        }
    }

    fn request_size_estimate(&mut self) {
        let Some(measurements) = self.state.measurements().cloned() else {
            return;
        };
        let seq = self.sequencer.next(RequestKind::Estimate);
        let request = ClientMessage::EstimateSize(EstimateSizeRequest {
            measurements,
            preferred_fit: self.settings.preferred_fit.clone(),
            clothing_item_id: self.state.selection().map(|s| s.item_id),
            seq,
        });
        if let Err(e) = self.sink.send(request) {
            log::warn!("Size estimate request not sent: {}", e);
        }
    }

    /// Handle a size estimate. Stale and unsuccessful estimates change nothing.
    pub fn on_size_estimated(&mut self, result: SizeEstimation) {
        if !self.state.is_active() {
            return;
        }
        if !self.sequencer.is_current(RequestKind::Estimate, result.seq) {
            log::debug!("Dropping stale size estimate {:?}", result.seq);
            return;
        }
        let (true, Some(size)) = (result.success, result.predicted_size) else {
            log::debug!("No size estimate this cycle");
            return;
        };

        let estimate = SizeEstimate::new(size, result.confidence.unwrap_or(0.0));
        log::info!("Size estimate: {}", estimate);
        self.state.record_estimate(estimate.clone());
        self.updates.push(SessionUpdate::SizeEstimated(estimate));
    }

    /// Handle a try-on result. Nothing is cleared when it carries no image.
    pub fn on_tryon_result(&mut self, result: TryOnResult) -> Option<DecodeJob> {
        if !self.state.is_active() {
            return None;
        }
        if !self.sequencer.is_current(RequestKind::TryOn, result.seq) {
            log::debug!("Dropping stale try-on result {:?}", result.seq);
            return None;
        }
        match (result.success, result.result_image) {
            (true, Some(payload)) => Some(DecodeJob {
                seq: result.seq,
                payload,
            }),
            _ => {
                log::debug!("No try-on image this cycle");
                None
            }
        }
    }

    /// Composite a decoded try-on image, unless the session stopped or a newer
    /// try-on request went out while it was decoding.
    pub fn finish_decode(&mut self, seq: Option<u64>, decoded: Result<RgbaImage, DecodeError>) {
        if !self.state.is_active() || !self.sequencer.is_current(RequestKind::TryOn, seq) {
            return;
        }
        match decoded {
            Ok(image) => {
                self.renderer.composite(&image);
                self.updates.push(SessionUpdate::TryOnComposited);
            }
            Err(e) => log::warn!("Try-on image could not be decoded: {}", e),
        }
    }

    // --- user actions ---

    /// Replace the garment selection.
    ///
    /// With try-on enabled and measurements held, captures a frame off-cadence
    /// and sends one try-on request. Returns whether a request was sent.
    pub fn select_garment(
        &mut self,
        selection: GarmentSelection,
        source: &mut dyn FrameSource,
    ) -> bool {
        let item_id = selection.item_id;
        self.state.select(selection);
        log::info!("Selected garment {}", item_id);

        if !self.settings.tryon_enabled || !self.state.is_active() {
            return false;
        }
        let Some(measurements) = self.state.measurements().cloned() else {
            log::debug!("Try-on withheld until measurements arrive");
            return false;
        };

        let image = if self.camera_denied {
            None
        } else {
            match self.sampler.capture_now(source) {
                Ok(frame) => Some(frame.data_url),
                Err(e) => {
                    log::debug!("Try-on sent without a frame: {}", e);
                    None
                }
            }
        };

        let seq = self.sequencer.next(RequestKind::TryOn);
        let request = ClientMessage::VirtualTryOn(VirtualTryOnRequest {
            clothing_item_id: item_id,
            measurements,
            opacity: self.renderer.opacity(),
            image,
            seq,
        });
        match self.sink.send(request) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Try-on request not sent: {}", e);
                false
            }
        }
    }
}
