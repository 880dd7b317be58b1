//! Session-owned state and the updates it publishes.

use crate::overlay::DrawStats;
use crate::pose::MeasurementSet;

use super::SizeEstimate;

/// The garment the user is currently trying on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarmentSelection {
    pub item_id: u64,
    pub name: Option<String>,
}

impl GarmentSelection {
    pub fn new(item_id: u64) -> Self {
        Self {
            item_id,
            name: None,
        }
    }

    pub fn named(item_id: u64, name: impl Into<String>) -> Self {
        Self {
            item_id,
            name: Some(name.into()),
        }
    }
}

/// Changes the session reports to whoever presents it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Started,
    Stopped,
    LandmarksDrawn(DrawStats),
    MeasurementsUpdated(MeasurementSet),
    SizeEstimated(SizeEstimate),
    TryOnComposited,
    /// Capture is not possible until the user acts; carries the notice text.
    CameraUnavailable(String),
}

/// Values held for one client session.
///
/// Only the controller mutates this; each value is replaced wholesale.
#[derive(Debug, Default)]
pub struct SessionState {
    active: bool,
    measurements: Option<MeasurementSet>,
    selection: Option<GarmentSelection>,
    size_estimate: Option<SizeEstimate>,
    last_frame_size: Option<(u32, u32)>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether capture is running. Late responses must check this before
    /// touching the overlay or UI.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn measurements(&self) -> Option<&MeasurementSet> {
        self.measurements.as_ref()
    }

    pub fn selection(&self) -> Option<&GarmentSelection> {
        self.selection.as_ref()
    }

    pub fn size_estimate(&self) -> Option<&SizeEstimate> {
        self.size_estimate.as_ref()
    }

    /// Dimensions of the most recently submitted frame.
    pub fn last_frame_size(&self) -> Option<(u32, u32)> {
        self.last_frame_size
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn replace_measurements(&mut self, measurements: MeasurementSet) {
        self.measurements = Some(measurements);
    }

    /// Replace the selection, returning the previous one.
    pub(crate) fn select(&mut self, selection: GarmentSelection) -> Option<GarmentSelection> {
        self.selection.replace(selection)
    }

    pub(crate) fn record_estimate(&mut self, estimate: SizeEstimate) {
        self.size_estimate = Some(estimate);
    }

    pub(crate) fn note_frame_size(&mut self, width: u32, height: u32) {
        self.last_frame_size = Some((width, height));
    }
}
