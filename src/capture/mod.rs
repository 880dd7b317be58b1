//! Frame capture for the detection loop.
//!
//! - Frame sources via [`FrameSource`] and [`StillFrameSource`]
//! - Encoded stills via [`Frame`]
//! - Single-flight gating via [`InFlightGuard`]
//! - Tick decisions via [`CaptureSampler`]

mod errors;
mod frame;
mod guard;
mod sampler;
mod source;

pub use errors::CaptureError;
pub use frame::{Frame, DEFAULT_JPEG_QUALITY};
pub use guard::InFlightGuard;
pub use sampler::{CaptureSampler, TickOutcome, DEFAULT_SAMPLE_RATE_HZ};
pub use source::{FrameSource, StillFrameSource};
