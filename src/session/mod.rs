//! The try-on session: state, request orchestration and the event loop.
//!
//! [`TryOnController`] reacts to ticks, service events and user actions
//! synchronously; [`run`] drives it from a timer, the channel and a command
//! queue on a single task.

mod controller;
mod estimate;
mod event_loop;
mod settings;
mod state;

pub use controller::{DecodeJob, SkipReason, TickReport, TryOnController};
pub use estimate::{ConfidenceTier, SizeEstimate};
pub use event_loop::{run, SessionCommand, SessionExit};
pub use settings::{SessionSettings, DEFAULT_PREFERRED_FIT};
pub use state::{GarmentSelection, SessionState, SessionUpdate};
