//! virtual-tryon library crate.
//!
//! A real-time try-on loop: frames are sampled from a [`capture::FrameSource`],
//! sent to a pose-detection service over a [`channel`], and the returned
//! landmarks, measurements, size estimates and try-on composites are drawn
//! onto an [`overlay`] surface by a [`session::TryOnController`].

pub mod api;
pub mod capture;
pub mod channel;
pub mod cli;
pub mod config;
pub mod overlay;
pub mod pose;
pub mod session;
