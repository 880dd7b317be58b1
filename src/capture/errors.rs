//! Error types for frame capture.

use std::path::PathBuf;

/// Errors that can occur while grabbing or encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The platform refused access to the video source.
    #[error("Camera access denied. Grant camera permission and restart the session.")]
    PermissionDenied,

    /// The source has not produced a decoded frame yet.
    #[error("Video source is not producing frames yet")]
    NotReady,

    #[error("No frames found in '{}'", .path.display())]
    NoFrames { path: PathBuf },

    #[error("Failed to read frame '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CaptureError {
    /// Whether this error means the user has to act before capture can work.
    pub fn is_capability_denial(&self) -> bool {
        matches!(self, CaptureError::PermissionDenied)
    }
}
