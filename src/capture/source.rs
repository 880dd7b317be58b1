//! Frame sources feeding the sampler.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::CaptureError;

/// Anything that can hand the sampler the current video frame.
pub trait FrameSource {
    /// Decoded dimensions of the current frame, or `None` before the first
    /// frame has been decoded.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Grab the current frame.
    fn grab(&mut self) -> Result<RgbImage, CaptureError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn dimensions(&self) -> Option<(u32, u32)> {
        (**self).dimensions()
    }

    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        (**self).grab()
    }
}

/// Extensions loaded by [`StillFrameSource::from_dir`].
const STILL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Replays a fixed list of still images, advancing one image per grab.
///
/// Stands in for a live camera in headless runs and tests.
#[derive(Debug, Default)]
pub struct StillFrameSource {
    frames: Vec<RgbImage>,
    cursor: usize,
}

impl StillFrameSource {
    pub fn from_images(frames: Vec<RgbImage>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// A source that never produces a frame, like a camera still warming up.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every JPEG/PNG file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            let is_still = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| STILL_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_still {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::NoFrames {
                path: dir.to_path_buf(),
            });
        }

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let image = image::open(path)?.to_rgb8();
            frames.push(image);
        }
        log::info!("Loaded {} still frame(s) from {}", frames.len(), dir.display());

        Ok(Self::from_images(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for StillFrameSource {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames
            .get(self.cursor)
            .map(|f| f.dimensions())
            .filter(|(w, h)| *w > 0 && *h > 0)
    }

    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        if self.frames.is_empty() {
            return Err(CaptureError::NotReady);
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CaptureError {
    if source.kind() == std::io::ErrorKind::PermissionDenied {
        CaptureError::PermissionDenied
    } else {
        CaptureError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
