//! Overlay layer drawn above the video.
//!
//! Landmarks and skeleton edges are redrawn from scratch every detection
//! cycle. Try-on images are decoded off the loop and composited on top.

mod decode;
mod raster;
mod recording;
mod renderer;
mod surface;

pub use decode::{decode_data_url, decode_image, DecodeError};
pub use raster::RasterSurface;
pub use recording::{DrawOp, RecordingSurface};
pub use renderer::{DrawStats, OverlayRenderer, OverlayStyle, DEFAULT_TRYON_OPACITY};
pub use surface::{Color, DrawingSurface};
