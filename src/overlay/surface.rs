//! Drawing surface abstraction.

use image::RgbaImage;

/// Straight-alpha RGBA color.
pub type Color = image::Rgba<u8>;

/// A transparent 2D surface the overlay renderer draws on.
///
/// Mirrors a canvas context: a global alpha applies to every subsequent draw
/// until it is reset.
pub trait DrawingSurface {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Make every pixel fully transparent.
    fn clear(&mut self);

    fn alpha(&self) -> f32;

    /// Set the global alpha (clamped to 0.0-1.0).
    fn set_alpha(&mut self, alpha: f32);

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color);

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color);

    /// Draw `image` stretched over the whole surface.
    fn draw_image(&mut self, image: &RgbaImage);
}
