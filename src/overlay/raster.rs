//! In-memory RGBA surface.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::surface::{Color, DrawingSurface};

/// Software-rendered surface backed by an RGBA buffer.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    buffer: RgbaImage,
    alpha: f32,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::new(width, height),
            alpha: 1.0,
        }
    }

    /// Current pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.buffer.pixels().all(|p| p.0[3] == 0)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }

    /// Source-over blend of `color` into the pixel at (x, y), scaled by the
    /// global alpha.
    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let src_a = color.0[3] as f32 / 255.0 * self.alpha;
        if src_a <= 0.0 {
            return;
        }
        let dst = self.buffer.get_pixel_mut(x, y);
        let dst_a = dst.0[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        for c in 0..3 {
            let s = color.0[c] as f32;
            let d = dst.0[c] as f32;
            let v = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Pixel range covering [lo, hi] clipped to `limit`.
    fn span(lo: f32, hi: f32, limit: u32) -> std::ops::Range<u32> {
        let start = lo.floor().max(0.0) as u32;
        let end = (hi.ceil().max(0.0) as u32).saturating_add(1).min(limit);
        start.min(end)..end
    }
}

impl DrawingSurface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        let (w, h) = self.size();
        let (cx, cy) = center;
        let r2 = radius * radius;
        for y in Self::span(cy - radius, cy + radius, h) {
            for x in Self::span(cx - radius, cx + radius, w) {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        let (w, h) = self.size();
        let half = (width / 2.0).max(0.5);
        let (x0, y0) = from;
        let (x1, y1) = to;
        let (vx, vy) = (x1 - x0, y1 - y0);
        let len2 = vx * vx + vy * vy;

        for y in Self::span(y0.min(y1) - half, y0.max(y1) + half, h) {
            for x in Self::span(x0.min(x1) - half, x0.max(x1) + half, w) {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                // distance from the pixel center to the segment
                let t = if len2 > 0.0 {
                    (((px - x0) * vx + (py - y0) * vy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = px - (x0 + t * vx);
                let dy = py - (y0 + t * vy);
                if dx * dx + dy * dy <= half * half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (w, h) = self.size();
        if w == 0 || h == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let scaled;
        let source = if image.dimensions() == (w, h) {
            image
        } else {
            scaled = imageops::resize(image, w, h, FilterType::Triangle);
            &scaled
        };
        for (x, y, pixel) in source.enumerate_pixels() {
            self.blend(x, y, *pixel);
        }
    }
}
