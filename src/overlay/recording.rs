//! Surface that records draw operations instead of rasterizing them.

use image::RgbaImage;

use super::surface::{Color, DrawingSurface};

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Circle {
        center: (f32, f32),
        radius: f32,
        color: Color,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Color,
    },
    Image {
        width: u32,
        height: u32,
        alpha: f32,
    },
}

/// Records every draw call in order. Clearing is recorded too, so the
/// history shows exactly when the surface was wiped.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    alpha: f32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: 1.0,
            ops: Vec::new(),
        }
    }

    /// Full draw history.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Operations drawn since the last clear, i.e. what is currently visible.
    pub fn visible_ops(&self) -> &[DrawOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == DrawOp::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.ops[start..]
    }

    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == DrawOp::Clear).count()
    }

    /// Centers of currently visible circles.
    pub fn circles(&self) -> Vec<(f32, f32)> {
        self.visible_ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle { center, .. } => Some(*center),
                _ => None,
            })
            .collect()
    }

    /// Endpoints of currently visible lines.
    pub fn lines(&self) -> Vec<((f32, f32), (f32, f32))> {
        self.visible_ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    /// Global alpha of every currently visible image draw.
    pub fn images(&self) -> Vec<f32> {
        self.visible_ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { alpha, .. } => Some(*alpha),
                _ => None,
            })
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.visible_ops().is_empty()
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        self.ops.push(DrawOp::Image {
            width: image.width(),
            height: image.height(),
            alpha: self.alpha,
        });
    }
}
