//! OverlayRenderer - draws landmarks and try-on composites on a surface.

use image::RgbaImage;

use super::surface::{Color, DrawingSurface};
use crate::pose::{LandmarkSet, DEFAULT_VISIBILITY_THRESHOLD, POSE_CONNECTIONS};

/// Default opacity for composited try-on images.
pub const DEFAULT_TRYON_OPACITY: f32 = 0.8;

/// Stroke and fill settings for landmark drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub point_radius: f32,
    pub line_width: f32,
    pub point_color: Color,
    pub line_color: Color,
    /// Landmarks at or below this visibility are neither drawn nor connected.
    pub visibility_threshold: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            point_radius: 5.0,
            line_width: 2.0,
            point_color: image::Rgba([0, 255, 0, 255]),
            line_color: image::Rgba([255, 255, 0, 255]),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

/// What one landmark pass drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub points: usize,
    pub edges: usize,
}

/// Sole writer of the overlay surface.
pub struct OverlayRenderer<S: DrawingSurface> {
    surface: S,
    style: OverlayStyle,
    opacity: f32,
}

impl<S: DrawingSurface> OverlayRenderer<S> {
    pub fn new(surface: S, style: OverlayStyle) -> Self {
        Self {
            surface,
            style,
            opacity: DEFAULT_TRYON_OPACITY,
        }
    }

    pub fn with_opacity(surface: S, style: OverlayStyle, opacity: f32) -> Self {
        Self {
            surface,
            style,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Opacity used for try-on composites.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Wipe the surface.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Clear the surface and draw one landmark set.
    ///
    /// Points first, then edges. An edge is drawn only when both endpoints
    /// exist in `landmarks` and are visible.
    pub fn draw_landmarks(&mut self, landmarks: &LandmarkSet) -> DrawStats {
        self.surface.clear();

        let (width, height) = self.surface.size();
        let threshold = self.style.visibility_threshold;
        let mut stats = DrawStats::default();

        for landmark in landmarks.iter().filter(|lm| lm.is_visible(threshold)) {
            self.surface.fill_circle(
                landmark.to_pixel(width, height),
                self.style.point_radius,
                self.style.point_color,
            );
            stats.points += 1;
        }

        for (a, b) in POSE_CONNECTIONS {
            let (Some(start), Some(end)) = (
                landmarks.visible(a, threshold),
                landmarks.visible(b, threshold),
            ) else {
                continue;
            };
            self.surface.stroke_line(
                start.to_pixel(width, height),
                end.to_pixel(width, height),
                self.style.line_width,
                self.style.line_color,
            );
            stats.edges += 1;
        }

        log::trace!("Drew {} landmark(s), {} edge(s)", stats.points, stats.edges);
        stats
    }

    /// Draw a decoded try-on image over the whole surface without clearing.
    ///
    /// The surface alpha is restored to fully opaque afterwards so the
    /// composite opacity does not leak into later draws.
    pub fn composite(&mut self, image: &RgbaImage) {
        self.surface.set_alpha(self.opacity);
        self.surface.draw_image(image);
        self.surface.set_alpha(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::RecordingSurface;
    use crate::pose::landmark::index::{LEFT_SHOULDER, RIGHT_SHOULDER};
    use crate::pose::Landmark;

    fn near(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 0.01 && (a.1 - b.1).abs() < 0.01
    }

    fn renderer() -> OverlayRenderer<RecordingSurface> {
        OverlayRenderer::new(RecordingSurface::new(640, 480), OverlayStyle::default())
    }

    fn shoulders(left: f32, right: f32) -> LandmarkSet {
        let mut set = LandmarkSet::invisible();
        set.set(LEFT_SHOULDER, Landmark::new(0.6, 0.3, left));
        set.set(RIGHT_SHOULDER, Landmark::new(0.4, 0.3, right));
        set
    }

    #[test]
    fn test_visible_pair_draws_edge() {
        let mut r = renderer();
        let stats = r.draw_landmarks(&shoulders(0.9, 0.9));
        assert_eq!(stats, DrawStats { points: 2, edges: 1 });
        let lines = r.surface().lines();
        assert_eq!(lines.len(), 1);
        assert!(near(lines[0].0, (384.0, 144.0)));
        assert!(near(lines[0].1, (256.0, 144.0)));
    }

    #[test]
    fn test_hidden_endpoint_drops_edge_keeps_point() {
        let mut r = renderer();
        let stats = r.draw_landmarks(&shoulders(0.9, 0.3));
        assert_eq!(stats, DrawStats { points: 1, edges: 0 });
        let circles = r.surface().circles();
        assert_eq!(circles.len(), 1);
        assert!(near(circles[0], (384.0, 144.0)));
        assert!(r.surface().lines().is_empty());
    }

    #[test]
    fn test_short_landmark_set_skips_out_of_range_edges() {
        let mut r = renderer();
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 1.0); 3]);
        let stats = r.draw_landmarks(&set);
        assert_eq!(stats.points, 3);
        // (0,1) and (1,2) are the only edges inside three landmarks
        assert_eq!(stats.edges, 2);
    }

    #[test]
    fn test_draw_landmarks_clears_first() {
        let mut r = renderer();
        r.draw_landmarks(&shoulders(0.9, 0.9));
        r.draw_landmarks(&shoulders(0.9, 0.9));
        assert_eq!(r.surface().clear_count(), 2);
        assert_eq!(r.surface().circles().len(), 2);
    }

    #[test]
    fn test_composite_uses_opacity_then_resets() {
        let mut r = renderer();
        r.set_opacity(0.4);
        r.draw_landmarks(&shoulders(0.9, 0.9));
        r.composite(&RgbaImage::new(2, 2));

        assert_eq!(r.surface().images(), vec![0.4]);
        assert_eq!(r.surface().alpha(), 1.0);
        // composite does not clear the landmarks underneath
        assert_eq!(r.surface().circles().len(), 2);
        assert_eq!(r.surface().clear_count(), 1);
    }
}
