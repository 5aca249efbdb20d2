//! Zoom-to-fit and gentle recentering of the canvas camera.
//!
//! [`ViewportFitter::fit`] is a pure function of block geometry and viewport
//! size: calling it twice on the same input yields the same camera.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::block::Block;
use crate::camera::{Camera, Point, Rect, Viewport};
use crate::config::FitConfig;

/// Computes camera transforms that keep blocks on screen.
#[derive(Debug, Clone, Default)]
pub struct ViewportFitter {
    config: FitConfig,
}

impl ViewportFitter {
    #[must_use]
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Bounding box of `blocks` grown by the fit margin, or the default box
    /// centered at the origin when there are none.
    #[must_use]
    pub fn content_bounds(&self, blocks: &[Block]) -> Rect {
        let bounds = blocks
            .iter()
            .filter(|b| b.is_well_formed())
            .map(Block::rect)
            .reduce(|acc, r| acc.union(&r));
        match bounds {
            Some(rect) => rect.expand(self.config.margin),
            None => Rect::new(
                -self.config.empty_width / 2.0,
                -self.config.empty_height / 2.0,
                self.config.empty_width,
                self.config.empty_height,
            ),
        }
    }

    /// Highest zoom allowed for `count` blocks.
    #[must_use]
    pub fn density_cap(&self, count: usize) -> f64 {
        self.config
            .density_caps
            .iter()
            .filter(|(threshold, _)| count > *threshold)
            .map(|(_, cap)| *cap)
            .fold(self.config.max_zoom, f64::min)
    }

    /// Camera that shows every block inside the padded viewport, centered.
    ///
    /// The more restrictive axis decides the zoom, so content is never
    /// cropped unless the density cap or the zoom floor forces it.
    #[must_use]
    pub fn fit(&self, blocks: &[Block], viewport: Viewport) -> Camera {
        if !viewport.is_usable() {
            return Camera::default();
        }
        let bounds = self.content_bounds(blocks);
        let usable_w = viewport.width * self.config.viewport_fraction;
        let usable_h = viewport.height * self.config.viewport_fraction;

        let zoom_x = usable_w / bounds.width.max(1.0);
        let zoom_y = usable_h / bounds.height.max(1.0);
        let zoom = zoom_x
            .min(zoom_y)
            .min(self.config.max_zoom)
            .max(self.config.min_zoom)
            .min(self.density_cap(blocks.len()))
            .max(self.config.min_zoom);

        let center = bounds.center();
        let screen_center = viewport.center();
        Camera {
            pan_x: screen_center.x - center.x * zoom,
            pan_y: screen_center.y - center.y * zoom,
            zoom,
        }
    }

    /// Nudge the pan toward the blocks' center of mass when the view has
    /// drifted far from it.
    ///
    /// Returns `None` while dragging, when there are no blocks, or when the
    /// drift is within the threshold. Zoom is never changed.
    #[must_use]
    pub fn gentle_recenter(&self, blocks: &[Block], camera: Camera, viewport: Viewport, dragging: bool) -> Option<Camera> {
        if dragging || !viewport.is_usable() {
            return None;
        }
        let mass = center_of_mass(blocks)?;
        let screen_mass = camera.world_to_screen(mass);
        let screen_center = viewport.center();
        let drift_x = screen_mass.x - screen_center.x;
        let drift_y = screen_mass.y - screen_center.y;

        let limit_x = viewport.width * self.config.recenter_drift;
        let limit_y = viewport.height * self.config.recenter_drift;
        if drift_x.abs() <= limit_x && drift_y.abs() <= limit_y {
            return None;
        }

        Some(Camera {
            pan_x: camera.pan_x - drift_x * self.config.recenter_nudge,
            pan_y: camera.pan_y - drift_y * self.config.recenter_nudge,
            zoom: camera.zoom,
        })
    }
}

/// Average of block centers.
#[must_use]
pub fn center_of_mass(blocks: &[Block]) -> Option<Point> {
    let centers: Vec<Point> = blocks.iter().filter(|b| b.is_well_formed()).map(|b| b.rect().center()).collect();
    if centers.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = centers.len() as f64;
    let sx: f64 = centers.iter().map(|p| p.x).sum();
    let sy: f64 = centers.iter().map(|p| p.y).sum();
    Some(Point::new(sx / n, sy / n))
}
