/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::default::{Point2D, Vector2D};
use serde::{Deserialize, Serialize};

pub const ZOOM_MIN: f32 = 0.1;
pub const ZOOM_MAX: f32 = 10.0;

/// Pan/zoom projection: `screen = canvas * zoom + pan`.
///
/// Node positions never change when the view scrolls or zooms; only this
/// projection does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Vector2D<f32>,
    pub zoom: f32,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            pan: Vector2D::zero(),
            zoom: 1.0,
        }
    }

    /// Clamp a zoom value to the allowed range.
    pub fn clamp_zoom(zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(ZOOM_MIN, ZOOM_MAX)
        } else {
            1.0
        }
    }

    pub fn canvas_to_screen(&self, point: Point2D<f32>) -> Point2D<f32> {
        (point.to_vector() * self.zoom + self.pan).to_point()
    }

    pub fn screen_to_canvas(&self, point: Point2D<f32>) -> Point2D<f32> {
        ((point.to_vector() - self.pan) / self.zoom).to_point()
    }

    pub fn pan_by(&mut self, delta: Vector2D<f32>) {
        self.pan += delta;
    }

    /// Change zoom while keeping the canvas point under `screen_anchor` fixed.
    pub fn zoom_about(&mut self, screen_anchor: Point2D<f32>, zoom: f32) {
        let canvas_anchor = self.screen_to_canvas(screen_anchor);
        self.zoom = Self::clamp_zoom(zoom);
        self.pan = screen_anchor.to_vector() - canvas_anchor.to_vector() * self.zoom;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_viewport_maps_points_unchanged() {
        let viewport = Viewport::new();
        let point = Point2D::new(12.5, -3.0);

        assert_eq!(viewport.canvas_to_screen(point), point);
        assert_eq!(viewport.screen_to_canvas(point), point);
    }

    #[test]
    fn screen_and_canvas_projections_are_inverse() {
        let viewport = Viewport {
            pan: Vector2D::new(40.0, -10.0),
            zoom: 2.0,
        };
        let canvas = Point2D::new(100.0, 200.0);
        let screen = viewport.canvas_to_screen(canvas);

        assert_eq!(screen, Point2D::new(240.0, 390.0));
        assert_eq!(viewport.screen_to_canvas(screen), canvas);
    }

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(Viewport::clamp_zoom(0.0), ZOOM_MIN);
        assert_eq!(Viewport::clamp_zoom(50.0), ZOOM_MAX);
        assert_eq!(Viewport::clamp_zoom(f32::NAN), 1.0);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let mut viewport = Viewport::new();
        viewport.pan_by(Vector2D::new(30.0, 30.0));
        let anchor = Point2D::new(200.0, 100.0);
        let before = viewport.screen_to_canvas(anchor);

        viewport.zoom_about(anchor, 4.0);
        let after = viewport.screen_to_canvas(anchor);

        assert_eq!(viewport.zoom, 4.0);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }
}
