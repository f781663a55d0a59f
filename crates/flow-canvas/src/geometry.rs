/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::default::{Box2D, Point2D, Size2D, Vector2D};
use serde::{Deserialize, Serialize};

/// Default node card width in canvas units.
pub const DEFAULT_NODE_WIDTH: f32 = 160.0;

/// Default node card height in canvas units.
pub const DEFAULT_NODE_HEIGHT: f32 = 80.0;

/// Control points sit at this fraction of the horizontal span between anchors.
pub const DEFAULT_CONTROL_FRACTION: f32 = 0.5;

/// Geometry parameters shared by every node and edge on the canvas.
///
/// Nodes are fixed-size rectangles anchored at their stored origin (top-left).
/// Edges leave a node at `output_anchor` and enter at `input_anchor`, both
/// expressed as offsets from the node origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub node_size: Size2D<f32>,
    pub output_anchor: Vector2D<f32>,
    pub input_anchor: Vector2D<f32>,
    pub control_fraction: f32,
}

impl CanvasGeometry {
    /// Geometry for a node size, with anchors at right-center and left-center.
    pub fn with_node_size(width: f32, height: f32) -> Self {
        Self {
            node_size: Size2D::new(width, height),
            output_anchor: Vector2D::new(width, height / 2.0),
            input_anchor: Vector2D::new(0.0, height / 2.0),
            control_fraction: DEFAULT_CONTROL_FRACTION,
        }
    }

    /// Rectangle covered by a node whose origin is `origin`.
    pub fn node_rect(&self, origin: Point2D<f32>) -> Box2D<f32> {
        Box2D::from_origin_and_size(origin, self.node_size)
    }

    /// Whether `point` lies on or inside the node at `origin`.
    pub fn node_contains(&self, origin: Point2D<f32>, point: Point2D<f32>) -> bool {
        let rect = self.node_rect(origin);
        point.x >= rect.min.x && point.x <= rect.max.x && point.y >= rect.min.y && point.y <= rect.max.y
    }

    pub fn output_anchor_at(&self, origin: Point2D<f32>) -> Point2D<f32> {
        origin + self.output_anchor
    }

    pub fn input_anchor_at(&self, origin: Point2D<f32>) -> Point2D<f32> {
        origin + self.input_anchor
    }

    /// Curve from the source node's output anchor to the target node's input anchor.
    pub fn edge_curve(&self, from_origin: Point2D<f32>, to_origin: Point2D<f32>) -> EdgeCurve {
        EdgeCurve::between(
            self.output_anchor_at(from_origin),
            self.input_anchor_at(to_origin),
            self.control_fraction,
        )
    }
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::with_node_size(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT)
    }
}

/// Cubic Bezier between two anchors.
///
/// The first control point shares the start's y, the second shares the end's
/// y, and both share one x placed `fraction` of the way across. With the
/// default fraction of one half this is a symmetric S-curve which collapses to
/// a straight segment when both anchors share a y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeCurve {
    pub start: Point2D<f32>,
    pub control1: Point2D<f32>,
    pub control2: Point2D<f32>,
    pub end: Point2D<f32>,
}

/// Exact at both ends and when `a == b`.
fn interpolate(a: Point2D<f32>, b: Point2D<f32>, t: f32) -> Point2D<f32> {
    if t < 0.5 {
        a + (b - a) * t
    } else {
        b - (b - a) * (1.0 - t)
    }
}

impl EdgeCurve {
    pub fn between(start: Point2D<f32>, end: Point2D<f32>, fraction: f32) -> Self {
        let control_x = start.x + (end.x - start.x) * fraction;
        Self {
            start,
            control1: Point2D::new(control_x, start.y),
            control2: Point2D::new(control_x, end.y),
            end,
        }
    }

    /// Evaluate the curve at `t` in `[0, 1]` by repeated interpolation.
    /// A level curve stays exactly on its y.
    pub fn point_at(&self, t: f32) -> Point2D<f32> {
        let t = t.clamp(0.0, 1.0);
        let ab = interpolate(self.start, self.control1, t);
        let bc = interpolate(self.control1, self.control2, t);
        let cd = interpolate(self.control2, self.end, t);
        let abc = interpolate(ab, bc, t);
        let bcd = interpolate(bc, cd, t);
        interpolate(abc, bcd, t)
    }

    /// True when every control point lies on the start-end line (same y).
    pub fn is_straight(&self) -> bool {
        self.start.y == self.end.y
    }

    /// Axis-aligned bounds of the control polygon (contains the curve).
    pub fn bounds(&self) -> Box2D<f32> {
        Box2D::from_points([self.start, self.control1, self.control2, self.end])
    }

    /// SVG path data, `M x1 y1 C cx1 cy1, cx2 cy2, x2 y2`.
    pub fn to_svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y,
        )
    }
}
