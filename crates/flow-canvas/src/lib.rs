/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Framework-agnostic canvas layer for the workflow editor.
//!
//! Nothing in this crate knows about workflow semantics. Callers hand in
//! node origins keyed by their own identifier type and get back:
//! - `CanvasGeometry`: fixed node size, anchor offsets, curve control-point rule
//! - `EdgeCurve`: cubic S-curve between an output and an input anchor
//! - `Viewport`: pan/zoom projection between screen and canvas space
//! - `CanvasScene`: derived node/edge visuals plus hit testing

mod geometry;
mod scene;
mod viewport;

pub use geometry::{CanvasGeometry, EdgeCurve};
pub use scene::{CanvasScene, EdgeVisual, NodeVisual, SceneBuilder};
pub use viewport::{Viewport, ZOOM_MAX, ZOOM_MIN};

pub use euclid::default::{Box2D, Point2D, Size2D, Vector2D};
