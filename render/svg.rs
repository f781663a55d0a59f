/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Static SVG export of a derived canvas scene.

use std::fmt::Write as _;

use flow_canvas::{Box2D, CanvasScene, Point2D};

pub const EDGE_STROKE: &str = "#9333ea";
const SELECTED_STROKE: &str = "#3b82f6";
const HOVER_STROKE: &str = "#a855f7";
const NODE_STROKE: &str = "#e5e7eb";
const GRID_DOT: &str = "#d1d5db";
const MARGIN: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions {
    /// Dot grid spacing in canvas units. Zero disables the grid.
    pub grid_spacing: f32,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self { grid_spacing: 20.0 }
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render `scene` as a standalone SVG document sized to its bounds.
pub fn scene_to_svg<K>(scene: &CanvasScene<K>, options: &SvgOptions) -> Result<String, std::fmt::Error>
where
    K: Copy + PartialEq,
{
    let bounds = scene
        .bounds()
        .unwrap_or_else(|| Box2D::new(Point2D::zero(), Point2D::zero()));
    let min = Point2D::new(bounds.min.x - MARGIN, bounds.min.y - MARGIN);
    let width = bounds.width() + MARGIN * 2.0;
    let height = bounds.height() + MARGIN * 2.0;

    let mut svg = String::new();
    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{} {} {width} {height}" font-family="Inter, system-ui, sans-serif">"#,
        min.x, min.y
    )?;

    if options.grid_spacing > 0.0 {
        let spacing = options.grid_spacing;
        writeln!(svg, "  <defs>")?;
        writeln!(
            svg,
            r#"    <pattern id="grid" width="{spacing}" height="{spacing}" patternUnits="userSpaceOnUse"><circle cx="1" cy="1" r="1" fill="{GRID_DOT}" /></pattern>"#
        )?;
        writeln!(svg, "  </defs>")?;
        writeln!(
            svg,
            r#"  <rect x="{}" y="{}" width="{width}" height="{height}" fill="url(#grid)" />"#,
            min.x, min.y
        )?;
    }

    for edge in &scene.edges {
        let stroke_width = if edge.highlighted { 3 } else { 2 };
        writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="{EDGE_STROKE}" stroke-width="{stroke_width}" stroke-dasharray="5,5" />"#,
            edge.curve.to_svg_path()
        )?;
    }

    for node in &scene.nodes {
        let (stroke, stroke_width) = if node.selected {
            (SELECTED_STROKE, 2)
        } else if node.hovered {
            (HOVER_STROKE, 1)
        } else {
            (NODE_STROKE, 1)
        };
        let rect = node.rect;
        writeln!(svg, "  <g>")?;
        if node.selected {
            writeln!(
                svg,
                r#"    <rect x="{}" y="{}" width="{}" height="{}" rx="12" fill="none" stroke="{SELECTED_STROKE}" stroke-opacity="0.3" stroke-width="4" />"#,
                rect.min.x - 4.0,
                rect.min.y - 4.0,
                rect.width() + 8.0,
                rect.height() + 8.0
            )?;
        }
        writeln!(
            svg,
            r#"    <rect x="{}" y="{}" width="{}" height="{}" rx="8" fill="white" stroke="{stroke}" stroke-width="{stroke_width}" />"#,
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height()
        )?;
        writeln!(
            svg,
            r##"    <text x="{}" y="{}" font-size="14" font-weight="600" fill="#111827">{} {}</text>"##,
            rect.min.x + 12.0,
            rect.min.y + 28.0,
            escape_xml(&node.icon),
            escape_xml(&node.title)
        )?;
        writeln!(
            svg,
            r##"    <text x="{}" y="{}" font-size="12" fill="#6b7280">{}</text>"##,
            rect.min.x + 12.0,
            rect.min.y + 52.0,
            escape_xml(&node.subtitle)
        )?;
        writeln!(svg, "  </g>")?;
    }

    writeln!(svg, "</svg>")?;
    Ok(svg)
}
