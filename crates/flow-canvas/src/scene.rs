/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scene derivation: a pure function of node origins, edges, and the
//! selection/hover keys the caller passes in.

use std::collections::HashMap;
use std::hash::Hash;

use euclid::default::{Box2D, Point2D};
use serde::Serialize;

use crate::geometry::{CanvasGeometry, EdgeCurve};

/// One node card, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeVisual<K> {
    pub key: K,
    pub rect: Box2D<f32>,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub selected: bool,
    pub hovered: bool,
}

/// One connection curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeVisual<K> {
    pub from: K,
    pub to: K,
    pub curve: EdgeCurve,
    /// Edge touches the selected node.
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasScene<K> {
    pub nodes: Vec<NodeVisual<K>>,
    pub edges: Vec<EdgeVisual<K>>,
}

impl<K: Copy + PartialEq> CanvasScene<K> {
    /// Topmost node whose rectangle contains `point` (later nodes draw on top).
    pub fn hit_test(&self, point: Point2D<f32>) -> Option<K> {
        self.nodes
            .iter()
            .rev()
            .find(|node| rect_contains_inclusive(&node.rect, point))
            .map(|node| node.key)
    }

    pub fn node(&self, key: K) -> Option<&NodeVisual<K>> {
        self.nodes.iter().find(|node| node.key == key)
    }

    /// Bounds of every node rect and edge curve, or `None` for an empty scene.
    pub fn bounds(&self) -> Option<Box2D<f32>> {
        let node_bounds = self.nodes.iter().map(|node| node.rect);
        let edge_bounds = self.edges.iter().map(|edge| edge.curve.bounds());
        node_bounds
            .chain(edge_bounds)
            .reduce(|acc, rect| acc.union(&rect))
    }
}

fn rect_contains_inclusive(rect: &Box2D<f32>, point: Point2D<f32>) -> bool {
    point.x >= rect.min.x && point.x <= rect.max.x && point.y >= rect.min.y && point.y <= rect.max.y
}

struct PendingNode<K> {
    key: K,
    origin: Point2D<f32>,
    title: String,
    subtitle: String,
    icon: String,
}

/// Collects node origins and edges, then derives a `CanvasScene`.
pub struct SceneBuilder<K> {
    geometry: CanvasGeometry,
    nodes: Vec<PendingNode<K>>,
    edges: Vec<(K, K)>,
    selected: Option<K>,
    hovered: Option<K>,
}

impl<K: Copy + Eq + Hash> SceneBuilder<K> {
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self {
            geometry,
            nodes: Vec::new(),
            edges: Vec::new(),
            selected: None,
            hovered: None,
        }
    }

    pub fn node(
        mut self,
        key: K,
        origin: Point2D<f32>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        self.nodes.push(PendingNode {
            key,
            origin,
            title: title.into(),
            subtitle: subtitle.into(),
            icon: icon.into(),
        });
        self
    }

    pub fn edge(mut self, from: K, to: K) -> Self {
        self.edges.push((from, to));
        self
    }

    pub fn selected(mut self, key: Option<K>) -> Self {
        self.selected = key;
        self
    }

    pub fn hovered(mut self, key: Option<K>) -> Self {
        self.hovered = key;
        self
    }

    /// Edges whose endpoints were never registered as nodes are skipped.
    pub fn build(self) -> CanvasScene<K> {
        let origins: HashMap<K, Point2D<f32>> = self
            .nodes
            .iter()
            .map(|node| (node.key, node.origin))
            .collect();

        let edges = self
            .edges
            .iter()
            .filter_map(|&(from, to)| {
                let from_origin = origins.get(&from)?;
                let to_origin = origins.get(&to)?;
                Some(EdgeVisual {
                    from,
                    to,
                    curve: self.geometry.edge_curve(*from_origin, *to_origin),
                    highlighted: self.selected.is_some_and(|s| s == from || s == to),
                })
            })
            .collect();

        let nodes = self
            .nodes
            .into_iter()
            .map(|node| NodeVisual {
                key: node.key,
                rect: self.geometry.node_rect(node.origin),
                selected: self.selected == Some(node.key),
                hovered: self.hovered == Some(node.key),
                title: node.title,
                subtitle: node.subtitle,
                icon: node.icon,
            })
            .collect();

        CanvasScene { nodes, edges }
    }
}
