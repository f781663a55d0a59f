/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Selection and pointer interaction state.
//!
//! Pure state machine: it never touches the graph. Pointer handlers return
//! what the caller should do to the graph (live positions during a drag, one
//! completed move on release).
//!
//! ```text
//! Idle ──down(node)──▶ Dragging ──up──▶ Selected
//!  ▲                      │  ▲             │
//!  └──down(empty)─────────┘  └─down(node)──┘
//! ```
//!
//! Closing the inspector clears the selection, so `inspector_open` holds
//! exactly when a node is selected or being dragged.

use euclid::default::{Point2D, Vector2D};

use crate::graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Selected(NodeId),
    Dragging {
        node: NodeId,
        /// Pointer minus node origin at pointer-down.
        offset: Vector2D<f32>,
        /// Node origin at pointer-down.
        origin: Point2D<f32>,
    },
}

/// A finished drag: one move from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutcome {
    pub node: NodeId,
    pub from: Point2D<f32>,
    pub to: Point2D<f32>,
}

impl DragOutcome {
    /// Released where it started.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: InteractionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selected(&self) -> Option<NodeId> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Selected(node) | InteractionState::Dragging { node, .. } => {
                Some(node)
            },
        }
    }

    pub fn inspector_open(&self) -> bool {
        self.selected().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Select `node`. Returns whether the selection changed.
    pub fn select(&mut self, node: NodeId) -> bool {
        if self.selected() == Some(node) {
            return false;
        }
        self.state = InteractionState::Selected(node);
        true
    }

    pub fn clear(&mut self) {
        self.state = InteractionState::Idle;
    }

    pub fn close_inspector(&mut self) {
        self.clear();
    }

    /// Pointer pressed at `pointer`. `hit` is the node under the pointer and
    /// its current origin, if any.
    ///
    /// A drag still in progress (release never delivered) is finished first
    /// and returned so the caller can record it.
    pub fn pointer_down(
        &mut self,
        hit: Option<(NodeId, Point2D<f32>)>,
        pointer: Point2D<f32>,
    ) -> Option<DragOutcome> {
        let abandoned = self.finish_drag(pointer);
        self.state = match hit {
            Some((node, origin)) => InteractionState::Dragging {
                node,
                offset: pointer - origin,
                origin,
            },
            None => InteractionState::Idle,
        };
        abandoned
    }

    /// Pointer moved. While dragging, returns the node and the origin it
    /// should be shown at.
    pub fn pointer_move(&self, pointer: Point2D<f32>) -> Option<(NodeId, Point2D<f32>)> {
        match self.state {
            InteractionState::Dragging { node, offset, .. } => Some((node, pointer - offset)),
            _ => None,
        }
    }

    /// Pointer released. Ends a drag in `Selected` and returns the whole move.
    pub fn pointer_up(&mut self, pointer: Point2D<f32>) -> Option<DragOutcome> {
        let outcome = self.finish_drag(pointer)?;
        self.state = InteractionState::Selected(outcome.node);
        Some(outcome)
    }

    /// Drop any reference to a node that no longer exists.
    pub fn forget(&mut self, node: NodeId) {
        if self.selected() == Some(node) {
            self.clear();
        }
    }

    /// Node being dragged, if any.
    pub fn dragged_node(&self) -> Option<NodeId> {
        match self.state {
            InteractionState::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    /// End a drag that will not see a release. `shown_at` is where the node
    /// was last drawn. The node stays selected.
    pub fn interrupt_drag(&mut self, shown_at: Point2D<f32>) -> Option<DragOutcome> {
        let InteractionState::Dragging { node, origin, .. } = self.state else {
            return None;
        };
        self.state = InteractionState::Selected(node);
        Some(DragOutcome {
            node,
            from: origin,
            to: shown_at,
        })
    }

    fn finish_drag(&mut self, pointer: Point2D<f32>) -> Option<DragOutcome> {
        let InteractionState::Dragging {
            node,
            offset,
            origin,
        } = self.state
        else {
            return None;
        };
        self.state = InteractionState::Selected(node);
        Some(DragOutcome {
            node,
            from: origin,
            to: pointer - offset,
        })
    }
}
