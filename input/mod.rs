/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Input handling for the workflow editor.
//!
//! Keyboard shortcuts are collected here. Pointer interaction (select, drag)
//! lives in [`interaction`].

pub mod interaction;

pub use interaction::{DragOutcome, InteractionState, Selection};

use crate::app::GraphIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
}

/// One key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn ctrl_shift(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::ctrl(key)
        }
    }

    fn is_char(&self, c: char) -> bool {
        matches!(self.key, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// Keyboard actions collected from one frame of key presses.
///
/// Decouples input detection from action application so actions stay
/// testable without a windowing backend.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyboardActions {
    pub undo: bool,
    pub redo: bool,
    pub delete_selected: bool,
    pub close_inspector: bool,
}

/// Collect keyboard actions (input detection only).
///
/// While a text field has keyboard focus only Escape is honoured; Backspace
/// and Ctrl+Z belong to the field.
pub fn collect_actions(chords: &[KeyChord], text_input_focused: bool) -> KeyboardActions {
    let mut actions = KeyboardActions::default();

    for chord in chords {
        if chord.key == Key::Escape {
            actions.close_inspector = true;
            continue;
        }

        if text_input_focused {
            continue;
        }

        if chord.ctrl && chord.is_char('z') {
            if chord.shift {
                actions.redo = true;
            } else {
                actions.undo = true;
            }
        }
        if chord.ctrl && chord.is_char('y') {
            actions.redo = true;
        }

        if matches!(chord.key, Key::Delete | Key::Backspace) && !chord.ctrl && !chord.alt {
            actions.delete_selected = true;
        }
    }

    actions
}

/// Convert keyboard actions to graph intents without applying them.
pub fn intents_from_actions(actions: &KeyboardActions) -> Vec<GraphIntent> {
    let mut intents = Vec::new();
    if actions.delete_selected {
        intents.push(GraphIntent::RemoveSelectedNode);
    }
    if actions.undo {
        intents.push(GraphIntent::Undo);
    }
    if actions.redo {
        intents.push(GraphIntent::Redo);
    }
    if actions.close_inspector {
        intents.push(GraphIntent::CloseInspector);
    }
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::WorkflowEditorApp;
    use crate::registries::atomic::node_type::NodeType;
    use euclid::default::Point2D;

    #[test]
    fn test_ctrl_z_is_undo_and_ctrl_shift_z_is_redo() {
        let actions = collect_actions(&[KeyChord::ctrl(Key::Char('z'))], false);
        assert!(actions.undo && !actions.redo);

        let actions = collect_actions(&[KeyChord::ctrl_shift(Key::Char('Z'))], false);
        assert!(actions.redo && !actions.undo);

        let actions = collect_actions(&[KeyChord::ctrl(Key::Char('y'))], false);
        assert!(actions.redo);
    }

    #[test]
    fn test_plain_z_does_nothing() {
        let actions = collect_actions(&[KeyChord::plain(Key::Char('z'))], false);
        assert_eq!(actions, KeyboardActions::default());
    }

    #[test]
    fn test_text_focus_only_lets_escape_through() {
        let chords = [
            KeyChord::plain(Key::Backspace),
            KeyChord::ctrl(Key::Char('z')),
            KeyChord::plain(Key::Escape),
        ];
        let actions = collect_actions(&chords, true);

        assert_eq!(
            actions,
            KeyboardActions {
                close_inspector: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_delete_action_removes_selected_node() {
        let mut app = WorkflowEditorApp::new();
        let id = app.add_node(NodeType::Router, Point2D::new(0.0, 0.0), None);
        app.select_node(id);

        let actions = collect_actions(&[KeyChord::plain(Key::Delete)], false);
        app.apply_intents(intents_from_actions(&actions));

        assert!(!app.graph().contains_node(id));
        assert_eq!(app.selection().selected(), None);
    }

    #[test]
    fn test_undo_action_reverts_last_mutation() {
        let mut app = WorkflowEditorApp::new();
        app.add_node(NodeType::Start, Point2D::new(0.0, 0.0), None);

        let actions = collect_actions(&[KeyChord::ctrl(Key::Char('z'))], false);
        app.apply_intents(intents_from_actions(&actions));

        assert_eq!(app.graph().node_count(), 0);
    }

    #[test]
    fn test_escape_closes_inspector() {
        let intents = intents_from_actions(&KeyboardActions {
            close_inspector: true,
            ..Default::default()
        });
        assert!(matches!(intents.as_slice(), [GraphIntent::CloseInspector]));
    }
}
