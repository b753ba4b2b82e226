//! Bounded undo/redo history over full state snapshots.
//!
//! The log is linear: undoing and then pushing a new action discards the
//! redo branch. Snapshots are whole state values rather than deltas; the
//! states involved are small and copying them keeps undo deterministic.

use crate::character::now_timestamp;

/// Maximum number of retained actions; pushing past this evicts the oldest.
pub const MAX_UNDO_STACK: usize = 20;

/// One recorded state transition.
#[derive(Debug, Clone)]
pub struct Action<S> {
    /// Human-readable description, e.g. "HP -7".
    pub name: String,
    /// Snapshot before the mutation.
    pub previous_state: S,
    /// Snapshot after the mutation.
    pub new_state: S,
    pub timestamp: String,
}

/// A bounded linear history with an undo pointer.
///
/// The pointer marks the currently-applied action: `None` means nothing to
/// undo (before the first action), `Some(len - 1)` means nothing to redo.
#[derive(Debug, Clone)]
pub struct ActionLog<S> {
    actions: Vec<Action<S>>,
    pointer: Option<usize>,
}

impl<S: Clone> Default for ActionLog<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> ActionLog<S> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            pointer: None,
        }
    }

    /// Record a transition. Any undone actions past the pointer are
    /// discarded first; the oldest entries are evicted past the cap.
    pub fn push(&mut self, name: impl Into<String>, previous_state: S, new_state: S) {
        let keep = self.pointer.map_or(0, |p| p + 1);
        self.actions.truncate(keep);

        self.actions.push(Action {
            name: name.into(),
            previous_state,
            new_state,
            timestamp: now_timestamp(),
        });

        if self.actions.len() > MAX_UNDO_STACK {
            let excess = self.actions.len() - MAX_UNDO_STACK;
            self.actions.drain(..excess);
        }

        self.pointer = Some(self.actions.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn can_redo(&self) -> bool {
        let next = self.pointer.map_or(0, |p| p + 1);
        next < self.actions.len()
    }

    /// Step back one action and return the state to restore, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> Option<S> {
        let current = self.pointer?;
        let restored = self.actions[current].previous_state.clone();
        self.pointer = current.checked_sub(1);
        Some(restored)
    }

    /// Step forward one action and return the state to restore, or `None`
    /// when there is nothing to redo.
    pub fn redo(&mut self) -> Option<S> {
        let next = self.pointer.map_or(0, |p| p + 1);
        if next >= self.actions.len() {
            return None;
        }
        self.pointer = Some(next);
        Some(self.actions[next].new_state.clone())
    }

    /// Name of the action an undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.pointer.map(|p| self.actions[p].name.as_str())
    }

    /// Name of the action a redo would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        let next = self.pointer.map_or(0, |p| p + 1);
        self.actions.get(next).map(|a| a.name.as_str())
    }

    /// The most recent up-to-`count` applied actions, newest first.
    pub fn recent_actions(&self, count: usize) -> Vec<&Action<S>> {
        let Some(pointer) = self.pointer else {
            return Vec::new();
        };
        let start = (pointer + 1).saturating_sub(count);
        self.actions[start..=pointer].iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Index of the currently-applied action; `None` at the oldest state.
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }
}
