use std::collections::VecDeque;
use std::sync::Arc;

use crate::sequencing::note::NoteEvent;

/*
Undo / Redo
===========

Two stacks of whole-collection snapshots. A committed edit pushes the state
BEFORE the edit onto the undo stack and empties the redo stack:

    edit:   undo.push(before)      redo.clear()
    undo:   redo.push(current)     current = undo.pop()
    redo:   undo.push(current)     current = redo.pop()

so `undo(); redo()` always lands back on exactly the collection you started
with. Snapshots are immutable `Arc<[NoteEvent]>` slices with runtime flags
stripped; moving one between stacks never copies notes. The undo stack is
capped: once full, the oldest snapshot falls off.
*/

pub struct NoteHistory {
    undo: VecDeque<Arc<[NoteEvent]>>,
    redo: Vec<Arc<[NoteEvent]>>,
    limit: usize,
}

impl NoteHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the collection as it was before a committed edit.
    pub fn record(&mut self, before: Vec<NoteEvent>) {
        self.undo.push_back(before.into());
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back. Returns the collection to make live, if any.
    pub fn undo(&mut self, current: Vec<NoteEvent>) -> Option<Vec<NoteEvent>> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.into());
        Some(previous.to_vec())
    }

    /// Step forward again. Returns the collection to make live, if any.
    pub fn redo(&mut self, current: Vec<NoteEvent>) -> Option<Vec<NoteEvent>> {
        let next = self.redo.pop()?;
        self.undo.push_back(current.into());
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        Some(next.to_vec())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for NoteHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
