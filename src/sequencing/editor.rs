use crate::sequencing::history::NoteHistory;
use crate::sequencing::note::{NoteEvent, NoteId};
use crate::sequencing::pitch::BoardLayout;
use crate::sequencing::sequence::Sequence;

/*
Note Editing
============

Pure data transforms over the note collection. Nothing here touches audio.

A drag is a SESSION:

    begin_drag(kind)  ── remember the selected notes and the whole collection
    update_drag(Δt, Δrow)  ── recompute from the remembered originals
    update_drag(Δt, Δrow)     (any number of times, no history)
    commit_drag()     ── one undo snapshot for the whole gesture
      or cancel_drag() ── put the originals back

Every update is computed from the ORIGINAL notes, never the previous frame, so
rounding can't accumulate over a long drag.

Resizing:

    ResizeLeft   start moves, end stays fixed.  duration ≥ min_duration
    ResizeRight  end moves, start stays fixed.  duration ≥ min_duration

    |<── min ──>|
    [===========|======]      ResizeLeft can't pass end − min
                 start ▶

Moving shifts start (never before 0) and moves the note by whole rows on the
board. A note with a board position re-resolves its pitch from the layout at the
new row; one without a position is transposed a semitone per row.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeLeft,
    ResizeRight,
}

struct DragSession {
    kind: DragKind,
    originals: Vec<NoteEvent>,
    before: Vec<NoteEvent>,
}

pub struct SequenceEditor {
    min_duration: f64,
    drag: Option<DragSession>,
}

impl SequenceEditor {
    pub fn new(min_duration: f64) -> Self {
        Self {
            min_duration: min_duration.max(0.0),
            drag: None,
        }
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Select `id`. Without `additive` every other note is deselected.
    pub fn select(&self, seq: &mut Sequence, id: NoteId, additive: bool) {
        for note in seq.notes_mut() {
            if note.id == id {
                note.selected = true;
            } else if !additive {
                note.selected = false;
            }
        }
    }

    pub fn clear_selection(&self, seq: &mut Sequence) {
        for note in seq.notes_mut() {
            note.selected = false;
        }
    }

    /// Select exactly the notes starting in `[from, to)`.
    pub fn select_range(&self, seq: &mut Sequence, from: f64, to: f64) {
        for note in seq.notes_mut() {
            note.selected = note.start >= from && note.start < to;
        }
    }

    pub fn selected_ids(&self, seq: &Sequence) -> Vec<NoteId> {
        seq.notes()
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id)
            .collect()
    }

    /// Start a drag over the current selection. False if nothing is selected.
    pub fn begin_drag(&mut self, seq: &Sequence, kind: DragKind) -> bool {
        let originals: Vec<NoteEvent> = seq.notes().iter().filter(|n| n.selected).cloned().collect();
        if originals.is_empty() {
            return false;
        }
        self.drag = Some(DragSession {
            kind,
            originals,
            before: seq.snapshot(),
        });
        true
    }

    /// Apply the drag offset to the selection. `delta_rows` only applies to `Move`.
    pub fn update_drag(
        &self,
        seq: &mut Sequence,
        delta_secs: f64,
        delta_rows: i32,
        layout: &dyn BoardLayout,
    ) {
        let Some(session) = &self.drag else {
            return;
        };

        for original in &session.originals {
            let Some(note) = seq.note_mut(original.id) else {
                continue;
            };
            match session.kind {
                DragKind::Move => {
                    note.start = (original.start + delta_secs).max(0.0);
                    move_rows(note, original, delta_rows, layout);
                }
                DragKind::ResizeLeft => {
                    let (start, duration) = self.resize_left(original, delta_secs);
                    note.start = start;
                    note.duration = duration;
                }
                DragKind::ResizeRight => {
                    note.duration = self.resize_right(original, delta_secs);
                }
            }
        }
    }

    /// Finish the drag. Records one undo snapshot if anything changed.
    pub fn commit_drag(&mut self, seq: &Sequence, history: &mut NoteHistory) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        if seq.snapshot() == session.before {
            return false;
        }
        history.record(session.before);
        log::debug!("committed {:?} of {} notes", session.kind, session.originals.len());
        true
    }

    /// Abandon the drag, restoring every dragged note.
    pub fn cancel_drag(&mut self, seq: &mut Sequence) {
        let Some(session) = self.drag.take() else {
            return;
        };
        for original in session.originals {
            if let Some(note) = seq.note_mut(original.id) {
                note.start = original.start;
                note.duration = original.duration;
                note.pitch = original.pitch;
                note.position = original.position;
            }
        }
    }

    /// Remove every selected note as one undoable edit.
    pub fn delete_selected(&mut self, seq: &mut Sequence, history: &mut NoteHistory) -> Vec<NoteEvent> {
        if !seq.notes().iter().any(|n| n.selected) {
            return Vec::new();
        }
        let before = seq.snapshot();
        let removed = seq.remove_where(|n| n.selected);
        history.record(before);
        log::debug!("deleted {} notes", removed.len());
        removed
    }

    fn resize_left(&self, original: &NoteEvent, delta_secs: f64) -> (f64, f64) {
        let end = original.end();
        let start = (original.start + delta_secs)
            .min(end - self.min_duration)
            .max(0.0);
        (start, (end - start).max(self.min_duration))
    }

    fn resize_right(&self, original: &NoteEvent, delta_secs: f64) -> f64 {
        (original.duration + delta_secs).max(self.min_duration)
    }
}

fn move_rows(note: &mut NoteEvent, original: &NoteEvent, delta_rows: i32, layout: &dyn BoardLayout) {
    if delta_rows == 0 {
        note.pitch = original.pitch;
        note.position = original.position;
        return;
    }
    match original.position {
        Some(pos) => {
            let mut moved = pos;
            moved.y += delta_rows;
            match layout.pitch_at(moved) {
                Some(pitch) => {
                    note.position = Some(moved);
                    note.pitch = pitch;
                }
                None => log::debug!("row move to {moved} is off the board, keeping {pos}"),
            }
        }
        None => note.pitch = original.pitch.transpose(delta_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::pitch::{BoardPosition, FretboardLayout, Pitch, PitchClass};
    use crate::sequencing::time_signature::Tempo;

    const MIN: f64 = 0.05;

    fn setup() -> (Sequence, NoteId, NoteId) {
        let mut seq = Sequence::new(Tempo::default(), 4);
        let a = seq.insert_note(Pitch::new(PitchClass::A, 2), 1.0, 0.5);
        let b = seq.insert_note(Pitch::new(PitchClass::E, 2), 2.0, 1.0);
        if let Some(n) = seq.note_mut(a) {
            n.position = Some(BoardPosition::new(5, 0));
        }
        (seq, a, b)
    }

    #[test]
    fn select_replaces_or_extends() {
        let (mut seq, a, b) = setup();
        let editor = SequenceEditor::new(MIN);
        editor.select(&mut seq, a, false);
        editor.select(&mut seq, b, true);
        assert_eq!(editor.selected_ids(&seq), vec![a, b]);

        editor.select(&mut seq, b, false);
        assert_eq!(editor.selected_ids(&seq), vec![b]);

        editor.select_range(&mut seq, 0.0, 1.5);
        assert_eq!(editor.selected_ids(&seq), vec![a]);
        editor.clear_selection(&mut seq);
        assert!(editor.selected_ids(&seq).is_empty());
    }

    #[test]
    fn resize_left_keeps_end_and_floor() {
        let (mut seq, a, _) = setup();
        let mut editor = SequenceEditor::new(MIN);
        let layout = FretboardLayout::standard_guitar();
        editor.select(&mut seq, a, false);
        assert!(editor.begin_drag(&seq, DragKind::ResizeLeft));

        for delta in [-0.3, 0.1, 0.2, 0.45, 0.49, 2.0] {
            editor.update_drag(&mut seq, delta, 0, &layout);
            let note = seq.note(a).unwrap();
            assert!(note.duration >= MIN - 1e-12, "delta {delta}: {}", note.duration);
            assert!((note.end() - 1.5).abs() < 1e-9, "delta {delta}: end {}", note.end());
        }
    }

    #[test]
    fn resize_right_moves_end_only() {
        let (mut seq, a, _) = setup();
        let mut editor = SequenceEditor::new(MIN);
        let layout = FretboardLayout::standard_guitar();
        editor.select(&mut seq, a, false);
        editor.begin_drag(&seq, DragKind::ResizeRight);

        editor.update_drag(&mut seq, 0.25, 0, &layout);
        assert_eq!(seq.note(a).unwrap().duration, 0.75);
        editor.update_drag(&mut seq, -5.0, 0, &layout);
        assert_eq!(seq.note(a).unwrap().duration, MIN);
        assert_eq!(seq.note(a).unwrap().start, 1.0);
    }

    #[test]
    fn move_changes_time_and_row() {
        let (mut seq, a, b) = setup();
        let mut editor = SequenceEditor::new(MIN);
        let layout = FretboardLayout::standard_guitar();
        editor.select(&mut seq, a, false);
        editor.select(&mut seq, b, true);
        editor.begin_drag(&seq, DragKind::Move);

        editor.update_drag(&mut seq, -1.5, 1, &layout);
        let moved = seq.note(a).unwrap();
        assert_eq!(moved.start, 0.0);
        // Fret 5 one string up is D3
        assert_eq!(moved.position, Some(BoardPosition::new(5, 1)));
        assert_eq!(moved.pitch, Pitch::new(PitchClass::D, 3));
        // No position: transposed by a semitone
        assert_eq!(seq.note(b).unwrap().pitch, Pitch::new(PitchClass::F, 2));
    }

    #[test]
    fn drag_commits_once_and_cancel_restores() {
        let (mut seq, a, _) = setup();
        let mut editor = SequenceEditor::new(MIN);
        let mut history = NoteHistory::new(10);
        let layout = FretboardLayout::standard_guitar();
        editor.select(&mut seq, a, false);

        editor.begin_drag(&seq, DragKind::Move);
        for step in 1..=10 {
            editor.update_drag(&mut seq, step as f64 * 0.1, 0, &layout);
        }
        assert!(editor.commit_drag(&seq, &mut history));
        assert_eq!(history.undo_depth(), 1);

        editor.begin_drag(&seq, DragKind::Move);
        editor.update_drag(&mut seq, 3.0, 0, &layout);
        editor.cancel_drag(&mut seq);
        assert_eq!(seq.note(a).unwrap().start, 2.0);
        assert!(!editor.is_dragging());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn delete_selected_is_undoable() {
        let (mut seq, a, b) = setup();
        let mut editor = SequenceEditor::new(MIN);
        let mut history = NoteHistory::new(10);
        editor.select(&mut seq, a, false);

        let removed = editor.delete_selected(&mut seq, &mut history);
        assert_eq!(removed.len(), 1);
        assert_eq!(seq.notes().len(), 1);
        assert_eq!(seq.notes()[0].id, b);

        let restored = history.undo(seq.snapshot()).unwrap();
        seq.replace_notes(restored);
        assert_eq!(seq.notes().len(), 2);

        editor.clear_selection(&mut seq);
        assert!(editor.delete_selected(&mut seq, &mut history).is_empty());
    }
}
