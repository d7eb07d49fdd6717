use crate::error::Result;
use crate::sequencing::editor::{DragKind, SequenceEditor};
use crate::sequencing::note::{NoteEvent, NoteId};
use crate::sequencing::sequence::{Sequence, SequenceFile};

use super::AudioEngine;

impl AudioEngine {
    /// Restore the notes before the last committed edit.
    pub fn undo(&mut self) -> bool {
        self.silence_notes();
        let current = self.sequence.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.sequence.replace_notes(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.silence_notes();
        let current = self.sequence.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.sequence.replace_notes(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Remove the selected notes, stopping any that are sounding.
    pub fn delete_selected(&mut self) -> Vec<NoteEvent> {
        let selected = self.editor.selected_ids(&self.sequence);
        self.silence_listed(&selected);
        self.editor.delete_selected(&mut self.sequence, &mut self.history)
    }

    pub fn select_note(&mut self, id: NoteId, additive: bool) {
        self.editor.select(&mut self.sequence, id, additive);
    }

    /// Select every note starting in song time `[from, to)`.
    pub fn select_range(&mut self, from: f64, to: f64) {
        self.editor.select_range(&mut self.sequence, from, to);
    }

    pub fn clear_selection(&mut self) {
        self.editor.clear_selection(&mut self.sequence);
    }

    /// Begin dragging the selection. False if nothing is selected.
    pub fn begin_edit(&mut self, kind: DragKind) -> bool {
        self.editor.begin_drag(&self.sequence, kind)
    }

    /// Intermediate drag frame: offsets are from where the drag began.
    pub fn update_edit(&mut self, delta_secs: f64, delta_rows: i32) {
        self.editor
            .update_drag(&mut self.sequence, delta_secs, delta_rows, self.layout.as_ref());
    }

    /// Finish the drag as one undoable edit. Edited notes that are sounding
    /// are stopped; their old note-off may already be behind the scheduler.
    pub fn commit_edit(&mut self) -> bool {
        let edited = self.editor.selected_ids(&self.sequence);
        if !self.editor.commit_drag(&self.sequence, &mut self.history) {
            return false;
        }
        self.silence_listed(&edited);
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel_drag(&mut self.sequence);
    }

    /// Replace the sequence with an interchange file. Stops playback and
    /// clears history.
    pub fn load_sequence(&mut self, json: &str) -> Result<()> {
        let file = SequenceFile::from_json(json)?;
        let sequence = Sequence::from_file(file, self.layout.as_ref())?;

        self.stop_playback();
        self.sequence = sequence;
        self.history.clear();
        self.editor = SequenceEditor::new(self.config.min_note_duration_secs);
        log::info!(
            "loaded {} notes at {} bpm",
            self.sequence.notes().len(),
            self.sequence.tempo.bpm()
        );
        Ok(())
    }

    pub fn export_sequence(&self) -> Result<String> {
        self.sequence.to_file().to_json()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{AudioEngine, EngineConfig};
    use crate::error::EngineError;
    use crate::sequencing::editor::DragKind;

    const SEQUENCE: &str = r#"{
        "tempo": 120,
        "notes": [
            { "note": "E", "octave": 2, "startTime": 0.0, "duration": 0.5 },
            { "note": "G", "octave": 3, "position": { "x": 0, "y": 3 }, "startTime": 0.5, "duration": 0.5 }
        ]
    }"#;

    fn loaded() -> AudioEngine {
        let mut engine = AudioEngine::new(EngineConfig::default());
        engine.load_sequence(SEQUENCE).expect("valid sequence");
        engine
    }

    #[test]
    fn load_derives_positions_and_export_round_trips() {
        let engine = loaded();
        let notes = engine.sequence().notes();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].position.is_some());

        let json = engine.export_sequence().expect("serialises");
        let mut reloaded = AudioEngine::new(EngineConfig::default());
        reloaded.load_sequence(&json).expect("own export loads");
        assert_eq!(reloaded.sequence().notes(), engine.sequence().notes());
    }

    #[test]
    fn malformed_file_is_rejected_without_changes() {
        let mut engine = loaded();
        let err = engine.load_sequence("{ not json");
        assert!(matches!(err, Err(EngineError::Sequence(_))));
        assert_eq!(engine.sequence().notes().len(), 2);
    }

    #[test]
    fn drag_commit_is_one_undo_step() {
        let mut engine = loaded();
        let id = engine.sequence().notes()[1].id;
        engine.select_note(id, false);

        assert!(engine.begin_edit(DragKind::ResizeRight));
        engine.update_edit(0.1, 0);
        engine.update_edit(0.25, 0);
        assert!(!engine.can_undo(), "intermediate frames are not history");
        assert!(engine.commit_edit());

        let resized = engine.sequence().note(id).map(|n| n.duration);
        assert_eq!(resized, Some(0.75));
        assert!(engine.undo());
        assert_eq!(engine.sequence().note(id).map(|n| n.duration), Some(0.5));
        assert!(!engine.can_undo());
    }

    #[test]
    fn delete_selected_is_undoable() {
        let mut engine = loaded();
        engine.select_range(0.0, 0.4);
        let removed = engine.delete_selected();
        assert_eq!(removed.len(), 1);
        assert_eq!(engine.sequence().notes().len(), 1);

        assert!(engine.undo());
        assert_eq!(engine.sequence().notes().len(), 2);
        assert!(engine.redo());
        assert_eq!(engine.sequence().notes().len(), 1);
    }

    #[test]
    fn cancel_restores_the_drag_origin() {
        let mut engine = loaded();
        let id = engine.sequence().notes()[0].id;
        engine.select_note(id, false);
        engine.begin_edit(DragKind::Move);
        engine.update_edit(1.0, 0);
        engine.cancel_edit();

        assert_eq!(engine.sequence().note(id).map(|n| n.start), Some(0.0));
        assert!(!engine.can_undo());
    }
}
