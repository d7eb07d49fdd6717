use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sequencing::note::{NoteEvent, NoteId, Section};
use crate::sequencing::pitch::{BoardLayout, BoardPosition, Pitch, PitchClass};
use crate::sequencing::time_signature::{Tempo, TimeSignature};

/*
Sequence Interchange
====================

The external persistence shape. Only pitch, octave, start and duration are
required per note; everything else is optional or derived on load.

{
  "tempo": 120,
  "beatsPerBar": 4,
  "bars": 4,
  "sections": [{ "startBar": 1, "endBar": 4, "name": "Intro" }],
  "notes": [
    { "note": "C#", "octave": 3, "position": { "x": 4, "y": 1 },
      "startTime": 0.0, "duration": 0.5 }
  ]
}

Times are seconds at the file's tempo. On load, negative times are clamped to
zero, reversed sections are swapped, notes without a position get one from the
board layout, and every runtime flag starts cleared.
*/

const MIN_OCTAVE: i8 = -1;
const MAX_OCTAVE: i8 = 9;

fn default_tempo() -> f64 {
    120.0
}

fn default_beats_per_bar() -> u32 {
    4
}

fn default_bars() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub note: PitchClass,
    pub octave: i8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<BoardPosition>,
    pub start_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceFile {
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,
    #[serde(default = "default_bars")]
    pub bars: u32,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub notes: Vec<NoteRecord>,
}

impl SequenceFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The live note collection plus its musical frame.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub tempo: Tempo,
    pub bars: u32,
    pub sections: Vec<Section>,
    notes: Vec<NoteEvent>,
    next_id: u64,
}

impl Sequence {
    pub fn new(tempo: Tempo, bars: u32) -> Self {
        Self {
            tempo,
            bars: bars.max(1),
            sections: Vec::new(),
            notes: Vec::new(),
            next_id: 0,
        }
    }

    /// Build from an interchange file, deriving positions through `layout`.
    pub fn from_file(file: SequenceFile, layout: &dyn BoardLayout) -> Result<Self> {
        let tempo = Tempo::new(file.tempo, TimeSignature::new(file.beats_per_bar));
        let mut sequence = Self::new(tempo, file.bars);
        sequence.sections = file.sections.into_iter().map(Section::normalized).collect();

        for (index, record) in file.notes.into_iter().enumerate() {
            if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&record.octave) {
                return Err(EngineError::InvalidSequence(format!(
                    "note {index} has octave {} outside {MIN_OCTAVE}..={MAX_OCTAVE}",
                    record.octave
                )));
            }
            if !record.start_time.is_finite() || !record.duration.is_finite() {
                return Err(EngineError::InvalidSequence(format!(
                    "note {index} has a non-finite time"
                )));
            }

            let pitch = Pitch::new(record.note, record.octave);
            let position = record.position.or_else(|| layout.position_of(pitch));
            if position.is_none() {
                log::warn!("note {index} ({pitch}) has no playable position on this layout");
            }

            let id = sequence.insert_note(pitch, record.start_time, record.duration);
            if let (Some(note), Some(pos)) = (sequence.note_mut(id), position) {
                note.position = Some(pos);
            }
        }

        log::info!(
            "loaded sequence: {} notes, {} bars at {} bpm",
            sequence.notes.len(),
            sequence.bars,
            sequence.tempo.bpm()
        );
        Ok(sequence)
    }

    pub fn to_file(&self) -> SequenceFile {
        SequenceFile {
            tempo: self.tempo.bpm(),
            beats_per_bar: self.tempo.signature.beats_per_bar,
            bars: self.bars,
            sections: self.sections.clone(),
            notes: self
                .notes
                .iter()
                .map(|n| NoteRecord {
                    note: n.pitch.class,
                    octave: n.pitch.octave,
                    position: n.position,
                    start_time: n.start,
                    duration: n.duration,
                })
                .collect(),
        }
    }

    /// Add a note and return its id. Negative times are clamped to zero.
    pub fn insert_note(&mut self, pitch: Pitch, start: f64, duration: f64) -> NoteId {
        if start < 0.0 || duration < 0.0 {
            log::debug!("clamping note time {start}+{duration} to non-negative");
        }
        self.next_id += 1;
        let id = NoteId(self.next_id);
        self.notes.push(NoteEvent::new(id, pitch, start, duration));
        id
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [NoteEvent] {
        &mut self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&NoteEvent> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut NoteEvent> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Remove every note matching `remove`, returning them.
    pub fn remove_where(&mut self, mut remove: impl FnMut(&NoteEvent) -> bool) -> Vec<NoteEvent> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.notes.len());
        for note in self.notes.drain(..) {
            if remove(&note) {
                removed.push(note);
            } else {
                kept.push(note);
            }
        }
        self.notes = kept;
        removed
    }

    /// Replace the whole collection (history restore).
    pub fn replace_notes(&mut self, notes: Vec<NoteEvent>) {
        let highest = notes.iter().map(|n| n.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest);
        self.notes = notes;
    }

    /// Collection with runtime state stripped, for history snapshots.
    pub fn snapshot(&self) -> Vec<NoteEvent> {
        self.notes.iter().map(NoteEvent::at_rest).collect()
    }

    /// Song length: the bar grid or the last note's end, whichever is later.
    pub fn length_secs(&self) -> f64 {
        let grid = self.bars as f64 * self.tempo.seconds_per_bar();
        self.notes.iter().map(NoteEvent::end).fold(grid, f64::max)
    }

    /// Change tempo keeping every note on the same beat.
    pub fn rescale_tempo(&mut self, bpm: f64) {
        let new_tempo = Tempo::new(bpm, self.tempo.signature);
        let factor = self.tempo.bpm() / new_tempo.bpm();
        for note in &mut self.notes {
            note.start *= factor;
            note.duration *= factor;
        }
        self.tempo = new_tempo;
    }
}
