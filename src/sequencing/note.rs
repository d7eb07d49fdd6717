use serde::{Deserialize, Serialize};

use crate::sequencing::pitch::{BoardPosition, Pitch};
use crate::synth::voice::VoiceHandle;

/// Stable identity of a recorded note, independent of its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

/// One recorded note.
///
/// `start` and `duration` are song seconds at the current tempo. The runtime
/// fields (`is_sounding`, `voice`) change only through `mark_sounding` and
/// `mark_silent`, which keeps "not sounding" and "no voice" in step.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub id: NoteId,
    pub pitch: Pitch,
    pub position: Option<BoardPosition>,
    pub start: f64,
    pub duration: f64,
    pub selected: bool,
    is_sounding: bool,
    voice: Option<VoiceHandle>,
}

impl NoteEvent {
    pub fn new(id: NoteId, pitch: Pitch, start: f64, duration: f64) -> Self {
        Self {
            id,
            pitch,
            position: None,
            start: start.max(0.0),
            duration: duration.max(0.0),
            selected: false,
            is_sounding: false,
            voice: None,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn is_sounding(&self) -> bool {
        self.is_sounding
    }

    pub fn voice(&self) -> Option<VoiceHandle> {
        self.voice
    }

    pub fn mark_sounding(&mut self, voice: VoiceHandle) {
        self.is_sounding = true;
        self.voice = Some(voice);
    }

    /// Clear the runtime flags, returning the voice that was attached.
    pub fn mark_silent(&mut self) -> Option<VoiceHandle> {
        self.is_sounding = false;
        self.voice.take()
    }

    /// Copy with runtime state cleared, as stored in history snapshots.
    pub fn at_rest(&self) -> Self {
        Self {
            is_sounding: false,
            voice: None,
            ..self.clone()
        }
    }
}

/// Descriptive bar range, e.g. "Verse" over bars 1 to 8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub start_bar: u32,
    pub end_bar: u32,
    pub name: String,
}

impl Section {
    /// Swap reversed bounds so `start_bar <= end_bar`.
    pub fn normalized(self) -> Self {
        if self.start_bar <= self.end_bar {
            self
        } else {
            log::debug!("section {:?} has reversed bars, swapping", self.name);
            Self {
                start_bar: self.end_bar,
                end_bar: self.start_bar,
                ..self
            }
        }
    }
}
