//! The recorded-note model: pitches and board positions, notes, tempo,
//! the interchange format, and the undoable editing operations over them.

pub mod editor;
pub mod history;
pub mod note;
pub mod pitch;
pub mod sequence;
pub mod time_signature;

pub use editor::{DragKind, SequenceEditor};
pub use history::NoteHistory;
pub use note::{NoteEvent, NoteId, Section};
pub use pitch::{BoardLayout, BoardPosition, FretboardLayout, Pitch, PitchClass, PitchMapping};
pub use sequence::{NoteRecord, Sequence, SequenceFile};
pub use time_signature::{Tempo, TimeSignature};
