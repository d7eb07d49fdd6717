use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/*
Pitches and Board Positions
===========================

A pitch is a pitch class plus an octave. Middle C is C4; A4 is the 440 Hz
tuning reference. Everything converts through the MIDI note number:

    note_number = 12 * (octave + 1) + semitone
    frequency   = 440 * 2^((note_number - 69) / 12)

    semitone: C=0 C#=1 D=2 D#=3 E=4 F=5 F#=6 G=7 G#=8 A=9 A#=10 B=11

Names parse with sharps or flats ("C#", "Db", "c#" all work) and always print
with sharps.

A BOARD POSITION is the (x, y) coordinate of a playable key on the instrument
surface. On a fretted layout x is the fret and y the string row:

            x=0   1    2    3    4    5
    y=0  E2  ●────┼────┼────┼────┼────┼──
    y=1  A2  ●────┼────┼────┼────┼────┼──
    ...
    y=5  E4  ●────┼────┼────┼────┼────┼──

Mapping between pitches and positions is owned by a `BoardLayout`. The engine
only asks it two questions: what sounds at a position, and where is a pitch.
A `PitchMapping` overrides the second question per pitch, so a recorded line
can be replayed on different keys without re-recording it.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

const PITCH_CLASSES: [PitchClass; 12] = [
    PitchClass::C,
    PitchClass::Cs,
    PitchClass::D,
    PitchClass::Ds,
    PitchClass::E,
    PitchClass::F,
    PitchClass::Fs,
    PitchClass::G,
    PitchClass::Gs,
    PitchClass::A,
    PitchClass::As,
    PitchClass::B,
];

impl PitchClass {
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        PITCH_CLASSES[(semitone % 12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let letter = chars
            .next()
            .ok_or_else(|| "empty pitch name".to_string())?;
        let natural: u8 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(format!("unknown pitch name {s:?}")),
        };

        let accidental: i8 = match chars.as_str() {
            "" => 0,
            "#" | "♯" | "s" => 1,
            "b" | "♭" => -1,
            _ => return Err(format!("unknown pitch name {s:?}")),
        };

        let semitone = (natural as i8 + accidental).rem_euclid(12) as u8;
        Ok(PitchClass::from_semitone(semitone))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(value: PitchClass) -> Self {
        value.name().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: i8) -> Self {
        Self { class, octave }
    }

    pub fn from_midi(note: i32) -> Self {
        let semitone = note.rem_euclid(12) as u8;
        let octave = note.div_euclid(12) - 1;
        Self {
            class: PitchClass::from_semitone(semitone),
            octave: octave as i8,
        }
    }

    pub fn midi(&self) -> i32 {
        12 * (self.octave as i32 + 1) + self.class.semitone() as i32
    }

    /// Equal-tempered frequency, A4 = 440 Hz.
    pub fn frequency(&self) -> f32 {
        440.0 * ((self.midi() - 69) as f32 / 12.0).exp2()
    }

    pub fn transpose(&self, semitones: i32) -> Self {
        Self::from_midi(self.midi() + semitones)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

/// Coordinate of a playable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardPosition {
    pub x: i32,
    pub y: i32,
}

impl BoardPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Resolves between board positions and pitches.
pub trait BoardLayout: Send {
    /// Pitch sounding at `position`, or None if no key is there.
    fn pitch_at(&self, position: BoardPosition) -> Option<Pitch>;

    /// Preferred position for `pitch`, or None if it can't be played.
    fn position_of(&self, pitch: Pitch) -> Option<BoardPosition>;
}

/// Fretted layout: each row is an open string, each column a fret.
#[derive(Debug, Clone)]
pub struct FretboardLayout {
    strings: Vec<Pitch>,
    frets: i32,
}

impl FretboardLayout {
    pub fn new(strings: Vec<Pitch>, frets: i32) -> Self {
        Self {
            strings,
            frets: frets.max(0),
        }
    }

    /// Six-string standard tuning, E2 A2 D3 G3 B3 E4, 24 frets.
    pub fn standard_guitar() -> Self {
        use PitchClass::*;
        Self::new(
            vec![
                Pitch::new(E, 2),
                Pitch::new(A, 2),
                Pitch::new(D, 3),
                Pitch::new(G, 3),
                Pitch::new(B, 3),
                Pitch::new(E, 4),
            ],
            24,
        )
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }
}

impl Default for FretboardLayout {
    fn default() -> Self {
        Self::standard_guitar()
    }
}

impl BoardLayout for FretboardLayout {
    fn pitch_at(&self, position: BoardPosition) -> Option<Pitch> {
        if position.x < 0 || position.x > self.frets {
            return None;
        }
        let open = self.strings.get(usize::try_from(position.y).ok()?)?;
        Some(open.transpose(position.x))
    }

    /// Lowest fret wins; ties go to the lower string row.
    fn position_of(&self, pitch: Pitch) -> Option<BoardPosition> {
        self.strings
            .iter()
            .enumerate()
            .filter_map(|(row, open)| {
                let fret = pitch.midi() - open.midi();
                (0..=self.frets)
                    .contains(&fret)
                    .then(|| BoardPosition::new(fret, row as i32))
            })
            .min_by_key(|p| (p.x, p.y))
    }
}

/// Per-pitch position overrides consulted before the layout.
#[derive(Debug, Clone, Default)]
pub struct PitchMapping {
    overrides: HashMap<Pitch, BoardPosition>,
}

impl PitchMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pitch: Pitch, position: BoardPosition) {
        self.overrides.insert(pitch, position);
    }

    pub fn remove(&mut self, pitch: Pitch) -> Option<BoardPosition> {
        self.overrides.remove(&pitch)
    }

    pub fn get(&self, pitch: Pitch) -> Option<BoardPosition> {
        self.overrides.get(&pitch).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sharps_and_flats() {
        assert_eq!("C#".parse::<PitchClass>(), Ok(PitchClass::Cs));
        assert_eq!("Db".parse::<PitchClass>(), Ok(PitchClass::Cs));
        assert_eq!("cb".parse::<PitchClass>(), Ok(PitchClass::B));
        assert_eq!("E#".parse::<PitchClass>(), Ok(PitchClass::F));
        assert!("H".parse::<PitchClass>().is_err());
        assert!("C##".parse::<PitchClass>().is_err());
        assert_eq!(PitchClass::As.to_string(), "A#");
    }

    #[test]
    fn a4_is_440() {
        let a4 = Pitch::new(PitchClass::A, 4);
        assert_eq!(a4.midi(), 69);
        assert!((a4.frequency() - 440.0).abs() < 1e-3);

        let c4 = Pitch::new(PitchClass::C, 4);
        assert!((c4.frequency() - 261.63).abs() < 0.01);
    }

    #[test]
    fn midi_round_trips_negative_octaves() {
        let low = Pitch::from_midi(3);
        assert_eq!(low, Pitch::new(PitchClass::Ds, -1));
        assert_eq!(low.midi(), 3);
    }

    #[test]
    fn fretboard_resolves_positions() {
        let board = FretboardLayout::standard_guitar();
        // Fret 3 on the A string is C3
        assert_eq!(
            board.pitch_at(BoardPosition::new(3, 1)),
            Some(Pitch::new(PitchClass::C, 3))
        );
        // Fret 5 on the low E string is A2, which is also the open A string
        assert_eq!(
            board.position_of(Pitch::new(PitchClass::A, 2)),
            Some(BoardPosition::new(0, 1))
        );
        assert_eq!(board.pitch_at(BoardPosition::new(25, 0)), None);
        assert_eq!(board.pitch_at(BoardPosition::new(0, 6)), None);
        assert_eq!(board.pitch_at(BoardPosition::new(0, -1)), None);
    }

    #[test]
    fn pitch_class_serialises_as_name() {
        let json = serde_json::to_string(&PitchClass::Fs).unwrap();
        assert_eq!(json, "\"F#\"");
        let back: PitchClass = serde_json::from_str("\"Gb\"").unwrap();
        assert_eq!(back, PitchClass::Fs);
    }
}
