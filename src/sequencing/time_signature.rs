/// Lowest tempo the transport accepts.
pub const MIN_BPM: f64 = 20.0;
/// Highest tempo the transport accepts.
pub const MAX_BPM: f64 = 400.0;

/// Beats per bar; every beat is one quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Number of beats per bar (numerator)
    pub beats_per_bar: u32,
}

impl TimeSignature {
    /// Standard 4/4 time
    pub const FOUR_FOUR: TimeSignature = TimeSignature { beats_per_bar: 4 };

    /// 3/4 time (waltz)
    pub const THREE_FOUR: TimeSignature = TimeSignature { beats_per_bar: 3 };

    pub fn new(beats_per_bar: u32) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

/// Tempo plus meter: every beat ↔ seconds conversion goes through here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
    pub signature: TimeSignature,
}

impl Tempo {
    /// Tempo clamped to `[MIN_BPM, MAX_BPM]`.
    pub fn new(bpm: f64, signature: TimeSignature) -> Self {
        Self {
            bpm: clamp_bpm(bpm),
            signature,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn seconds_per_bar(&self) -> f64 {
        self.seconds_per_beat() * self.signature.beats_per_bar as f64
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_beat()
    }

    /// Song seconds at the start of 1-based `bar` and `beat`.
    pub fn position_to_seconds(&self, bar: u32, beat: u32) -> f64 {
        let beats = bar.saturating_sub(1) as f64 * self.signature.beats_per_bar as f64
            + beat.saturating_sub(1) as f64;
        self.beats_to_seconds(beats)
    }

    /// 1-based (bar, beat) containing song time `seconds`.
    pub fn seconds_to_position(&self, seconds: f64) -> (u32, u32) {
        let beats = self.seconds_to_beats(seconds.max(0.0)).floor() as u64;
        let per_bar = self.signature.beats_per_bar as u64;
        ((beats / per_bar) as u32 + 1, (beats % per_bar) as u32 + 1)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120.0, TimeSignature::FOUR_FOUR)
    }
}

/// Clamp into the supported tempo range; non-finite input becomes 120.
pub fn clamp_bpm(bpm: f64) -> f64 {
    let clamped = if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        120.0
    };
    if clamped != bpm {
        log::debug!("tempo {bpm} out of range, using {clamped}");
    }
    clamped
}
