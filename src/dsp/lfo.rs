//! Low Frequency Oscillator depth mappings.

/*
Low Frequency Oscillators
=========================

An LFO is an ordinary oscillator running below the audible range (0.01 to
~20 Hz). It never reaches the output directly; it moves a parameter.

  audio-rate      ~20 Hz to ~20 kHz. Makes the sound you hear.
  control-rate    ~0.01 Hz to ~20 Hz. Moves other parameters.
  bipolar         Swings −1..+1. Natural for vibrato and wah.
  unipolar        Swings 0..1.

    unipolar = (bipolar + 1.0) * 0.5

A voice owns exactly ONE LFO, and it drives exactly one destination. The
waveform math is the audio oscillator's (see `dsp/oscillator.rs`); this module
only maps the bipolar LFO value and a depth in [0, 1] to a multiplier for the
chosen destination:

| routing   | effect  | multiplier                    | range at depth d         |
| --------- | ------- | ----------------------------- | ------------------------ |
| amplitude | tremolo | 1 − d · unipolar(lfo)         | [1 − d, 1]               |
| filter    | wah     | 2^(2 · d · lfo)               | ±2 octaves × d           |
| pitch     | vibrato | 2^(d · lfo / 12)              | ±1 semitone × d          |

Tremolo only ever pulls the level DOWN from the envelope, so it can never push
a voice above unity. Filter and pitch are multiplicative in frequency, which
is how the ear hears them: +1 octave and −1 octave sound like equal moves.


Typical rates
-------------

    0.1 - 0.5 Hz    slow filter sweeps
    0.5 - 2 Hz      classic tremolo
    2 - 7 Hz        vibrato sweet spot
    > 15 Hz         approaching audio-rate AM/FM
*/

/// Octaves of filter sweep at full depth.
pub const FILTER_LFO_OCTAVES: f32 = 2.0;
/// Semitones of vibrato at full depth.
pub const PITCH_LFO_SEMITONES: f32 = 1.0;

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Gain multiplier for tremolo, in `[1 - depth, 1]`.
#[inline]
pub fn tremolo_gain(lfo: f32, depth: f32) -> f32 {
    1.0 - depth * bipolar_to_unipolar(lfo)
}

/// Cutoff multiplier for a filter sweep.
#[inline]
pub fn filter_factor(lfo: f32, depth: f32) -> f32 {
    (FILTER_LFO_OCTAVES * depth * lfo).exp2()
}

/// Frequency multiplier for vibrato.
#[inline]
pub fn pitch_factor(lfo: f32, depth: f32) -> f32 {
    (PITCH_LFO_SEMITONES * depth * lfo / 12.0).exp2()
}
