use crate::dsp::oscillator::{NoiseBlock, OscillatorBlock, Waveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Voice Sources
=============

Each (sub-)voice has two tonal oscillators and the voice as a whole may add
white noise. The oscillators are the raw material the filter bank sculpts.

Waveform character:
-------------------

Sine: Fundamental only. Smooth, hollow, flute-like.
Sawtooth: All harmonics, falling as 1/n. Bright, buzzy, brassy.
Square: Odd harmonics only. Hollow, woody. Pulse width thins it out.
Triangle: Odd harmonics falling as 1/n². Soft and mellow.
Noise: Every frequency at once. Breath, pick attack, hiss.

Pitch:
------

An oscillator either FOLLOWS THE KEYBOARD (its frequency is the played pitch,
including glide and vibrato, times its detune ratio) or DRONES at a fixed
reference (middle C, 261.63 Hz) times its detune ratio. A droning oscillator is
how you get a constant pedal tone under whatever is being played.

    detune ratio = 2^(semitones / 12)

Unison copies of the pair add a further spread ratio on top, so every copy of
both oscillators moves together:

    spread ratio = 2^(cents / 1200)

Hard sync:
----------

`OscPair` wires the two together. With hard sync on, oscillator 2 restarts its
cycle whenever oscillator 1 wraps (see `dsp/oscillator.rs`). The pair's output
is the level-weighted sum of both oscillators; nothing is normalised here.

Example:
  let pair = OscPair::new(
      OscNode::new(Waveform::Sawtooth),
      OscNode::new(Waveform::Square).with_detune_semitones(7.0).with_level(0.5),
  )
  .with_hard_sync(true);
*/

/// Fixed reference an oscillator drones at when it doesn't follow the keyboard.
pub const DRONE_HZ: f32 = 261.63;

#[derive(Debug, Clone)]
pub struct OscNode {
    osc: OscillatorBlock,
    /// Fixed frequency (Hz). If Some, ignores the played pitch.
    base_frequency: Option<f32>,
    detune_ratio: f32,
    level: f32,
}

impl OscNode {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            base_frequency: None,
            detune_ratio: 1.0,
            level: 1.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Sawtooth)
    }

    /// Set a fixed frequency, ignoring the played pitch.
    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.base_frequency = Some(freq);
        self
    }

    /// Offset in semitones (fractional allowed).
    pub fn with_detune_semitones(mut self, semitones: f32) -> Self {
        self.detune_ratio = (semitones / 12.0).exp2();
        self
    }

    pub fn with_pulse_width(mut self, width: f32) -> Self {
        self.osc = self.osc.with_pulse_width(width);
        self
    }

    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Frequency this oscillator runs at for a given played pitch.
    #[inline]
    pub fn frequency_for(&self, played: Option<f32>) -> f32 {
        let base = self.base_frequency.or(played).unwrap_or(DRONE_HZ);
        base * self.detune_ratio
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for (i, sample) in out.iter_mut().enumerate() {
            let freq = self.frequency_for(ctx.pitch_at(i));
            *sample = self.osc.next_sample(freq, ctx.sample_rate).0 * self.level;
        }
    }

    fn reset(&mut self) {
        self.osc.reset_phase();
    }
}

/// The two oscillators of one (sub-)voice.
#[derive(Debug, Clone)]
pub struct OscPair {
    primary: OscNode,
    secondary: OscNode,
    hard_sync: bool,
    spread_ratio: f32,
}

impl OscPair {
    pub fn new(primary: OscNode, secondary: OscNode) -> Self {
        Self {
            primary,
            secondary,
            hard_sync: false,
            spread_ratio: 1.0,
        }
    }

    pub fn with_hard_sync(mut self, hard_sync: bool) -> Self {
        self.hard_sync = hard_sync;
        self
    }

    /// Unison detune in cents applied to both oscillators.
    pub fn with_spread_cents(mut self, cents: f32) -> Self {
        self.spread_ratio = (cents / 1200.0).exp2();
        self
    }

    pub fn spread_ratio(&self) -> f32 {
        self.spread_ratio
    }
}

impl GraphNode for OscPair {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sr = ctx.sample_rate;
        for (i, sample) in out.iter_mut().enumerate() {
            let played = ctx.pitch_at(i);
            let f1 = self.primary.frequency_for(played) * self.spread_ratio;
            let f2 = self.secondary.frequency_for(played) * self.spread_ratio;

            let (s1, wrapped) = self.primary.osc.next_sample(f1, sr);
            if self.hard_sync && wrapped {
                self.secondary.osc.reset_phase();
            }
            let (s2, _) = self.secondary.osc.next_sample(f2, sr);

            *sample = s1 * self.primary.level + s2 * self.secondary.level;
        }
    }

    fn reset(&mut self) {
        self.primary.reset();
        self.secondary.reset();
    }
}

/// White noise at a fixed level.
pub struct NoiseNode {
    noise: NoiseBlock,
    level: f32,
}

impl NoiseNode {
    pub fn new(level: f32) -> Self {
        Self {
            noise: NoiseBlock::new(),
            level,
        }
    }

    pub fn with_seed(level: f32, seed: u64) -> Self {
        Self {
            noise: NoiseBlock::with_seed(seed),
            level,
        }
    }
}

impl GraphNode for NoiseNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.noise.next_sample() * self.level;
        }
    }
}
