use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/*
Phase-Accumulator Oscillators
=============================

Every tonal source in a voice is a phase accumulator: a number in [0, 1) that
advances by `frequency / sample_rate` each sample and wraps back to zero once
per cycle. The waveform is a pure function of that phase.

    phase  0.0 ──────────────→ 1.0 (wrap)
    sine      sin(2π·phase)
    saw       2·phase − 1
    square    +1 while phase < width, −1 after
    triangle  1 − 4·|phase − 0.5|

Frequency is passed per sample rather than stored, because the voice drives it
from an automation timeline (glide) and an optional vibrato LFO.


Hard Sync
---------

When oscillator 2 is hard-synced to oscillator 1, oscillator 2 restarts its
cycle every time oscillator 1 wraps. The slave's own frequency then only shapes
the timbre; the perceived pitch follows the master.

    master   /|  /|  /|
    slave    /|/|/ /|/|/ /|/|/     (reset at every master wrap)

`next_sample` reports whether the phase wrapped on this sample so the voice can
forward that edge to the slave via `reset_phase`.


Pulse Width
-----------

The square waveform takes its duty cycle from `pulse_width`. 0.5 is a classic
square (odd harmonics only); narrower widths thin the sound out toward a buzzy
pulse. Values are clamped to [0.01, 0.99] so the wave never collapses into DC.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sawtooth
    }
}

#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    waveform: Waveform,
    pulse_width: f32,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            pulse_width: 0.5,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Sawtooth)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(Waveform::Triangle)
    }

    pub fn with_pulse_width(mut self, width: f32) -> Self {
        self.pulse_width = width.clamp(0.01, 0.99);
        self
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Restart the cycle. Used for hard sync and for deterministic note starts.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample at `frequency` and advance the phase.
    ///
    /// Returns the sample and whether the phase wrapped on this step.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> (f32, bool) {
        let value = self.value_at_phase(self.phase);

        let increment = (frequency / sample_rate).max(0.0);
        self.phase += increment;
        let wrapped = self.phase >= 1.0;
        if wrapped {
            self.phase -= self.phase.floor();
        }

        (value, wrapped)
    }

    /// Fill `out` with a fixed-frequency signal.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate).0;
        }
    }

    #[inline]
    fn value_at_phase(&self, phase: f32) -> f32 {
        match self.waveform {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < self.pulse_width {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// White noise source.
pub struct NoiseBlock {
    rng: fastrand::Rng,
}

impl NoiseBlock {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic noise for tests and offline renders.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }
}

impl Default for NoiseBlock {
    fn default() -> Self {
        Self::new()
    }
}
