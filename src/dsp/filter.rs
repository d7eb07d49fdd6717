use std::f32::consts::TAU;

/*
Resonant Low-Pass (TPT State-Variable Filter)
=============================================

Each voice filter is a 2-pole state-variable filter in the topology-preserving
transform form (Zavalishin / Simper). Two trapezoidal integrators in a loop
give a 12 dB/octave low-pass whose resonance is set by the damping term `k`:

    g = tan(π · fc / fs)        prewarped integrator gain
    k = 1 / Q                   damping (Q = 0.707 is maximally flat)

    v3 = x − ic2
    v1 = (ic1 + g·v3) / (1 + g·(g + k))     band-pass
    v2 = ic2 + g·v1                         low-pass  ← output

A voice runs one or two of these in PARALLEL and averages them (see
`graph/filter.rs`), which thickens the slope around cutoff without a literal
4-pole cascade.

| Q     | character                         |
| ----- | --------------------------------- |
| 0.5   | soft, no peak                     |
| 0.707 | flat passband                     |
| 2..8  | audible peak at cutoff            |
| > 10  | whistling, close to self-oscillation |

Cutoff is clamped to [MIN_CUTOFF_HZ, 0.49·fs] when coefficients are computed so
envelope or LFO excursions never push `tan` past Nyquist.
*/

pub const MIN_CUTOFF_HZ: f32 = 10.0;
pub const MIN_Q: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub q: f32,
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32, q: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q: q.max(MIN_Q),
        }
    }

    /// Integrator gain and damping for the current cutoff.
    #[inline]
    pub fn coefficients(&self, sample_rate: f32) -> (f32, f32) {
        let nyquist_guard = sample_rate * 0.49;
        let cutoff = self.cutoff_hz.clamp(MIN_CUTOFF_HZ, nyquist_guard);
        let g = (TAU * cutoff / (2.0 * sample_rate)).tan();
        let k = 1.0 / self.q.max(MIN_Q);
        (g, k)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, g: f32, k: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    /// Filter `buffer` in place at the current cutoff.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let (g, k) = self.coefficients(sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, g, k);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.max(MIN_Q);
    }
}
