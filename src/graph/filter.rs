use crate::{
    dsp::{
        envelope::Adsr,
        filter::SVFilter,
        modulate::{block_average, CONTROL_BLOCK},
        param::AudioParam,
    },
    graph::node::{GraphNode, RenderCtx},
};

/*
Parallel Filter Bank
====================

Subtractive synthesis starts from a harmonically rich source and removes
harmonics. Every voice passes its source mix through a bank of zero, one or two
resonant low-pass filters:

    0 filters   bypass, the raw mix reaches the output
    1 filter    a single 12 dB/oct low-pass
    2 filters   both filters see the SAME input and their outputs are averaged

        ┌─▶ LPF(c1, Q1) ─┐
   in ──┤                ├─▶ ½(a + b) ─▶ out
        └─▶ LPF(c2, Q2) ─┘

Running them in parallel rather than in series keeps the bank stable and its
gain predictable while still steepening the response when the cutoffs sit near
each other. It is an approximation of a 24 dB slope, not a literal 4-pole.

Cutoff movement:
----------------

Each filter owns a cutoff `AudioParam`. A filter envelope writes

    base → base·(1 + amount)            over attack
         → base·(1 + amount·sustain)    over decay

onto it at note start, and on release the cutoff ramps back to `base` over the
release time, starting from wherever it currently is.

An optional external multiplier (the wah LFO, see `graph/lfo.rs`) scales every
cutoff. Cutoff is evaluated once per control block; see `dsp/modulate.rs`.
*/

struct FilterStage {
    filter: SVFilter,
    cutoff: AudioParam,
    base_cutoff: f32,
    envelope_amount: f32,
}

pub struct FilterBank {
    stages: Vec<FilterStage>,
    cutoff_factor: [f32; CONTROL_BLOCK],
    factor_len: usize,
}

impl FilterBank {
    /// A bank that passes its input through untouched.
    pub fn bypass() -> Self {
        Self {
            stages: Vec::new(),
            cutoff_factor: [1.0; CONTROL_BLOCK],
            factor_len: 0,
        }
    }

    /// Add a low-pass stage. `envelope_amount` is the fraction of `cutoff_hz`
    /// the filter envelope adds at its peak.
    pub fn with_lowpass(mut self, cutoff_hz: f32, q: f32, envelope_amount: f32) -> Self {
        self.stages.push(FilterStage {
            filter: SVFilter::lowpass(cutoff_hz, q),
            cutoff: AudioParam::new(cutoff_hz),
            base_cutoff: cutoff_hz,
            envelope_amount,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Scheduled cutoff of stage `index` at `time`, before LFO modulation.
    pub fn cutoff_at(&self, index: usize, time: f64) -> Option<f32> {
        self.stages.get(index).map(|s| s.cutoff.value_at(time))
    }

    /// Write the filter envelope onto every stage with a non-zero amount.
    pub fn schedule_envelope(&mut self, envelope: &Adsr, sustain: f32, t0: f64) {
        for stage in &mut self.stages {
            if stage.envelope_amount <= 0.0 {
                continue;
            }
            let base = stage.base_cutoff;
            let peak = base + stage.envelope_amount * base;
            let floor = base + stage.envelope_amount * base * sustain;
            envelope.schedule_onset(&mut stage.cutoff, t0, base, peak, floor);
        }
    }

    /// Ramp every cutoff from its current value back to base.
    pub fn schedule_release(&mut self, at: f64, release: f32) {
        for stage in &mut self.stages {
            Adsr::schedule_release(&mut stage.cutoff, at, stage.base_cutoff, release);
        }
    }

    /// Per-sample cutoff multiplier for the next block (wah LFO).
    pub fn set_cutoff_modulation(&mut self, factor: &[f32]) {
        let n = factor.len().min(CONTROL_BLOCK);
        self.cutoff_factor[..n].copy_from_slice(&factor[..n]);
        self.factor_len = n;
    }

    fn render_chunk(&mut self, out: &mut [f32], ctx: &RenderCtx, offset: usize) {
        let n = out.len();
        let factor = if self.factor_len > 0 {
            let start = offset.min(self.factor_len);
            let end = (offset + n).min(self.factor_len);
            let slice = &self.cutoff_factor[start..end];
            if slice.is_empty() {
                1.0
            } else {
                block_average(slice)
            }
        } else {
            1.0
        };
        let mid_time = ctx.sample_time(offset + n / 2);

        let mut input = [0.0f32; CONTROL_BLOCK];
        let mut acc = [0.0f32; CONTROL_BLOCK];
        input[..n].copy_from_slice(out);

        let weight = 1.0 / self.stages.len() as f32;
        for stage in &mut self.stages {
            let cutoff = stage.cutoff.value_at(mid_time) * factor;
            stage.filter.set_cutoff(cutoff);
            let (g, k) = stage.filter.coefficients(ctx.sample_rate);
            for i in 0..n {
                acc[i] += stage.filter.next_sample(input[i], g, k) * weight;
            }
        }

        out.copy_from_slice(&acc[..n]);
    }
}

impl GraphNode for FilterBank {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if self.stages.is_empty() {
            return;
        }
        let mut offset = 0;
        for chunk in out.chunks_mut(CONTROL_BLOCK) {
            let len = chunk.len();
            self.render_chunk(chunk, ctx, offset);
            offset += len;
        }
        self.factor_len = 0;
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.filter.reset();
        }
    }
}
