use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        lfo::{filter_factor, pitch_factor, tremolo_gain},
        oscillator::{OscillatorBlock, Waveform},
    },
    graph::node::{GraphNode, RenderCtx},
};

/*
LFO Node
========

Each voice has exactly one LFO. Its routing picks ONE destination:

  Amplitude   tremolo   output gain wobbles down from the envelope level
  Filter      wah       every filter cutoff sweeps up and down
  Pitch       vibrato   every oscillator of every unison copy bends together

The node does not render the raw LFO wave. It renders the MULTIPLIER for its
destination (see `dsp/lfo.rs` for the mappings), so the voice can apply it
without knowing anything about depth or routing:

    gain[i]   *= lfo[i]     (Amplitude)
    cutoff    *= avg(lfo)   (Filter, block rate)
    pitch[i]  *= lfo[i]     (Pitch)

With depth 0 every multiplier is exactly 1.0.

The LFO phase restarts with each note, so a note always begins at the same
point of the modulation cycle.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LfoRouting {
    #[default]
    Amplitude,
    Filter,
    Pitch,
}

pub struct LfoNode {
    osc: OscillatorBlock,
    frequency: f32, // Fixed frequency in Hz (ignores played pitch)
    depth: f32,
    routing: LfoRouting,
}

impl LfoNode {
    pub fn new(waveform: Waveform, frequency: f32, depth: f32, routing: LfoRouting) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency,
            depth,
            routing,
        }
    }

    pub fn sine(frequency: f32, depth: f32, routing: LfoRouting) -> Self {
        Self::new(Waveform::Sine, frequency, depth, routing)
    }

    pub fn routing(&self) -> LfoRouting {
        self.routing
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            let (lfo, _) = self.osc.next_sample(self.frequency, ctx.sample_rate);
            *sample = match self.routing {
                LfoRouting::Amplitude => tremolo_gain(lfo, self.depth),
                LfoRouting::Filter => filter_factor(lfo, self.depth),
                LfoRouting::Pitch => pitch_factor(lfo, self.depth),
            };
        }
    }

    fn reset(&mut self) {
        self.osc.reset_phase();
    }
}
