use serde::{Deserialize, Serialize};

use crate::dsp::envelope::Adsr;
use crate::dsp::mix::{apply_gain_curve, sum_in_place, sum_scaled_in_place};
use crate::dsp::modulate::CONTROL_BLOCK;
use crate::dsp::param::AudioParam;
use crate::graph::{
    FilterBank, GraphNode, LfoNode, LfoRouting, NoiseNode, OscNode, OscPair, RenderCtx, DRONE_HZ,
};
use crate::synth::params::{OscillatorParams, SynthParams};

/*
Voice Signal Chain
==============================

One voice is one note. It is built from `SynthParams` when the note starts and
never changes shape afterwards:

   ┌ sub-voice 0: OscPair(osc1, osc2) ─ ×1/N ┐
   │ sub-voice 1: OscPair(osc1, osc2) ─ ×1/N ├─▶ Σ ─▶ FilterBank ─▶ × gain ─▶ out
   │ ...                                     │     (0, 1 or 2 LPF
   └ noise (once per voice) ─────────────────┘      in parallel)

  frequency ──(glide)──▶ × vibrato ──▶ every OscPair
  LFO ─────────▶ exactly one of: gain (tremolo), cutoff (wah), pitch (vibrato)

Unison copies are spread symmetrically around the played pitch:

    offset_i = (i − (N−1)/2) × detune_cents        N = 4, 10¢: −15 −5 +5 +15

and each is pre-scaled by 1/N so loudness does not depend on N.

Lifecycle:
----------

    Starting ──(attack+decay elapsed)──▶ Sustaining
        │                                   │
        └────────────── release(at) ────────┴──▶ Releasing ──▶ Disposed

Releasing captures the gain's current value, ramps it to RELEASE_FLOOR (never
literal zero) over the release time, and ramps every cutoff back to its base.
A voice is never resurrected: a second release is refused. Disposal itself is
the engine's job, once the release tail plus a safety margin has rendered.
*/

/// Gain a released voice ramps toward.
pub const RELEASE_FLOOR: f32 = 1.0e-4;

/// Opaque reference to a voice owned by `VoiceEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceHandle(pub(crate) u64);

impl VoiceHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Starting,   // Attack or decay in progress
    Sustaining, // Holding the sustain level
    Releasing,  // Release ramp scheduled
    Disposed,   // Torn down by the engine
}

fn osc_node(params: &OscillatorParams) -> OscNode {
    let node = OscNode::new(params.waveform)
        .with_pulse_width(params.pulse_width.unwrap_or(0.5))
        .with_detune_semitones(params.detune_semitones)
        .with_level(params.mix_level);
    if params.track_keyboard {
        node
    } else {
        node.with_frequency(DRONE_HZ)
    }
}

pub struct Voice {
    sub_voices: Vec<OscPair>,
    sub_gain: f32,
    noise: Option<NoiseNode>,
    filters: FilterBank,
    lfo: LfoNode,
    gain: AudioParam,
    frequency: AudioParam,
    frequency_hz: f32,
    start_time: f64,
    onset_end: f64,
    release: f32,
    released_at: Option<f64>,
    release_end: Option<f64>,

    // Scratch, one control block each
    lfo_buf: [f32; CONTROL_BLOCK],
    pitch_buf: [f32; CONTROL_BLOCK],
    mix_buf: [f32; CONTROL_BLOCK],
    sub_buf: [f32; CONTROL_BLOCK],
    gain_buf: [f32; CONTROL_BLOCK],
}

impl Voice {
    /// Build the chain for `frequency` starting at clock time `t0`.
    ///
    /// `glide_from` is where a glide starts; `None` glides up from nothing.
    /// `params` are expected to be sanitized.
    pub fn new(frequency: f32, params: &SynthParams, t0: f64, glide_from: Option<f32>) -> Self {
        let count = params.sub_voice_count();
        let sub_voices = (0..count)
            .map(|i| {
                OscPair::new(osc_node(&params.osc1), osc_node(&params.osc2))
                    .with_hard_sync(params.osc2.hard_sync)
                    .with_spread_cents(params.unison_offset_cents(i, count))
            })
            .collect();

        let noise = params
            .noise
            .enabled
            .then(|| NoiseNode::new(params.noise.mix_level));

        let sustain = params.amp_envelope.sustain;
        let mut filters = params
            .filters
            .iter()
            .fold(FilterBank::bypass(), |bank, f| {
                bank.with_lowpass(f.cutoff_hz, f.resonance_q, f.envelope_amount)
            });
        filters.schedule_envelope(&params.filter_envelope, sustain, t0);

        let lfo = LfoNode::new(
            params.lfo.waveform,
            params.lfo.frequency_hz,
            params.lfo.depth,
            params.lfo.routing,
        );

        let mut gain = AudioParam::new(0.0);
        params
            .amp_envelope
            .schedule_onset(&mut gain, t0, 0.0, 1.0, sustain);

        let mut pitch = AudioParam::new(frequency);
        if params.glide.enabled && params.glide.time_secs > 0.0 {
            pitch.set_value_at_time(glide_from.unwrap_or(0.0), t0);
            pitch.exponential_ramp_to_value_at_time(frequency, t0 + params.glide.time_secs as f64);
        } else {
            pitch.set_value_at_time(frequency, t0);
        }

        Self {
            sub_voices,
            sub_gain: 1.0 / count as f32,
            noise,
            filters,
            lfo,
            gain,
            frequency: pitch,
            frequency_hz: frequency,
            start_time: t0,
            onset_end: t0 + params.amp_envelope.onset_duration() as f64,
            release: params.amp_envelope.release,
            released_at: None,
            release_end: None,
            lfo_buf: [1.0; CONTROL_BLOCK],
            pitch_buf: [0.0; CONTROL_BLOCK],
            mix_buf: [0.0; CONTROL_BLOCK],
            sub_buf: [0.0; CONTROL_BLOCK],
            gain_buf: [0.0; CONTROL_BLOCK],
        }
    }

    /// Schedule the release at clock time `at`.
    ///
    /// Returns false if the voice was already released.
    pub fn release(&mut self, at: f64, release_override: Option<f32>) -> bool {
        if self.released_at.is_some() {
            return false;
        }
        let at = at.max(self.start_time);
        let release = release_override.unwrap_or(self.release).max(0.0);

        Adsr::schedule_release(&mut self.gain, at, RELEASE_FLOOR, release);
        self.filters.schedule_release(at, release);

        self.released_at = Some(at);
        self.release_end = Some(at + release as f64);
        true
    }

    /// Fade out within `release` seconds of `at`, even if already releasing.
    ///
    /// A release that would already finish sooner is left alone. Returns the
    /// clock time the voice is silent.
    pub fn silence(&mut self, at: f64, release: f32) -> f64 {
        let at = at.max(self.start_time);
        let end = at + release.max(0.0) as f64;
        if let Some(current) = self.release_end.filter(|&current| current <= end) {
            return current;
        }

        Adsr::schedule_release(&mut self.gain, at, RELEASE_FLOOR, release.max(0.0));
        self.filters.schedule_release(at, release.max(0.0));
        self.released_at.get_or_insert(at);
        self.release_end = Some(end);
        end
    }

    /// Clock time the release ramp finishes, once released.
    pub fn release_end(&self) -> Option<f64> {
        self.release_end
    }

    pub fn state_at(&self, now: f64) -> VoiceState {
        if self.released_at.is_some() {
            VoiceState::Releasing
        } else if now < self.onset_end {
            VoiceState::Starting
        } else {
            VoiceState::Sustaining
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn sub_voice_count(&self) -> usize {
        self.sub_voices.len()
    }

    /// Output gain at `time`, before tremolo.
    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    /// Oscillator frequency at `time`, before vibrato.
    pub fn frequency_at(&self, time: f64) -> f32 {
        self.frequency.value_at(time)
    }

    /// Render and ADD this voice into `out`, whose first sample is at `start_time`.
    pub fn render_add(&mut self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        let mut offset = 0;
        for chunk in out.chunks_mut(CONTROL_BLOCK) {
            let n = chunk.len();
            let t = start_time + offset as f64 * dt;
            offset += n;

            // Nothing to do until the note begins
            if t + n as f64 * dt <= self.start_time {
                continue;
            }
            self.render_chunk(chunk, t, sample_rate);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32], t: f64, sample_rate: f32) {
        let n = out.len();
        let dt = 1.0 / sample_rate as f64;
        let routing = self.lfo.routing();

        let ctx = RenderCtx::new(sample_rate, t);
        self.lfo.render_block(&mut self.lfo_buf[..n], &ctx);

        for i in 0..n {
            let vibrato = if routing == LfoRouting::Pitch {
                self.lfo_buf[i]
            } else {
                1.0
            };
            self.pitch_buf[i] = self.frequency.value_at(t + i as f64 * dt) * vibrato;
        }

        let mix = &mut self.mix_buf[..n];
        mix.fill(0.0);
        let ctx = RenderCtx::with_pitch(sample_rate, t, &self.pitch_buf[..n]);
        for pair in &mut self.sub_voices {
            pair.render_block(&mut self.sub_buf[..n], &ctx);
            sum_scaled_in_place(mix, &self.sub_buf[..n], self.sub_gain);
        }
        if let Some(noise) = self.noise.as_mut() {
            noise.render_block(&mut self.sub_buf[..n], &ctx);
            sum_in_place(mix, &self.sub_buf[..n]);
        }

        if routing == LfoRouting::Filter {
            self.filters.set_cutoff_modulation(&self.lfo_buf[..n]);
        }
        self.filters.render_block(mix, &ctx);

        for i in 0..n {
            let tremolo = if routing == LfoRouting::Amplitude {
                self.lfo_buf[i]
            } else {
                1.0
            };
            self.gain_buf[i] = self.gain.value_at(t + i as f64 * dt) * tremolo;
        }
        apply_gain_curve(mix, &self.gain_buf[..n]);
        sum_in_place(out, mix);
    }
}
