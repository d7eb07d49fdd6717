use serde::{Deserialize, Serialize};

use crate::dsp::{envelope::Adsr, oscillator::Waveform};
use crate::graph::lfo::LfoRouting;

/// Most filters a voice runs in parallel.
pub const MAX_FILTERS: usize = 2;
/// Most unison copies a voice builds.
pub const MAX_UNISON_VOICES: usize = 8;

/// Clamp `value` into `[min, max]`, logging when it had to move.
///
/// Non-finite input falls back to `fallback`.
fn clamp_logged(name: &str, value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    let clamped = if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    };
    if clamped != value {
        log::debug!("{name} {value} out of range, using {clamped}");
    }
    clamped
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    /// Duty cycle for the square waveform. `None` means 0.5.
    pub pulse_width: Option<f32>,
    pub detune_semitones: f32,
    pub mix_level: f32,
    pub track_keyboard: bool,
    /// Restart this oscillator whenever oscillator 1 wraps. Only read on oscillator 2.
    pub hard_sync: bool,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            pulse_width: None,
            detune_semitones: 0.0,
            mix_level: 0.8,
            track_keyboard: true,
            hard_sync: false,
        }
    }
}

impl OscillatorParams {
    fn sanitized(self) -> Self {
        Self {
            pulse_width: self
                .pulse_width
                .map(|w| clamp_logged("pulse_width", w, 0.01, 0.99, 0.5)),
            detune_semitones: clamp_logged("detune_semitones", self.detune_semitones, -48.0, 48.0, 0.0),
            mix_level: clamp_logged("mix_level", self.mix_level, 0.0, 1.0, 0.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub enabled: bool,
    pub mix_level: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            enabled: false,
            mix_level: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub cutoff_hz: f32,
    pub resonance_q: f32,
    /// Fraction of the cutoff the filter envelope adds at its peak.
    pub envelope_amount: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff_hz: 2_000.0,
            resonance_q: 1.0,
            envelope_amount: 0.5,
        }
    }
}

impl FilterParams {
    fn sanitized(self) -> Self {
        Self {
            cutoff_hz: clamp_logged("cutoff_hz", self.cutoff_hz, 20.0, 20_000.0, 2_000.0),
            resonance_q: clamp_logged("resonance_q", self.resonance_q, 0.1, 30.0, 1.0),
            envelope_amount: clamp_logged("envelope_amount", self.envelope_amount, 0.0, 1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoParams {
    pub routing: LfoRouting,
    pub waveform: Waveform,
    pub frequency_hz: f32,
    pub depth: f32,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            routing: LfoRouting::Amplitude,
            waveform: Waveform::Sine,
            frequency_hz: 5.0,
            depth: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideParams {
    pub enabled: bool,
    pub time_secs: f32,
}

impl Default for GlideParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time_secs: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnisonParams {
    pub enabled: bool,
    pub voice_count: usize,
    /// Spacing between neighbouring copies, in cents.
    pub detune_cents: f32,
}

impl Default for UnisonParams {
    fn default() -> Self {
        Self {
            enabled: false,
            voice_count: 3,
            detune_cents: 10.0,
        }
    }
}

/// Everything a voice needs to build its signal chain.
///
/// Deserialises with every field optional; missing fields take the defaults
/// below. Call `sanitized` (the engine does) before building a voice.
///
/// Default patch: a sawtooth over a quieter square, one low-pass at 2 kHz with
/// half-depth envelope, short pluck-like amplitude envelope, LFO at zero depth,
/// glide and unison off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub osc1: OscillatorParams,
    pub osc2: OscillatorParams,
    pub noise: NoiseParams,
    pub filters: Vec<FilterParams>,
    pub amp_envelope: Adsr,
    /// Attack and decay times shape the cutoff. Its decay floor uses the
    /// amplitude envelope's sustain fraction.
    pub filter_envelope: Adsr,
    pub lfo: LfoParams,
    pub glide: GlideParams,
    pub unison: UnisonParams,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            osc1: OscillatorParams::default(),
            osc2: OscillatorParams {
                waveform: Waveform::Square,
                mix_level: 0.4,
                ..OscillatorParams::default()
            },
            noise: NoiseParams::default(),
            filters: vec![FilterParams::default()],
            amp_envelope: Adsr::default(),
            filter_envelope: Adsr::new(0.01, 0.3, 0.5, 0.3),
            lfo: LfoParams::default(),
            glide: GlideParams::default(),
            unison: UnisonParams::default(),
        }
    }
}

impl SynthParams {
    /// Clamp every field into its valid range.
    pub fn sanitized(mut self) -> Self {
        if self.filters.len() > MAX_FILTERS {
            log::debug!(
                "{} filters requested, keeping the first {MAX_FILTERS}",
                self.filters.len()
            );
            self.filters.truncate(MAX_FILTERS);
        }

        Self {
            osc1: self.osc1.sanitized(),
            osc2: self.osc2.sanitized(),
            noise: NoiseParams {
                mix_level: clamp_logged("noise.mix_level", self.noise.mix_level, 0.0, 1.0, 0.0),
                ..self.noise
            },
            filters: self.filters.into_iter().map(FilterParams::sanitized).collect(),
            amp_envelope: self.amp_envelope.sanitized(),
            filter_envelope: self.filter_envelope.sanitized(),
            lfo: LfoParams {
                frequency_hz: clamp_logged("lfo.frequency_hz", self.lfo.frequency_hz, 0.0, 50.0, 5.0),
                depth: clamp_logged("lfo.depth", self.lfo.depth, 0.0, 1.0, 0.0),
                ..self.lfo
            },
            glide: GlideParams {
                time_secs: clamp_logged("glide.time_secs", self.glide.time_secs, 0.0, 10.0, 0.0),
                ..self.glide
            },
            unison: UnisonParams {
                voice_count: {
                    let count = self.unison.voice_count.clamp(1, MAX_UNISON_VOICES);
                    if count != self.unison.voice_count {
                        log::debug!(
                            "unison.voice_count {} out of range, using {count}",
                            self.unison.voice_count
                        );
                    }
                    count
                },
                detune_cents: clamp_logged("unison.detune_cents", self.unison.detune_cents, 0.0, 100.0, 10.0),
                ..self.unison
            },
        }
    }

    /// Number of oscillator pairs a voice built from these params runs.
    pub fn sub_voice_count(&self) -> usize {
        if self.unison.enabled {
            self.unison.voice_count.clamp(1, MAX_UNISON_VOICES)
        } else {
            1
        }
    }

    /// Cents offset of unison copy `index` out of `count`, centred on zero.
    pub fn unison_offset_cents(&self, index: usize, count: usize) -> f32 {
        let centre = (count as f32 - 1.0) / 2.0;
        (index as f32 - centre) * self.unison.detune_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let params: SynthParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, SynthParams::default());
    }

    #[test]
    fn partial_json_fills_missing_fields() {
        let params: SynthParams = serde_json::from_str(
            r#"{ "lfo": { "routing": "pitch", "depth": 0.5 }, "osc1": { "waveform": "sine" } }"#,
        )
        .unwrap();
        assert_eq!(params.lfo.routing, LfoRouting::Pitch);
        assert_eq!(params.lfo.frequency_hz, 5.0);
        assert_eq!(params.osc1.waveform, Waveform::Sine);
        assert!(params.osc1.track_keyboard);
    }

    #[test]
    fn sanitized_clamps_every_range() {
        let mut params = SynthParams::default();
        params.osc1.mix_level = 4.0;
        params.osc2.pulse_width = Some(0.0);
        params.filters = vec![FilterParams::default(); 3];
        params.filters[0].cutoff_hz = -10.0;
        params.amp_envelope.attack = -1.0;
        params.lfo.depth = f32::NAN;
        params.unison.voice_count = 0;

        let clean = params.sanitized();
        assert_eq!(clean.osc1.mix_level, 1.0);
        assert_eq!(clean.osc2.pulse_width, Some(0.01));
        assert_eq!(clean.filters.len(), MAX_FILTERS);
        assert_eq!(clean.filters[0].cutoff_hz, 20.0);
        assert_eq!(clean.amp_envelope.attack, 0.0);
        assert_eq!(clean.lfo.depth, 0.0);
        assert_eq!(clean.unison.voice_count, 1);
    }

    #[test]
    fn unison_offsets_are_symmetric() {
        let mut params = SynthParams::default();
        params.unison.enabled = true;
        params.unison.voice_count = 4;
        params.unison.detune_cents = 10.0;

        let offsets: Vec<f32> = (0..4).map(|i| params.unison_offset_cents(i, 4)).collect();
        assert_eq!(offsets, vec![-15.0, -5.0, 5.0, 15.0]);
        assert_eq!(params.sub_voice_count(), 4);

        params.unison.enabled = false;
        assert_eq!(params.sub_voice_count(), 1);
    }
}
