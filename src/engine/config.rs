use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dsp::envelope::Adsr;
use crate::dsp::oscillator::Waveform;
use crate::synth::params::SynthParams;

/// Metronome click settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub enabled: bool,
    /// Click pitch on the first beat of a bar.
    pub accent_hz: f32,
    pub beat_hz: f32,
    pub level: f32,
    pub click_secs: f32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            accent_hz: 1000.0,
            beat_hz: 800.0,
            level: 0.5,
            click_secs: 0.03,
        }
    }
}

impl MetronomeConfig {
    pub fn frequency(&self, accent: bool) -> f32 {
        if accent {
            self.accent_hz
        } else {
            self.beat_hz
        }
    }

    /// A short unfiltered sine blip.
    pub fn click_params(&self) -> SynthParams {
        let mut params = SynthParams::default();
        params.osc1.waveform = Waveform::Sine;
        params.osc1.mix_level = self.level;
        params.osc2.mix_level = 0.0;
        params.filters.clear();
        params.amp_envelope = Adsr::new(0.001, self.click_secs, 0.0, 0.01);
        params
    }
}

/// Engine-wide settings. Every field has a default, so a config file only
/// needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub lookahead_secs: f64,
    pub poll_interval_ms: u64,
    pub disposal_margin_secs: f64,
    pub panic_release_secs: f32,
    pub min_note_duration_secs: f64,
    pub bpm: f64,
    pub beats_per_bar: u32,
    pub bars: u32,
    pub master_gain: f32,
    pub history_limit: usize,
    pub metronome: MetronomeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            lookahead_secs: 0.1,
            poll_interval_ms: 25,
            disposal_margin_secs: 0.1,
            panic_release_secs: 0.005,
            min_note_duration_secs: 0.05,
            bpm: 120.0,
            beats_per_bar: 4,
            bars: 4,
            master_gain: 0.8,
            history_limit: 100,
            metronome: MetronomeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Set the preferred sample rate (hosts may override it).
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the tempo in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn lookahead(mut self, secs: f64) -> Self {
        self.lookahead_secs = secs;
        self
    }

    pub fn disposal_margin(mut self, secs: f64) -> Self {
        self.disposal_margin_secs = secs;
        self
    }

    pub fn bars(mut self, bars: u32) -> Self {
        self.bars = bars;
        self
    }

    pub fn master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    pub fn metronome(mut self, enabled: bool) -> Self {
        self.metronome.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "bpm": 90, "metronome": { "enabled": true } }"#)
            .expect("valid config");
        assert_eq!(config.bpm, 90.0);
        assert!(config.metronome.enabled);
        assert_eq!(config.metronome.accent_hz, 1000.0);
        assert_eq!(config.poll_interval(), Duration::from_millis(25));
    }

    #[test]
    fn builder_overrides_fields() {
        let config = EngineConfig::new().bpm(140.0).lookahead(0.05).metronome(true);
        assert_eq!(config.bpm, 140.0);
        assert_eq!(config.lookahead_secs, 0.05);
        assert!(config.metronome.enabled);
    }

    #[test]
    fn click_is_a_bare_sine() {
        let params = MetronomeConfig::default().click_params();
        assert!(params.filters.is_empty());
        assert_eq!(params.osc2.mix_level, 0.0);
        assert_eq!(params.amp_envelope.sustain, 0.0);
    }
}
