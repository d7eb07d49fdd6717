//! Benchmarks for complete voice chains.
//!
//! From a plain two-oscillator voice up to an 8-voice unison patch with two
//! filters, noise and vibrato.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tabsynth::graph::LfoRouting;
use tabsynth::synth::{SynthParams, Voice, VoiceEngine};

use crate::BLOCK_SIZES;

fn thick_params() -> SynthParams {
    let mut params = SynthParams::default();
    params.unison.enabled = true;
    params.unison.voice_count = 8;
    params.noise.enabled = true;
    params.filters.push(params.filters[0].clone());
    params.lfo.routing = LfoRouting::Pitch;
    params.lfo.depth = 0.3;
    params.sanitized()
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let block_secs = size as f64 / sample_rate as f64;

        // Baseline: default saw + square through one filter
        let mut plain = Voice::new(110.0, &SynthParams::default(), 0.0, None);
        let mut t = 0.0;
        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                plain.render_add(black_box(&mut buffer), t, sample_rate);
                t += block_secs;
            })
        });

        let mut thick = Voice::new(110.0, &thick_params(), 0.0, None);
        let mut t = 0.0;
        group.bench_with_input(BenchmarkId::new("unison_8", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                thick.render_add(black_box(&mut buffer), t, sample_rate);
                t += block_secs;
            })
        });

        // A six-note chord of default voices
        let mut engine = VoiceEngine::new(sample_rate, 0.1);
        for freq in [82.41, 110.0, 146.83, 196.0, 246.94, 329.63] {
            engine.start(freq, &SynthParams::default(), 0.0);
        }
        let mut t = 0.0;
        group.bench_with_input(BenchmarkId::new("chord_6", size), &size, |b, _| {
            b.iter(|| {
                engine.render(black_box(&mut buffer), t);
                t += block_secs;
            })
        });
    }

    group.finish();
}
