//! Benchmarks for the band-unlimited oscillators and noise.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tabsynth::dsp::oscillator::{NoiseBlock, OscillatorBlock};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let shapes = [
            ("sine", OscillatorBlock::sine()),
            ("sawtooth", OscillatorBlock::sawtooth()),
            ("square", OscillatorBlock::square().with_pulse_width(0.3)),
            ("triangle", OscillatorBlock::triangle()),
        ];
        for (name, mut osc) in shapes {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer), black_box(440.0), 48_000.0))
            });
        }

        let mut noise = NoiseBlock::with_seed(7);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = noise.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
