//! Benchmarks for automation timeline evaluation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tabsynth::dsp::envelope::Adsr;
use tabsynth::dsp::param::AudioParam;

use crate::BLOCK_SIZES;

pub fn bench_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/param");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Gain mid-decay: the common case for a held note
        let mut gain = AudioParam::new(0.0);
        Adsr::new(0.01, 0.5, 0.6, 0.3).schedule_onset(&mut gain, 0.0, 0.0, 1.0, 0.6);
        group.bench_with_input(BenchmarkId::new("adsr_decay", size), &size, |b, _| {
            b.iter(|| gain.render(black_box(&mut buffer), black_box(0.1), 48_000.0))
        });

        let mut glide = AudioParam::new(440.0);
        glide.set_value_at_time(220.0, 0.0);
        glide.exponential_ramp_to_value_at_time(440.0, 1.0);
        group.bench_with_input(BenchmarkId::new("exponential_glide", size), &size, |b, _| {
            b.iter(|| glide.render(black_box(&mut buffer), black_box(0.5), 48_000.0))
        });
    }

    group.finish();
}
