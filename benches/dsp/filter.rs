//! Benchmarks for the state-variable low-pass and the parallel filter bank.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tabsynth::dsp::envelope::Adsr;
use tabsynth::dsp::filter::SVFilter;
use tabsynth::graph::{FilterBank, GraphNode, RenderCtx};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::new(48_000.0, 0.0);

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp as test signal
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = SVFilter::lowpass(1000.0, 2.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), 48_000.0);
            })
        });

        // Two parallel stages with a cutoff envelope, rendered per control block
        let mut bank = FilterBank::bypass()
            .with_lowpass(800.0, 1.0, 0.5)
            .with_lowpass(2400.0, 4.0, 0.5);
        bank.schedule_envelope(&Adsr::new(0.01, 0.3, 0.5, 0.3), 0.5, 0.0);
        group.bench_with_input(BenchmarkId::new("bank_24db", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                bank.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
