//! Benchmarks for DSP primitives and engine scenarios.
//!
//! Run with: cargo bench
//!
//! Every render must finish well inside its real-time deadline.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Primitives (oscillator, filter, automation)
//!   - scenarios/*  Full voices, polyphony and scheduled playback

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_param,
    scenarios::bench_voices,
    scenarios::bench_playback,
);
criterion_main!(benches);
