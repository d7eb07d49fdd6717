//! Scenario benchmarks: whole voices and the engine driving them.

mod playback;
mod voices;

pub use playback::bench_playback;
pub use voices::bench_voices;
