//! Low-level DSP primitives used by the graph nodes and voices.
//!
//! These components are allocation-free once constructed and know nothing
//! about notes or scheduling; they only do signal math.

/// Attack/decay/sustain/release shapes written onto automation timelines.
pub mod envelope;
/// Resonant low-pass state-variable filter.
pub mod filter;
/// LFO depth mappings for tremolo, wah and vibrato.
pub mod lfo;
/// Summing and gain helpers.
pub mod mix;
/// Block-rate modulation helpers.
pub mod modulate;
/// Oscillator waveforms and noise sources.
pub mod oscillator;
/// Sample-accurate parameter automation.
pub mod param;

pub use envelope::Adsr;
pub use oscillator::Waveform;
pub use param::AudioParam;
