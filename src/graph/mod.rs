//! Render-ready nodes built on the DSP primitives.
//!
//! Graph nodes add what a voice needs on top of the raw math: pitch that
//! follows the played note, hard sync, per-note phase resets, automated filter
//! cutoffs and routed LFO modulation. All of them render in blocks through the
//! `GraphNode` trait.

/// Parallel resonant low-pass bank with envelope-driven cutoffs.
pub mod filter;
/// Low frequency oscillator with exclusive routing.
pub mod lfo;
/// Core traits shared by all graph nodes.
pub mod node;
/// Keyboard-tracking oscillators, oscillator pairs and noise.
pub mod oscillator;

pub use filter::FilterBank;
pub use lfo::{LfoNode, LfoRouting};
pub use node::{GraphNode, RenderCtx};
pub use oscillator::{NoiseNode, OscNode, OscPair, DRONE_HZ};
