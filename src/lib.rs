pub mod dsp; // Per-sample primitives and automation
pub mod engine; // Clock, scheduler, transport and the owning engine context
pub mod error;
pub mod graph; // Render-ready nodes
pub mod sequencing; // Recorded notes, tempo and editing
pub mod synth; // Voices and their lifetime

pub use engine::{AudioEngine, EngineConfig, EngineStatus};
pub use error::{EngineError, Result};
pub use synth::{SynthParams, VoiceHandle};

/// Largest block the engine is asked to render in one call.
pub const MAX_BLOCK_SIZE: usize = 2048;
