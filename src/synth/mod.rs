// Purpose: per-note signal chains and their lifetime
// This layer sits above graph nodes and owns every sounding voice

pub mod deferred;
pub mod engine;
pub mod message;
pub mod params;
pub mod voice;

pub use deferred::DeferredQueue;
pub use engine::VoiceEngine;
pub use message::{MessageReceiver, PerformanceMessage};
pub use params::SynthParams;
pub use voice::{Voice, VoiceHandle, VoiceState, RELEASE_FLOOR};
