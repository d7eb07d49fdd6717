use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The audio subsystem is absent, blocked, or was never initialised.
    #[error("audio unavailable: {reason}")]
    AudioUnavailable { reason: String },

    /// The sequence file is not valid JSON of the expected shape.
    #[error("malformed sequence file")]
    Sequence(#[from] serde_json::Error),

    /// The sequence file parsed but can't be played.
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),
}

impl EngineError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        EngineError::AudioUnavailable {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
