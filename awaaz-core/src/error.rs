use thiserror::Error;

/// All errors produced by awaaz-core.
#[derive(Debug, Error)]
pub enum AwaazError {
    #[error("speech engine initialization failed: {0}")]
    EngineInit(String),

    #[error("speech engine is not ready")]
    EngineNotReady,

    #[error("speak invocation rejected: {0}")]
    SpeakRejected(String),

    #[error("announcement pipeline has shut down")]
    PipelineClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AwaazError>;
