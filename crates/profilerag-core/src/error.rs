use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedder not initialized; call initialize() first")]
    EmbedderNotReady,

    #[error("Vector index not available: {0}")]
    IndexUnavailable(String),

    #[error("Dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation backend failed: {0}")]
    Generation(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index operation failed: {0}")]
    Index(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Corpus error: {0}")]
    Corpus(String),
}

/// Closed tag for branching on an error without inspecting its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmbedderNotReady,
    IndexUnavailable,
    DimensionMismatch,
    Generation,
    Embedding,
    Index,
    InvalidInput,
    InvalidConfig,
    Corpus,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmbedderNotReady => ErrorKind::EmbedderNotReady,
            Error::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Embedding(_) => ErrorKind::Embedding,
            Error::Index(_) => ErrorKind::Index,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Corpus(_) => ErrorKind::Corpus,
        }
    }

    /// Fatal errors are surfaced to the caller; only generation failures are
    /// absorbed by the engine.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Generation)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
