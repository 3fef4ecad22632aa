//! Central error type for the tile pipeline.

/// Everything that can go wrong between dispatch and scene insertion.
#[derive(thiserror::Error, Debug)]
pub enum TerrainError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Malformed tile key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Worker {worker} faulted on tile {key}: {message}")]
    WorkerFault {
        worker: usize,
        key: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerrainError {
    pub fn fetch<T: ToString>(msg: T) -> Self {
        TerrainError::Fetch(msg.to_string())
    }

    pub fn decode<T: ToString>(msg: T) -> Self {
        TerrainError::Decode(msg.to_string())
    }

    pub fn protocol<T: ToString>(msg: T) -> Self {
        TerrainError::Protocol(msg.to_string())
    }

    pub fn malformed_key<K: ToString, R: ToString>(key: K, reason: R) -> Self {
        TerrainError::MalformedKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for TerrainError {
    fn from(err: reqwest::Error) -> Self {
        TerrainError::Fetch(err.to_string())
    }
}

impl From<image::ImageError> for TerrainError {
    fn from(err: image::ImageError) -> Self {
        TerrainError::Decode(err.to_string())
    }
}

/// Result alias used across the crate.
pub type TerrainResult<T> = Result<T, TerrainError>;
