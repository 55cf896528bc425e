//! Error types for the repsense system.

use thiserror::Error;

use crate::types::Landmark;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Required landmark missing from frame: {landmark}")]
    MissingLandmark { landmark: Landmark },

    #[error("No person detected in frame")]
    NoPerson,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Observation stream ended")]
    StreamEnded,

    #[error("Observation source error: {0}")]
    Source(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand used by the threshold validators.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
