// Error types for the settings bag

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Setting not found: {0}")]
    KeyNotFound(String),

    #[error("Setting {key} has the wrong type: expected {expected}")]
    InvalidType { key: String, expected: &'static str },

    #[error("Failed to load settings: {0}")]
    LoadError(String),

    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
