use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabrefError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    Security(String),
}

pub type Result<T> = std::result::Result<T, LabrefError>;
