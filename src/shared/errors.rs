use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a failure belongs in the user-facing taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty, oversized or unreadable upload
    Validation,
    /// Missing or rejected API keys
    Credentials,
    /// Network failure, non-success response or malformed model output
    Remote,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Credentials => "credentials",
            ErrorKind::Remote => "remote",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("The uploaded file is empty")]
    EmptyUpload,

    #[error("Unsupported file type: {0}. Accepted: jpg, jpeg, png")]
    UnsupportedExtension(String),

    #[error("File too large: {size} bytes. Maximum: {max} bytes")]
    UploadTooLarge { size: usize, max: usize },

    #[error("The uploaded file is not a readable JPEG or PNG image: {0}")]
    UnreadableImage(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("{service} rejected the credentials: {message}")]
    Unauthorized { service: &'static str, message: String },

    #[error("Image hosting failed: {0}")]
    Hosting(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::EmptyUpload
            | AppError::UnsupportedExtension(_)
            | AppError::UploadTooLarge { .. }
            | AppError::UnreadableImage(_) => ErrorKind::Validation,
            AppError::MissingCredential(_) | AppError::Unauthorized { .. } => {
                ErrorKind::Credentials
            }
            AppError::Hosting(_)
            | AppError::Inference(_)
            | AppError::MalformedOutput(_)
            | AppError::Configuration(_)
            | AppError::IoError(_)
            | AppError::SerializationError(_) => ErrorKind::Remote,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
