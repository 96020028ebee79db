use serde::Serialize;
use thiserror::Error;

pub const INVALID_FILE_TYPE_MESSAGE: &str = "Please upload a valid file type: .csv, .json, or .xlsx";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading file. Please try again.";

/// Broad failure class, used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::UnsupportedFileType(_) => ErrorKind::Validation,
            UploadError::Request(_) | UploadError::Status(_) | UploadError::MalformedResponse(_) => {
                ErrorKind::Transport
            }
        }
    }

    /// The fixed advisory string shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => INVALID_FILE_TYPE_MESSAGE,
            ErrorKind::Transport => UPLOAD_FAILED_MESSAGE,
        }
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::MalformedResponse(err.to_string())
    }
}

/// Error returned across the IPC boundary.
#[derive(Debug, Serialize, Error)]
#[error("{message}")]
pub struct AppError {
    pub message: String,
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { message: msg }
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError {
            message: msg.to_string(),
        }
    }
}
