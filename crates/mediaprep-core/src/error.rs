//! Error types module
//!
//! `MediaError` covers failures while deriving new content from a resource. None of
//! these reach the caller of a transform: the processing layer recovers from them and
//! reports them through logging, using `log_level` to pick the severity.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like non-image bytes behind an image mime type
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image decoding failed: {0}")]
    Decode(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Resource data missing: {0}")]
    MissingData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl MediaError {
    pub fn log_level(&self) -> LogLevel {
        match self {
            MediaError::Decode(_) | MediaError::MissingData(_) => LogLevel::Debug,
            MediaError::Encode(_) | MediaError::InvalidInput(_) | MediaError::Io(_) => {
                LogLevel::Warn
            }
            MediaError::Task(_) => LogLevel::Error,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            MediaError::Decode(_) => "DECODE_FAILED",
            MediaError::Encode(_) => "ENCODE_FAILED",
            MediaError::MissingData(_) => "MISSING_DATA",
            MediaError::InvalidInput(_) => "INVALID_INPUT",
            MediaError::Io(_) => "IO_ERROR",
            MediaError::Task(_) => "TASK_FAILED",
        }
    }
}

pub type MediaResult<T> = Result<T, MediaError>;
