//! Error types and handling
//!
//! Errors surfaced to the caller of `start`/`stop`, and their bridge form.

use crate::capture::error::PlatformError;
use crate::capture::traits::Permission;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing recorder error
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Activity is null")]
    ActivityUnavailable,

    #[error("Permissions requested: {0:?}. Start again once granted")]
    PermissionRequested(Vec<Permission>),

    #[error("Permission denied: {0:?}")]
    PermissionDenied(Vec<Permission>),

    #[error("Screen capture permission denied")]
    CaptureDenied,

    #[error("Failed to prepare MediaRecorder: {0}")]
    PrepareError(String),

    #[error("Failed to stop MediaRecorder: {0}")]
    StopError(String),

    #[error("MediaRecorder is null")]
    RecorderNotActive,

    #[error("A recording session is already active")]
    AlreadyActive,

    #[error("No capture token request is pending")]
    UnexpectedTokenResult,

    #[error("Recording session was torn down before it started")]
    SessionAborted,

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Stable code reported across the bridge
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::ActivityUnavailable => "ACTIVITY_NULL",
            RecorderError::PermissionRequested(_) => "PERMISSION_REQUESTED",
            RecorderError::PermissionDenied(_) => "PERMISSION_DENIED",
            RecorderError::CaptureDenied => "CAPTURE_DENIED",
            RecorderError::PrepareError(_) => "PREPARE_ERROR",
            RecorderError::StopError(_) => "STOP_ERROR",
            RecorderError::RecorderNotActive => "RECORDER_NULL",
            RecorderError::AlreadyActive => "SESSION_ACTIVE",
            RecorderError::UnexpectedTokenResult => "TOKEN_RESULT_UNEXPECTED",
            RecorderError::SessionAborted => "SESSION_ABORTED",
            RecorderError::Platform(_) => "PLATFORM_ERROR",
            RecorderError::Io(_) => "IO_ERROR",
        }
    }
}

/// Error response for the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<RecorderError> for ErrorResponse {
    fn from(error: RecorderError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using RecorderError
pub type RecorderResult<T> = Result<T, RecorderError>;
