//! Capability provider errors
//!
//! Failures reported by the platform services behind the capture traits.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Screen capture is not supported on this platform")]
    Unsupported,

    #[error("Platform rejected the request: {0}")]
    Rejected(String),

    #[error("Bridge call failed: {0}")]
    Bridge(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;
