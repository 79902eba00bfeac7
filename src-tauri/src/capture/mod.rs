//! Platform capture services
//!
//! Capability traits for the services a recording needs, and their platform
//! implementations.

pub mod error;
pub mod traits;
pub mod unsupported;

#[cfg(all(feature = "shell", target_os = "android"))]
pub mod android;

#[cfg(test)]
pub(crate) mod testing;

// Re-export traits
pub use error::{PlatformError, PlatformResult};
pub use traits::{
    CaptureToken, CaptureTokenBroker, Encoder, EncoderConfig, EncoderService, ForegroundAnnouncer,
    Permission, PermissionProvider, PermissionState, SurfaceHandle, TokenOutcome, TokenPayload,
    VirtualDisplay, VirtualDisplaySpec,
};
pub use unsupported::UnsupportedPlatform;
