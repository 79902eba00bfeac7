//! Capability set for hosts without screen-capture services
//!
//! Desktop builds of the shell have no media projection, so `start` stops at
//! the foreground-context check and reports `ACTIVITY_NULL`.

use super::error::{PlatformError, PlatformResult};
use super::traits::{
    CaptureToken, CaptureTokenBroker, Encoder, EncoderService, Permission, PermissionProvider,
    PermissionState, TokenPayload,
};
use crate::presence::{NotificationAnnouncer, NotificationHost, NotificationSpec};
use crate::recorder::{Providers, TokenReply};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    pub fn providers(notification: NotificationSpec) -> Providers {
        let platform = Arc::new(UnsupportedPlatform);
        Providers {
            permissions: platform.clone(),
            tokens: platform.clone(),
            encoders: platform.clone(),
            announcer: Arc::new(NotificationAnnouncer::new(platform, notification)),
        }
    }
}

#[async_trait]
impl PermissionProvider for UnsupportedPlatform {
    fn has_foreground_context(&self) -> bool {
        false
    }

    fn check(&self, _permission: Permission) -> PlatformResult<PermissionState> {
        Err(PlatformError::Unsupported)
    }

    async fn request(
        &self,
        _permissions: &[Permission],
    ) -> PlatformResult<Vec<(Permission, PermissionState)>> {
        Err(PlatformError::Unsupported)
    }
}

impl CaptureTokenBroker for UnsupportedPlatform {
    fn request_token(&self, _reply: TokenReply) -> PlatformResult<()> {
        Err(PlatformError::Unsupported)
    }

    fn materialize(&self, _payload: TokenPayload) -> PlatformResult<Box<dyn CaptureToken>> {
        Err(PlatformError::Unsupported)
    }
}

impl EncoderService for UnsupportedPlatform {
    fn create(&self) -> PlatformResult<Box<dyn Encoder>> {
        Err(PlatformError::Unsupported)
    }
}

impl NotificationHost for UnsupportedPlatform {
    fn create_channel(&self, _spec: &NotificationSpec) -> PlatformResult<()> {
        Err(PlatformError::Unsupported)
    }

    fn post_foreground(&self, _spec: &NotificationSpec) -> PlatformResult<()> {
        Err(PlatformError::Unsupported)
    }

    fn cancel(&self, _notification_id: i32) -> PlatformResult<()> {
        Ok(())
    }
}
