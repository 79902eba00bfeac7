//! Foreground presence announcer
//!
//! Posts the persistent notification the platform requires before it will
//! show the screen-capture dialog, and removes it when the session ends.

use crate::capture::error::PlatformResult;
use crate::capture::traits::ForegroundAnnouncer;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Notification channel and content for the foreground service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSpec {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
    pub notification_id: i32,
    pub title: String,
    pub text: String,
}

impl Default for NotificationSpec {
    fn default() -> Self {
        Self {
            channel_id: "ScreenRecordingChannel".to_string(),
            channel_name: "Screen Recording Service".to_string(),
            channel_description: "Foreground service for screen recording".to_string(),
            notification_id: 1,
            title: "Screen Recording Service".to_string(),
            text: "Recording screen...".to_string(),
        }
    }
}

/// Notification subsystem of the host OS
pub trait NotificationHost: Send + Sync {
    /// Register the notification channel. Called once per announcer.
    fn create_channel(&self, spec: &NotificationSpec) -> PlatformResult<()>;

    /// Enter the foreground with a persistent notification
    fn post_foreground(&self, spec: &NotificationSpec) -> PlatformResult<()>;

    fn cancel(&self, notification_id: i32) -> PlatformResult<()>;
}

#[derive(Debug, Default)]
struct PresenceState {
    channel_created: bool,
    posted: bool,
}

/// [`ForegroundAnnouncer`] backed by a persistent notification
pub struct NotificationAnnouncer {
    host: Arc<dyn NotificationHost>,
    spec: NotificationSpec,
    state: Mutex<PresenceState>,
}

impl NotificationAnnouncer {
    pub fn new(host: Arc<dyn NotificationHost>, spec: NotificationSpec) -> Self {
        Self {
            host,
            spec,
            state: Mutex::new(PresenceState::default()),
        }
    }

    /// Whether the foreground notification is currently posted
    #[cfg(test)]
    pub fn is_announced(&self) -> bool {
        self.state.lock().posted
    }
}

impl ForegroundAnnouncer for NotificationAnnouncer {
    fn announce(&self) -> PlatformResult<()> {
        let mut state = self.state.lock();

        if !state.channel_created {
            self.host.create_channel(&self.spec)?;
            state.channel_created = true;
            tracing::debug!("Created notification channel {}", self.spec.channel_id);
        }

        if state.posted {
            return Ok(());
        }

        self.host.post_foreground(&self.spec)?;
        state.posted = true;
        tracing::info!("Foreground presence announced");
        Ok(())
    }

    fn retract(&self) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if !state.posted {
            return Ok(());
        }

        self.host.cancel(self.spec.notification_id)?;
        state.posted = false;
        tracing::info!("Foreground presence retracted");
        Ok(())
    }
}
