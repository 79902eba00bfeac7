//! Capture trait definitions
//!
//! Capability interfaces for the platform services a capture session depends
//! on. The coordinator only ever holds trait objects, so every service can be
//! swapped for the Android bridge or a test fake.

use super::error::PlatformResult;
use crate::recorder::TokenReply;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime permissions a recording needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Microphone input for the audio track
    Microphone,
    /// Write access to the movies directory
    Storage,
}

impl Permission {
    /// Everything `start` checks before showing the capture dialog
    pub const REQUIRED: [Permission; 2] = [Permission::Microphone, Permission::Storage];
}

/// Answer from the permission broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; asking will show the OS prompt
    Prompt,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// Opaque grant data handed back by the capture dialog.
///
/// Only the token broker understands its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPayload(pub serde_json::Value);

/// Result of one capture-token request
#[derive(Debug, Clone, PartialEq)]
pub enum TokenOutcome {
    Granted(TokenPayload),
    Denied,
}

impl TokenOutcome {
    /// Build an outcome from the raw dialog result.
    ///
    /// A grant without payload cannot be materialized and counts as a denial.
    pub fn from_result(granted: bool, payload: Option<TokenPayload>) -> Self {
        match (granted, payload) {
            (true, Some(payload)) => TokenOutcome::Granted(payload),
            (true, None) => {
                tracing::warn!("Capture dialog reported a grant without token data");
                TokenOutcome::Denied
            }
            (false, _) => TokenOutcome::Denied,
        }
    }
}

/// Handle to the encoder's writable input surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoCodec {
    H264,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioCodec {
    Aac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioSource {
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoSource {
    /// Frames are drawn into the encoder's input surface
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Container {
    Mpeg4,
}

/// Encoder configuration.
///
/// There is no format negotiation: every session uses
/// [`EncoderConfig::screen_capture`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Target frame rate
    pub frame_rate: u32,

    /// Video bitrate in bits per second
    pub video_bitrate: u32,

    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub audio_source: AudioSource,
    pub video_source: VideoSource,
    pub container: Container,
}

impl EncoderConfig {
    pub const WIDTH: u32 = 1280;
    pub const HEIGHT: u32 = 720;
    pub const FRAME_RATE: u32 = 30;
    pub const VIDEO_BITRATE: u32 = 512 * 1000;

    /// The fixed 720p H.264/AAC MPEG-4 profile
    pub fn screen_capture() -> Self {
        Self {
            width: Self::WIDTH,
            height: Self::HEIGHT,
            frame_rate: Self::FRAME_RATE,
            video_bitrate: Self::VIDEO_BITRATE,
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
            audio_source: AudioSource::Mic,
            video_source: VideoSource::Surface,
            container: Container::Mpeg4,
        }
    }
}

/// Parameters of the virtual display mirroring the screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDisplaySpec {
    /// Display name shown by the compositor
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Density in dpi
    pub density_dpi: u32,
    /// Mirror the default display's content automatically
    pub auto_mirror: bool,
}

impl VirtualDisplaySpec {
    pub fn screen_mirror() -> Self {
        Self {
            name: "ScreenRecorder".to_string(),
            width: EncoderConfig::WIDTH,
            height: EncoderConfig::HEIGHT,
            density_dpi: 1,
            auto_mirror: true,
        }
    }
}

/// OS permission broker
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Whether a foreground UI context exists to anchor prompts and dialogs
    fn has_foreground_context(&self) -> bool;

    /// Current state of one permission, without prompting
    fn check(&self, permission: Permission) -> PlatformResult<PermissionState>;

    /// Show the OS prompt for `permissions` and wait for the user's answer
    async fn request(
        &self,
        permissions: &[Permission],
    ) -> PlatformResult<Vec<(Permission, PermissionState)>>;
}

/// Screen-capture token broker.
///
/// `request_token` only launches the platform dialog; the answer arrives later
/// through `reply`, exactly once.
pub trait CaptureTokenBroker: Send + Sync {
    fn request_token(&self, reply: TokenReply) -> PlatformResult<()>;

    /// Turn a granted payload into a live capture token
    fn materialize(&self, payload: TokenPayload) -> PlatformResult<Box<dyn CaptureToken>>;
}

/// A live screen-capture grant
pub trait CaptureToken: Send {
    /// Mirror the screen into `surface`
    fn create_virtual_display(
        &mut self,
        spec: &VirtualDisplaySpec,
        surface: SurfaceHandle,
    ) -> PlatformResult<Box<dyn VirtualDisplay>>;

    fn release(&mut self) -> PlatformResult<()>;
}

pub trait VirtualDisplay: Send {
    fn release(&mut self) -> PlatformResult<()>;
}

/// Hardware encoder factory
pub trait EncoderService: Send + Sync {
    fn create(&self) -> PlatformResult<Box<dyn Encoder>>;
}

/// One platform media recorder instance
pub trait Encoder: Send {
    fn configure(&mut self, config: &EncoderConfig, output: &Path) -> PlatformResult<()>;

    fn prepare(&mut self) -> PlatformResult<()>;

    /// Writable input surface; valid only after `prepare`
    fn surface(&self) -> PlatformResult<SurfaceHandle>;

    fn start(&mut self) -> PlatformResult<()>;

    /// Stop and finalize the output file
    fn stop(&mut self) -> PlatformResult<()>;

    /// Free the platform recorder without finalizing
    fn release(&mut self) -> PlatformResult<()>;
}

/// Keeps the OS aware that a capture is in progress
pub trait ForegroundAnnouncer: Send + Sync {
    fn announce(&self) -> PlatformResult<()>;

    fn retract(&self) -> PlatformResult<()>;
}
