//! Android capture services
//!
//! Media projection, MediaRecorder and the foreground service live in the
//! native `ScreenRecorderPlugin`. Every capability here is a call through
//! Tauri's mobile plugin bridge; platform objects stay on the native side and
//! are referred to by id.

use super::error::{PlatformError, PlatformResult};
use super::traits::{
    CaptureToken, CaptureTokenBroker, Encoder, EncoderConfig, EncoderService, Permission,
    PermissionProvider, PermissionState, SurfaceHandle, TokenOutcome, TokenPayload,
    VirtualDisplay, VirtualDisplaySpec,
};
use crate::presence::{NotificationAnnouncer, NotificationHost, NotificationSpec};
use crate::recorder::{Providers, TokenReply, PERMISSIONS_REQUEST_CODE, PROJECTION_REQUEST_CODE};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tauri::plugin::{Builder, PluginHandle, TauriPlugin};
use tauri::{Manager, Runtime};

const PLUGIN_IDENTIFIER: &str = "com.screenrecorder.bridge";
const PLUGIN_CLASS: &str = "ScreenRecorderPlugin";

/// Register the native plugin and manage an [`AndroidBridge`] for it
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("screen-recorder")
        .setup(|app, api| {
            let handle = api.register_android_plugin(PLUGIN_IDENTIFIER, PLUGIN_CLASS)?;
            app.manage(AndroidBridge::new(handle));
            Ok(())
        })
        .build()
}

/// Build the coordinator's capability set on top of the bridge
pub fn providers<R: Runtime>(bridge: AndroidBridge<R>, notification: NotificationSpec) -> Providers {
    let announcer = NotificationAnnouncer::new(Arc::new(bridge.clone()), notification);
    Providers {
        permissions: Arc::new(bridge.clone()),
        tokens: Arc::new(bridge.clone()),
        encoders: Arc::new(bridge),
        announcer: Arc::new(announcer),
    }
}

pub struct AndroidBridge<R: Runtime> {
    handle: Arc<PluginHandle<R>>,
}

impl<R: Runtime> Clone for AndroidBridge<R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<R: Runtime> AndroidBridge<R> {
    pub fn new(handle: PluginHandle<R>) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    fn invoke<T: DeserializeOwned>(&self, command: &str, payload: impl Serialize) -> PlatformResult<T> {
        tracing::debug!("Bridge call: {}", command);
        self.handle
            .run_mobile_plugin(command, payload)
            .map_err(|e| PlatformError::Bridge(format!("{}: {}", command, e)))
    }

    fn call(&self, command: &str, payload: impl Serialize) -> PlatformResult<()> {
        self.invoke::<serde_json::Value>(command, payload).map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    available: bool,
}

#[derive(Debug, Deserialize)]
struct PermissionAnswer {
    permission: Permission,
    state: PermissionState,
}

#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    results: Vec<PermissionAnswer>,
}

#[derive(Debug, Deserialize)]
struct ProjectionResponse {
    granted: bool,
    token: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionHandle {
    projection_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplayHandle {
    display_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecorderHandle {
    recorder_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurfaceResponse {
    surface_id: u64,
}

#[async_trait]
impl<R: Runtime> PermissionProvider for AndroidBridge<R> {
    fn has_foreground_context(&self) -> bool {
        match self.invoke::<ActivityResponse>("hasActivity", json!({})) {
            Ok(response) => response.available,
            Err(e) => {
                tracing::warn!("Could not query current activity: {}", e);
                false
            }
        }
    }

    fn check(&self, permission: Permission) -> PlatformResult<PermissionState> {
        let response: PermissionsResponse =
            self.invoke("checkPermissions", json!({ "permissions": [permission] }))?;
        response
            .results
            .into_iter()
            .find(|answer| answer.permission == permission)
            .map(|answer| answer.state)
            .ok_or_else(|| PlatformError::Bridge(format!("no state reported for {:?}", permission)))
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> PlatformResult<Vec<(Permission, PermissionState)>> {
        let bridge = self.clone();
        let payload = json!({
            "permissions": permissions,
            "requestCode": PERMISSIONS_REQUEST_CODE,
        });

        // Resolves only once the user answers the prompt.
        let response: PermissionsResponse = tauri::async_runtime::spawn_blocking(move || {
            bridge.invoke::<PermissionsResponse>("requestPermissions", payload)
        })
        .await
        .map_err(|e| PlatformError::Bridge(e.to_string()))??;

        Ok(response
            .results
            .into_iter()
            .map(|answer| (answer.permission, answer.state))
            .collect())
    }
}

impl<R: Runtime> CaptureTokenBroker for AndroidBridge<R> {
    fn request_token(&self, reply: TokenReply) -> PlatformResult<()> {
        let bridge = self.clone();
        tauri::async_runtime::spawn_blocking(move || {
            let session_id = reply.session_id();
            let outcome = match bridge.invoke::<ProjectionResponse>(
                "requestProjection",
                json!({ "requestCode": PROJECTION_REQUEST_CODE }),
            ) {
                Ok(response) => {
                    TokenOutcome::from_result(response.granted, response.token.map(TokenPayload))
                }
                Err(e) => {
                    tracing::warn!(session = %session_id, "Capture dialog failed: {}", e);
                    TokenOutcome::Denied
                }
            };

            if let Err(e) = reply.deliver(outcome) {
                tracing::warn!(session = %session_id, "Capture result not accepted: {}", e);
            }
        });
        Ok(())
    }

    fn materialize(&self, payload: TokenPayload) -> PlatformResult<Box<dyn CaptureToken>> {
        let handle: ProjectionHandle = self.invoke("getProjection", json!({ "token": payload }))?;
        Ok(Box::new(AndroidProjection {
            bridge: self.clone(),
            projection_id: handle.projection_id,
        }))
    }
}

impl<R: Runtime> EncoderService for AndroidBridge<R> {
    fn create(&self) -> PlatformResult<Box<dyn Encoder>> {
        let handle: RecorderHandle = self.invoke("createRecorder", json!({}))?;
        Ok(Box::new(AndroidRecorder {
            bridge: self.clone(),
            recorder_id: handle.recorder_id,
        }))
    }
}

impl<R: Runtime> NotificationHost for AndroidBridge<R> {
    fn create_channel(&self, spec: &NotificationSpec) -> PlatformResult<()> {
        self.call("createNotificationChannel", spec)
    }

    fn post_foreground(&self, spec: &NotificationSpec) -> PlatformResult<()> {
        self.call("startForeground", spec)
    }

    fn cancel(&self, notification_id: i32) -> PlatformResult<()> {
        self.call("stopForeground", json!({ "notificationId": notification_id }))
    }
}

struct AndroidProjection<R: Runtime> {
    bridge: AndroidBridge<R>,
    projection_id: u64,
}

impl<R: Runtime> CaptureToken for AndroidProjection<R> {
    fn create_virtual_display(
        &mut self,
        spec: &VirtualDisplaySpec,
        surface: SurfaceHandle,
    ) -> PlatformResult<Box<dyn VirtualDisplay>> {
        let handle: DisplayHandle = self.bridge.invoke(
            "createVirtualDisplay",
            json!({
                "projectionId": self.projection_id,
                "surfaceId": surface.0,
                "display": spec,
            }),
        )?;
        Ok(Box::new(AndroidVirtualDisplay {
            bridge: self.bridge.clone(),
            display_id: handle.display_id,
        }))
    }

    fn release(&mut self) -> PlatformResult<()> {
        self.bridge
            .call("stopProjection", json!({ "projectionId": self.projection_id }))
    }
}

struct AndroidVirtualDisplay<R: Runtime> {
    bridge: AndroidBridge<R>,
    display_id: u64,
}

impl<R: Runtime> VirtualDisplay for AndroidVirtualDisplay<R> {
    fn release(&mut self) -> PlatformResult<()> {
        self.bridge
            .call("releaseVirtualDisplay", json!({ "displayId": self.display_id }))
    }
}

struct AndroidRecorder<R: Runtime> {
    bridge: AndroidBridge<R>,
    recorder_id: u64,
}

impl<R: Runtime> AndroidRecorder<R> {
    fn call(&self, command: &str) -> PlatformResult<()> {
        self.bridge
            .call(command, json!({ "recorderId": self.recorder_id }))
    }
}

impl<R: Runtime> Encoder for AndroidRecorder<R> {
    fn configure(&mut self, config: &EncoderConfig, output: &Path) -> PlatformResult<()> {
        self.bridge.call(
            "configureRecorder",
            json!({
                "recorderId": self.recorder_id,
                "config": config,
                "outputPath": output.to_string_lossy(),
            }),
        )
    }

    fn prepare(&mut self) -> PlatformResult<()> {
        self.call("prepareRecorder")
    }

    fn surface(&self) -> PlatformResult<SurfaceHandle> {
        let response: SurfaceResponse = self
            .bridge
            .invoke("recorderSurface", json!({ "recorderId": self.recorder_id }))?;
        Ok(SurfaceHandle(response.surface_id))
    }

    fn start(&mut self) -> PlatformResult<()> {
        self.call("startRecorder")
    }

    fn stop(&mut self) -> PlatformResult<()> {
        self.call("stopRecorder")
    }

    fn release(&mut self) -> PlatformResult<()> {
        self.call("releaseRecorder")
    }
}
