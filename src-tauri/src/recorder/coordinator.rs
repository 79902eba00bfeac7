//! Recording coordinator
//!
//! Runs one capture session at a time: permission check, foreground presence,
//! capture-token handshake, encoder start, and teardown on stop.

use super::pending::PendingResult;
use super::state::{RecordingState, SessionInfo};
use crate::capture::traits::{
    CaptureToken, CaptureTokenBroker, Encoder, EncoderConfig, EncoderService,
    ForegroundAnnouncer, Permission, PermissionProvider, TokenOutcome, TokenPayload,
    VirtualDisplay, VirtualDisplaySpec,
};
use crate::capture::error::PlatformError;
use crate::config::RecorderConfig;
use crate::utils::error::{RecorderError, RecorderResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Activity request code of the screen-capture dialog
pub const PROJECTION_REQUEST_CODE: i32 = 1000;

/// Activity request code of the runtime permission prompt
pub const PERMISSIONS_REQUEST_CODE: i32 = 101;

/// Platform services the coordinator drives
#[derive(Clone)]
pub struct Providers {
    pub permissions: Arc<dyn PermissionProvider>,
    pub tokens: Arc<dyn CaptureTokenBroker>,
    pub encoders: Arc<dyn EncoderService>,
    pub announcer: Arc<dyn ForegroundAnnouncer>,
}

/// Platform resources held by a session
#[derive(Default)]
struct Pipeline {
    encoder: Option<Box<dyn Encoder>>,
    display: Option<Box<dyn VirtualDisplay>>,
    token: Option<Box<dyn CaptureToken>>,
}

impl Pipeline {
    /// Release everything still held. The encoder goes first so no frame is
    /// delivered to a discarded surface; the token goes last.
    fn release(&mut self) {
        if let Some(mut encoder) = self.encoder.take() {
            if let Err(e) = encoder.release() {
                tracing::warn!("Failed to release encoder: {}", e);
            }
        }
        if let Some(mut display) = self.display.take() {
            if let Err(e) = display.release() {
                tracing::warn!("Failed to release virtual display: {}", e);
            }
        }
        if let Some(mut token) = self.token.take() {
            if let Err(e) = token.release() {
                tracing::warn!("Failed to release capture token: {}", e);
            }
        }
    }
}

struct ActiveSession {
    id: Uuid,
    state: RecordingState,
    started_at: DateTime<Utc>,
    output_path: PathBuf,
    pipeline: Pipeline,
}

struct Inner {
    providers: Providers,
    config: RecorderConfig,
    session: Mutex<Option<ActiveSession>>,
    pending: PendingResult<RecorderResult<()>>,
}

/// Reply handle given to the token broker with each request.
///
/// Consumed on delivery, so one request yields at most one answer.
pub struct TokenReply {
    session_id: Uuid,
    inner: Weak<Inner>,
}

impl TokenReply {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Hand the dialog result back to the coordinator
    pub fn deliver(self, outcome: TokenOutcome) -> RecorderResult<()> {
        let inner = self.inner.upgrade().ok_or(RecorderError::SessionAborted)?;
        inner.resolve_token(Some(self.session_id), outcome)
    }
}

/// Owns the lifecycle of a single recording session
#[derive(Clone)]
pub struct RecordingCoordinator {
    inner: Arc<Inner>,
}

impl RecordingCoordinator {
    pub fn new(providers: Providers, config: RecorderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                config,
                session: Mutex::new(None),
                pending: PendingResult::new(),
            }),
        }
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        self.inner
            .session
            .lock()
            .as_ref()
            .map(|s| s.state)
            .unwrap_or_default()
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.inner.session.lock().as_ref().map(|s| SessionInfo {
            id: s.id,
            state: s.state,
            started_at: s.started_at,
            output_path: s.output_path.clone(),
        })
    }

    /// Start recording.
    ///
    /// Resolves once the encoder is running, or with the error that ended the
    /// attempt. The session is gone again whenever this returns an error, and
    /// also when the caller drops this future before the token is requested.
    pub async fn start(&self) -> RecorderResult<()> {
        let inner = &self.inner;
        if inner.session.lock().is_some() {
            return Err(RecorderError::AlreadyActive);
        }

        let permissions = inner.providers.permissions.clone();
        let missing = blocking(move || {
            if !permissions.has_foreground_context() {
                tracing::warn!("No foreground activity to anchor the capture dialog");
                return Err(RecorderError::ActivityUnavailable);
            }

            let mut missing = Vec::new();
            for permission in Permission::REQUIRED {
                if !permissions.check(permission)?.is_granted() {
                    missing.push(permission);
                }
            }
            Ok(missing)
        })
        .await?;

        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        {
            let mut session = inner.session.lock();
            if session.is_some() {
                return Err(RecorderError::AlreadyActive);
            }

            let state = if missing.is_empty() {
                RecordingState::AwaitingToken
            } else {
                RecordingState::AwaitingPermission
            };
            *session = Some(ActiveSession {
                id: session_id,
                state,
                started_at,
                output_path: inner.config.output_path(started_at),
                pipeline: Pipeline::default(),
            });
        }
        let mut guard = SessionGuard::new(session_id, inner);

        tracing::info!(session = %session_id, "Starting recording");

        if !missing.is_empty() {
            self.negotiate_permissions(session_id, missing).await?;
        }

        inner.ensure_current(session_id)?;
        let shared = Arc::clone(inner);
        blocking(move || {
            if let Err(e) = shared.providers.announcer.announce() {
                tracing::error!(session = %session_id, "Failed to enter foreground: {}", e);
                return Err(e.into());
            }
            // A teardown that ran before the post above could not retract it.
            if let Err(e) = shared.ensure_current(session_id) {
                shared.retract_presence();
                return Err(e);
            }
            Ok(())
        })
        .await?;

        // Arming under the session lock orders it against `on_host_destroy`,
        // which takes the session before cancelling the slot.
        let receiver = {
            let session = inner.session.lock();
            if !session.as_ref().is_some_and(|s| s.id == session_id) {
                drop(session);
                tracing::warn!(session = %session_id, "Session torn down before the capture token was requested");
                inner.retract_presence();
                return Err(RecorderError::SessionAborted);
            }
            inner.pending.arm(session_id)?
        };
        guard.disarm();

        let reply = TokenReply {
            session_id,
            inner: Arc::downgrade(inner),
        };
        if let Err(e) = inner.providers.tokens.request_token(reply) {
            tracing::error!(session = %session_id, "Failed to request capture token: {}", e);
            inner.pending.cancel();
            inner.discard(session_id);
            return Err(e.into());
        }

        match receiver.await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(session = %session_id, "Session torn down while awaiting capture token");
                Err(RecorderError::SessionAborted)
            }
        }
    }

    /// Prompt for `missing` and decide whether the start may continue
    async fn negotiate_permissions(
        &self,
        session_id: Uuid,
        missing: Vec<Permission>,
    ) -> RecorderResult<()> {
        let inner = &self.inner;
        tracing::info!(session = %session_id, "Requesting permissions: {:?}", missing);

        let answers = match inner.providers.permissions.request(&missing).await {
            Ok(answers) => answers,
            Err(e) => {
                inner.discard(session_id);
                return Err(e.into());
            }
        };

        let denied: Vec<Permission> = missing
            .iter()
            .copied()
            .filter(|permission| {
                !answers
                    .iter()
                    .any(|(answered, state)| answered == permission && state.is_granted())
            })
            .collect();

        if !denied.is_empty() {
            tracing::warn!(session = %session_id, "Permissions denied: {:?}", denied);
            inner.discard(session_id);
            return Err(RecorderError::PermissionDenied(denied));
        }

        if !inner.config.resume_after_permission_grant {
            inner.discard(session_id);
            return Err(RecorderError::PermissionRequested(missing));
        }

        inner.transition(session_id, RecordingState::AwaitingToken)
    }

    /// Deliver the capture dialog's answer for the pending request
    pub fn on_capture_token_result(&self, outcome: TokenOutcome) -> RecorderResult<()> {
        self.inner.resolve_token(None, outcome)
    }

    /// Route an activity result. Returns whether it belonged to the capture
    /// dialog.
    pub fn on_activity_result(
        &self,
        request_code: i32,
        outcome: TokenOutcome,
    ) -> RecorderResult<bool> {
        if request_code != PROJECTION_REQUEST_CODE {
            tracing::debug!("Ignoring activity result for request code {}", request_code);
            return Ok(false);
        }
        self.on_capture_token_result(outcome)?;
        Ok(true)
    }

    /// Stop recording and return the output file path.
    ///
    /// Resources are taken out of the session before any platform call, so a
    /// repeated stop reports [`RecorderError::RecorderNotActive`] and never
    /// touches released resources.
    pub fn stop(&self) -> RecorderResult<PathBuf> {
        let mut session = {
            let mut guard = self.inner.session.lock();
            match guard.take() {
                Some(session) if session.pipeline.encoder.is_some() => session,
                other => {
                    *guard = other;
                    return Err(RecorderError::RecorderNotActive);
                }
            }
        };

        tracing::info!(session = %session.id, "Stopping recording");

        let stopped = match session.pipeline.encoder.as_mut() {
            Some(encoder) => encoder.stop(),
            None => Ok(()),
        };
        session.pipeline.release();
        self.inner.retract_presence();

        match stopped {
            Ok(()) => {
                tracing::info!(session = %session.id, "Recording saved to {:?}", session.output_path);
                Ok(session.output_path)
            }
            Err(e) => {
                tracing::error!(session = %session.id, "Failed to stop MediaRecorder: {}", e);
                Err(RecorderError::StopError(e.to_string()))
            }
        }
    }

    /// Host process is going away: release everything without finalizing
    pub fn on_host_destroy(&self) {
        let session = self.inner.session.lock().take();
        if self.inner.pending.cancel() {
            tracing::debug!("Dropped pending capture token request");
        }

        if let Some(mut session) = session {
            tracing::warn!(session = %session.id, "Host destroyed during {:?}, forcing release", session.state);
            session.pipeline.release();
            self.inner.retract_presence();
        }
    }
}

impl Inner {
    fn resolve_token(&self, session_id: Option<Uuid>, outcome: TokenOutcome) -> RecorderResult<()> {
        let (id, sender) = self.pending.take(session_id).map_err(|e| {
            tracing::warn!("Rejected capture token result with no matching request");
            e
        })?;

        let result = match outcome {
            TokenOutcome::Denied => {
                tracing::warn!(session = %id, "Screen capture permission denied");
                self.discard(id);
                Err(RecorderError::CaptureDenied)
            }
            TokenOutcome::Granted(payload) => self.begin_recording(id, payload),
        };

        if sender.send(result).is_err() {
            tracing::warn!(session = %id, "Start caller went away before the capture result arrived");
        }
        Ok(())
    }

    fn begin_recording(&self, session_id: Uuid, payload: TokenPayload) -> RecorderResult<()> {
        let output_path = {
            let session = self.session.lock();
            match session.as_ref() {
                Some(s) if s.id == session_id && s.state == RecordingState::AwaitingToken => {
                    s.output_path.clone()
                }
                _ => {
                    drop(session);
                    self.retract_presence();
                    return Err(RecorderError::SessionAborted);
                }
            }
        };

        let mut pipeline = Pipeline::default();
        if let Err(e) = self.assemble(&mut pipeline, payload, &output_path) {
            tracing::error!(session = %session_id, "Failed to prepare MediaRecorder: {}", e);
            pipeline.release();
            self.discard(session_id);
            return Err(RecorderError::PrepareError(e));
        }

        {
            let mut session = self.session.lock();
            if let Some(s) = session.as_mut().filter(|s| s.id == session_id) {
                s.pipeline = pipeline;
                s.state = RecordingState::Recording;
                tracing::info!(session = %session_id, "Recording to {:?}", s.output_path);
                return Ok(());
            }
        }

        // Torn down by the host while the pipeline was being assembled.
        pipeline.release();
        self.retract_presence();
        Err(RecorderError::SessionAborted)
    }

    /// Materialize the token, then configure, prepare and start the encoder
    /// behind a mirroring virtual display. Every acquired resource is stored
    /// in `pipeline` as soon as it exists.
    fn assemble(
        &self,
        pipeline: &mut Pipeline,
        payload: TokenPayload,
        output_path: &Path,
    ) -> Result<(), String> {
        if let Some(dir) = output_path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create {:?}: {}", dir, e))?;
        }

        let token = pipeline
            .token
            .insert(self.providers.tokens.materialize(payload).map_err(|e| e.to_string())?);

        let encoder = pipeline
            .encoder
            .insert(self.providers.encoders.create().map_err(|e| e.to_string())?);
        encoder
            .configure(&EncoderConfig::screen_capture(), output_path)
            .map_err(|e| e.to_string())?;
        encoder.prepare().map_err(|e| e.to_string())?;

        let surface = encoder.surface().map_err(|e| e.to_string())?;
        let display = token
            .create_virtual_display(&VirtualDisplaySpec::screen_mirror(), surface)
            .map_err(|e| e.to_string())?;
        pipeline.display = Some(display);

        if let Some(encoder) = pipeline.encoder.as_mut() {
            encoder.start().map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn ensure_current(&self, session_id: Uuid) -> RecorderResult<()> {
        match self.session.lock().as_ref() {
            Some(s) if s.id == session_id => Ok(()),
            _ => Err(RecorderError::SessionAborted),
        }
    }

    fn transition(&self, session_id: Uuid, next: RecordingState) -> RecorderResult<()> {
        let mut session = self.session.lock();
        match session.as_mut() {
            Some(s) if s.id == session_id => {
                debug_assert!(s.state.can_transition_to(next));
                tracing::debug!(session = %session_id, "{:?} -> {:?}", s.state, next);
                s.state = next;
                Ok(())
            }
            _ => Err(RecorderError::SessionAborted),
        }
    }

    /// End the session `session_id` if it is still current
    fn discard(&self, session_id: Uuid) {
        let session = {
            let mut guard = self.session.lock();
            match guard.take() {
                Some(s) if s.id == session_id => Some(s),
                other => {
                    *guard = other;
                    None
                }
            }
        };

        if let Some(mut session) = session {
            session.pipeline.release();
            self.retract_presence();
        }
    }

    fn retract_presence(&self) {
        if let Err(e) = self.providers.announcer.retract() {
            tracing::warn!("Failed to retract foreground presence: {}", e);
        }
    }
}

/// Discards a session whose `start` future was dropped before the token
/// request went out
struct SessionGuard {
    session_id: Uuid,
    inner: Weak<Inner>,
    armed: bool,
}

impl SessionGuard {
    fn new(session_id: Uuid, inner: &Arc<Inner>) -> Self {
        Self {
            session_id,
            inner: Arc::downgrade(inner),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.discard(self.session_id);
        }
    }
}

/// Run a blocking bridge call off the async worker
async fn blocking<T, F>(f: F) -> RecorderResult<T>
where
    F: FnOnce() -> RecorderResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PlatformError::Bridge(e.to_string()))?
}
