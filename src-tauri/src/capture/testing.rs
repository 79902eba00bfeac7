//! In-memory platform used by the recorder tests
//!
//! Every call into a fake service is appended to a shared [`CallLog`] so tests
//! can assert ordering and that nothing is released twice.

use super::error::{PlatformError, PlatformResult};
use super::traits::{
    CaptureToken, CaptureTokenBroker, Encoder, EncoderConfig, EncoderService, Permission,
    PermissionProvider, PermissionState, SurfaceHandle, TokenOutcome, TokenPayload,
    VirtualDisplay, VirtualDisplaySpec,
};
use crate::config::RecorderConfig;
use crate::presence::{NotificationAnnouncer, NotificationHost, NotificationSpec};
use crate::recorder::{Providers, RecordingCoordinator, TokenReply};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.0.lock().iter().any(|c| c == call)
    }
}

pub struct FakePlatform {
    pub log: CallLog,
    foreground: Mutex<bool>,
    permissions: Mutex<HashMap<Permission, PermissionState>>,
    prompt_answer: Mutex<PermissionState>,
    prompt_gate: Mutex<Option<Arc<Notify>>>,
    token_outcome: Option<TokenOutcome>,
    held_reply: Mutex<Option<TokenReply>>,
    failures: Arc<Mutex<HashSet<String>>>,
    configured: Arc<Mutex<Vec<(EncoderConfig, PathBuf)>>>,
}

impl FakePlatform {
    /// All permissions granted. With `token_outcome` set, the capture dialog
    /// answers immediately; otherwise the reply is held for the test.
    pub fn answering(token_outcome: Option<TokenOutcome>) -> Arc<Self> {
        let permissions = Permission::REQUIRED
            .iter()
            .map(|p| (*p, PermissionState::Granted))
            .collect();
        Arc::new(Self {
            log: CallLog::default(),
            foreground: Mutex::new(true),
            permissions: Mutex::new(permissions),
            prompt_answer: Mutex::new(PermissionState::Granted),
            prompt_gate: Mutex::new(None),
            token_outcome,
            held_reply: Mutex::new(None),
            failures: Arc::new(Mutex::new(HashSet::new())),
            configured: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn set_foreground(&self, available: bool) {
        *self.foreground.lock() = available;
    }

    pub fn set_permission(&self, permission: Permission, state: PermissionState) {
        self.permissions.lock().insert(permission, state);
    }

    pub fn answer_prompts_with(&self, state: PermissionState) {
        *self.prompt_answer.lock() = state;
    }

    /// Keep permission prompts open until the returned gate is notified
    pub fn hold_prompts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.prompt_gate.lock() = Some(gate.clone());
        gate
    }

    /// Make the named call fail from now on
    pub fn fail_on(&self, call: &str) {
        self.failures.lock().insert(call.to_string());
    }

    pub fn configured(&self) -> Vec<(EncoderConfig, PathBuf)> {
        self.configured.lock().clone()
    }

    /// Wait until the coordinator has asked for a capture token
    pub async fn wait_for_reply(&self) -> TokenReply {
        for _ in 0..400 {
            if let Some(reply) = self.held_reply.lock().take() {
                return reply;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("capture token was never requested");
    }

    fn call(&self, call: &str) -> PlatformResult<()> {
        record(&self.log, &self.failures, call)
    }
}

fn record(log: &CallLog, failures: &Mutex<HashSet<String>>, call: &str) -> PlatformResult<()> {
    if failures.lock().contains(call) {
        return Err(PlatformError::Rejected(format!("{} failed", call)));
    }
    log.push(call);
    Ok(())
}

/// Coordinator wired to `fake` through the real notification announcer
pub fn coordinator_with(fake: &Arc<FakePlatform>, config: RecorderConfig) -> RecordingCoordinator {
    let announcer = NotificationAnnouncer::new(fake.clone(), config.notification.clone());
    let providers = Providers {
        permissions: fake.clone(),
        tokens: fake.clone(),
        encoders: fake.clone(),
        announcer: Arc::new(announcer),
    };
    RecordingCoordinator::new(providers, config)
}

#[async_trait]
impl PermissionProvider for FakePlatform {
    fn has_foreground_context(&self) -> bool {
        *self.foreground.lock()
    }

    fn check(&self, permission: Permission) -> PlatformResult<PermissionState> {
        Ok(self
            .permissions
            .lock()
            .get(&permission)
            .copied()
            .unwrap_or(PermissionState::Prompt))
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> PlatformResult<Vec<(Permission, PermissionState)>> {
        self.call("permissions:request")?;
        let gate = self.prompt_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let answer = *self.prompt_answer.lock();
        let mut granted = self.permissions.lock();
        Ok(permissions
            .iter()
            .map(|p| {
                granted.insert(*p, answer);
                (*p, answer)
            })
            .collect())
    }
}

impl CaptureTokenBroker for FakePlatform {
    fn request_token(&self, reply: TokenReply) -> PlatformResult<()> {
        self.call("token:request")?;
        match self.token_outcome.clone() {
            Some(outcome) => {
                reply.deliver(outcome).map_err(|e| PlatformError::Bridge(e.to_string()))
            }
            None => {
                *self.held_reply.lock() = Some(reply);
                Ok(())
            }
        }
    }

    fn materialize(&self, _payload: TokenPayload) -> PlatformResult<Box<dyn CaptureToken>> {
        self.call("token:materialize")?;
        Ok(Box::new(FakeToken {
            log: self.log.clone(),
            failures: self.failures.clone(),
            released: false,
        }))
    }
}

impl EncoderService for FakePlatform {
    fn create(&self) -> PlatformResult<Box<dyn Encoder>> {
        self.call("encoder:create")?;
        Ok(Box::new(FakeEncoder {
            log: self.log.clone(),
            failures: self.failures.clone(),
            configured: self.configured.clone(),
            released: false,
        }))
    }
}

impl NotificationHost for FakePlatform {
    fn create_channel(&self, _spec: &NotificationSpec) -> PlatformResult<()> {
        self.call("notify:channel")
    }

    fn post_foreground(&self, _spec: &NotificationSpec) -> PlatformResult<()> {
        self.call("notify:post")
    }

    fn cancel(&self, _notification_id: i32) -> PlatformResult<()> {
        self.call("notify:cancel")
    }
}

struct FakeToken {
    log: CallLog,
    failures: Arc<Mutex<HashSet<String>>>,
    released: bool,
}

impl CaptureToken for FakeToken {
    fn create_virtual_display(
        &mut self,
        spec: &VirtualDisplaySpec,
        _surface: SurfaceHandle,
    ) -> PlatformResult<Box<dyn VirtualDisplay>> {
        record(&self.log, &self.failures, &format!("display:create:{}", spec.name))?;
        Ok(Box::new(FakeDisplay {
            log: self.log.clone(),
            released: false,
        }))
    }

    fn release(&mut self) -> PlatformResult<()> {
        assert!(!self.released, "capture token released twice");
        self.released = true;
        record(&self.log, &self.failures, "token:release")
    }
}

struct FakeDisplay {
    log: CallLog,
    released: bool,
}

impl VirtualDisplay for FakeDisplay {
    fn release(&mut self) -> PlatformResult<()> {
        assert!(!self.released, "virtual display released twice");
        self.released = true;
        self.log.push("display:release");
        Ok(())
    }
}

struct FakeEncoder {
    log: CallLog,
    failures: Arc<Mutex<HashSet<String>>>,
    configured: Arc<Mutex<Vec<(EncoderConfig, PathBuf)>>>,
    released: bool,
}

impl FakeEncoder {
    fn call(&self, call: &str) -> PlatformResult<()> {
        assert!(!self.released, "{} on a released encoder", call);
        record(&self.log, &self.failures, call)
    }
}

impl Encoder for FakeEncoder {
    fn configure(&mut self, config: &EncoderConfig, output: &Path) -> PlatformResult<()> {
        self.call("encoder:configure")?;
        self.configured
            .lock()
            .push((config.clone(), output.to_path_buf()));
        Ok(())
    }

    fn prepare(&mut self) -> PlatformResult<()> {
        self.call("encoder:prepare")
    }

    fn surface(&self) -> PlatformResult<SurfaceHandle> {
        Ok(SurfaceHandle(42))
    }

    fn start(&mut self) -> PlatformResult<()> {
        self.call("encoder:start")
    }

    fn stop(&mut self) -> PlatformResult<()> {
        self.call("encoder:stop")
    }

    fn release(&mut self) -> PlatformResult<()> {
        self.call("encoder:release")?;
        self.released = true;
        Ok(())
    }
}
