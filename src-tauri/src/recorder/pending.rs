//! Single-slot pending result
//!
//! Holds the sender half of the caller's outstanding `start`. The slot is
//! armed once per capture-token request and can be taken exactly once.

use crate::utils::error::{RecorderError, RecorderResult};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

struct Armed<T> {
    session_id: Uuid,
    sender: oneshot::Sender<T>,
}

pub struct PendingResult<T> {
    slot: Mutex<Option<Armed<T>>>,
}

impl<T> PendingResult<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Arm the slot for `session_id`. Fails if a request is already pending.
    pub fn arm(&self, session_id: Uuid) -> RecorderResult<oneshot::Receiver<T>> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(RecorderError::AlreadyActive);
        }

        let (sender, receiver) = oneshot::channel();
        *slot = Some(Armed { session_id, sender });
        Ok(receiver)
    }

    /// Take the sender. With `session_id` set, only a matching request is
    /// taken; a mismatched one stays armed.
    pub fn take(&self, session_id: Option<Uuid>) -> RecorderResult<(Uuid, oneshot::Sender<T>)> {
        let mut slot = self.slot.lock();
        match slot.take() {
            Some(armed) if session_id.map_or(true, |id| id == armed.session_id) => {
                Ok((armed.session_id, armed.sender))
            }
            Some(armed) => {
                *slot = Some(armed);
                Err(RecorderError::UnexpectedTokenResult)
            }
            None => Err(RecorderError::UnexpectedTokenResult),
        }
    }

    /// Drop any armed sender; the waiting receiver sees a closed channel
    pub fn cancel(&self) -> bool {
        self.slot.lock().take().is_some()
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<T> Default for PendingResult<T> {
    fn default() -> Self {
        Self::new()
    }
}
