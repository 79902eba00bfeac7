//! Foreground presence
//!
//! Tells the host OS that a capture is in progress.

pub mod announcer;

pub use announcer::{NotificationAnnouncer, NotificationHost, NotificationSpec};
