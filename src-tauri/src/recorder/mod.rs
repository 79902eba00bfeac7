//! Recording system module
//!
//! - RecordingCoordinator drives one capture session over the capability traits
//! - PendingResult holds the caller's outstanding start
//! - state defines the session state machine
//! - output relocates finished recordings

pub mod coordinator;
pub mod output;
pub mod pending;
pub mod state;

pub use coordinator::{
    Providers, RecordingCoordinator, TokenReply, PERMISSIONS_REQUEST_CODE, PROJECTION_REQUEST_CODE,
};
pub use state::{RecordingState, SessionInfo};
