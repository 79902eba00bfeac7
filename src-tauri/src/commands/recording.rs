//! Recording-related Tauri commands

use crate::recorder::output;
use crate::recorder::{RecordingCoordinator, SessionInfo};
use crate::utils::error::{ErrorResponse, RecorderError};
use std::path::PathBuf;
use tauri::State;

/// Application state for recording
pub struct RecorderState {
    pub coordinator: RecordingCoordinator,
}

impl RecorderState {
    pub fn new(coordinator: RecordingCoordinator) -> Self {
        Self { coordinator }
    }
}

/// Start recording. Resolves once the encoder is running.
#[tauri::command]
pub async fn start_recording(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    let coordinator = state.coordinator.clone();
    coordinator.start().await.map_err(ErrorResponse::from)
}

/// Stop recording and return the output file path
#[tauri::command]
pub async fn stop_recording(state: State<'_, RecorderState>) -> Result<String, ErrorResponse> {
    let coordinator = state.coordinator.clone();

    // Stopping finalizes the file through blocking bridge calls.
    let path = tauri::async_runtime::spawn_blocking(move || coordinator.stop())
        .await
        .map_err(|e| ErrorResponse::from(RecorderError::StopError(e.to_string())))??;

    Ok(path.to_string_lossy().to_string())
}

/// Get the active session, if any
#[tauri::command]
pub async fn get_recording_state(
    state: State<'_, RecorderState>,
) -> Result<Option<SessionInfo>, ErrorResponse> {
    Ok(state.coordinator.session_info())
}

/// Move a finished recording into `dest_dir` so the next session does not
/// overwrite it
#[tauri::command]
pub async fn move_recording(path: String, dest_dir: String) -> Result<String, ErrorResponse> {
    let dest = output::move_recording(&PathBuf::from(&path), &PathBuf::from(&dest_dir))
        .map_err(|e| ErrorResponse::from(RecorderError::Io(e)))?;
    Ok(dest.to_string_lossy().to_string())
}
