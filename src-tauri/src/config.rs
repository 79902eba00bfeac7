//! Recorder configuration
//!
//! Where recordings land, how they are named, the permission-resume policy and
//! the foreground notification text. Encoder parameters are fixed and live in
//! [`crate::capture::traits::EncoderConfig`].

use crate::presence::NotificationSpec;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_NAME: &str = "screen_recording.mp4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// Movies directory recordings are written to
    pub output_dir: PathBuf,

    /// Output file name
    pub file_name: String,

    /// Append a UTC timestamp to the file name so sessions don't overwrite
    /// each other
    pub timestamped_output: bool,

    /// Continue straight to the capture dialog once a permission prompt is
    /// granted, instead of asking the caller to start again
    pub resume_after_permission_grant: bool,

    /// Foreground notification shown while recording
    pub notification: NotificationSpec,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Movies"),
            file_name: DEFAULT_FILE_NAME.to_string(),
            timestamped_output: false,
            resume_after_permission_grant: false,
            notification: NotificationSpec::default(),
        }
    }
}

impl RecorderConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No recorder config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recorder config {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse recorder config {:?}", path))?;
        Ok(config)
    }

    /// Output path for a session started at `started_at`
    pub fn output_path(&self, started_at: DateTime<Utc>) -> PathBuf {
        if !self.timestamped_output {
            return self.output_dir.join(&self.file_name);
        }

        let name = Path::new(&self.file_name);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "screen_recording".to_string());
        let stamp = started_at.format("%Y%m%d_%H%M%S");
        let file_name = match name.extension() {
            Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
            None => format!("{}_{}", stem, stamp),
        };
        self.output_dir.join(file_name)
    }
}
