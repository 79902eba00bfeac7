//! Finished recording relocation
//!
//! Every session writes to the same file, so a recording worth keeping has to
//! be moved out before the next start.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Move `source` into `dest_dir`, keeping its file name. Falls back to copy
/// and remove when a rename crosses filesystems.
pub fn move_recording(source: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {:?}", source),
        )
    })?;

    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name);

    if fs::rename(source, &dest).is_err() {
        fs::copy(source, &dest)?;
        fs::remove_file(source)?;
    }

    tracing::info!("Moved recording {:?} -> {:?}", source, dest);
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_move_recording() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Movies").join("screen_recording.mp4");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"mp4").unwrap();

        let dest = move_recording(&source, &dir.path().join("Download")).unwrap();

        assert_eq!(dest, dir.path().join("Download").join("screen_recording.mp4"));
        assert_eq!(fs::read(&dest).unwrap(), b"mp4");
        assert!(!source.exists());
    }

    #[test]
    fn test_move_missing_recording_fails() {
        let dir = tempdir().unwrap();
        let result = move_recording(&dir.path().join("missing.mp4"), &dir.path().join("out"));
        assert!(result.is_err());
    }
}
