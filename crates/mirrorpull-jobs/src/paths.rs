//! Output locations.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::{OrchestratorError, Result};

/// Returns the platform data directory for downloads.
///
/// - Linux: `~/.local/share/mirrorpull`
/// - macOS: `~/Library/Application Support/mirrorpull`
/// - Windows: `C:\Users\<user>\AppData\Roaming\mirrorpull\data`
///
/// Falls back to `./data` if no home directory can be determined.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "mirrorpull")
        .map_or_else(|| PathBuf::from("data"), |dirs| dirs.data_dir().to_path_buf())
}

/// Creates `dir` (and its parents) if it does not exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| OrchestratorError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
