//! Recording directory preparation.

use std::path::{Path, PathBuf};

use screencaster_common::error::{ScreencastError, ScreencastResult};
use screencaster_platform_linux::process::hostname;

/// Throwaway directory used to prove the recording root is writable.
pub const WRITE_PROBE_DIR: &str = "~~test-for-recording";

/// Make sure `root` exists and that new entries can be created in it.
pub fn ensure_writable(root: &Path) -> ScreencastResult<()> {
    std::fs::create_dir_all(root)
        .map_err(|e| ScreencastError::workspace(root, format!("cannot create directory: {e}")))?;

    if !root.is_dir() {
        return Err(ScreencastError::workspace(root, "not a directory"));
    }

    let probe = root.join(WRITE_PROBE_DIR);
    std::fs::create_dir_all(&probe)
        .map_err(|e| ScreencastError::workspace(root, format!("not writable: {e}")))?;
    std::fs::remove_dir(&probe).map_err(|e| {
        ScreencastError::workspace(root, format!("cannot clean up write probe: {e}"))
    })?;
    Ok(())
}

/// Create `{root}/{stamp}-recording` and return its absolute path.
pub fn create_session_dir(root: &Path, stamp: &str) -> ScreencastResult<PathBuf> {
    let dir = root.join(format!("{stamp}-recording"));
    std::fs::create_dir_all(&dir).map_err(|e| {
        ScreencastError::workspace(&dir, format!("cannot create session directory: {e}"))
    })?;
    Ok(dir.canonicalize().unwrap_or(dir))
}

/// `{dir}/{hostname}-{stamp}.log`, where `dir` is `log_dir` when it exists
/// and the working directory otherwise.
pub fn status_log_path(log_dir: Option<&Path>, stamp: &str) -> PathBuf {
    let dir = match log_dir {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        Some(dir) => {
            tracing::warn!(
                path = %dir.display(),
                "Status log directory missing; using working directory"
            );
            working_dir()
        }
        None => working_dir(),
    };
    dir.join(format!("{}-{stamp}.log", hostname()))
}

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
