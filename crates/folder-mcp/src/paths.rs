//! Process-wide state directory resolution and PID-file based
//! already-running detection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Resolves the directory the daemon persists its state under: per-folder
/// SQLite stores, the PID file, and rotated logs.
///
/// Honors `FOLDER_MCP_STATE_DIR` first, then falls back to the platform data
/// directory (`~/.local/share/folder-mcp` on Linux, `~/Library/Application
/// Support/folder-mcp` on macOS, `%APPDATA%\folder-mcp` on Windows).
#[must_use]
pub fn default_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FOLDER_MCP_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folder-mcp")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PidFile {
    pid: u32,
    started_at: chrono::DateTime<chrono::Utc>,
    version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PidClaimError {
    #[error("daemon already running with pid {pid}")]
    AlreadyRunning { pid: u32 },

    #[error("failed to access pid file: {0}")]
    Io(#[from] io::Error),
}

/// Claims `<state_dir>/folder-mcp.pid` for the current process, refusing if
/// another live process already holds it.
///
/// A PID file is considered stale (and silently reclaimed) if the process it
/// names is no longer alive, which on Linux is checked via `/proc/<pid>`. On
/// other platforms any existing PID file is treated as live, since there's no
/// cheap portable liveness probe available here.
///
/// # Errors
///
/// Returns [`PidClaimError::AlreadyRunning`] if a live daemon already holds
/// the file, or [`PidClaimError::Io`] if the state directory or PID file
/// can't be created or read.
pub fn claim_pid_file(state_dir: &Path) -> Result<PathBuf, PidClaimError> {
    fs::create_dir_all(state_dir)?;
    let pid_path = state_dir.join("folder-mcp.pid");

    if let Ok(existing) = fs::read_to_string(&pid_path)
        && let Ok(pid_file) = serde_json::from_str::<PidFile>(&existing)
        && is_process_alive(pid_file.pid)
    {
        return Err(PidClaimError::AlreadyRunning { pid: pid_file.pid });
    }

    let pid_file = PidFile {
        pid: std::process::id(),
        started_at: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    fs::write(&pid_path, serde_json::to_string_pretty(&pid_file)?)?;
    Ok(pid_path)
}

/// Releases the PID file claimed by [`claim_pid_file`]. Best-effort: a
/// missing file is not an error, since the daemon may be shutting down after
/// an unclean restart that already removed it.
pub fn release_pid_file(state_dir: &Path) {
    let pid_path = state_dir.join("folder-mcp.pid");
    let _ = fs::remove_file(pid_path);
}

#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn is_process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_an_empty_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = claim_pid_file(dir.path()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_claim_when_pid_is_still_alive() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("folder-mcp.pid");
        let fake = PidFile {
            pid: std::process::id(),
            started_at: chrono::Utc::now(),
            version: "0.0.0".to_string(),
        };
        fs::write(&pid_path, serde_json::to_string(&fake).unwrap()).unwrap();

        let err = claim_pid_file(dir.path()).unwrap_err();
        assert!(matches!(err, PidClaimError::AlreadyRunning { .. }));
    }

    #[test]
    fn release_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        claim_pid_file(dir.path()).unwrap();
        release_pid_file(dir.path());
        assert!(!dir.path().join("folder-mcp.pid").exists());
    }
}
