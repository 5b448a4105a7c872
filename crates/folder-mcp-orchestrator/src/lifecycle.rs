//! The per-folder state machine.

use crate::error::{OrchestratorError, OrchestratorResult};
use std::time::Duration;
use tracing::{info, warn};

/// States a monitored folder moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Created,
    Scanning,
    Detecting,
    Indexing,
    Active,
    Watching,
    Paused,
    Stopping,
    Stopped,
    Failed,
}

impl std::fmt::Display for FolderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A request to move a folder to a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    Start,
    ChangesDetected,
    IndexingComplete,
    FileSystemChange,
    Pause,
    Resume,
    Stop,
    Fail,
}

impl FolderState {
    /// Whether `cmd` is a legal transition out of this state, and if so,
    /// the resulting state.
    #[must_use]
    pub fn apply(self, cmd: LifecycleCommand) -> Option<Self> {
        use FolderState::{
            Active, Created, Detecting, Failed, Indexing, Paused, Scanning, Stopped, Stopping,
            Watching,
        };
        use LifecycleCommand::{
            ChangesDetected, Fail, FileSystemChange, IndexingComplete, Pause, Resume, Start, Stop,
        };

        match (self, cmd) {
            (_, Fail) if !matches!(self, Stopped | Failed) => Some(Failed),
            (_, Stop) if !matches!(self, Stopped | Failed) => Some(Stopping),
            (Created, Start) => Some(Scanning),
            (Scanning, ChangesDetected) => Some(Detecting),
            (Detecting, ChangesDetected) => Some(Indexing),
            (Indexing, IndexingComplete) => Some(Active),
            (Active, FileSystemChange) => Some(Watching),
            (Watching, FileSystemChange) => Some(Detecting),
            (Active, Pause) => Some(Paused),
            (Paused, Resume) => Some(Active),
            (Stopping, IndexingComplete) => Some(Stopped),
            _ => None,
        }
    }
}

/// Probes and releases OS handles held against a folder's persistence
/// directory. Real releasing only matters on Windows, where an open
/// memory-mapped file blocks directory deletion; elsewhere this is a no-op.
pub trait HandleProbe: Send + Sync {
    /// Returns `true` once no process holds a lock on `path`.
    fn is_released(&self, path: &std::path::Path) -> bool;
}

/// The portable default: assumes handles are released as soon as the store
/// reports closed (true on every platform except Windows).
pub struct ImmediateRelease;

impl HandleProbe for ImmediateRelease {
    fn is_released(&self, _path: &std::path::Path) -> bool {
        true
    }
}

#[cfg(target_os = "windows")]
pub struct WindowsHandleProbe;

#[cfg(target_os = "windows")]
impl HandleProbe for WindowsHandleProbe {
    fn is_released(&self, path: &std::path::Path) -> bool {
        // Renaming a directory to itself fails with EBUSY/EPERM while a
        // descendant file is still memory-mapped or open for writing.
        std::fs::rename(path, path).is_ok()
    }
}

/// Retry-with-backoff wait for `probe` to report the persistence directory
/// released, as required on `Stopping` before the directory may be deleted.
///
/// # Errors
///
/// Returns [`OrchestratorError::HandleReleaseTimeout`] if `ceiling` elapses
/// before the probe succeeds.
pub async fn wait_for_handle_release(
    probe: &dyn HandleProbe,
    path: &std::path::Path,
    ceiling: Duration,
) -> OrchestratorResult<()> {
    let start = tokio::time::Instant::now();
    let mut backoff = Duration::from_millis(50);

    loop {
        if probe.is_released(path) {
            return Ok(());
        }
        if start.elapsed() >= ceiling {
            return Err(OrchestratorError::HandleReleaseTimeout(ceiling));
        }
        warn!(path = %path.display(), backoff_ms = backoff.as_millis(), "waiting for handle release");
        tokio::time::sleep(backoff.min(ceiling.saturating_sub(start.elapsed()))).await;
        backoff = (backoff * 2).min(Duration::from_secs(2));
    }
}

/// Owns one folder's current state and drives transitions. Actual scan/
/// detect/index/watch work is performed by the orchestrator; this struct
/// only enforces which transitions are legal and logs them.
pub struct FolderLifecycle {
    state: FolderState,
}

impl FolderLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FolderState::Created,
        }
    }

    #[must_use]
    pub fn state(&self) -> FolderState {
        self.state
    }

    /// Apply `cmd`, returning an error if it isn't legal from the current state.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::IllegalTransition`] if `cmd` isn't valid
    /// from the current state.
    pub fn transition(&mut self, cmd: LifecycleCommand) -> OrchestratorResult<FolderState> {
        let Some(next) = self.state.apply(cmd) else {
            return Err(OrchestratorError::IllegalTransition {
                from: self.state.to_string(),
                attempted: format!("{cmd:?}"),
            });
        };
        info!(from = %self.state, to = %next, "folder lifecycle transition");
        self.state = next;
        Ok(next)
    }
}

impl Default for FolderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleCommand::{ChangesDetected, Fail, FileSystemChange, IndexingComplete, Start, Stop};

    #[test]
    fn happy_path_reaches_active() {
        let mut lifecycle = FolderLifecycle::new();
        lifecycle.transition(Start).unwrap();
        lifecycle.transition(ChangesDetected).unwrap();
        lifecycle.transition(ChangesDetected).unwrap();
        assert_eq!(lifecycle.transition(IndexingComplete).unwrap(), FolderState::Active);
    }

    #[test]
    fn active_watching_cycle_returns_to_detecting_on_change() {
        let mut lifecycle = FolderLifecycle::new();
        lifecycle.transition(Start).unwrap();
        lifecycle.transition(ChangesDetected).unwrap();
        lifecycle.transition(ChangesDetected).unwrap();
        lifecycle.transition(IndexingComplete).unwrap();
        lifecycle.transition(FileSystemChange).unwrap();
        assert_eq!(
            lifecycle.transition(FileSystemChange).unwrap(),
            FolderState::Detecting
        );
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut lifecycle = FolderLifecycle::new();
        assert!(lifecycle.transition(IndexingComplete).is_err());
        assert_eq!(lifecycle.state(), FolderState::Created);
    }

    #[test]
    fn stop_is_legal_from_any_non_terminal_state() {
        let mut lifecycle = FolderLifecycle::new();
        assert_eq!(lifecycle.transition(Stop).unwrap(), FolderState::Stopping);
    }

    #[test]
    fn fail_is_terminal_and_not_reachable_from_failed() {
        let mut lifecycle = FolderLifecycle::new();
        lifecycle.transition(Fail).unwrap();
        assert_eq!(lifecycle.state(), FolderState::Failed);
        assert!(lifecycle.transition(Fail).is_err());
    }

    #[tokio::test]
    async fn handle_release_succeeds_immediately_on_portable_probe() {
        let probe = ImmediateRelease;
        let result = wait_for_handle_release(
            &probe,
            std::path::Path::new("/tmp/does-not-matter"),
            Duration::from_millis(100),
        )
        .await;
        assert!(result.is_ok());
    }
}
