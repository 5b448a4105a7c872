//! OS signal handling for the daemon supervisor: SIGHUP triggers a config
//! reload, SIGINT/SIGTERM trigger graceful shutdown.

use std::sync::Arc;

use futures::stream::StreamExt;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Reload,
    Shutdown,
}

pub type SignalEventSlot = Arc<Mutex<Option<SignalEvent>>>;

/// Spawns a task that listens for SIGHUP/SIGINT/SIGTERM, stashes the
/// corresponding [`SignalEvent`] into `slot`, and wakes `notify` so a
/// `tokio::select!` loop elsewhere can react to it.
pub fn spawn_signal_listener(notify: Arc<Notify>, slot: SignalEventSlot) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Ok(mut signals) = signal_hook_tokio::Signals::new([SIGHUP, SIGINT, SIGTERM]) else {
            warn!("failed to register signal handlers; reload/shutdown signals will be ignored");
            return;
        };

        while let Some(signal) = signals.next().await {
            let event = match signal {
                SIGHUP => SignalEvent::Reload,
                SIGINT | SIGTERM => SignalEvent::Shutdown,
                _ => continue,
            };
            info!(?event, "received signal");
            *slot.lock().await = Some(event);
            notify.notify_one();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slot_starts_empty() {
        let slot: SignalEventSlot = Arc::new(Mutex::new(None));
        assert!(slot.lock().await.is_none());
    }
}
