use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use shelflife_events::Subscription;

use crate::repository::{InventoryRepository, InventorySnapshot};

const TICK: Duration = Duration::from_millis(250);

/// Handle to a running watcher. Dropping it leaves the watcher running until
/// the repository goes away; call [`WatchHandle::unsubscribe`] to stop it.
#[derive(Debug)]
pub struct WatchHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop delivering snapshots and wait for the watcher thread to exit.
    pub fn unsubscribe(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Callback-style subscription to inventory snapshots.
///
/// The handler first receives the current snapshot, then one snapshot per
/// change. When several changes queue up while the handler is busy, only the
/// newest snapshot is delivered.
#[derive(Debug)]
pub struct SnapshotWatcher;

impl SnapshotWatcher {
    /// Subscribe to `repo` and deliver snapshots to `handler` on a named thread.
    ///
    /// The subscription is taken before the thread starts, so no change made
    /// after this call returns can be missed.
    pub fn spawn<R, H, E>(name: &str, repo: &R, mut handler: H) -> std::io::Result<WatchHandle>
    where
        R: InventoryRepository + ?Sized,
        H: FnMut(InventorySnapshot) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = repo.subscribe();
        let worker = name.to_string();

        let join = thread::Builder::new()
            .name(worker.clone())
            .spawn(move || watch_loop(&worker, sub, shutdown_rx, &mut handler))?;

        Ok(WatchHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn watch_loop<H, E>(
    name: &str,
    sub: Subscription<InventorySnapshot>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) where
    H: FnMut(InventorySnapshot) -> Result<(), E>,
    E: core::fmt::Debug,
{
    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(TICK) {
            Ok(first) => {
                let snapshot = sub.latest().unwrap_or(first);
                if let Err(err) = handler(snapshot) {
                    warn!(watcher = name, error = ?err, "snapshot handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(watcher = name, "snapshot watcher stopped");
}
