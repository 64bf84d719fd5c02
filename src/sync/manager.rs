// src/sync/manager.rs

//! Monitor orchestrator.
//!
//! [`SyncMonitor`] owns the monitor state and a supervisor task. The
//! supervisor runs three sibling listeners (sync notifications, network path
//! updates, account changes) and is the only place state is mutated while
//! monitoring: the listeners and [`SyncMonitor::reset_last_sync_error`] funnel
//! [`MonitorUpdate`]s to it over one channel, and each applied update is
//! published to observers through a `watch` channel.
//!
//! If a listener fails, the supervisor ends with that error and is not
//! restarted; calling [`SyncMonitor::start_monitoring`] again starts over.

use anyhow::{anyhow, Context, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use super::environment::NetworkPath;
use super::error::SyncError;
use super::event::{RawSyncNotification, SyncEvent};
use super::sources::{AccountStatusProvider, NetworkPathMonitor, Notifications, SyncNotificationSource};
use super::state::{MonitorState, MonitorUpdate};

/// The three collaborators the monitor listens to.
#[derive(Clone)]
pub struct MonitorSources {
    pub sync_events: Arc<dyn SyncNotificationSource>,
    pub network: Arc<dyn NetworkPathMonitor>,
    pub account: Arc<dyn AccountStatusProvider>,
}

pub struct SyncMonitor {
    sources: MonitorSources,
    state: Arc<watch::Sender<MonitorState>>,
    supervisor: Mutex<Option<Supervisor>>,
}

/// A spawned supervisor and a handle to its update channel.
///
/// The sender is weak so the channel still closes once every listener is done.
struct Supervisor {
    handle: JoinHandle<Result<()>>,
    updates: mpsc::WeakUnboundedSender<MonitorUpdate>,
}

impl SyncMonitor {
    pub fn new(sources: MonitorSources) -> Self {
        let (state, _) = watch::channel(MonitorState::default());
        SyncMonitor {
            sources,
            state: Arc::new(state),
            supervisor: Mutex::new(None),
        }
    }

    /// Ensure listening has begun. No-op while the supervisor is running.
    ///
    /// Must be called from within a Tokio runtime. All sources are subscribed
    /// before this returns, so notifications published afterwards are seen.
    pub fn start_monitoring(&self) {
        let mut supervisor = self.supervisor();
        match supervisor.as_ref() {
            Some(running) if !running.handle.is_finished() => return,
            Some(_) => log::info!("Monitor: Restarting listeners after supervisor exit"),
            None => log::info!("Monitor: Starting listeners"),
        }

        let sync_events = self.sources.sync_events.subscribe();
        let (network, network_paths) = NetworkMonitorGuard::start(Arc::clone(&self.sources.network));
        let account_changes = self.sources.account.subscribe_changes();

        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let updates = update_tx.downgrade();
        let handle = tokio::spawn(run_supervisor(
            Arc::clone(&self.state),
            network,
            update_tx,
            update_rx,
            sync_events,
            network_paths,
            account_changes,
            Arc::clone(&self.sources.account),
        ));
        *supervisor = Some(Supervisor { handle, updates });
    }

    pub fn is_monitoring(&self) -> bool {
        self.supervisor().as_ref().is_some_and(|running| !running.handle.is_finished())
    }

    /// Cancel all listeners and return how the supervisor ended.
    ///
    /// Cancellation itself is not an error; a listener failure that already
    /// ended the supervisor is returned.
    pub async fn stop(&self) -> Result<()> {
        let Some(Supervisor { handle, .. }) = self.supervisor().take() else {
            return Ok(());
        };
        handle.abort();
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                log::info!("Monitor: Stopped");
                Ok(())
            }
            Err(e) => Err(anyhow!("monitor supervisor panicked: {}", e)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> MonitorState {
        self.state.borrow().clone()
    }

    /// Clear the sticky error.
    ///
    /// While monitoring, the reset is queued behind updates already received
    /// and applied by the supervisor; otherwise it is applied immediately.
    pub fn reset_last_sync_error(&self) {
        let updates = self.supervisor().as_ref().and_then(|running| running.updates.upgrade());
        let unsent = match updates {
            Some(tx) => tx.send(MonitorUpdate::ResetLastSyncError).err().map(|e| e.0),
            None => Some(MonitorUpdate::ResetLastSyncError),
        };
        if let Some(update) = unsent {
            self.state.send_modify(|s| s.apply_update(update));
        }
    }

    fn supervisor(&self) -> MutexGuard<'_, Option<Supervisor>> {
        self.supervisor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncMonitor {
    fn drop(&mut self) {
        if let Some(running) = self.supervisor().take() {
            running.handle.abort();
        }
    }
}

/// A started network monitor; stopped when dropped, on every exit path.
struct NetworkMonitorGuard {
    monitor: Arc<dyn NetworkPathMonitor>,
}

impl NetworkMonitorGuard {
    fn start(monitor: Arc<dyn NetworkPathMonitor>) -> (Self, Notifications<NetworkPath>) {
        let paths = monitor.start();
        (NetworkMonitorGuard { monitor }, paths)
    }
}

impl Drop for NetworkMonitorGuard {
    fn drop(&mut self) {
        log::debug!("Monitor: Stopping network path monitor");
        self.monitor.stop();
    }
}

async fn run_supervisor(
    state: Arc<watch::Sender<MonitorState>>,
    // Dropped with the supervisor future, before `SyncMonitor::stop` returns.
    _network: NetworkMonitorGuard,
    update_tx: mpsc::UnboundedSender<MonitorUpdate>,
    mut update_rx: mpsc::UnboundedReceiver<MonitorUpdate>,
    sync_events: Notifications<RawSyncNotification>,
    network_paths: Notifications<NetworkPath>,
    account_changes: Notifications<()>,
    account: Arc<dyn AccountStatusProvider>,
) -> Result<()> {
    // Dropping the set aborts every listener still running.
    let mut listeners = JoinSet::new();
    listeners.spawn(listen_sync_events(sync_events, update_tx.clone()));
    listeners.spawn(listen_network_paths(network_paths, update_tx.clone()));
    listeners.spawn(listen_account_changes(account_changes, account, update_tx));

    let result = loop {
        tokio::select! {
            biased;

            Some(update) = update_rx.recv() => {
                state.send_modify(|s| s.apply_update(update));
            }

            Some(joined) = listeners.join_next() => {
                match joined {
                    Ok(Ok(())) => log::debug!("Monitor: A listener finished"),
                    Ok(Err(e)) => break Err(e),
                    Err(e) => break Err(anyhow!("monitor listener panicked: {}", e)),
                }
            }

            else => break Ok(()),
        }
    };

    // Updates queued before the channel closed still land; later senders
    // see the closed channel.
    update_rx.close();
    while let Ok(update) = update_rx.try_recv() {
        state.send_modify(|s| s.apply_update(update));
    }

    if let Err(e) = &result {
        log::error!("Monitor: Stopped after listener failure: {:#}", e);
    }
    result
}

/// Forward an update to the supervisor. `false` when it has gone away.
fn forward(tx: &mpsc::UnboundedSender<MonitorUpdate>, update: MonitorUpdate) -> bool {
    tx.send(update).is_ok()
}

async fn listen_sync_events(
    mut notifications: Notifications<RawSyncNotification>,
    tx: mpsc::UnboundedSender<MonitorUpdate>,
) -> Result<()> {
    log::debug!("Monitor: Listening for sync notifications");
    while let Some(notification) = notifications.recv().await {
        let notification = notification.context("sync notification stream failed")?;
        if let Some(event) = SyncEvent::translate(notification) {
            if !forward(&tx, MonitorUpdate::Sync(event)) {
                break;
            }
        }
    }
    Ok(())
}

async fn listen_network_paths(
    mut paths: Notifications<NetworkPath>,
    tx: mpsc::UnboundedSender<MonitorUpdate>,
) -> Result<()> {
    log::debug!("Monitor: Listening for network path updates");
    while let Some(path) = paths.recv().await {
        let path = path.context("network path stream failed")?;
        if !forward(&tx, MonitorUpdate::NetworkPath(path)) {
            break;
        }
    }
    Ok(())
}

/// Query the account status once at start and again on every change.
///
/// Queries run concurrently with the change loop; when two overlap, the one
/// that completes last decides the recorded status.
async fn listen_account_changes(
    mut changes: Notifications<()>,
    account: Arc<dyn AccountStatusProvider>,
    tx: mpsc::UnboundedSender<MonitorUpdate>,
) -> Result<()> {
    log::debug!("Monitor: Listening for account changes");
    let mut queries = JoinSet::new();
    queries.spawn(query_account_status(Arc::clone(&account), tx.clone()));

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Some(change) => {
                    change.context("account change stream failed")?;
                    queries.spawn(query_account_status(Arc::clone(&account), tx.clone()));
                }
                None => break,
            },
            Some(joined) = queries.join_next() => {
                match joined {
                    Err(e) if e.is_panic() => log::error!("Monitor: Account status query panicked: {}", e),
                    Err(e) => log::warn!("Monitor: Account status query aborted: {}", e),
                    Ok(()) => {}
                }
            }
        }
    }

    while queries.join_next().await.is_some() {}
    Ok(())
}

async fn query_account_status(account: Arc<dyn AccountStatusProvider>, tx: mpsc::UnboundedSender<MonitorUpdate>) {
    let result = account
        .account_status()
        .await
        .context("account status query failed")
        .map_err(SyncError::from);
    forward(&tx, MonitorUpdate::AccountStatus(result));
}
