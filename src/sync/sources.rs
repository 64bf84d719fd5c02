// src/sync/sources.rs

//! Seams to the three external collaborators, plus channel-backed adapters.
//!
//! A host bridges platform callbacks into the monitor by publishing into the
//! channel adapters; tests use the same adapters as fakes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use super::environment::{AccountStatus, NetworkPath};
use super::event::RawSyncNotification;

/// A potentially infinite stream of notifications.
///
/// An `Err` item means the underlying stream failed; the listener reading it
/// stops with that error.
pub type Notifications<T> = mpsc::UnboundedReceiver<Result<T>>;

/// Source of synchronisation lifecycle notifications.
pub trait SyncNotificationSource: Send + Sync {
    fn subscribe(&self) -> Notifications<RawSyncNotification>;
}

/// Network path monitor with an explicit start/stop lifecycle.
pub trait NetworkPathMonitor: Send + Sync {
    /// Start monitoring and return the stream of path updates.
    fn start(&self) -> Notifications<NetworkPath>;
    fn stop(&self);
}

/// Account subsystem: change notifications and on-demand status queries.
#[async_trait]
pub trait AccountStatusProvider: Send + Sync {
    fn subscribe_changes(&self) -> Notifications<()>;
    async fn account_status(&self) -> Result<AccountStatus>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out of published items to every live subscriber.
pub struct NotificationHub<T> {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Result<T>>>>,
}

impl<T> Default for NotificationHub<T> {
    fn default() -> Self {
        NotificationHub {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> NotificationHub<T> {
    pub fn subscribe(&self) -> Notifications<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Deliver an item to all subscribers, returning how many received it.
    pub fn publish(&self, item: T) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| tx.send(Ok(item.clone())).is_ok());
        subscribers.len()
    }

    /// Fail every subscriber's stream and forget them.
    pub fn fail(&self, message: impl Display) {
        for tx in lock(&self.subscribers).drain(..) {
            let _ = tx.send(Err(anyhow!("{}", message)));
        }
    }

    /// End every subscriber's stream.
    pub fn close(&self) {
        lock(&self.subscribers).clear();
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

/// Synchronisation notifications published by the host.
#[derive(Default)]
pub struct ChannelSyncSource {
    hub: NotificationHub<RawSyncNotification>,
}

impl ChannelSyncSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hub(&self) -> &NotificationHub<RawSyncNotification> {
        &self.hub
    }

    pub fn publish(&self, notification: RawSyncNotification) -> usize {
        self.hub.publish(notification)
    }
}

impl SyncNotificationSource for ChannelSyncSource {
    fn subscribe(&self) -> Notifications<RawSyncNotification> {
        self.hub.subscribe()
    }
}

/// Network path updates published by the host.
///
/// Tracks whether it is running and how often it was started and stopped.
#[derive(Default)]
pub struct ChannelNetworkMonitor {
    hub: NotificationHub<NetworkPath>,
    running: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ChannelNetworkMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hub(&self) -> &NotificationHub<NetworkPath> {
        &self.hub
    }

    pub fn publish(&self, path: NetworkPath) -> usize {
        self.hub.publish(path)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl NetworkPathMonitor for ChannelNetworkMonitor {
    fn start(&self) -> Notifications<NetworkPath> {
        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.hub.subscribe()
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.hub.close();
    }
}

/// Account service whose status is set by the host.
///
/// Each query answers with the status (or failure) set last.
pub struct ChannelAccountService {
    changes: NotificationHub<()>,
    status: Mutex<std::result::Result<AccountStatus, String>>,
    queries: AtomicUsize,
}

impl Default for ChannelAccountService {
    fn default() -> Self {
        ChannelAccountService {
            changes: NotificationHub::default(),
            status: Mutex::new(Ok(AccountStatus::CouldNotDetermine)),
            queries: AtomicUsize::new(0),
        }
    }
}

impl ChannelAccountService {
    pub fn new(status: AccountStatus) -> Self {
        let service = Self::default();
        *lock(&service.status) = Ok(status);
        service
    }

    pub fn hub(&self) -> &NotificationHub<()> {
        &self.changes
    }

    /// Set the status answered by queries and announce a change.
    pub fn set_status(&self, status: AccountStatus) -> usize {
        *lock(&self.status) = Ok(status);
        self.changes.publish(())
    }

    /// Make queries fail and announce a change.
    pub fn set_failure(&self, message: impl Display) -> usize {
        *lock(&self.status) = Err(message.to_string());
        self.changes.publish(())
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStatusProvider for ChannelAccountService {
    fn subscribe_changes(&self) -> Notifications<()> {
        self.changes.subscribe()
    }

    async fn account_status(&self) -> Result<AccountStatus> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let status = lock(&self.status).clone();
        status.map_err(|message| anyhow!(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hub_fans_out_and_prunes() {
        let hub = NotificationHub::<u32>::default();
        let mut a = hub.subscribe();
        let b = hub.subscribe();
        assert_eq!(hub.publish(1), 2);

        drop(b);
        assert_eq!(hub.publish(2), 1);
        assert_eq!(a.recv().await.unwrap().unwrap(), 1);
        assert_eq!(a.recv().await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_hub_fail_and_close() {
        let hub = NotificationHub::<u32>::default();
        let mut failed = hub.subscribe();
        hub.fail("stream broke");
        let err = failed.recv().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "stream broke");
        assert!(failed.recv().await.is_none());

        let mut closed = hub.subscribe();
        hub.close();
        assert!(closed.recv().await.is_none());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_network_monitor_lifecycle() {
        let monitor = ChannelNetworkMonitor::new();
        let mut paths = monitor.start();
        assert!(monitor.is_running());
        monitor.publish(NetworkPath::unsatisfied());
        assert_eq!(paths.recv().await.unwrap().unwrap(), NetworkPath::unsatisfied());

        monitor.stop();
        assert!(!monitor.is_running());
        assert_eq!((monitor.start_count(), monitor.stop_count()), (1, 1));
        assert!(paths.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_account_service_answers_latest_status() {
        let service = ChannelAccountService::new(AccountStatus::Available);
        let mut changes = service.subscribe_changes();
        assert_eq!(service.account_status().await.unwrap(), AccountStatus::Available);

        service.set_failure("request timed out");
        assert!(changes.recv().await.unwrap().is_ok());
        let err = service.account_status().await.unwrap_err();
        assert_eq!(err.to_string(), "request timed out");
        assert_eq!(service.query_count(), 2);
    }
}
