// src/sync/mod.rs

// Declare sub-modules for the sync monitor
pub mod environment;
pub mod error;
pub mod event;
pub mod manager;
pub mod phase;
pub mod replay;
pub mod sources;
pub mod state;
pub mod status;

pub use environment::{AccountStatus, EnvironmentState, NetworkPath, PathStatus};
pub use error::SyncError;
pub use event::{Phase, RawSyncNotification, SyncEvent};
pub use manager::{MonitorSources, SyncMonitor};
pub use phase::PhaseState;
pub use state::{MonitorState, MonitorUpdate, StatusReport};
pub use status::{StatusColor, SyncSummary};
