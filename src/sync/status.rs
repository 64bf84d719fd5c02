// src/sync/status.rs
// Summary classification shown to users, plus the hints needed to render it.

use serde::Serialize;
use std::fmt;

/// Severity class used to colour a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Neutral,
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSummary {
    NoNetwork,
    AccountNotAvailable,
    Error,
    NotSyncing,
    NotStarted,
    InProgress,
    Succeeded,
    Unknown,
}

impl SyncSummary {
    /// Symbol identifier for the status icon.
    pub fn icon(&self) -> &'static str {
        match self {
            SyncSummary::NoNetwork => "bolt.horizontal.icloud",
            SyncSummary::AccountNotAvailable => "person.icloud",
            SyncSummary::Error => "exclamationmark.icloud",
            SyncSummary::NotSyncing => "xmark.icloud",
            SyncSummary::NotStarted => "icloud.dashed",
            SyncSummary::InProgress => "arrow.clockwise.icloud",
            SyncSummary::Succeeded => "checkmark.icloud",
            SyncSummary::Unknown => "questionmark.square.dashed",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            SyncSummary::Succeeded => StatusColor::Green,
            SyncSummary::AccountNotAvailable | SyncSummary::Error | SyncSummary::NotSyncing => StatusColor::Red,
            SyncSummary::NoNetwork
            | SyncSummary::NotStarted
            | SyncSummary::InProgress
            | SyncSummary::Unknown => StatusColor::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncSummary::NoNetwork => "No network available",
            SyncSummary::AccountNotAvailable => "Account not available",
            SyncSummary::Error => "Sync error",
            SyncSummary::NotSyncing => "Not syncing",
            SyncSummary::NotStarted => "Sync not started",
            SyncSummary::InProgress => "Syncing",
            SyncSummary::Succeeded => "Synced",
            SyncSummary::Unknown => "Sync status unknown",
        }
    }

    /// Whether the summary means synchronisation is not working.
    pub fn is_broken(&self) -> bool {
        matches!(self, SyncSummary::Error | SyncSummary::NotSyncing | SyncSummary::Unknown)
    }

    pub fn is_in_progress(&self) -> bool {
        *self == SyncSummary::InProgress
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
