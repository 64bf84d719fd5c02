// src/sync/event.rs

//! Translation of raw synchronisation notifications into [`SyncEvent`]s.
//!
//! The external notification schema is kept in [`RawSyncNotification`]; the
//! rest of the crate only ever sees the stable [`SyncEvent`] value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::SyncError;

/// A category of synchronisation activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Import,
    Export,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Setup, Phase::Import, Phase::Export];

    /// Map an external phase tag onto a known phase.
    pub fn from_tag(tag: &str) -> Option<Phase> {
        match tag {
            "setup" => Some(Phase::Setup),
            "import" => Some(Phase::Import),
            "export" => Some(Phase::Export),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Import => "import",
            Phase::Export => "export",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification as delivered by the synchronisation engine.
///
/// The phase tag is left as a free-form string so that phases added by the
/// engine later on can be recognised and dropped instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSyncNotification {
    #[serde(rename = "phase")]
    pub phase_tag: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// A translated synchronisation notification.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub phase: Phase,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub succeeded: bool,
    pub error: Option<SyncError>,
}

impl SyncEvent {
    /// Convert a raw notification, dropping it when the phase tag is unknown.
    ///
    /// Debug builds log unknown tags as errors so new engine phases are
    /// noticed during development; release builds only warn.
    pub fn translate(raw: RawSyncNotification) -> Option<SyncEvent> {
        let Some(phase) = Phase::from_tag(&raw.phase_tag) else {
            if cfg!(debug_assertions) {
                log::error!("Sync: Dropping notification with unrecognized phase '{}'", raw.phase_tag);
            } else {
                log::warn!("Sync: Dropping notification with unrecognized phase '{}'", raw.phase_tag);
            }
            return None;
        };

        Some(SyncEvent {
            phase,
            start_time: raw.start_time,
            end_time: raw.end_time,
            succeeded: raw.succeeded,
            error: raw.error.map(SyncError::msg),
        })
    }
}
