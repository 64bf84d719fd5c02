// src/sync/state.rs

//! Monitor state and the properties derived from it.
//!
//! [`MonitorState`] holds the three phase states, the environment and the
//! sticky last error. Everything else (errors, "not syncing", the summary) is
//! computed on each call so a reader can never see a stale value.

use serde::Serialize;

use super::environment::{AccountStatus, EnvironmentState, NetworkPath};
use super::error::SyncError;
use super::event::{Phase, SyncEvent};
use super::phase::PhaseState;
use super::status::{StatusColor, SyncSummary};

/// A single mutation of the monitor state, produced by one of the listeners.
#[derive(Debug, Clone)]
pub enum MonitorUpdate {
    Sync(SyncEvent),
    NetworkPath(NetworkPath),
    AccountStatus(Result<AccountStatus, SyncError>),
    ResetLastSyncError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitorState {
    pub setup: PhaseState,
    pub import: PhaseState,
    pub export: PhaseState,
    pub environment: EnvironmentState,
    last_sync_error: Option<SyncError>,
}

impl MonitorState {
    pub fn apply_update(&mut self, update: MonitorUpdate) {
        match update {
            MonitorUpdate::Sync(event) => self.apply_sync_event(&event),
            MonitorUpdate::NetworkPath(path) => self.environment.record_network_path(&path),
            MonitorUpdate::AccountStatus(result) => self.environment.record_account_query(result),
            MonitorUpdate::ResetLastSyncError => self.reset_last_sync_error(),
        }
    }

    /// Overwrite the state of the event's phase.
    pub fn apply_sync_event(&mut self, event: &SyncEvent) {
        let next = PhaseState::apply(event);
        if let Some(err) = next.error() {
            self.last_sync_error = Some(err.clone());
        }

        let slot = self.phase_mut(event.phase);
        if *slot != next {
            log::info!("Sync: {} {} -> {}", event.phase, slot.name(), next.name());
        }
        *slot = next;
    }

    pub fn phase(&self, phase: Phase) -> &PhaseState {
        match phase {
            Phase::Setup => &self.setup,
            Phase::Import => &self.import,
            Phase::Export => &self.export,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut PhaseState {
        match phase {
            Phase::Setup => &mut self.setup,
            Phase::Import => &mut self.import,
            Phase::Export => &mut self.export,
        }
    }

    pub fn is_network_available(&self) -> Option<bool> {
        self.environment.network_available
    }

    pub fn account_status(&self) -> Option<AccountStatus> {
        self.environment.account_status
    }

    pub fn account_status_error(&self) -> Option<&SyncError> {
        self.environment.account_status_error.as_ref()
    }

    /// Most recent error of any failed phase, kept until explicitly reset.
    pub fn last_sync_error(&self) -> Option<&SyncError> {
        self.last_sync_error.as_ref()
    }

    pub fn reset_last_sync_error(&mut self) {
        self.last_sync_error = None;
    }

    /// Error of a phase, reported only when the network is known to be up.
    ///
    /// Failures while offline, or before the network state is known, are
    /// expected and not actionable.
    pub fn phase_error(&self, phase: Phase) -> Option<&SyncError> {
        if !self.environment.is_network_available() {
            return None;
        }
        self.phase(phase).error()
    }

    pub fn setup_error(&self) -> Option<&SyncError> {
        self.phase_error(Phase::Setup)
    }

    pub fn import_error(&self) -> Option<&SyncError> {
        self.phase_error(Phase::Import)
    }

    pub fn export_error(&self) -> Option<&SyncError> {
        self.phase_error(Phase::Export)
    }

    pub fn has_sync_error(&self) -> bool {
        Phase::ALL.iter().any(|&phase| self.phase_error(phase).is_some())
    }

    /// Nothing known is wrong: account and network are up, setup succeeded
    /// and no phase reports an error.
    pub fn should_be_syncing(&self) -> bool {
        self.environment.is_account_available()
            && self.environment.is_network_available()
            && !self.has_sync_error()
            && self.setup.is_succeeded()
    }

    /// Everything looks fine yet the engine never started importing.
    pub fn is_not_syncing(&self) -> bool {
        self.should_be_syncing() && self.import.is_not_started()
    }

    pub fn sync_state_summary(&self) -> SyncSummary {
        let env = &self.environment;
        let phases = [&self.setup, &self.import, &self.export];

        if env.network_available == Some(false) {
            SyncSummary::NoNetwork
        } else if env.account_status.is_some_and(|s| !s.is_available()) {
            SyncSummary::AccountNotAvailable
        } else if self.has_sync_error() {
            SyncSummary::Error
        } else if self.is_not_syncing() {
            SyncSummary::NotSyncing
        } else if phases.iter().all(|p| p.is_not_started()) {
            SyncSummary::NotStarted
        } else if phases.iter().any(|p| p.is_in_progress()) {
            SyncSummary::InProgress
        } else if self.import.is_succeeded() && self.export.is_succeeded() {
            SyncSummary::Succeeded
        } else {
            SyncSummary::Unknown
        }
    }

    pub fn report(&self) -> StatusReport {
        let summary = self.sync_state_summary();
        let describe = |err: Option<&SyncError>| err.map(SyncError::description);

        StatusReport {
            summary,
            label: summary.label(),
            icon: summary.icon(),
            color: summary.color(),
            broken: summary.is_broken(),
            in_progress: summary.is_in_progress(),
            setup: self.setup.name(),
            import: self.import.name(),
            export: self.export.name(),
            network_available: self.environment.network_available,
            account_status: self.environment.account_status,
            account_status_error: describe(self.account_status_error()),
            has_sync_error: self.has_sync_error(),
            should_be_syncing: self.should_be_syncing(),
            is_not_syncing: self.is_not_syncing(),
            setup_error: describe(self.setup_error()),
            import_error: describe(self.import_error()),
            export_error: describe(self.export_error()),
            last_sync_error: describe(self.last_sync_error()),
        }
    }
}

/// Flat, serialisable view of a [`MonitorState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub summary: SyncSummary,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: StatusColor,
    pub broken: bool,
    pub in_progress: bool,
    pub setup: &'static str,
    pub import: &'static str,
    pub export: &'static str,
    pub network_available: Option<bool>,
    pub account_status: Option<AccountStatus>,
    pub account_status_error: Option<String>,
    pub has_sync_error: bool,
    pub should_be_syncing: bool,
    pub is_not_syncing: bool,
    pub setup_error: Option<String>,
    pub import_error: Option<String>,
    pub export_error: Option<String>,
    pub last_sync_error: Option<String>,
}
