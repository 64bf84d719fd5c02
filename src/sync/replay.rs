// src/sync/replay.rs

//! Replay a scripted scenario through a live [`SyncMonitor`].
//!
//! A scenario is a TOML file with a list of `[[step]]` tables:
//!
//! ```toml
//! [[step]]
//! kind = "network"
//! status = "satisfied"
//! interfaces = ["en0"]
//!
//! [[step]]
//! kind = "account"
//! status = "available"
//!
//! [[step]]
//! kind = "sync"
//! phase = "export"
//! start_time = "2024-03-01T12:00:00Z"
//! end_time = "2024-03-01T12:00:01Z"
//! succeeded = false
//! error = "quota exceeded"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::environment::{AccountStatus, NetworkPath};
use super::event::RawSyncNotification;
use super::manager::{MonitorSources, SyncMonitor};
use super::sources::{ChannelAccountService, ChannelNetworkMonitor, ChannelSyncSource};
use super::state::{MonitorState, StatusReport};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayStep {
    Sync(RawSyncNotification),
    Network(NetworkPath),
    Account { status: AccountStatus },
    AccountFailure { message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<ReplayStep>,
}

impl Scenario {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse scenario TOML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid scenario file: {}", path.display()))
    }
}

/// Outcome of a single replayed step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: ReplayStep,
    /// Whether the monitor published a change before the settle timeout.
    pub changed: bool,
    pub report: StatusReport,
}

/// Feed every step into a fresh monitor and collect the report after each.
///
/// Steps whose effect never reaches the state are reported as unchanged once
/// `settle` elapses, such as notifications with an unknown phase.
pub async fn replay(scenario: &Scenario, settle: Duration) -> Result<Vec<StepOutcome>> {
    let sync_source = Arc::new(ChannelSyncSource::new());
    let network = Arc::new(ChannelNetworkMonitor::new());
    let account = Arc::new(ChannelAccountService::default());

    let monitor = SyncMonitor::new(MonitorSources {
        sync_events: sync_source.clone(),
        network: network.clone(),
        account: account.clone(),
    });
    let mut updates = monitor.subscribe();
    monitor.start_monitoring();

    // Let the initial account query land before the first step.
    wait_for_change(&mut updates, settle).await;

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for step in &scenario.steps {
        updates.borrow_and_update();
        match step {
            ReplayStep::Sync(notification) => {
                sync_source.publish(notification.clone());
            }
            ReplayStep::Network(path) => {
                network.publish(path.clone());
            }
            ReplayStep::Account { status } => {
                account.set_status(*status);
            }
            ReplayStep::AccountFailure { message } => {
                account.set_failure(message);
            }
        }

        let changed = wait_for_change(&mut updates, settle).await;
        let report = updates.borrow_and_update().report();
        log::debug!("Replay: {:?} -> {}", step, report.label);
        outcomes.push(StepOutcome {
            step: step.clone(),
            changed,
            report,
        });
    }

    monitor.stop().await.context("Monitor failed during replay")?;
    Ok(outcomes)
}

async fn wait_for_change(updates: &mut watch::Receiver<MonitorState>, settle: Duration) -> bool {
    matches!(tokio::time::timeout(settle, updates.changed()).await, Ok(Ok(())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(
            r#"
            [[step]]
            kind = "network"
            status = "unsatisfied"

            [[step]]
            kind = "account_failure"
            message = "timed out"

            [[step]]
            kind = "sync"
            phase = "setup"
            start_time = "2024-03-01T12:00:00Z"
            "#,
        )
        .unwrap();

        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.steps[0], ReplayStep::Network(NetworkPath::unsatisfied()));
        assert_eq!(
            scenario.steps[1],
            ReplayStep::AccountFailure {
                message: "timed out".to_string()
            }
        );
        match &scenario.steps[2] {
            ReplayStep::Sync(raw) => assert_eq!(raw.phase_tag, "setup"),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Scenario::parse("[[step]]\nkind = \"reboot\"\n").is_err());
    }

    #[test]
    fn test_empty_scenario() {
        assert!(Scenario::parse("").unwrap().steps.is_empty());
    }
}
