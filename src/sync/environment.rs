// src/sync/environment.rs

//! Network and account trackers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::SyncError;

/// Link status reported by a network path update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    Satisfied,
    Unsatisfied,
    RequiresConnection,
}

/// A network path update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkPath {
    /// `None` on platforms that do not expose link status.
    #[serde(default)]
    pub status: Option<PathStatus>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl NetworkPath {
    pub fn satisfied(interfaces: &[&str]) -> Self {
        NetworkPath {
            status: Some(PathStatus::Satisfied),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn unsatisfied() -> Self {
        NetworkPath {
            status: Some(PathStatus::Unsatisfied),
            interfaces: Vec::new(),
        }
    }

    /// Whether this path counts as usable network.
    ///
    /// Without link status, any available interface counts.
    pub fn is_available(&self) -> bool {
        match self.status {
            Some(status) => status == PathStatus::Satisfied,
            None => !self.interfaces.is_empty(),
        }
    }
}

/// Account status as reported by the account subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    CouldNotDetermine,
    Available,
    Restricted,
    NoAccount,
    TemporarilyUnavailable,
}

impl AccountStatus {
    pub fn is_available(&self) -> bool {
        *self == AccountStatus::Available
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::CouldNotDetermine => "could_not_determine",
            AccountStatus::Available => "available",
            AccountStatus::Restricted => "restricted",
            AccountStatus::NoAccount => "no_account",
            AccountStatus::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is known about the environment synchronisation depends on.
///
/// `network_available` and `account_status` start unknown and are never
/// reset to unknown once learned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentState {
    pub network_available: Option<bool>,
    pub account_status: Option<AccountStatus>,
    /// Set when the latest account-status query failed.
    pub account_status_error: Option<SyncError>,
}

impl EnvironmentState {
    /// Network tracker: record a path update.
    pub fn record_network_path(&mut self, path: &NetworkPath) {
        let available = path.is_available();
        if self.network_available != Some(available) {
            log::info!("Network: available = {}", available);
        }
        self.network_available = Some(available);
    }

    /// Account tracker: record the outcome of an account-status query.
    ///
    /// A failed query keeps the last known status and only flags the error.
    pub fn record_account_query(&mut self, result: Result<AccountStatus, SyncError>) {
        match result {
            Ok(status) => {
                if self.account_status != Some(status) {
                    log::info!("Account: status = {}", status);
                }
                self.account_status = Some(status);
                self.account_status_error = None;
            }
            Err(err) => {
                log::warn!("Account: status query failed: {}", err);
                self.account_status_error = Some(err);
            }
        }
    }

    pub fn is_network_available(&self) -> bool {
        self.network_available == Some(true)
    }

    pub fn is_account_available(&self) -> bool {
        self.account_status.is_some_and(|s| s.is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_availability() {
        assert!(NetworkPath::satisfied(&["en0"]).is_available());
        assert!(!NetworkPath::unsatisfied().is_available());

        let requires = NetworkPath {
            status: Some(PathStatus::RequiresConnection),
            interfaces: vec!["wlan0".to_string()],
        };
        assert!(!requires.is_available());
    }

    #[test]
    fn test_network_fallback_on_interface_count() {
        let with_interface = NetworkPath {
            status: None,
            interfaces: vec!["eth0".to_string()],
        };
        assert!(with_interface.is_available());
        assert!(!NetworkPath::default().is_available());
    }

    #[test]
    fn test_network_tracker() {
        let mut env = EnvironmentState::default();
        assert_eq!(env.network_available, None);

        env.record_network_path(&NetworkPath::unsatisfied());
        assert_eq!(env.network_available, Some(false));
        env.record_network_path(&NetworkPath::satisfied(&["en0"]));
        assert_eq!(env.network_available, Some(true));
        assert!(env.is_network_available());
    }

    #[test]
    fn test_account_query_failure_keeps_known_status() {
        let mut env = EnvironmentState::default();
        env.record_account_query(Ok(AccountStatus::Available));
        env.record_account_query(Err(SyncError::msg("request timed out")));

        assert_eq!(env.account_status, Some(AccountStatus::Available));
        assert_eq!(
            env.account_status_error.as_ref().map(SyncError::description).as_deref(),
            Some("request timed out")
        );

        env.record_account_query(Ok(AccountStatus::NoAccount));
        assert_eq!(env.account_status, Some(AccountStatus::NoAccount));
        assert!(env.account_status_error.is_none());
        assert!(!env.is_account_available());
    }

    #[test]
    fn test_account_query_failure_before_any_status() {
        let mut env = EnvironmentState::default();
        env.record_account_query(Err(SyncError::msg("offline")));
        assert_eq!(env.account_status, None);
        assert!(env.account_status_error.is_some());
    }
}
