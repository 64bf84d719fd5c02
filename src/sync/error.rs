// src/sync/error.rs

//! Error values that end up inside the observable monitor state.

use std::fmt;
use std::sync::Arc;

/// A cloneable error carried by phase states and the account tracker.
///
/// The wrapped error type is not comparable, so two `SyncError`s are equal
/// when their rendered descriptions are equal.
#[derive(Clone)]
pub struct SyncError(Arc<anyhow::Error>);

impl SyncError {
    /// Build an error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        SyncError(Arc::new(anyhow::anyhow!("{}", message)))
    }

    /// Rendered description, including any attached context.
    pub fn description(&self) -> String {
        format!("{:#}", self.0)
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError(Arc::new(err))
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.description() == other.description()
    }
}

impl Eq for SyncError {}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl fmt::Debug for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncError").field(&self.description()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_errors_compare_by_description() {
        let a = SyncError::msg("quota exceeded");
        let b = SyncError::from(anyhow::anyhow!("quota exceeded"));
        let c = SyncError::msg("network lost");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_description_includes_context() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("timed out")).context("account query failed");
        let err = SyncError::from(err.unwrap_err());
        assert_eq!(err.description(), "account query failed: timed out");
        assert_eq!(err.to_string(), err.description());
    }
}
