//! # Store Deadlines
//!
//! Every store call made by the engine is bounded by a fixed deadline. A
//! call that overruns is dropped; for the approval unit that drop rolls the
//! SQLite transaction back, so nothing partial survives a timeout.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{RedemptionError, RedemptionResult};

/// Deadline applied to store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    after: Duration,
}

impl Deadline {
    pub fn new(after: Duration) -> Self {
        Deadline { after }
    }

    pub fn duration(&self) -> Duration {
        self.after
    }

    /// Runs `fut`, converting its error and mapping an overrun to
    /// [`RedemptionError::Timeout`].
    pub async fn run<T, E, F>(&self, operation: &'static str, fut: F) -> RedemptionResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RedemptionError>,
    {
        match tokio::time::timeout(self.after, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                warn!(operation, after_secs = self.after.as_secs(), "Store call timed out");
                Err(RedemptionError::Timeout {
                    operation,
                    after: self.after,
                })
            }
        }
    }
}
