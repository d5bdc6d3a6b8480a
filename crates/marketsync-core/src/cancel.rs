use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied stop condition observed between batch items.
///
/// Combines an explicit cancellation token with an optional deadline. Clones
/// share the same token.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Why a batch stopped before attempting every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Interruption {
    Cancelled,
    DeadlineExceeded,
    /// A batch-fatal error (e.g. rejected credentials) made further calls pointless.
    Halted { code: String },
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the reason to stop, if any. Explicit cancellation wins over the deadline.
    pub fn interruption(&self) -> Option<Interruption> {
        if self.token.is_cancelled() {
            return Some(Interruption::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interruption::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.interruption().is_some()
    }
}
