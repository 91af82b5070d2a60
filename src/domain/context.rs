//! # Operation Context
//!
//! Per-call context threaded through every pipeline and store call. It carries
//! the transaction id and acting user used for events and tracking, plus the
//! cancellation token and optional deadline that bound the call.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{NboxError, Result};

/// Username recorded when the caller is anonymous.
pub const DEFAULT_USERNAME: &str = "ghost";

#[derive(Debug, Clone)]
pub struct OperationContext {
    pub transaction_id: Uuid,
    pub username: Option<String>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationContext {
    pub fn new() -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            username: None,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Ties this context to an externally owned token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The acting user, or `ghost` when none was provided.
    pub fn username(&self) -> &str {
        self.username.as_deref().filter(|name| !name.is_empty()).unwrap_or(DEFAULT_USERNAME)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns a cancellation error naming `operation` if the call should stop.
    pub fn ensure_active(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(NboxError::cancelled(operation))
        } else {
            Ok(())
        }
    }

    /// Completes once the token is cancelled or the deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancellation.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancellation.cancelled().await,
        }
    }
}
