use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;

use crate::chart::ContainerSize;

pub const DEFAULT_LAYOUT_RETRY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    /// Container not yet measured at a non-zero width.
    Waiting,
    Resolved(ContainerSize),
    Cancelled,
}

/// Result of feeding one container measurement into the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStep {
    Ready(ContainerSize),
    RetryScheduled,
    Ignored,
}

/// Defers surface creation until the host container has a width.
///
/// At most one retry timer exists at any time; scheduling a new one replaces
/// the old, and `cancel` drops it.
pub struct LayoutGate {
    state: LayoutState,
    retry_delay: Duration,
    warn_after: u32,
    attempts: u32,
    timer: Option<Pin<Box<Sleep>>>,
}

impl LayoutGate {
    pub fn new(retry_delay: Duration, warn_after: u32) -> Self {
        Self {
            state: LayoutState::Waiting,
            retry_delay,
            warn_after,
            attempts: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        self.state == LayoutState::Waiting
    }

    /// Number of measurements taken so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn observe(&mut self, size: ContainerSize) -> LayoutStep {
        if !self.is_waiting() {
            return LayoutStep::Ignored;
        }
        self.attempts += 1;
        if size.is_resolved() {
            self.timer = None;
            self.state = LayoutState::Resolved(size);
            tracing::debug!(
                attempts = self.attempts,
                width = size.width,
                height = size.height,
                "Container layout resolved"
            );
            return LayoutStep::Ready(size);
        }

        if self.attempts == self.warn_after {
            tracing::warn!(
                attempts = self.attempts,
                "Container still has zero width, continuing to retry"
            );
        } else {
            tracing::debug!(attempts = self.attempts, "Container has zero width, retrying");
        }
        self.timer = Some(Box::pin(tokio::time::sleep(self.retry_delay)));
        LayoutStep::RetryScheduled
    }

    /// Completes when the pending retry timer fires; never completes without one.
    pub async fn retry_elapsed(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => std::future::pending::<()>().await,
        }
    }

    pub fn cancel(&mut self) {
        self.timer = None;
        if self.is_waiting() {
            self.state = LayoutState::Cancelled;
        }
    }
}

impl std::fmt::Debug for LayoutGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutGate")
            .field("state", &self.state)
            .field("retry_delay", &self.retry_delay)
            .field("attempts", &self.attempts)
            .field("pending_timer", &self.timer.is_some())
            .finish()
    }
}
