//! Visible-range propagation from the primary pane to its followers.

use crate::chart::pane::PaneKind;
use crate::model::candle::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq)]
struct Subscription {
    id: SubscriptionId,
    target: PaneKind,
}

/// Observer relationship between one source pane and any number of
/// follower panes. Owned by a surface; once closed it never fires again.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncCoordinator {
    source: PaneKind,
    subscriptions: Vec<Subscription>,
    next_id: u64,
    last_range: Option<TimeRange>,
    closed: bool,
}

impl SyncCoordinator {
    pub fn new(source: PaneKind) -> Self {
        Self {
            source,
            subscriptions: Vec::new(),
            next_id: 1,
            last_range: None,
            closed: false,
        }
    }

    pub fn source(&self) -> PaneKind {
        self.source
    }

    /// Register `target` as a follower. A target is subscribed at most once;
    /// subscribing again returns the existing id. Returns `None` after close
    /// or when `target` is the source itself.
    pub fn subscribe(&mut self, target: PaneKind) -> Option<SubscriptionId> {
        if self.closed || target == self.source {
            return None;
        }
        if let Some(existing) = self.subscriptions.iter().find(|s| s.target == target) {
            return Some(existing.id);
        }
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, target });
        tracing::debug!(source = ?self.source, follower = ?target, "Range sync subscribed");
        Some(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    pub fn is_subscribed(&self, target: PaneKind) -> bool {
        self.subscriptions.iter().any(|s| s.target == target)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Last range published by the source; new followers start from it.
    pub fn last_range(&self) -> Option<TimeRange> {
        self.last_range
    }

    /// Record a source range change and return the panes that must follow.
    pub fn publish(&mut self, range: Option<TimeRange>) -> Vec<PaneKind> {
        if self.closed {
            return Vec::new();
        }
        self.last_range = range;
        self.subscriptions.iter().map(|s| s.target).collect()
    }

    pub fn close(&mut self) {
        self.subscriptions.clear();
        self.last_range = None;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_is_idempotent_per_target() {
        let mut sync = SyncCoordinator::new(PaneKind::Price);
        let a = sync.subscribe(PaneKind::Oscillator).unwrap();
        let b = sync.subscribe(PaneKind::Oscillator).unwrap();
        assert_eq!(a, b);
        assert_eq!(sync.subscriber_count(), 1);
        assert!(sync.subscribe(PaneKind::Price).is_none());
    }

    #[test]
    fn closed_coordinator_stops_firing() {
        let mut sync = SyncCoordinator::new(PaneKind::Price);
        sync.subscribe(PaneKind::Oscillator);
        assert_eq!(
            sync.publish(Some(TimeRange::new(0, 10))),
            vec![PaneKind::Oscillator]
        );
        sync.close();
        assert!(sync.publish(Some(TimeRange::new(5, 15))).is_empty());
        assert!(sync.subscribe(PaneKind::Oscillator).is_none());
        assert!(sync.last_range().is_none());
    }
}
