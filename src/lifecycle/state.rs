use std::fmt;

/// Refresh state of one chart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Ready,
    Refreshing,
    Disposed,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (Disposed, _) => false,
            (_, Disposed) => true,
            (Uninitialized, Ready) => true,
            (Ready, Refreshing) => true,
            // A newer fetch supersedes the one in flight.
            (Refreshing, Refreshing) => true,
            (Refreshing, Ready) => true,
            _ => false,
        }
    }

    /// Panes exist and receive updates.
    pub fn is_live(self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Refreshing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Ready => "ready",
            LifecycleState::Refreshing => "refreshing",
            LifecycleState::Disposed => "disposed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
