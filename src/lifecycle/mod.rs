pub mod cancel;
pub mod layout;
pub mod manager;
pub mod session;
pub mod state;

pub use cancel::CancellationToken;
pub use layout::{LayoutGate, LayoutState, LayoutStep};
pub use manager::{ChartHandle, LifecycleManager};
pub use session::ChartSession;
pub use state::LifecycleState;
