pub mod pane;
pub mod series;
pub mod surface;

pub use pane::{Pane, PaneKind};
pub use series::{SeriesData, SeriesKey};
pub use surface::ChartSurface;

/// Rendered size of the host container, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerSize {
    pub width: u16,
    pub height: u16,
}

impl ContainerSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// A container with zero width has not been laid out yet.
    pub fn is_resolved(&self) -> bool {
        self.width > 0
    }
}
