use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::chart::ContainerSize;

/// The host-side element the chart is drawn into.
pub trait HostContainer: Send + Sync + 'static {
    /// Current rendered size. Zero width means layout has not happened yet.
    fn size(&self) -> ContainerSize;
}

/// Size cell shared between the host's render loop and the chart task.
#[derive(Debug, Clone, Default)]
pub struct SharedContainer {
    packed: Arc<AtomicU32>,
}

impl SharedContainer {
    pub fn new(size: ContainerSize) -> Self {
        Self {
            packed: Arc::new(AtomicU32::new(pack(size))),
        }
    }

    pub fn set(&self, size: ContainerSize) {
        self.packed.store(pack(size), Ordering::Release);
    }
}

impl HostContainer for SharedContainer {
    fn size(&self) -> ContainerSize {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

fn pack(size: ContainerSize) -> u32 {
    (u32::from(size.width) << 16) | u32::from(size.height)
}

fn unpack(v: u32) -> ContainerSize {
    ContainerSize::new((v >> 16) as u16, (v & 0xFFFF) as u16)
}

/// Options the host passes when mounting a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    pub symbol: String,
    /// Raw interval string; missing or unknown values fall back to the default.
    pub interval: Option<String>,
    pub hide_oscillator: bool,
}
