use crate::chart::pane::Pane;
use crate::chart::ContainerSize;
use crate::indicator::IndicatorConfig;
use crate::lifecycle::state::LifecycleState;
use crate::model::candle::TimeRange;
use crate::model::interval::Interval;

/// Inputs from the host UI to a running chart.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Resize(ContainerSize),
    /// User zoomed or scrolled the price pane. `None` resets to fit-all.
    VisibleRangeChanged(Option<TimeRange>),
    SetMarket {
        symbol: String,
        interval: Option<String>,
    },
    SetIndicators(IndicatorConfig),
    SetHideOscillator(bool),
    Refresh,
    Unmount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub superseded: u64,
}

/// What the host should currently draw, published after every state change.
#[derive(Debug, Clone, Default)]
pub struct ChartSnapshot {
    pub session_id: u64,
    pub state: LifecycleState,
    pub symbol: String,
    pub interval: Interval,
    pub primary: Option<Pane>,
    pub oscillator: Option<Pane>,
    pub candle_count: usize,
    pub surfaces_created: u64,
    pub layout_attempts: u32,
    pub fetches: FetchStats,
    pub last_error: Option<String>,
}

impl ChartSnapshot {
    pub fn last_close(&self) -> Option<f64> {
        self.primary
            .as_ref()?
            .series(crate::chart::SeriesKey::Candles)?
            .as_candles()?
            .last()
            .map(|c| c.close)
    }
}
