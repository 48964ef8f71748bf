use serde::Serialize;

/// One OHLCV observation. `time` is the bucket start in epoch seconds, already
/// shifted by the feed's timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// A single derived value aligned to a candle timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    /// Non-finite values (NaN closes, overflow) are stored as absent.
    pub fn new(time: i64, value: f64) -> Self {
        Self {
            time,
            value: value.is_finite().then_some(value),
        }
    }
}

/// Upper, middle and lower Bollinger lines sharing identical timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandTriple {
    pub upper: Vec<IndicatorPoint>,
    pub middle: Vec<IndicatorPoint>,
    pub lower: Vec<IndicatorPoint>,
}

impl BandTriple {
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeBar {
    pub time: i64,
    pub volume: f64,
    pub bullish: bool,
}

impl From<&Candle> for VolumeBar {
    fn from(c: &Candle) -> Self {
        Self {
            time: c.time,
            volume: c.volume,
            bullish: c.is_bullish(),
        }
    }
}

/// Inclusive visible time window of a pane, in the same seconds as `Candle::time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(from: i64, to: i64) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn contains(&self, time: i64) -> bool {
        time >= self.from && time <= self.to
    }
}
