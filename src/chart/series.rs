use std::fmt;

use crate::model::candle::{Candle, IndicatorPoint, VolumeBar};

/// Name of a series within a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    Candles,
    Volume,
    Sma(usize),
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    Rsi,
    RsiUpperRef,
    RsiLowerRef,
}

impl SeriesKey {
    pub const BOLLINGER: [SeriesKey; 3] = [
        SeriesKey::BollingerUpper,
        SeriesKey::BollingerMiddle,
        SeriesKey::BollingerLower,
    ];

    pub const OSCILLATOR: [SeriesKey; 3] =
        [SeriesKey::Rsi, SeriesKey::RsiUpperRef, SeriesKey::RsiLowerRef];

    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            SeriesKey::Sma(_)
                | SeriesKey::BollingerUpper
                | SeriesKey::BollingerMiddle
                | SeriesKey::BollingerLower
        )
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Candles => f.write_str("candles"),
            SeriesKey::Volume => f.write_str("volume"),
            SeriesKey::Sma(p) => write!(f, "sma{}", p),
            SeriesKey::BollingerUpper => f.write_str("bb.upper"),
            SeriesKey::BollingerMiddle => f.write_str("bb.middle"),
            SeriesKey::BollingerLower => f.write_str("bb.lower"),
            SeriesKey::Rsi => f.write_str("rsi"),
            SeriesKey::RsiUpperRef => f.write_str("rsi.upper"),
            SeriesKey::RsiLowerRef => f.write_str("rsi.lower"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Candlestick(Vec<Candle>),
    Histogram(Vec<VolumeBar>),
    Line(Vec<IndicatorPoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candlestick(v) => v.len(),
            SeriesData::Histogram(v) => v.len(),
            SeriesData::Line(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_line(&self) -> Option<&[IndicatorPoint]> {
        match self {
            SeriesData::Line(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_candles(&self) -> Option<&[Candle]> {
        match self {
            SeriesData::Candlestick(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&[VolumeBar]> {
        match self {
            SeriesData::Histogram(v) => Some(v),
            _ => None,
        }
    }

    /// First and last timestamps, if any.
    pub fn time_span(&self) -> Option<(i64, i64)> {
        let (first, last) = match self {
            SeriesData::Candlestick(v) => (v.first()?.time, v.last()?.time),
            SeriesData::Histogram(v) => (v.first()?.time, v.last()?.time),
            SeriesData::Line(v) => (v.first()?.time, v.last()?.time),
        };
        Some((first, last))
    }
}

/// A flat line at `value` across the given timestamps.
pub fn reference_line(times: impl IntoIterator<Item = i64>, value: f64) -> Vec<IndicatorPoint> {
    times
        .into_iter()
        .map(|t| IndicatorPoint::new(t, value))
        .collect()
}
