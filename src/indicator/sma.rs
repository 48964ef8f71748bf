use crate::model::candle::{Candle, IndicatorPoint};

/// Simple moving average of `close` over a trailing window.
///
/// Points for indices before `period - 1` are omitted, so the result has
/// `len(candles) - period + 1` entries, or none when the window is shorter
/// than `period` (or `period == 0`).
pub fn sma(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }
    candles
        .windows(period)
        .map(|window| {
            let last = &window[period - 1];
            IndicatorPoint::new(last.time, window_mean(window))
        })
        .collect()
}

pub(crate) fn window_mean(window: &[Candle]) -> f64 {
    window.iter().map(|c| c.close).sum::<f64>() / window.len() as f64
}
