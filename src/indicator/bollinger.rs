use crate::model::candle::{BandTriple, Candle, IndicatorPoint};

use super::sma::window_mean;

/// Bollinger bands over a trailing window of closes.
///
/// The middle line is the SMA, the band width is `multiplier` times the
/// population standard deviation of the same window. Negative multipliers are
/// treated as zero so that `upper >= middle >= lower` always holds.
pub fn bollinger_bands(candles: &[Candle], period: usize, multiplier: f64) -> BandTriple {
    if period == 0 || candles.len() < period {
        return BandTriple::default();
    }
    let multiplier = multiplier.max(0.0);
    let n = candles.len() - period + 1;
    let mut bands = BandTriple {
        upper: Vec::with_capacity(n),
        middle: Vec::with_capacity(n),
        lower: Vec::with_capacity(n),
    };

    for window in candles.windows(period) {
        let time = window[period - 1].time;
        let mean = window_mean(window);
        let variance = window
            .iter()
            .map(|c| {
                let d = c.close - mean;
                d * d
            })
            .sum::<f64>()
            / period as f64;
        let width = multiplier * variance.sqrt();

        bands.upper.push(IndicatorPoint::new(time, mean + width));
        bands.middle.push(IndicatorPoint::new(time, mean));
        bands.lower.push(IndicatorPoint::new(time, mean - width));
    }
    bands
}
