use crate::model::candle::{Candle, IndicatorPoint};

/// Relative strength index using Wilder's smoothing.
///
/// The first `period` price changes seed the average gain and loss, and the
/// first point is emitted at index `period`. The output therefore holds
/// `len(candles) - period` points and is empty when there are not enough
/// candles.
pub fn rsi(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() <= period {
        return Vec::new();
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = candles[i].close - candles[i - 1].close;
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let p = period as f64;
    let mut avg_gain = gains / p;
    let mut avg_loss = losses / p;

    let mut out = Vec::with_capacity(candles.len() - period);
    out.push(IndicatorPoint::new(
        candles[period].time,
        rsi_value(avg_gain, avg_loss),
    ));

    for i in (period + 1)..candles.len() {
        let change = candles[i].close - candles[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        out.push(IndicatorPoint::new(
            candles[i].time,
            rsi_value(avg_gain, avg_loss),
        ));
    }
    out
}

/// A zero average loss pins RS at 100 rather than infinity, so an all-gain
/// window reads `100 - 100 / 101`.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        100.0
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(values: &[f64]) -> Vec<Candle> {
        values
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                time: i as i64,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect()
    }

    #[test]
    fn seed_point_uses_simple_averages() {
        // changes: +2, -1, +1 -> avg gain 1, avg loss 1/3 -> RS 3 -> RSI 75
        let out = rsi(&closes(&[10.0, 12.0, 11.0, 12.0]), 3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time, 3);
        assert!((out[0].value.unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn subsequent_points_are_wilder_smoothed() {
        let out = rsi(&closes(&[10.0, 12.0, 11.0, 12.0, 11.0]), 3);
        // avg gain (1*2 + 0)/3 = 2/3, avg loss (1/3*2 + 1)/3 = 5/9 -> RS 1.2
        let expected = 100.0 - 100.0 / 2.2;
        assert_eq!(out.len(), 2);
        assert!((out[1].value.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_loss_pins_rs_at_one_hundred() {
        let out = rsi(&closes(&[1.0, 2.0, 3.0]), 2);
        assert_eq!(out[0].value, Some(100.0 - 100.0 / 101.0));
    }

    #[test]
    fn all_losses_read_zero() {
        let out = rsi(&closes(&[5.0, 4.0, 3.0, 2.0]), 2);
        for p in out {
            assert_eq!(p.value, Some(0.0));
        }
    }

    #[test]
    fn warm_up_consumes_period_candles() {
        assert!(rsi(&closes(&[1.0, 2.0]), 2).is_empty());
        assert!(rsi(&closes(&[1.0, 2.0]), 0).is_empty());
        assert_eq!(rsi(&closes(&[1.0; 20]), 14).len(), 6);
    }
}
