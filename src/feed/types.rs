use serde::Deserialize;

use crate::model::candle::Candle;

/// Accepts both JSON numbers and numeric strings, treating `null` as zero.
pub fn string_or_number_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// Body of the candle endpoint.
#[derive(Debug, Deserialize)]
pub struct CandleResponse {
    #[serde(default)]
    pub data: Vec<WireCandle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCandle {
    /// Bucket start in epoch milliseconds.
    pub timestamp: i64,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub open: f64,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub high: f64,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub low: f64,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "string_or_number_to_f64")]
    pub volume: f64,
}

impl WireCandle {
    pub fn into_candle(self, tz_offset_secs: i64) -> Candle {
        Candle {
            time: self.timestamp.div_euclid(1000) + tz_offset_secs,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

impl CandleResponse {
    /// Convert to chart candles: seconds plus the timezone offset, sorted
    /// ascending, one candle per timestamp (the last occurrence wins).
    pub fn into_candles(self, tz_offset_secs: i64) -> Vec<Candle> {
        let mut candles: Vec<Candle> = self
            .data
            .into_iter()
            .map(|w| w.into_candle(tz_offset_secs))
            .collect();
        // Stable sort keeps arrival order among equal timestamps.
        candles.sort_by_key(|c| c.time);

        let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
        for c in candles {
            match out.last_mut() {
                Some(last) if last.time == c.time => *last = c,
                _ => out.push(c),
            }
        }
        out
    }
}
