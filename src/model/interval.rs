use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Candle bucket sizes the feed understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    #[default]
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::OneMinute,
        Interval::ThreeMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
        Interval::OneWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::ThreeMinutes => "3m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1w",
        }
    }

    pub fn duration_secs(&self) -> i64 {
        match self {
            Interval::OneMinute => 60,
            Interval::ThreeMinutes => 3 * 60,
            Interval::FiveMinutes => 5 * 60,
            Interval::FifteenMinutes => 15 * 60,
            Interval::ThirtyMinutes => 30 * 60,
            Interval::OneHour => 3_600,
            Interval::FourHours => 4 * 3_600,
            Interval::OneDay => 86_400,
            Interval::OneWeek => 7 * 86_400,
        }
    }

    /// Resolve a host-supplied interval. Missing or unknown values fall back to
    /// the default instead of failing the refresh cycle.
    pub fn resolve(raw: Option<&str>) -> Interval {
        match raw.map(str::trim) {
            None | Some("") => Interval::default(),
            Some(s) => match s.parse() {
                Ok(iv) => iv,
                Err(e) => {
                    tracing::warn!(
                        interval = s,
                        fallback = Interval::default().as_str(),
                        error = %e,
                        "Unknown interval, using default"
                    );
                    Interval::default()
                }
            },
        }
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(iv) = Interval::ALL.iter().find(|iv| iv.as_str() == s) {
            return Ok(*iv);
        }
        bail!(
            "invalid interval '{}': expected one of 1m/3m/5m/15m/30m/1h/4h/1d/1w",
            s
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
