//! Pure indicator functions and the configuration that selects which of them
//! feed the chart.

pub mod bollinger;
pub mod rsi;
pub mod sma;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::candle::{BandTriple, Candle, IndicatorPoint};

pub use bollinger::bollinger_bands;
pub use rsi::rsi;
pub use sma::sma;

pub const DEFAULT_SMA_PERIODS: [usize; 4] = [5, 20, 60, 120];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    pub enabled: bool,
    pub period: usize,
    pub std_dev_multiplier: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    pub enabled: bool,
    pub period: usize,
    pub upper: f64,
    pub lower: f64,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 14,
            upper: 70.0,
            lower: 30.0,
        }
    }
}

/// Which derived series the surface shows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_periods: Vec<usize>,
    pub bollinger: BollingerConfig,
    pub oscillator: OscillatorConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_periods: DEFAULT_SMA_PERIODS.to_vec(),
            bollinger: BollingerConfig::default(),
            oscillator: OscillatorConfig::default(),
        }
    }
}

impl IndicatorConfig {
    /// Sorts and dedups SMA periods, drops zero periods, clamps the band
    /// multiplier and resets inverted oscillator reference lines.
    pub fn normalized(mut self) -> Self {
        self.sma_periods.retain(|p| *p > 0);
        self.sma_periods.sort_unstable();
        self.sma_periods.dedup();

        if !self.bollinger.std_dev_multiplier.is_finite() || self.bollinger.std_dev_multiplier < 0.0
        {
            self.bollinger.std_dev_multiplier = 0.0;
        }
        self.bollinger.period = self.bollinger.period.max(1);
        self.oscillator.period = self.oscillator.period.max(1);

        let OscillatorConfig { upper, lower, .. } = self.oscillator;
        if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) || lower >= upper {
            self.oscillator.upper = 70.0;
            self.oscillator.lower = 30.0;
        }
        self
    }
}

/// Every enabled series derived from one candle window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedSeries {
    pub sma: BTreeMap<usize, Vec<IndicatorPoint>>,
    pub bollinger: Option<BandTriple>,
    pub rsi: Option<Vec<IndicatorPoint>>,
}

pub fn compute_all(candles: &[Candle], config: &IndicatorConfig) -> DerivedSeries {
    let sma = config
        .sma_periods
        .iter()
        .map(|&period| (period, sma::sma(candles, period)))
        .collect();
    let bollinger = config.bollinger.enabled.then(|| {
        bollinger::bollinger_bands(
            candles,
            config.bollinger.period,
            config.bollinger.std_dev_multiplier,
        )
    });
    let rsi = config
        .oscillator
        .enabled
        .then(|| rsi::rsi(candles, config.oscillator.period));

    DerivedSeries {
        sma,
        bollinger,
        rsi,
    }
}
