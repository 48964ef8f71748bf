use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ChartError;
use crate::host::HostOptions;
use crate::indicator::IndicatorConfig;
use crate::model::interval::Interval;

/// Candle timestamps are shifted into this zone (UTC+9) before display.
pub const DEFAULT_TZ_OFFSET_SECS: i64 = 9 * 3600;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub indicators: IndicatorConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub symbol: String,
    pub interval: String,
    pub limit: usize,
    pub tz_offset_secs: i64,
    pub request_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            symbol: "BTC_KRW".to_string(),
            interval: Interval::default().as_str().to_string(),
            limit: 200,
            tz_offset_secs: DEFAULT_TZ_OFFSET_SECS,
            request_timeout_ms: 10_000,
        }
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub poll_interval_ms: u64,
    pub layout_retry_ms: u64,
    /// Warn once the container has stayed at zero width for this many checks.
    pub layout_warn_after: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            layout_retry_ms: 100,
            layout_warn_after: 50,
        }
    }
}

impl RefreshConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn layout_retry(&self) -> Duration {
        Duration::from_millis(self.layout_retry_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `config/default.toml`, applying `.env` and environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(path)
            .map_err(ChartError::from)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if let Ok(url) = std::env::var("CHART_FEED_BASE_URL") {
            if !url.trim().is_empty() {
                config.feed.base_url = url.trim().to_string();
                config.validate()?;
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(s).context("invalid chart config TOML")?;
        config.indicators = config.indicators.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed.base_url).map_err(|e| {
            ChartError::Config(format!("feed.base_url '{}' is invalid: {}", self.feed.base_url, e))
        })?;
        if self.feed.symbol.trim().is_empty() {
            return Err(ChartError::Config("feed.symbol must not be empty".to_string()).into());
        }
        Ok(())
    }

    /// Interval from the config file, falling back to the default when unknown.
    pub fn interval(&self) -> Interval {
        Interval::resolve(Some(&self.feed.interval))
    }

    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            symbol: self.feed.symbol.clone(),
            interval: Some(self.feed.interval.clone()),
            hide_oscillator: !self.indicators.oscillator.enabled,
        }
    }
}
