use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::ChartError;
use crate::model::candle::Candle;

use super::types::CandleResponse;
use super::{CandleRequest, CandleSource};

/// Polls `GET {base_url}/candles?symbol=..&interval=..&limit=..`.
pub struct RestCandleSource {
    http: reqwest::Client,
    base_url: String,
    tz_offset_secs: i64,
}

impl RestCandleSource {
    pub fn new(base_url: &str, tz_offset_secs: i64, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tz_offset_secs,
        })
    }

    pub fn candles_url(&self) -> String {
        format!("{}/candles", self.base_url)
    }
}

impl CandleSource for RestCandleSource {
    async fn fetch(&self, request: &CandleRequest) -> Result<Vec<Candle>> {
        let limit = request.limit.to_string();
        let resp = self
            .http
            .get(self.candles_url())
            .query(&[
                ("symbol", request.symbol.as_str()),
                ("interval", request.interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(ChartError::from)
            .context("candle fetch HTTP failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChartError::FeedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = resp
            .text()
            .await
            .map_err(ChartError::from)
            .context("candle fetch body read failed")?;
        let parsed: CandleResponse =
            serde_json::from_str(&body).map_err(ChartError::from)?;
        let candles = parsed.into_candles(self.tz_offset_secs);
        tracing::debug!(
            symbol = %request.symbol,
            interval = %request.interval,
            count = candles.len(),
            "Candle window received"
        );
        Ok(candles)
    }
}
