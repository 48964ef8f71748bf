pub mod rest;
pub mod types;

use std::future::Future;

use anyhow::Result;

use crate::model::candle::Candle;
use crate::model::interval::Interval;

pub use rest::RestCandleSource;

pub const MAX_CANDLE_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: usize,
}

impl CandleRequest {
    pub fn new(symbol: &str, interval: Interval, limit: usize) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            interval,
            limit: limit.clamp(1, MAX_CANDLE_LIMIT),
        }
    }
}

/// Anything that can return a bounded, time-ordered candle window.
pub trait CandleSource: Send + Sync + 'static {
    fn fetch(&self, request: &CandleRequest)
        -> impl Future<Output = Result<Vec<Candle>>> + Send;
}
