//! Live candlestick chart with SMA / Bollinger overlays and an RSI pane,
//! refreshed from a polled candle feed.

pub mod chart;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod host;
pub mod indicator;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod sync;
pub mod ui;
