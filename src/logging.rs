use std::io;

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// `RUST_LOG` wins over the configured level; an unparsable level falls back
/// to `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(config.level.trim()).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global JSON subscriber. The host owns the terminal, so logs go
/// to `writer` (usually a file) without ANSI colours.
pub fn init_tracing<W>(config: &LoggingConfig, writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(writer)
        .with_ansi(false)
        .json()
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

/// Convenience for hosts that log to stderr.
pub fn init_stderr_tracing(config: &LoggingConfig) -> Result<()> {
    init_tracing(config, io::stderr)
}
