use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode};

use indicator_chart::chart::{ContainerSize, SeriesData, SeriesKey};
use indicator_chart::config::Config;
use indicator_chart::event::{ChartSnapshot, HostEvent};
use indicator_chart::feed::RestCandleSource;
use indicator_chart::host::SharedContainer;
use indicator_chart::lifecycle::LifecycleManager;
use indicator_chart::logging;
use indicator_chart::model::{Interval, TimeRange};
use indicator_chart::ui::ChartView;

const INPUT_POLL: Duration = Duration::from_millis(100);
const MIN_ZOOM: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // Log to file so it doesn't interfere with the TUI
    let log_file = std::fs::File::create("indicator-chart.log")?;
    logging::init_tracing(&config.logging, log_file)?;

    tracing::info!(
        symbol = %config.feed.symbol,
        interval = %config.feed.interval,
        base_url = %config.feed.base_url,
        "Starting indicator-chart"
    );

    let source = RestCandleSource::new(
        &config.feed.base_url,
        config.feed.tz_offset_secs,
        config.feed.request_timeout(),
    )?;
    // Zero until the first frame is drawn; the chart waits for it.
    let container = SharedContainer::default();
    let handle =
        LifecycleManager::new(source, container.clone(), &config, config.host_options()).spawn();

    let mut terminal = ratatui::init();
    let mut zoom: Option<usize> = None;
    let mut hide_oscillator = !config.indicators.oscillator.enabled;
    let mut interval = config.interval();
    let symbol = config.feed.symbol.clone();

    let result: Result<()> = async {
        loop {
            let snapshot = handle.snapshot();
            terminal
                .draw(|frame| {
                    let area = frame.area();
                    container.set(ContainerSize::new(area.width, area.height));
                    frame.render_widget(ChartView::new(&snapshot), area);
                })
                .context("terminal draw failed")?;

            if !crossterm::event::poll(INPUT_POLL)? {
                continue;
            }
            let event = match crossterm::event::read()? {
                Event::Resize(w, h) => Some(HostEvent::Resize(ContainerSize::new(w, h))),
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        tracing::info!("User quit");
                        break;
                    }
                    KeyCode::Char('r') => Some(HostEvent::Refresh),
                    KeyCode::Char('o') => {
                        hide_oscillator = !hide_oscillator;
                        Some(HostEvent::SetHideOscillator(hide_oscillator))
                    }
                    KeyCode::Char('i') => {
                        interval = next_interval(interval);
                        Some(HostEvent::SetMarket {
                            symbol: symbol.clone(),
                            interval: Some(interval.as_str().to_string()),
                        })
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        zoom = Some(zoom.unwrap_or(snapshot.candle_count) / 2);
                        Some(HostEvent::VisibleRangeChanged(tail_range(&snapshot, zoom)))
                    }
                    KeyCode::Char('-') => {
                        zoom = zoom.map(|n| n * 2).filter(|n| *n < snapshot.candle_count);
                        Some(HostEvent::VisibleRangeChanged(tail_range(&snapshot, zoom)))
                    }
                    KeyCode::Char('0') => {
                        zoom = None;
                        Some(HostEvent::VisibleRangeChanged(None))
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some(event) = event {
                if !handle.send(event).await {
                    tracing::warn!("Chart task stopped, exiting");
                    break;
                }
            }
        }
        Ok(())
    }
    .await;

    ratatui::restore();
    let last = handle.unmount().await;
    tracing::info!(
        session = last.session_id,
        state = %last.state,
        completed = last.fetches.completed,
        failed = last.fetches.failed,
        "Chart unmounted"
    );
    result
}

fn next_interval(current: Interval) -> Interval {
    let pos = Interval::ALL.iter().position(|i| *i == current).unwrap_or(0);
    Interval::ALL[(pos + 1) % Interval::ALL.len()]
}

/// Range covering the newest `count` candles, or fit-all for `None`.
fn tail_range(snapshot: &ChartSnapshot, count: Option<usize>) -> Option<TimeRange> {
    let count = count?.max(MIN_ZOOM);
    let candles = snapshot
        .primary
        .as_ref()?
        .series(SeriesKey::Candles)
        .and_then(SeriesData::as_candles)?;
    let last = candles.last()?;
    let first = &candles[candles.len().saturating_sub(count)];
    Some(TimeRange::new(first.time, last.time))
}
