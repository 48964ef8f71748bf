use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use indicator_chart::chart::{ContainerSize, SeriesKey};
use indicator_chart::config::Config;
use indicator_chart::event::HostEvent;
use indicator_chart::feed::{CandleRequest, CandleSource};
use indicator_chart::host::{HostOptions, SharedContainer};
use indicator_chart::lifecycle::{ChartHandle, LifecycleManager, LifecycleState};
use indicator_chart::model::{Candle, Interval, TimeRange};

struct Step {
    delay: Duration,
    result: std::result::Result<Vec<Candle>, String>,
}

#[derive(Clone, Default)]
struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<CandleRequest>>>,
    calls: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self::default()
    }

    fn ok(self, delay_ms: u64, candles: Vec<Candle>) -> Self {
        self.push(delay_ms, Ok(candles))
    }

    fn err(self, delay_ms: u64, msg: &str) -> Self {
        self.push(delay_ms, Err(msg.to_string()))
    }

    fn push(self, delay_ms: u64, result: std::result::Result<Vec<Candle>, String>) -> Self {
        self.steps.lock().unwrap().push_back(Step {
            delay: Duration::from_millis(delay_ms),
            result,
        });
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<CandleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CandleSource for ScriptedSource {
    async fn fetch(&self, request: &CandleRequest) -> Result<Vec<Candle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        let step = step.unwrap_or(Step {
            delay: Duration::ZERO,
            result: Err("script exhausted".to_string()),
        });
        tokio::time::sleep(step.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        step.result.map_err(anyhow::Error::msg)
    }
}

fn window(n: usize, base: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = base + (i as f64 * 0.5).sin();
            Candle {
                time: 1_700_000_000 + i as i64 * 60,
                open: close - 0.1,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1.0,
            }
        })
        .collect()
}

fn test_config(poll_ms: u64) -> Config {
    let mut config = Config::default();
    config.refresh.poll_interval_ms = poll_ms;
    config
}

fn options(symbol: &str, interval: &str) -> HostOptions {
    HostOptions {
        symbol: symbol.to_string(),
        interval: Some(interval.to_string()),
        hide_oscillator: false,
    }
}

fn mount(source: &ScriptedSource, container: &SharedContainer, config: &Config) -> ChartHandle {
    LifecycleManager::new(
        source.clone(),
        container.clone(),
        config,
        options("btc_krw", "5m"),
    )
    .spawn()
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn surface_waits_for_container_width() {
    let source = ScriptedSource::new().ok(0, window(40, 10.0));
    let container = SharedContainer::new(ContainerSize::new(0, 30));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(50).await;
    let snap = handle.snapshot();
    assert_eq!(snap.state, LifecycleState::Uninitialized);
    assert_eq!(snap.surfaces_created, 0);
    assert!(snap.primary.is_none());
    assert_eq!(source.calls(), 0);

    settle(100).await; // t = 150ms, one retry already failed
    container.set(ContainerSize::new(640, 30));
    settle(150).await;

    let snap = handle.snapshot();
    assert_eq!(snap.surfaces_created, 1);
    assert_eq!(snap.layout_attempts, 3);
    assert_eq!(snap.primary.as_ref().unwrap().size().width, 640);
    assert_eq!(snap.candle_count, 40);
    assert_eq!(snap.state, LifecycleState::Ready);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn newer_fetch_supersedes_slower_one() {
    let source = ScriptedSource::new()
        .ok(3_000, window(50, 100.0))
        .ok(1_000, window(20, 200.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(500).await;
    assert_eq!(handle.snapshot().state, LifecycleState::Refreshing);
    assert!(handle.send(HostEvent::Refresh).await);

    settle(4_000).await;
    let snap = handle.snapshot();
    assert_eq!(snap.candle_count, 20);
    assert!(snap.last_close().unwrap() > 150.0);
    assert_eq!(snap.fetches.started, 2);
    assert_eq!(snap.fetches.superseded, 1);
    assert_eq!(snap.fetches.completed, 1);
    assert_eq!(source.calls(), 2);
    // the slow attempt was dropped before it returned
    assert_eq!(source.finished(), 1);
    assert_eq!(snap.state, LifecycleState::Ready);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_previous_window() {
    let source = ScriptedSource::new()
        .ok(0, window(30, 100.0))
        .err(0, "upstream 503");
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    let before = handle.snapshot();
    assert_eq!(before.candle_count, 30);

    handle.send(HostEvent::Refresh).await;
    settle(100).await;
    let after = handle.snapshot();
    assert_eq!(after.candle_count, 30);
    assert_eq!(after.last_close(), before.last_close());
    assert_eq!(after.fetches.failed, 1);
    assert!(after.last_error.as_deref().unwrap().contains("upstream 503"));
    assert_eq!(after.state, LifecycleState::Ready);
}

#[tokio::test(start_paused = true)]
async fn polls_on_the_configured_interval() {
    let source = ScriptedSource::new()
        .ok(0, window(10, 1.0))
        .ok(0, window(11, 1.0))
        .ok(0, window(12, 1.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(5_000));

    settle(4_900).await;
    assert_eq!(source.calls(), 1);
    settle(200).await;
    assert_eq!(source.calls(), 2);
    settle(5_000).await;
    assert_eq!(source.calls(), 3);

    let snap = handle.snapshot();
    assert_eq!(snap.candle_count, 12);
    assert_eq!(snap.fetches.completed, 3);
}

#[tokio::test(start_paused = true)]
async fn market_change_replaces_session() {
    let source = ScriptedSource::new()
        .ok(0, window(30, 10.0))
        .ok(0, window(25, 20.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    let first = handle.snapshot();
    assert_eq!(first.session_id, 1);
    assert_eq!(first.symbol, "BTC_KRW");
    assert_eq!(first.interval, Interval::FiveMinutes);

    handle
        .send(HostEvent::SetMarket {
            symbol: "eth_krw".to_string(),
            interval: Some("7x".to_string()),
        })
        .await;
    settle(100).await;

    let snap = handle.snapshot();
    assert_eq!(snap.session_id, 2);
    assert_eq!(snap.symbol, "ETH_KRW");
    assert_eq!(snap.interval, Interval::OneMinute);
    assert_eq!(snap.surfaces_created, 2);
    assert_eq!(snap.candle_count, 25);

    let requests = source.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].symbol, "ETH_KRW");
    assert_eq!(requests[1].interval, Interval::OneMinute);
}

#[tokio::test(start_paused = true)]
async fn same_market_does_not_restart() {
    let source = ScriptedSource::new().ok(0, window(30, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    handle
        .send(HostEvent::SetMarket {
            symbol: "BTC_KRW".to_string(),
            interval: Some("5m".to_string()),
        })
        .await;
    settle(100).await;
    let snap = handle.snapshot();
    assert_eq!(snap.session_id, 1);
    assert_eq!(snap.surfaces_created, 1);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unmount_disposes_and_cancels_pending_fetch() {
    let source = ScriptedSource::new().ok(10_000, window(30, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(1_000));

    settle(100).await;
    assert_eq!(source.calls(), 1);

    let last = handle.unmount().await;
    assert_eq!(last.state, LifecycleState::Disposed);
    assert!(last.primary.is_none());
    assert!(last.oscillator.is_none());

    settle(20_000).await;
    assert_eq!(source.finished(), 0);
    // no poll tick survives the unmount
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unmount_during_layout_wait_stops_retrying() {
    let source = ScriptedSource::new();
    let container = SharedContainer::new(ContainerSize::new(0, 0));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(350).await;
    let attempts = handle.snapshot().layout_attempts;
    assert!(attempts >= 3);

    let last = handle.unmount().await;
    assert_eq!(last.state, LifecycleState::Disposed);
    assert_eq!(last.surfaces_created, 0);

    container.set(ContainerSize::new(100, 20));
    settle(1_000).await;
    assert_eq!(source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn abort_still_cancels_in_flight_fetch() {
    let source = ScriptedSource::new().ok(5_000, window(30, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    handle.abort();
    settle(10_000).await;
    assert_eq!(source.calls(), 1);
    assert_eq!(source.finished(), 0);
    assert!(!handle.send(HostEvent::Refresh).await);
}

#[tokio::test(start_paused = true)]
async fn hiding_oscillator_detaches_pane_and_refetches() {
    let source = ScriptedSource::new()
        .ok(0, window(40, 10.0))
        .ok(0, window(40, 10.0))
        .ok(0, window(40, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    let snap = handle.snapshot();
    assert_eq!(snap.oscillator.as_ref().unwrap().series(SeriesKey::Rsi).unwrap().len(), 26);

    handle.send(HostEvent::SetHideOscillator(true)).await;
    settle(100).await;
    let snap = handle.snapshot();
    assert!(snap.oscillator.is_none());
    assert_eq!(snap.primary.as_ref().unwrap().size().height, 40);
    assert_eq!(snap.fetches.started, 2);

    handle.send(HostEvent::SetHideOscillator(false)).await;
    settle(100).await;
    let snap = handle.snapshot();
    assert!(snap.oscillator.is_some());
    assert_eq!(snap.primary.as_ref().unwrap().size().height, 28);
    assert_eq!(snap.fetches.started, 3);
}

#[tokio::test(start_paused = true)]
async fn indicator_change_updates_only_touched_series() {
    let source = ScriptedSource::new()
        .ok(0, window(150, 10.0))
        .ok(5_000, window(150, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));

    settle(100).await;
    let mut config = Config::default().indicators;
    config.sma_periods = vec![5, 20, 200];
    handle.send(HostEvent::SetIndicators(config)).await;
    settle(100).await;

    // the refetch is still pending; the series diff is already applied
    let snap = handle.snapshot();
    let primary = snap.primary.as_ref().unwrap();
    assert!(primary.has_series(SeriesKey::Sma(200)));
    assert!(primary.series(SeriesKey::Sma(200)).unwrap().is_empty());
    assert!(!primary.has_series(SeriesKey::Sma(60)));
    assert!(!primary.has_series(SeriesKey::Sma(120)));
    assert_eq!(primary.series(SeriesKey::Sma(5)).unwrap().len(), 146);
    assert_eq!(snap.state, LifecycleState::Refreshing);
}

#[tokio::test(start_paused = true)]
async fn visible_range_and_resize_reach_both_panes() {
    let source = ScriptedSource::new().ok(0, window(60, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let handle = mount(&source, &container, &test_config(60_000));
    settle(100).await;

    let range = TimeRange::new(1_700_000_600, 1_700_001_800);
    handle.send(HostEvent::VisibleRangeChanged(Some(range))).await;
    handle.send(HostEvent::Resize(ContainerSize::new(200, 50))).await;
    settle(10).await;

    let snap = handle.snapshot();
    let primary = snap.primary.as_ref().unwrap();
    let osc = snap.oscillator.as_ref().unwrap();
    assert_eq!(primary.visible_range(), Some(range));
    assert_eq!(osc.visible_range(), Some(range));
    assert_eq!(primary.size(), ContainerSize::new(200, 35));
    assert_eq!(osc.size(), ContainerSize::new(200, 15));
}

#[tokio::test(start_paused = true)]
async fn host_can_hide_oscillator_at_mount() {
    let source = ScriptedSource::new().ok(0, window(30, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let mut opts = options("xrp_krw", "1h");
    opts.hide_oscillator = true;
    let handle =
        LifecycleManager::new(source.clone(), container, &test_config(60_000), opts).spawn();

    settle(100).await;
    let snap = handle.snapshot();
    assert!(snap.oscillator.is_none());
    assert_eq!(snap.interval, Interval::OneHour);
    assert_eq!(snap.candle_count, 30);
}

#[tokio::test(start_paused = true)]
async fn host_hide_flag_survives_indicator_changes() {
    let source = ScriptedSource::new()
        .ok(0, window(40, 10.0))
        .ok(0, window(40, 10.0))
        .ok(0, window(40, 10.0));
    let container = SharedContainer::new(ContainerSize::new(120, 40));
    let mut opts = options("btc_krw", "1m");
    opts.hide_oscillator = true;
    let handle =
        LifecycleManager::new(source.clone(), container, &test_config(60_000), opts).spawn();
    settle(100).await;
    assert!(handle.snapshot().oscillator.is_none());

    let mut config = Config::default().indicators;
    config.sma_periods = vec![5, 20];
    handle.send(HostEvent::SetIndicators(config.clone())).await;
    settle(100).await;
    let snap = handle.snapshot();
    assert!(snap.oscillator.is_none());
    assert!(!snap.primary.as_ref().unwrap().has_series(SeriesKey::Sma(60)));

    // un-hiding restores the oscillator from the requested settings
    handle.send(HostEvent::SetHideOscillator(false)).await;
    settle(100).await;
    assert!(handle.snapshot().oscillator.is_some());

    // a config that disables the oscillator wins even when the host shows it
    config.oscillator.enabled = false;
    handle.send(HostEvent::SetIndicators(config)).await;
    settle(100).await;
    assert!(handle.snapshot().oscillator.is_none());
}
