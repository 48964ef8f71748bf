use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::chart::ContainerSize;
use crate::config::{Config, RefreshConfig};
use crate::event::{ChartSnapshot, HostEvent};
use crate::feed::{CandleRequest, CandleSource};
use crate::host::{HostContainer, HostOptions};
use crate::indicator::IndicatorConfig;
use crate::model::interval::Interval;

use super::layout::LayoutStep;
use super::session::{self, ChartSession};
use super::state::LifecycleState;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Drives one chart: layout gate, polling, reconfiguration and teardown.
///
/// All state is owned by the task running [`LifecycleManager::run`]; the host
/// talks to it only through [`HostEvent`]s and reads [`ChartSnapshot`]s.
pub struct LifecycleManager<S: CandleSource, C: HostContainer> {
    source: Arc<S>,
    container: C,
    refresh: RefreshConfig,
    limit: usize,
    /// Indicator settings as last requested, before the host's hide flag.
    indicators: IndicatorConfig,
    hide_oscillator: bool,
    session: ChartSession,
    next_session_id: u64,
    surfaces_created: u64,
    snapshots: watch::Sender<ChartSnapshot>,
}

impl<S: CandleSource, C: HostContainer> LifecycleManager<S, C> {
    pub fn new(source: S, container: C, config: &Config, host: HostOptions) -> Self {
        let indicators = config.indicators.clone().normalized();

        let request = CandleRequest::new(
            &host.symbol,
            Interval::resolve(host.interval.as_deref()),
            config.feed.limit,
        );
        let session = ChartSession::new(1, request, &config.refresh);
        let (snapshots, _) = watch::channel(ChartSnapshot::default());

        Self {
            source: Arc::new(source),
            container,
            refresh: config.refresh.clone(),
            limit: config.feed.limit,
            indicators,
            hide_oscillator: host.hide_oscillator,
            session,
            next_session_id: 2,
            surfaces_created: 0,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChartSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn session(&self) -> &ChartSession {
        &self.session
    }

    /// Run on the current runtime and hand back a handle for the host.
    pub fn spawn(self) -> ChartHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let snapshots = self.subscribe();
        let task = tokio::spawn(self.run(events_rx));
        ChartHandle {
            events: events_tx,
            snapshots,
            task,
        }
    }

    /// Event loop. Returns after `Unmount` or when every event sender is gone;
    /// the session is torn down on the way out.
    pub async fn run(mut self, mut events: mpsc::Receiver<HostEvent>) {
        self.check_layout();
        self.publish();

        loop {
            tokio::select! {
                biased;
                event = events.recv() => {
                    let flow = match event {
                        Some(event) => self.handle_event(event),
                        None => ControlFlow::Break(()),
                    };
                    if flow.is_break() {
                        break;
                    }
                }
                _ = self.session.layout.retry_elapsed(), if self.session.layout.has_pending_timer() => {
                    self.check_layout();
                }
                outcome = session::next_outcome(&mut self.session.in_flight), if self.session.in_flight.is_some() => {
                    if let Some(flight) = self.session.in_flight.take() {
                        self.session.complete_fetch(flight, outcome);
                    }
                }
                _ = session::next_tick(&mut self.session.ticker), if self.session.ticker.is_some() => {
                    self.session.start_fetch(&self.source);
                }
            }
            self.publish();
        }

        self.session.teardown();
        self.publish();
    }

    /// Apply one host event. `Break` ends the event loop.
    fn handle_event(&mut self, event: HostEvent) -> ControlFlow<()> {
        match event {
            HostEvent::Resize(size) => {
                if self.session.state() == LifecycleState::Uninitialized {
                    self.observe_size(size);
                } else {
                    self.session.resize(size);
                }
            }
            HostEvent::VisibleRangeChanged(range) => self.session.set_visible_range(range),
            HostEvent::SetMarket { symbol, interval } => {
                let request = CandleRequest::new(
                    &symbol,
                    Interval::resolve(interval.as_deref()),
                    self.limit,
                );
                if &request != self.session.request() {
                    self.replace_session(request);
                }
            }
            HostEvent::SetIndicators(config) => {
                self.indicators = config.normalized();
                self.apply_indicators();
            }
            HostEvent::SetHideOscillator(hide) => {
                self.hide_oscillator = hide;
                self.apply_indicators();
            }
            HostEvent::Refresh => self.session.start_fetch(&self.source),
            HostEvent::Unmount => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Requested indicators with the host's hide flag applied.
    fn effective_indicators(&self) -> IndicatorConfig {
        let mut config = self.indicators.clone();
        config.oscillator.enabled &= !self.hide_oscillator;
        config
    }

    fn check_layout(&mut self) {
        let size = self.container.size();
        self.observe_size(size);
    }

    fn observe_size(&mut self, size: ContainerSize) {
        if let LayoutStep::Ready(size) = self.session.layout.observe(size) {
            self.surfaces_created += 1;
            let indicators = self.effective_indicators();
            self.session.open_surface(size, indicators);
            self.session.start_fetch(&self.source);
        }
    }

    fn apply_indicators(&mut self) {
        if self.session.state().is_live() {
            let indicators = self.effective_indicators();
            self.session.reconfigure(indicators);
            self.session.start_fetch(&self.source);
        }
    }

    /// Symbol or interval changed: dispose the current session and start over.
    fn replace_session(&mut self, request: CandleRequest) {
        self.session.teardown();
        let id = self.next_session_id;
        self.next_session_id += 1;
        self.session = ChartSession::new(id, request, &self.refresh);
        self.check_layout();
    }

    fn snapshot(&self) -> ChartSnapshot {
        let surface = self.session.surface();
        ChartSnapshot {
            session_id: self.session.id(),
            state: self.session.state(),
            symbol: self.session.request().symbol.clone(),
            interval: self.session.request().interval,
            primary: surface.map(|s| s.primary().clone()),
            oscillator: surface.and_then(|s| s.oscillator().cloned()),
            candle_count: surface.map_or(0, |s| s.candles().len()),
            surfaces_created: self.surfaces_created,
            layout_attempts: self.session.layout.attempts(),
            fetches: self.session.stats(),
            last_error: self.session.last_error().map(str::to_string),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

/// Host-side handle to a spawned chart.
pub struct ChartHandle {
    events: mpsc::Sender<HostEvent>,
    snapshots: watch::Receiver<ChartSnapshot>,
    task: JoinHandle<()>,
}

impl ChartHandle {
    /// Returns `false` once the chart task has stopped.
    pub async fn send(&self, event: HostEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<ChartSnapshot> {
        self.snapshots.clone()
    }

    /// Unmount and wait for teardown. Returns the final snapshot.
    pub async fn unmount(self) -> ChartSnapshot {
        let _ = self.events.send(HostEvent::Unmount).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Chart task ended abnormally");
        }
        let last = self.snapshots.borrow().clone();
        last
    }

    /// Abort without waiting. The session's drop guard still runs teardown.
    pub fn abort(&self) {
        self.task.abort();
    }
}
