use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::time::{Instant, Interval as Ticker, MissedTickBehavior};

use crate::chart::{ChartSurface, ContainerSize};
use crate::config::RefreshConfig;
use crate::event::FetchStats;
use crate::feed::{CandleRequest, CandleSource};
use crate::indicator::IndicatorConfig;
use crate::model::candle::{Candle, TimeRange};

use super::cancel::CancellationToken;
use super::layout::LayoutGate;
use super::state::LifecycleState;

/// `None` means the attempt observed its cancellation token.
pub type FetchOutcome = Option<Result<Vec<Candle>>>;

pub struct InFlight {
    generation: u64,
    token: CancellationToken,
    started_at: Instant,
    future: BoxFuture<'static, FetchOutcome>,
}

impl InFlight {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// One surface lifetime for a single symbol/interval pair.
///
/// Dropping a session tears it down, so timers and the in-flight fetch never
/// outlive it on any exit path.
pub struct ChartSession {
    id: u64,
    request: CandleRequest,
    state: LifecycleState,
    surface: Option<ChartSurface>,
    poll_interval: Duration,
    latest_generation: u64,
    stats: FetchStats,
    last_error: Option<String>,
    pub(crate) layout: LayoutGate,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) ticker: Option<Ticker>,
}

impl ChartSession {
    pub fn new(id: u64, request: CandleRequest, refresh: &RefreshConfig) -> Self {
        tracing::info!(
            session = id,
            symbol = %request.symbol,
            interval = %request.interval,
            "Chart session opened"
        );
        Self {
            id,
            request,
            state: LifecycleState::Uninitialized,
            surface: None,
            poll_interval: refresh.poll_interval(),
            latest_generation: 0,
            stats: FetchStats::default(),
            last_error: None,
            layout: LayoutGate::new(refresh.layout_retry(), refresh.layout_warn_after),
            in_flight: None,
            ticker: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &CandleRequest {
        &self.request
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn surface(&self) -> Option<&ChartSurface> {
        self.surface.as_ref()
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn transition(&mut self, next: LifecycleState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::debug!(session = self.id, from = %self.state, to = %next, "Transition skipped");
            return false;
        }
        self.state = next;
        true
    }

    /// Create the panes once the container has a width, and start polling.
    pub fn open_surface(&mut self, size: ContainerSize, config: IndicatorConfig) {
        if !self.transition(LifecycleState::Ready) {
            return;
        }
        self.surface = Some(ChartSurface::create(size, config));
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    /// Start a fetch, cancelling any attempt still in flight.
    pub fn start_fetch<S: CandleSource>(&mut self, source: &Arc<S>) {
        if !self.state.is_live() {
            return;
        }
        if let Some(prev) = self.in_flight.take() {
            prev.token.cancel();
            self.stats.superseded += 1;
            tracing::debug!(
                session = self.id,
                generation = prev.generation,
                "Superseding in-flight fetch"
            );
        }

        self.latest_generation += 1;
        let generation = self.latest_generation;
        let token = CancellationToken::new();
        let guard = token.clone();
        let source = Arc::clone(source);
        let request = self.request.clone();
        let future = async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => None,
                result = source.fetch(&request) => Some(result),
            }
        }
        .boxed();

        self.in_flight = Some(InFlight {
            generation,
            token,
            started_at: Instant::now(),
            future,
        });
        self.stats.started += 1;
        self.transition(LifecycleState::Refreshing);
        tracing::info!(
            session = self.id,
            symbol = %self.request.symbol,
            interval = %self.request.interval,
            limit = self.request.limit,
            generation,
            "Fetching candles"
        );
    }

    /// Apply a finished fetch. Cancelled or stale attempts leave the surface
    /// untouched; failures are logged and keep the previous window.
    pub fn complete_fetch(&mut self, flight: InFlight, outcome: FetchOutcome) {
        let current = !flight.token.is_cancelled()
            && flight.generation == self.latest_generation
            && self.state.is_live();
        let result = match outcome {
            Some(result) if current => result,
            _ => {
                tracing::debug!(
                    session = self.id,
                    generation = flight.generation,
                    "Dropping stale fetch result"
                );
                return;
            }
        };

        let elapsed_ms = flight.started_at.elapsed().as_millis() as u64;
        match result {
            Ok(candles) => {
                let count = candles.len();
                if let Some(surface) = self.surface.as_mut() {
                    surface.apply_window(candles);
                }
                self.stats.completed += 1;
                self.last_error = None;
                tracing::info!(
                    session = self.id,
                    generation = flight.generation,
                    count,
                    elapsed_ms,
                    "Candle window applied"
                );
            }
            Err(e) => {
                self.stats.failed += 1;
                self.last_error = Some(format!("{:#}", e));
                tracing::warn!(
                    session = self.id,
                    generation = flight.generation,
                    error = %e,
                    elapsed_ms,
                    "Candle fetch failed, keeping previous window"
                );
            }
        }
        if self.in_flight.is_none() {
            self.transition(LifecycleState::Ready);
        }
    }

    pub fn reconfigure(&mut self, config: IndicatorConfig) {
        if let Some(surface) = self.surface.as_mut() {
            surface.reconfigure(config);
        }
    }

    pub fn resize(&mut self, size: ContainerSize) {
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(size);
        }
    }

    pub fn set_visible_range(&mut self, range: Option<TimeRange>) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_visible_range(range);
        }
    }

    /// Clear timers, cancel the in-flight fetch and release both panes.
    /// Idempotent.
    pub fn teardown(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.layout.cancel();
        self.ticker = None;
        if let Some(flight) = self.in_flight.take() {
            flight.token.cancel();
        }
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
        }
        self.state = LifecycleState::Disposed;
        tracing::info!(session = self.id, symbol = %self.request.symbol, "Chart session disposed");
    }
}

impl Drop for ChartSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Resolves with the outcome of the in-flight fetch; pending when there is none.
pub(crate) async fn next_outcome(slot: &mut Option<InFlight>) -> FetchOutcome {
    match slot.as_mut() {
        Some(flight) => flight.future.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Resolves on the next poll tick; pending while no ticker runs.
pub(crate) async fn next_tick(ticker: &mut Option<Ticker>) {
    match ticker.as_mut() {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
