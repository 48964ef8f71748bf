use crate::indicator::{self, IndicatorConfig};
use crate::model::candle::{BandTriple, Candle, IndicatorPoint, TimeRange, VolumeBar};
use crate::sync::{SubscriptionId, SyncCoordinator};

use super::pane::{Pane, PaneKind};
use super::series::{reference_line, SeriesData, SeriesKey};
use super::ContainerSize;

const OSCILLATOR_HEIGHT_PERCENT: u32 = 30;

/// Price pane plus optional oscillator pane, kept in step with one candle
/// window and one indicator configuration.
#[derive(Debug, Clone)]
pub struct ChartSurface {
    size: ContainerSize,
    primary: Pane,
    oscillator: Option<Pane>,
    oscillator_sub: Option<SubscriptionId>,
    sync: SyncCoordinator,
    config: IndicatorConfig,
    candles: Vec<Candle>,
    disposed: bool,
}

/// Splits the container between the price pane and the oscillator pane.
pub fn split_size(size: ContainerSize, with_oscillator: bool) -> (ContainerSize, ContainerSize) {
    if !with_oscillator {
        return (size, ContainerSize::new(size.width, 0));
    }
    let osc_height = (u32::from(size.height) * OSCILLATOR_HEIGHT_PERCENT / 100) as u16;
    (
        ContainerSize::new(size.width, size.height - osc_height),
        ContainerSize::new(size.width, osc_height),
    )
}

impl ChartSurface {
    pub fn create(size: ContainerSize, config: IndicatorConfig) -> Self {
        let config = config.normalized();
        let (primary_size, _) = split_size(size, config.oscillator.enabled);
        let mut surface = Self {
            size,
            primary: Pane::new(PaneKind::Price, primary_size),
            oscillator: None,
            oscillator_sub: None,
            sync: SyncCoordinator::new(PaneKind::Price),
            config,
            candles: Vec::new(),
            disposed: false,
        };
        if surface.config.oscillator.enabled {
            surface.attach_oscillator();
        }
        tracing::info!(
            width = size.width,
            height = size.height,
            oscillator = surface.oscillator.is_some(),
            "Chart surface created"
        );
        surface
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn primary(&self) -> &Pane {
        &self.primary
    }

    pub fn oscillator(&self) -> Option<&Pane> {
        self.oscillator.as_ref()
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Replace the candle window and every enabled series derived from it.
    pub fn apply_window(&mut self, candles: Vec<Candle>) {
        if self.disposed {
            return;
        }
        self.candles = candles;
        let derived = indicator::compute_all(&self.candles, &self.config);

        self.primary.set_data(
            SeriesKey::Candles,
            SeriesData::Candlestick(self.candles.clone()),
        );
        self.primary.set_data(
            SeriesKey::Volume,
            SeriesData::Histogram(self.candles.iter().map(VolumeBar::from).collect()),
        );
        for (period, points) in derived.sma {
            self.primary.set_data(SeriesKey::Sma(period), SeriesData::Line(points));
        }
        if let Some(bands) = derived.bollinger {
            self.write_bands(bands);
        }
        if let Some(points) = derived.rsi {
            self.write_rsi(points);
        }
    }

    /// Apply a new indicator configuration, touching only the series whose
    /// settings changed. Returns the keys that were written or removed.
    pub fn reconfigure(&mut self, config: IndicatorConfig) -> Vec<SeriesKey> {
        let config = config.normalized();
        let mut touched = Vec::new();
        if self.disposed || config == self.config {
            return touched;
        }
        let old = std::mem::replace(&mut self.config, config);

        for &period in &old.sma_periods {
            if !self.config.sma_periods.contains(&period) {
                self.primary.remove_series(SeriesKey::Sma(period));
                touched.push(SeriesKey::Sma(period));
            }
        }
        for period in self.config.sma_periods.clone() {
            if !old.sma_periods.contains(&period) {
                let points = indicator::sma(&self.candles, period);
                self.primary.set_data(SeriesKey::Sma(period), SeriesData::Line(points));
                touched.push(SeriesKey::Sma(period));
            }
        }

        let bb = self.config.bollinger.clone();
        if !bb.enabled && old.bollinger.enabled {
            for key in SeriesKey::BOLLINGER {
                self.primary.remove_series(key);
            }
            touched.extend(SeriesKey::BOLLINGER);
        } else if bb.enabled && bb != old.bollinger {
            let bands =
                indicator::bollinger_bands(&self.candles, bb.period, bb.std_dev_multiplier);
            self.write_bands(bands);
            touched.extend(SeriesKey::BOLLINGER);
        }

        let osc = self.config.oscillator.clone();
        if osc != old.oscillator {
            if osc.enabled {
                if self.oscillator.is_none() {
                    self.attach_oscillator();
                }
                let points = indicator::rsi(&self.candles, osc.period);
                self.write_rsi(points);
            } else {
                self.detach_oscillator();
            }
            touched.extend(SeriesKey::OSCILLATOR);
        }

        tracing::info!(touched = touched.len(), "Chart surface reconfigured");
        touched
    }

    /// User-driven visible range change on the price pane. Followers are
    /// updated through the sync coordinator; nothing happens after dispose.
    pub fn set_visible_range(&mut self, range: Option<TimeRange>) {
        if self.disposed {
            return;
        }
        self.primary.set_visible_range(range);
        for target in self.sync.publish(range) {
            match self.pane_mut(target) {
                Some(pane) if !pane.is_released() => pane.set_visible_range(range),
                _ => tracing::debug!(pane = ?target, "Range sync target missing"),
            }
        }
    }

    pub fn resize(&mut self, size: ContainerSize) {
        if self.disposed {
            return;
        }
        self.size = size;
        let (primary_size, osc_size) = split_size(size, self.oscillator.is_some());
        self.primary.resize(primary_size);
        if let Some(pane) = self.oscillator.as_mut() {
            pane.resize(osc_size);
        }
    }

    /// Release both panes and stop range propagation. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.sync.close();
        self.oscillator_sub = None;
        if let Some(pane) = self.oscillator.as_mut() {
            pane.release();
        }
        self.primary.release();
        self.candles.clear();
        self.disposed = true;
        tracing::info!("Chart surface disposed");
    }

    fn pane_mut(&mut self, kind: PaneKind) -> Option<&mut Pane> {
        match kind {
            PaneKind::Price => Some(&mut self.primary),
            PaneKind::Oscillator => self.oscillator.as_mut(),
        }
    }

    fn attach_oscillator(&mut self) {
        let (primary_size, osc_size) = split_size(self.size, true);
        self.primary.resize(primary_size);
        let mut pane = Pane::new(PaneKind::Oscillator, osc_size);
        pane.set_visible_range(self.sync.last_range());
        self.oscillator = Some(pane);
        self.oscillator_sub = self.sync.subscribe(PaneKind::Oscillator);
    }

    fn detach_oscillator(&mut self) {
        if let Some(id) = self.oscillator_sub.take() {
            self.sync.unsubscribe(id);
        }
        if let Some(mut pane) = self.oscillator.take() {
            pane.release();
        }
        self.primary.resize(self.size);
    }

    fn write_bands(&mut self, bands: BandTriple) {
        self.primary
            .set_data(SeriesKey::BollingerUpper, SeriesData::Line(bands.upper));
        self.primary
            .set_data(SeriesKey::BollingerMiddle, SeriesData::Line(bands.middle));
        self.primary
            .set_data(SeriesKey::BollingerLower, SeriesData::Line(bands.lower));
    }

    fn write_rsi(&mut self, points: Vec<IndicatorPoint>) {
        let (upper, lower) = (self.config.oscillator.upper, self.config.oscillator.lower);
        let Some(pane) = self.oscillator.as_mut() else {
            return;
        };
        let times: Vec<i64> = points.iter().map(|p| p.time).collect();
        pane.set_data(
            SeriesKey::RsiUpperRef,
            SeriesData::Line(reference_line(times.iter().copied(), upper)),
        );
        pane.set_data(
            SeriesKey::RsiLowerRef,
            SeriesData::Line(reference_line(times, lower)),
        );
        pane.set_data(SeriesKey::Rsi, SeriesData::Line(points));
    }
}
