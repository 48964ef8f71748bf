use std::collections::BTreeMap;

use crate::model::candle::TimeRange;

use super::series::{SeriesData, SeriesKey};
use super::ContainerSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Price,
    Oscillator,
}

/// One drawable time-series surface.
///
/// Series are only ever replaced wholesale. Once released, the pane drops its
/// data and ignores further writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    kind: PaneKind,
    series: BTreeMap<SeriesKey, SeriesData>,
    visible_range: Option<TimeRange>,
    size: ContainerSize,
    revision: u64,
    released: bool,
}

impl Pane {
    pub fn new(kind: PaneKind, size: ContainerSize) -> Self {
        Self {
            kind,
            series: BTreeMap::new(),
            visible_range: None,
            size,
            revision: 0,
            released: false,
        }
    }

    pub fn kind(&self) -> PaneKind {
        self.kind
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    /// Bumped on every series write or removal.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn set_data(&mut self, key: SeriesKey, data: SeriesData) {
        if self.released {
            tracing::warn!(pane = ?self.kind, series = %key, "Write to released pane ignored");
            return;
        }
        self.series.insert(key, data);
        self.revision += 1;
    }

    pub fn remove_series(&mut self, key: SeriesKey) -> bool {
        let removed = self.series.remove(&key).is_some();
        if removed {
            self.revision += 1;
        }
        removed
    }

    pub fn series(&self, key: SeriesKey) -> Option<&SeriesData> {
        self.series.get(&key)
    }

    pub fn has_series(&self, key: SeriesKey) -> bool {
        self.series.contains_key(&key)
    }

    pub fn series_keys(&self) -> impl Iterator<Item = SeriesKey> + '_ {
        self.series.keys().copied()
    }

    pub fn iter_series(&self) -> impl Iterator<Item = (SeriesKey, &SeriesData)> {
        self.series.iter().map(|(k, v)| (*k, v))
    }

    /// `None` means "fit all data".
    pub fn visible_range(&self) -> Option<TimeRange> {
        self.visible_range
    }

    pub fn set_visible_range(&mut self, range: Option<TimeRange>) {
        if !self.released {
            self.visible_range = range;
        }
    }

    /// Span across every series, ignoring empty ones.
    pub fn data_span(&self) -> Option<TimeRange> {
        self.series
            .values()
            .filter_map(SeriesData::time_span)
            .fold(None, |acc, (first, last)| match acc {
                None => Some(TimeRange::new(first, last)),
                Some(r) => Some(TimeRange::new(r.from.min(first), r.to.max(last))),
            })
    }

    pub fn resize(&mut self, size: ContainerSize) {
        self.size = size;
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.series.clear();
        self.visible_range = None;
        self.released = true;
        self.revision += 1;
    }
}
