pub mod chart;
pub mod oscillator;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::SeriesKey;
use crate::event::ChartSnapshot;
use crate::model::candle::TimeRange;

pub use chart::PriceChart;
pub use oscillator::OscillatorChart;

/// Price pane on top, oscillator pane below when the snapshot carries one.
pub struct ChartView<'a> {
    snapshot: &'a ChartSnapshot,
}

impl<'a> ChartView<'a> {
    pub fn new(snapshot: &'a ChartSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Widget for ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let Some(primary) = self.snapshot.primary.as_ref() else {
            let msg = format!(" {} ", self.snapshot.state);
            buf.set_string(area.x, area.y, msg, Style::default().fg(Color::DarkGray));
            return;
        };
        let title = format!(
            " {} {} ",
            self.snapshot.symbol, self.snapshot.interval
        );

        match self.snapshot.oscillator.as_ref() {
            Some(osc) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                    .split(area);
                PriceChart::new(primary).title(title).render(chunks[0], buf);
                OscillatorChart::new(osc).render(chunks[1], buf);
            }
            None => PriceChart::new(primary).title(title).render(area, buf),
        }
    }
}

pub(crate) fn series_color(key: SeriesKey) -> Color {
    match key {
        SeriesKey::Sma(5) => Color::Yellow,
        SeriesKey::Sma(20) => Color::Magenta,
        SeriesKey::Sma(60) => Color::Green,
        SeriesKey::Sma(120) => Color::Blue,
        SeriesKey::Sma(_) => Color::LightCyan,
        SeriesKey::BollingerUpper | SeriesKey::BollingerLower => Color::Gray,
        SeriesKey::BollingerMiddle => Color::DarkGray,
        SeriesKey::Rsi => Color::Cyan,
        SeriesKey::RsiUpperRef | SeriesKey::RsiLowerRef => Color::DarkGray,
        SeriesKey::Candles | SeriesKey::Volume => Color::White,
    }
}

/// Row offset (0 = top) for `value` in a plot of `height` rows spanning
/// `[min, min + range]`.
pub(crate) fn value_to_row(value: f64, min: f64, range: f64, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    let normalized = ((value - min) / range).clamp(0.0, 1.0);
    let from_bottom = ((normalized * (height - 1) as f64).round() as usize).min(height - 1);
    height - 1 - from_bottom
}

/// Keep items inside `range` (all when `None`), then the last `width` of them.
pub(crate) fn visible_tail<T>(
    items: &[T],
    time: impl Fn(&T) -> i64,
    range: Option<TimeRange>,
    width: usize,
) -> Vec<&T> {
    let in_range: Vec<&T> = items
        .iter()
        .filter(|item| range.map_or(true, |r| r.contains(time(*item))))
        .collect();
    let skip = in_range.len().saturating_sub(width);
    in_range.into_iter().skip(skip).collect()
}

pub(crate) fn format_time(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
