use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Widget},
};

use crate::chart::{Pane, SeriesData, SeriesKey};
use crate::model::candle::VolumeBar;

use super::{format_time, series_color, value_to_row, visible_tail};

const MIN_HEIGHT_FOR_VOLUME: usize = 10;

/// Candles with SMA and Bollinger overlays, one column per candle,
/// right-aligned so the newest candle sits at the right edge. Tall enough
/// panes get a volume strip along the bottom.
pub struct PriceChart<'a> {
    pane: &'a Pane,
    title: String,
}

impl<'a> PriceChart<'a> {
    pub fn new(pane: &'a Pane) -> Self {
        Self {
            pane,
            title: " Price ".to_string(),
        }
    }

    pub fn title(mut self, title: String) -> Self {
        self.title = title;
        self
    }
}

impl PriceChart<'_> {
    /// Volume bars growing up from `bottom`, scaled to the largest visible bar.
    fn render_volume(
        &self,
        columns: &HashMap<i64, u16>,
        bottom: u16,
        rows: usize,
        buf: &mut Buffer,
    ) {
        let Some(bars) = self
            .pane
            .series(SeriesKey::Volume)
            .and_then(SeriesData::as_histogram)
        else {
            return;
        };
        let visible: Vec<(u16, &VolumeBar)> = bars
            .iter()
            .filter_map(|b| Some((*columns.get(&b.time)?, b)))
            .collect();
        let max_volume = visible.iter().map(|(_, b)| b.volume).fold(0.0, f64::max);
        if max_volume <= 0.0 {
            return;
        }
        for (x, bar) in visible {
            let height = ((bar.volume / max_volume) * rows as f64).ceil() as usize;
            let color = if bar.bullish { Color::Green } else { Color::Red };
            let style = Style::default().fg(color);
            for i in 0..height.min(rows) {
                buf.set_string(x, bottom - i as u16, "▒", style);
            }
        }
    }
}

impl Widget for PriceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || inner.width < 4 {
            return;
        }
        let Some(candles) = self
            .pane
            .series(SeriesKey::Candles)
            .and_then(SeriesData::as_candles)
        else {
            return;
        };

        let chart_width = inner.width as usize;
        let chart_height = inner.height.saturating_sub(1) as usize; // bottom row holds time labels
        let volume_rows = if chart_height >= MIN_HEIGHT_FOR_VOLUME {
            chart_height / 5
        } else {
            0
        };
        let price_height = chart_height - volume_rows;
        let visible = visible_tail(candles, |c| c.time, self.pane.visible_range(), chart_width);
        if visible.is_empty() {
            return;
        }

        let x_offset = (chart_width - visible.len()) as u16;
        let columns: HashMap<i64, u16> = visible
            .iter()
            .enumerate()
            .map(|(i, c)| (c.time, inner.x + x_offset + i as u16))
            .collect();

        let overlays: Vec<(SeriesKey, Vec<(u16, f64)>)> = self
            .pane
            .iter_series()
            .filter(|(key, _)| key.is_overlay())
            .filter_map(|(key, data)| {
                let points = data
                    .as_line()?
                    .iter()
                    .filter_map(|p| Some((*columns.get(&p.time)?, p.value?)))
                    .collect();
                Some((key, points))
            })
            .collect();

        let mut min_price = visible.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let mut max_price = visible.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        for (_, points) in &overlays {
            for (_, v) in points {
                min_price = min_price.min(*v);
                max_price = max_price.max(*v);
            }
        }
        let range = max_price - min_price;
        let range = if range < 1e-9 { 1.0 } else { range };
        let row = |price: f64| inner.y + value_to_row(price, min_price, range, price_height) as u16;

        // Bands and averages first so candles stay readable on top.
        for (key, points) in &overlays {
            let style = Style::default().fg(series_color(*key));
            for (x, v) in points {
                buf.set_string(*x, row(*v), "·", style);
            }
        }

        for (c, x) in visible.iter().map(|c| (c, columns[&c.time])) {
            let color = if c.is_bullish() { Color::Green } else { Color::Red };
            let style = Style::default().fg(color);
            let (wick_top, wick_bottom) = (row(c.high), row(c.low));
            let (body_top, body_bottom) = (row(c.open.max(c.close)), row(c.open.min(c.close)));
            for y in wick_top..=wick_bottom {
                let glyph = if (body_top..=body_bottom).contains(&y) { "█" } else { "│" };
                buf.set_string(x, y, glyph, style);
            }
        }

        let label_style = Style::default().fg(Color::DarkGray);
        buf.set_string(inner.x, inner.y, format!("{:.2}", max_price), label_style);
        buf.set_string(
            inner.x,
            inner.y + price_height as u16 - 1,
            format!("{:.2}", min_price),
            label_style,
        );

        if volume_rows > 0 {
            let strip_bottom = inner.y + chart_height as u16 - 1;
            self.render_volume(&columns, strip_bottom, volume_rows, buf);
        }

        let time_row = inner.y + inner.height - 1;
        if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
            let left = format_time(first.time);
            let right = format_time(last.time);
            buf.set_string(inner.x + x_offset, time_row, &left, label_style);
            let right_x = (inner.x + inner.width).saturating_sub(right.chars().count() as u16);
            if right_x > inner.x + x_offset + left.chars().count() as u16 {
                buf.set_string(right_x, time_row, &right, label_style);
            }
        }
    }
}
