use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Widget},
};

use crate::chart::{Pane, SeriesData, SeriesKey};

use super::{series_color, value_to_row, visible_tail};

/// RSI on a fixed 0..100 scale with the reference lines drawn across.
pub struct OscillatorChart<'a> {
    pane: &'a Pane,
}

impl<'a> OscillatorChart<'a> {
    pub fn new(pane: &'a Pane) -> Self {
        Self { pane }
    }
}

impl Widget for OscillatorChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" RSI ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 2 || inner.width < 4 {
            return;
        }
        let height = inner.height as usize;
        let width = inner.width as usize;
        let row = |v: f64| inner.y + value_to_row(v, 0.0, 100.0, height) as u16;

        for key in [SeriesKey::RsiUpperRef, SeriesKey::RsiLowerRef] {
            let level = self
                .pane
                .series(key)
                .and_then(SeriesData::as_line)
                .and_then(|pts| pts.first())
                .and_then(|p| p.value);
            if let Some(level) = level {
                let y = row(level);
                let style = Style::default().fg(series_color(key));
                for x in inner.x..inner.x + inner.width {
                    buf.set_string(x, y, "─", style);
                }
                buf.set_string(inner.x, y, format!("{:.0}", level), style);
            }
        }

        let Some(points) = self.pane.series(SeriesKey::Rsi).and_then(SeriesData::as_line) else {
            return;
        };
        let visible = visible_tail(points, |p| p.time, self.pane.visible_range(), width);
        let x_offset = (width - visible.len()) as u16;
        let style = Style::default().fg(series_color(SeriesKey::Rsi));
        for (i, p) in visible.iter().enumerate() {
            if let Some(v) = p.value {
                buf.set_string(inner.x + x_offset + i as u16, row(v), "•", style);
            }
        }

        if let Some(v) = visible.last().and_then(|p| p.value) {
            let label = format!("{:.1}", v);
            let x = (inner.x + inner.width).saturating_sub(label.chars().count() as u16);
            buf.set_string(x, inner.y, label, style);
        }
    }
}
