//! Session picker sidebar component

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// One row in the session picker
pub struct SessionEntry {
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub is_current: bool,
}

/// Sidebar listing sessions in reverse creation order
pub struct SessionList {
    pub entries: Vec<SessionEntry>,
    pub selected: usize,
    pub has_focus: bool,
}

impl Widget for SessionList {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🗂 Consultations")
            .style(if self.has_focus {
                Style::default().fg(Color::Blue)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        // Two rows per entry: title, then a dimmed date line
        for (index, entry) in self.entries.iter().enumerate() {
            let y = (index * 2) as u16;
            if y + 1 >= inner_area.height {
                break;
            }

            let title_style = if self.has_focus && index == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if entry.is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let marker = if entry.is_current { "● " } else { "  " };
            let title_line = Line::from(vec![
                Span::raw(marker),
                Span::styled(entry.title.clone(), title_style),
            ]);
            buf.set_line(inner_area.x, inner_area.y + y, &title_line, inner_area.width);

            let date_line = Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    entry.last_updated.format("%Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            buf.set_line(inner_area.x, inner_area.y + y + 1, &date_line, inner_area.width);
        }
    }
}
