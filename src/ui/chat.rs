//! Consultation transcript display component

use crate::store::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Message list for the current session, rendered bottom-anchored
pub struct ChatView {
    title: String,
    messages: Vec<Message>,
    is_streaming: bool,
}

impl ChatView {
    pub fn new(title: String, messages: Vec<Message>, is_streaming: bool) -> Self {
        Self {
            title,
            messages,
            is_streaming,
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16, with_cursor: bool) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            Role::User => "👤",
            Role::Assistant => "🩺",
        };
        let timestamp = message.timestamp.format("%H:%M:%S").to_string();
        let header = format!("{} {} {}", role_icon, timestamp, "─".repeat(20));
        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let style = match message.role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Assistant => Style::default().fg(Color::Green),
        };

        let content_lines = wrap_text(&message.content, width.saturating_sub(2) as usize);
        let last = content_lines.len().saturating_sub(1);
        for (i, content_line) in content_lines.into_iter().enumerate() {
            let cursor = if with_cursor && i == last { "▋" } else { "" };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, style),
                Span::styled(cursor, Style::default().fg(Color::Yellow)),
            ]));
        }

        lines
    }
}

impl Widget for ChatView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("💬 {}", self.title));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Welcome to your eye consultation. 🩺",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Describe your symptoms or ask a question below.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Press Enter to send. Type / for commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        // Collect all lines, with a streaming cursor on the tail message
        let last_index = self.messages.len() - 1;
        let mut all_lines: Vec<Line> = Vec::new();
        for (i, message) in self.messages.iter().enumerate() {
            let with_cursor =
                self.is_streaming && i == last_index && message.role == Role::Assistant;
            all_lines.extend(self.render_message(message, inner_area.width, with_cursor));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        // Show the most recent lines that fit
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
