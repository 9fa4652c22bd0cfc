//! Medical disclaimer modal overlay

use crate::ui::chat::wrap_text;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

const DISCLAIMER_PARAGRAPHS: &[&str] = &[
    "Dr. Mrityunjay Singh AI is an AI assistant specializing in Ophthalmology. It is not a licensed medical professional.",
    "This tool provides educational information about eye care and vision health. It does not replace a physical eye examination (slit-lamp exam, fundoscopy, etc.) by a qualified Ophthalmologist.",
    "Do not use this tool for eye emergencies. If you have sudden vision loss, severe pain, chemical burns, or a penetrating injury, go to an Emergency Room immediately.",
];

/// One-time disclaimer shown over the whole screen until dismissed
pub struct DisclaimerOverlay;

impl Widget for DisclaimerOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(area, 60, 16);

        Clear.render(popup, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("⚠ Medical Disclaimer")
            .style(Style::default().fg(Color::Yellow));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let width = inner.width.saturating_sub(2) as usize;
        let mut lines: Vec<Line> = Vec::new();
        for paragraph in DISCLAIMER_PARAGRAPHS {
            for wrapped in wrap_text(paragraph, width) {
                lines.push(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(wrapped, Style::default().fg(Color::White)),
                ]));
            }
            lines.push(Line::from(vec![Span::raw("")]));
        }
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(
                "Press Enter to acknowledge and continue.",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));

        for (i, line) in lines.iter().enumerate() {
            if i >= inner.height as usize {
                break;
            }
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

/// Centered rect of the given width percentage and fixed height
fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
