use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

/// Key hints, or the outcome of the last action when there is one.
pub fn render(frame: &mut Frame, area: Rect, flash: Option<&(String, bool)>) {
    let line = match flash {
        Some((msg, true)) => Line::from(Span::styled(format!("✗ {}", msg), theme::red())),
        Some((msg, false)) => Line::from(Span::styled(format!("✓ {}", msg), theme::green())),
        None => {
            let hints = [
                ("[Tab]", " panel  "),
                ("[m]", " mark read  "),
                ("[n]", " with note  "),
                ("[d]", " distribute  "),
                ("[R]", " read all  "),
                ("[?]", " help  "),
                ("[Esc]", " quit"),
            ];
            let mut spans = Vec::new();
            for (key, label) in hints {
                spans.push(Span::styled(key, theme::gold()));
                spans.push(Span::styled(label, theme::dim()));
            }
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
