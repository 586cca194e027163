use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, hijri_str: &str, reader: &str, unread: i64) {
    let gregorian_str = Local::now().format("%A, %b %d, %Y").to_string();

    let title_line = Line::from(vec![
        Span::styled("  خَتْمَة  ", theme::gold().add_modifier(Modifier::BOLD)),
        Span::styled("khatma", theme::gold()),
    ]);

    let date_line = Line::from(vec![
        Span::styled(hijri_str, theme::amber()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(gregorian_str, theme::dim()),
    ]);

    let mut reader_spans = vec![Span::styled(format!("السلام عليكم, {}", reader), theme::bold())];
    if unread > 0 {
        reader_spans.push(Span::styled("  ·  ", theme::dim()));
        reader_spans.push(Span::styled(format!("{} unread", unread), theme::amber()));
    }

    let text = vec![title_line, date_line, Line::from(reader_spans)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold().add_modifier(Modifier::BOLD))
        .style(theme::base());

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
