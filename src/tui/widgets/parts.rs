use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::KhatmaPart;
use crate::tui::theme;
use crate::utils::format::{pad_width, truncate_width};

/// Parts are laid out column-major: 1-10, 11-20, 21-30.
pub const ROWS: usize = 10;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    title: Option<&str>,
    parts: &[KhatmaPart],
    selected: usize,
    focused: bool,
    user_id: i64,
) {
    let heading = match title {
        Some(t) => format!(" Parts · {} ", truncate_width(t, 30)),
        None => " Parts ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(heading, theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused))
        .style(theme::surface());

    let columns = parts.len().div_ceil(ROWS).max(1);
    let cell_width = ((area.width as usize).saturating_sub(4) / columns).max(12);
    let name_width = cell_width.saturating_sub(8);

    let mut lines = Vec::with_capacity(ROWS);
    for row in 0..ROWS {
        let mut spans = vec![Span::raw(" ")];
        for col in 0..columns {
            let idx = col * ROWS + row;
            let Some(part) = parts.get(idx) else { continue };

            let mine = part.assigned_to == Some(user_id);
            let (icon, icon_style) = if part.is_completed {
                ("●", theme::green())
            } else if mine {
                ("◉", theme::amber())
            } else if part.assigned_to.is_some() {
                ("○", theme::dim())
            } else {
                ("·", theme::dim())
            };
            let who = part.assignee.as_deref().unwrap_or("open");
            let cell = format!(" {:>2} {}", part.part_number, truncate_width(who, name_width));

            let mut cell_style = if mine { theme::bold() } else { theme::dim() };
            if focused && idx == selected {
                cell_style = theme::selected().add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(icon, icon_style));
            spans.push(Span::styled(pad_width(&cell, cell_width.saturating_sub(1)), cell_style));
        }
        lines.push(Line::from(spans));
    }

    if parts.is_empty() {
        lines = vec![
            Line::from(""),
            Line::from(Span::styled("  Select a khatma to see its parts", theme::dim())),
        ];
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
