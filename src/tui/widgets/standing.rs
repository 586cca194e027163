use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::{Profile, Progress};
use crate::tui::theme;
use crate::utils::format::progress_bar;

/// Level, points, streak and how much of the reader's assigned share is done.
pub fn render(frame: &mut Frame, area: Rect, profile: Option<&Profile>, assigned: Progress) {
    let block = Block::default()
        .title(Span::styled(" Standing ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(false))
        .style(theme::surface());

    let Some(profile) = profile else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let level_line = Line::from(vec![
        Span::styled("  Level ", theme::dim()),
        Span::styled(profile.level.to_string(), theme::gold().add_modifier(Modifier::BOLD)),
        Span::styled(format!("  ·  {} points", profile.total_points), theme::dim()),
    ]);

    let streak_line = Line::from(vec![
        Span::styled("  ", theme::dim()),
        Span::styled(
            format!("{} day streak", profile.consecutive_days),
            theme::green().add_modifier(Modifier::BOLD),
        ),
    ]);

    let bar_style = if assigned.is_done() { theme::green() } else { theme::amber() };
    let assigned_line = Line::from(vec![
        Span::styled("  ", theme::dim()),
        Span::styled(progress_bar(assigned.completed, assigned.total, 12), bar_style),
        Span::styled(
            format!("  {}/{} parts read", assigned.completed, assigned.total),
            theme::dim(),
        ),
    ]);

    let text = vec![Line::from(""), level_line, streak_line, assigned_line];
    frame.render_widget(Paragraph::new(text).block(block), area);
}
