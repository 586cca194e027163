use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

use crate::models::Notification;
use crate::tui::theme;
use crate::utils::format::{short_date, truncate_width};

pub fn render(frame: &mut Frame, area: Rect, feed: &[Notification], selected: usize, focused: bool) {
    let block = Block::default()
        .title(Span::styled(" Notifications ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused))
        .style(theme::surface());

    let msg_width = (area.width as usize).saturating_sub(18).max(10);
    let mut items: Vec<ListItem> = feed
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let (icon, style) = if n.is_read {
                ("  ", theme::dim())
            } else {
                ("● ", theme::bold())
            };
            let line = Line::from(vec![
                Span::styled(format!(" {}", icon), theme::amber()),
                Span::styled(format!("{}  ", short_date(&n.created_at)), theme::dim()),
                Span::styled(truncate_width(&n.message, msg_width), style),
            ]);
            let item = ListItem::new(line);
            if focused && i == selected {
                item.style(theme::selected())
            } else {
                item
            }
        })
        .collect();

    if items.is_empty() {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Span::styled("  All caught up", theme::green())));
    }

    frame.render_widget(List::new(items).block(block), area);
}
