use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

use crate::models::{Khatma, Progress};
use crate::tui::theme;
use crate::utils::format::{format_percent, progress_bar, truncate_width};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    khatmas: &[(Khatma, Progress)],
    selected: usize,
    focused: bool,
    user_id: i64,
) {
    let block = Block::default()
        .title(Span::styled(" Khatmas ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused))
        .style(theme::surface());

    if khatmas.is_empty() {
        let empty = List::new(vec![
            ListItem::new(""),
            ListItem::new(Span::styled("  Not part of any khatma yet", theme::dim())),
            ListItem::new(Span::styled("  Start one: khatma khatma create <title>", theme::dim())),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let title_width = (area.width as usize).saturating_sub(30).max(8);
    let items: Vec<ListItem> = khatmas
        .iter()
        .enumerate()
        .map(|(i, (k, progress))| {
            let (icon, icon_style) = if k.is_completed {
                ("✓", theme::green())
            } else if k.creator_id == user_id {
                ("★", theme::gold())
            } else {
                ("○", theme::dim())
            };
            let bar_style = if progress.is_done() { theme::green() } else { theme::amber() };

            let line = Line::from(vec![
                Span::styled(format!("  {} ", icon), icon_style),
                Span::styled(format!("{:<w$}", truncate_width(&k.title, title_width), w = title_width), theme::bold()),
                Span::styled(format!(" {} ", progress_bar(progress.completed, progress.total, 10)), bar_style),
                Span::styled(format!("{:>5}", format_percent(progress.percent())), theme::dim()),
            ]);
            let item = ListItem::new(line);
            if focused && i == selected {
                item.style(theme::selected())
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
