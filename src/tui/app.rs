use anyhow::Result;
use crossterm::event::{KeyCode, KeyEventKind};
use log::warn;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::{Khatma, KhatmaPart, Notification, Profile, Progress, User};
use crate::services::{accounts, khatmas, notifications};
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::{header, khatmas as khatma_list, notifications as feed, parts, standing, statusbar};
use crate::utils::format::format_part_range;
use crate::utils::hijri::today_hijri_string;

const FEED_LIMIT: usize = 20;
const NOTE_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusSection {
    Khatmas,
    Parts,
    Notifications,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    /// Typing the reflection saved with a part completion
    NoteInput,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub user: User,
    pub focus_section: FocusSection,
    pub khatma_idx: usize,
    pub part_idx: usize,
    pub notification_idx: usize,
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input_buffer: String,
    /// Last action's message; `true` marks an error.
    pub flash: Option<(String, bool)>,

    // Cached state (refreshed on tick/action)
    pub hijri_str: String,
    pub profile: Option<Profile>,
    pub assigned: Progress,
    pub khatmas: Vec<(Khatma, Progress)>,
    pub parts: Vec<KhatmaPart>,
    pub feed: Vec<Notification>,
    pub unread: i64,
}

impl App {
    pub fn new(config: AppConfig, user: User) -> Self {
        let hijri_str = today_hijri_string(config.display.hijri_offset);
        App {
            view: View::Dashboard,
            config,
            user,
            focus_section: FocusSection::Khatmas,
            khatma_idx: 0,
            part_idx: 0,
            notification_idx: 0,
            should_quit: false,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            flash: None,
            hijri_str,
            profile: None,
            assigned: Progress::default(),
            khatmas: Vec::new(),
            parts: Vec::new(),
            feed: Vec::new(),
            unread: 0,
        }
    }

    pub fn load(&mut self, conn: &Connection) -> Result<()> {
        self.user = accounts::require_id(conn, self.user.id)?;
        self.profile = Some(accounts::profile(conn, &self.user)?);
        self.hijri_str = today_hijri_string(self.config.display.hijri_offset);

        let d = crate::services::dashboard::dashboard(conn, &self.user)?;
        self.assigned = d.assigned;
        let mut list = Vec::with_capacity(d.created.len() + d.joined.len());
        for k in d.created.into_iter().chain(d.joined) {
            let progress = khatmas::progress(conn, k.id)?;
            list.push((k, progress));
        }
        // open campaigns first
        list.sort_by_key(|(k, _)| k.is_completed);
        self.khatmas = list;
        self.khatma_idx = self.khatma_idx.min(self.khatmas.len().saturating_sub(1));

        self.parts = match self.selected_khatma() {
            Some(k) => khatmas::parts(conn, k)?,
            None => Vec::new(),
        };
        self.part_idx = self.part_idx.min(self.parts.len().saturating_sub(1));

        self.feed = notifications::list(conn, &self.user, false, FEED_LIMIT)?;
        self.unread = notifications::unread_count(conn, &self.user)?;
        self.notification_idx = self.notification_idx.min(self.feed.len().saturating_sub(1));
        Ok(())
    }

    /// Reload so work done from another terminal shows up.
    pub fn tick(&mut self, conn: &Connection) {
        if let Err(e) = self.load(conn) {
            warn!("dashboard refresh failed: {e:#}");
        }
    }

    pub fn selected_khatma(&self) -> Option<&Khatma> {
        self.khatmas.get(self.khatma_idx).map(|(k, _)| k)
    }

    fn selected_part(&self) -> Option<&KhatmaPart> {
        self.parts.get(self.part_idx)
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent, conn: &Connection) {
        // Only handle actual key presses; some terminals also report releases
        if key.kind != KeyEventKind::Press {
            return;
        }
        match self.input_mode {
            InputMode::NoteInput => self.handle_note_input(key, conn),
            InputMode::Normal => match self.view {
                View::Dashboard => self.handle_dashboard_key(key, conn),
                View::Help => self.handle_help_key(key),
            },
        }
    }

    fn handle_dashboard_key(&mut self, key: crossterm::event::KeyEvent, conn: &Connection) {
        self.flash = None;
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.view = View::Help;
            }
            KeyCode::Tab => {
                self.focus_section = match self.focus_section {
                    FocusSection::Khatmas => FocusSection::Parts,
                    FocusSection::Parts => FocusSection::Notifications,
                    FocusSection::Notifications => FocusSection::Khatmas,
                };
            }
            KeyCode::BackTab => {
                self.focus_section = match self.focus_section {
                    FocusSection::Khatmas => FocusSection::Notifications,
                    FocusSection::Parts => FocusSection::Khatmas,
                    FocusSection::Notifications => FocusSection::Parts,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_focus(-1, conn),
            KeyCode::Down | KeyCode::Char('j') => self.move_focus(1, conn),
            // the part grid is three columns of ten
            KeyCode::Left | KeyCode::Char('h') if self.focus_section == FocusSection::Parts => {
                self.part_idx = self.part_idx.saturating_sub(parts::ROWS);
            }
            KeyCode::Right | KeyCode::Char('l') if self.focus_section == FocusSection::Parts => {
                if self.part_idx + parts::ROWS < self.parts.len() {
                    self.part_idx += parts::ROWS;
                }
            }
            KeyCode::Char('m') | KeyCode::Enter => match self.focus_section {
                FocusSection::Khatmas => {
                    self.focus_section = FocusSection::Parts;
                }
                FocusSection::Parts => self.complete_focused_part(conn, None),
                FocusSection::Notifications => self.read_focused_notification(conn),
            },
            KeyCode::Char('n') if self.focus_section == FocusSection::Parts => {
                self.input_mode = InputMode::NoteInput;
                self.input_buffer.clear();
            }
            KeyCode::Char('d') => self.distribute_selected(conn),
            KeyCode::Char('R') => {
                let outcome = notifications::mark_all_read(conn, &self.user)
                    .map(|n| format!("Marked {} notifications as read", n));
                self.finish_action(conn, outcome);
            }
            KeyCode::Char('g') => self.tick(conn),
            _ => {}
        }
    }

    fn move_focus(&mut self, delta: i64, conn: &Connection) {
        let (idx, len) = match self.focus_section {
            FocusSection::Khatmas => (&mut self.khatma_idx, self.khatmas.len()),
            FocusSection::Parts => (&mut self.part_idx, self.parts.len()),
            FocusSection::Notifications => (&mut self.notification_idx, self.feed.len()),
        };
        let next = (*idx as i64 + delta).clamp(0, len.saturating_sub(1) as i64) as usize;
        let changed = next != *idx;
        *idx = next;

        if changed && self.focus_section == FocusSection::Khatmas {
            self.part_idx = 0;
            self.tick(conn);
        }
    }

    fn handle_help_key(&mut self, key: crossterm::event::KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            self.view = View::Dashboard;
        }
    }

    fn handle_note_input(&mut self, key: crossterm::event::KeyEvent, conn: &Connection) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            KeyCode::Enter => {
                let note = self.input_buffer.trim().to_string();
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                let note = Some(note).filter(|n| !n.is_empty());
                self.complete_focused_part(conn, note.as_deref());
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) if self.input_buffer.chars().count() < NOTE_MAX => {
                self.input_buffer.push(c);
            }
            _ => {}
        }
    }

    fn complete_focused_part(&mut self, conn: &Connection, note: Option<&str>) {
        let (Some(k), Some(part)) = (self.selected_khatma().cloned(), self.selected_part()) else {
            return;
        };
        let number = part.part_number;
        let outcome = khatmas::complete_part(conn, &self.user, &k, number, note, None).map(|done| {
            if done.finished {
                format!("'{}' is complete. May it be accepted!", k.title)
            } else {
                format!("Part {} done · {}/{}", number, done.progress.completed, done.progress.total)
            }
        });
        self.finish_action(conn, outcome);
    }

    fn read_focused_notification(&mut self, conn: &Connection) {
        let Some(n) = self.feed.get(self.notification_idx) else {
            return;
        };
        if n.is_read {
            return;
        }
        let id = n.id;
        let outcome = notifications::mark_read(conn, &self.user, id).map(|_| format!("Marked #{} as read", id));
        self.finish_action(conn, outcome);
    }

    fn distribute_selected(&mut self, conn: &Connection) {
        let Some(k) = self.selected_khatma().cloned() else {
            return;
        };
        let outcome = khatmas::distribute(conn, &self.user, &k).map(|shares| {
            let mine: Vec<String> = shares
                .iter()
                .filter(|s| s.member == self.user.id)
                .map(|s| format_part_range(s.first, s.last))
                .collect();
            if mine.is_empty() {
                format!("Shared '{}' among {} readers", k.title, shares.len())
            } else {
                format!("Shared among {} readers · yours: {}", shares.len(), mine.join(", "))
            }
        });
        self.finish_action(conn, outcome);
    }

    /// Show what happened and reload.
    fn finish_action(&mut self, conn: &Connection, outcome: Result<String>) {
        self.flash = Some(match outcome {
            Ok(msg) => (msg, false),
            Err(e) => (e.to_string(), true),
        });
        self.tick(conn);
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.draw_dashboard(frame);
        if self.view == View::Help {
            self.draw_help_overlay(frame);
        }
        if self.input_mode == InputMode::NoteInput {
            self.draw_note_input(frame);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Min(0),    // body
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(frame, outer_chunks[0], &self.hijri_str, self.user.label(), self.unread);
        statusbar::render(frame, outer_chunks[2], self.flash.as_ref());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer_chunks[1]);

        // Left column: campaigns over the selected campaign's parts
        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(parts::ROWS as u16 + 2)])
            .split(columns[0]);

        khatma_list::render(
            frame,
            left_chunks[0],
            &self.khatmas,
            self.khatma_idx,
            self.focus_section == FocusSection::Khatmas,
            self.user.id,
        );
        parts::render(
            frame,
            left_chunks[1],
            self.selected_khatma().map(|k| k.title.as_str()),
            &self.parts,
            self.part_idx,
            self.focus_section == FocusSection::Parts,
            self.user.id,
        );

        // Right column: standing over notifications
        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(columns[1]);

        standing::render(frame, right_chunks[0], self.profile.as_ref(), self.assigned);
        feed::render(
            frame,
            right_chunks[1],
            &self.feed,
            self.notification_idx,
            self.focus_section == FocusSection::Notifications,
        );
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();
        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: (area.height / 2).max(16).min(area.height),
        };
        frame.render_widget(Clear, popup_area);

        let bindings = [
            ("  [Tab]        ", "Switch panel"),
            ("  [↑ ↓ ← →]    ", "Move within a panel"),
            ("  [m] / Enter  ", "Mark part read · mark notification read"),
            ("  [n]          ", "Mark part read with a note"),
            ("  [d]          ", "Distribute parts (creator only)"),
            ("  [R]          ", "Mark every notification read"),
            ("  [g]          ", "Refresh now"),
            ("  [?]          ", "Toggle help"),
            ("  [Esc]        ", "Quit"),
        ];
        let mut help_text = vec![
            Line::from(Span::styled("  Keybindings", theme::gold().add_modifier(Modifier::BOLD))),
            Line::from(""),
        ];
        for (key, what) in bindings {
            help_text.push(Line::from(vec![
                Span::styled(key, theme::gold()),
                Span::styled(what, theme::dim()),
            ]));
        }
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "  Everything else lives in the CLI: khatma --help",
            theme::dim(),
        )));

        let block = Block::default()
            .title(Span::styled(" Help ", theme::gold()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::gold())
            .style(theme::surface());
        frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
    }

    fn draw_note_input(&self, frame: &mut Frame) {
        let area = frame.area();
        let popup_area = Rect {
            x: area.width / 4,
            y: (area.height / 2).saturating_sub(3),
            width: area.width / 2,
            height: 5,
        };
        frame.render_widget(Clear, popup_area);

        let part = self.selected_part().map(|p| p.part_number).unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Note: ", theme::dim()),
                Span::styled(self.input_buffer.as_str(), theme::gold().add_modifier(Modifier::BOLD)),
                Span::styled("█", theme::amber()),
            ]),
            Line::from(Span::styled("  [Enter] save and mark read  ·  [Esc] cancel", theme::dim())),
        ];

        let block = Block::default()
            .title(Span::styled(format!(" Part {} ", part), theme::gold()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::amber())
            .style(theme::surface());
        frame.render_widget(Paragraph::new(text).block(block), popup_area);
    }
}

/// Run the TUI event loop for `user`.
pub fn run(conn: Connection, config: AppConfig, user: User) -> Result<()> {
    let tick_ms = config.tui.tick_ms;
    let mut app = App::new(config, user);
    app.load(&conn)?;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(tick_ms);

    let outcome = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }

        match events.next()? {
            Event::Key(key) => {
                app.handle_key(key, &conn);
                if app.should_quit {
                    break Ok(());
                }
            }
            Event::Resize => {}
            Event::Tick => app.tick(&conn),
        }
    };

    ratatui::restore();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewKhatma;
    use crate::services::testing::{db, user};
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn press(app: &mut App, conn: &Connection, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), conn);
    }

    fn setup() -> (Connection, App) {
        let conn = db();
        let amina = user(&conn, "amina");
        khatmas::create(&conn, &amina, NewKhatma::new("Ramadan reading")).unwrap();
        let mut app = App::new(AppConfig::default(), amina);
        app.load(&conn).unwrap();
        (conn, app)
    }

    #[test]
    fn load_lists_own_campaign_with_parts() {
        let (_conn, app) = setup();
        assert_eq!(app.khatmas.len(), 1);
        assert_eq!(app.parts.len(), 30);
        assert_eq!(app.khatmas[0].1.completed, 0);
        assert!(app.unread >= 1);
    }

    #[test]
    fn distribute_then_mark_part_from_grid() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Char('d'));
        assert_eq!(app.flash.as_ref().map(|f| f.1), Some(false));
        assert!(app.parts.iter().all(|p| p.assigned_to == Some(app.user.id)));

        press(&mut app, &conn, KeyCode::Tab);
        assert_eq!(app.focus_section, FocusSection::Parts);
        press(&mut app, &conn, KeyCode::Down);
        press(&mut app, &conn, KeyCode::Enter);

        assert!(app.parts[1].is_completed);
        assert_eq!(app.khatmas[0].1.completed, 1);
    }

    #[test]
    fn completing_twice_shows_error() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Tab);
        press(&mut app, &conn, KeyCode::Enter);
        press(&mut app, &conn, KeyCode::Enter);
        assert_eq!(app.flash.as_ref().map(|f| f.1), Some(true));
    }

    #[test]
    fn note_popup_saves_with_completion() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Tab);
        press(&mut app, &conn, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::NoteInput);
        for c in "read at fajr".chars() {
            press(&mut app, &conn, KeyCode::Char(c));
        }
        press(&mut app, &conn, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.parts[0].is_completed);
    }

    #[test]
    fn read_all_clears_unread() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Char('R'));
        assert_eq!(app.unread, 0);
    }

    #[test]
    fn part_grid_moves_by_column() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Tab);
        press(&mut app, &conn, KeyCode::Right);
        assert_eq!(app.part_idx, 10);
        press(&mut app, &conn, KeyCode::Right);
        press(&mut app, &conn, KeyCode::Right);
        assert_eq!(app.part_idx, 20);
        press(&mut app, &conn, KeyCode::Left);
        assert_eq!(app.part_idx, 10);
    }

    #[test]
    fn help_toggles_and_esc_quits() {
        let (conn, mut app) = setup();
        press(&mut app, &conn, KeyCode::Char('?'));
        assert_eq!(app.view, View::Help);
        press(&mut app, &conn, KeyCode::Esc);
        assert_eq!(app.view, View::Dashboard);
        press(&mut app, &conn, KeyCode::Esc);
        assert!(app.should_quit);
    }
}
