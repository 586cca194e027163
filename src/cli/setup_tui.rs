use anyhow::Result;
use chrono::NaiveTime;
use crossterm::event::{KeyCode, KeyEventKind};
use log::info;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use rusqlite::Connection;
use tui_big_text::{BigText, PixelSize};

use crate::cli::handlers::SETUP_USER_KEY;
use crate::config::AppConfig;
use crate::db::repository::MetaRepo;
use crate::services::{accounts, notifications};
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::utils::hijri::today_hijri_string;

// ─── Wizard steps ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Welcome,
    Username,
    DisplayName,
    Email,
    HijriOffset,
    QuietHours,
    Confirm,
}

const HIJRI_CHOICES: [(i32, &str); 3] = [
    (0, "Same day as astronomical calculation"),
    (-1, "One day after (local moon sighting)"),
    (1, "One day before"),
];

const QUIET_CHOICES: [&str; 2] = ["No quiet hours", "Quiet from 22:00 to 07:00"];

// ─── Wizard state ────────────────────────────────────────────────────────────

struct SetupWizard {
    step: Step,
    input: String,
    error: Option<String>,

    username: String,
    display_name: String,
    email: String,
    hijri_idx: usize,
    quiet_idx: usize,

    should_quit: bool,
    confirmed: bool,
}

impl SetupWizard {
    fn new(conn: &Connection, existing: &AppConfig) -> Self {
        let known = existing
            .user
            .current
            .as_deref()
            .and_then(|name| accounts::find_by_username(conn, name).ok().flatten());
        let hijri_idx = HIJRI_CHOICES
            .iter()
            .position(|(offset, _)| *offset == existing.display.hijri_offset)
            .unwrap_or(0);

        Self {
            step: Step::Welcome,
            input: String::new(),
            error: None,
            username: existing.user.current.clone().unwrap_or_default(),
            display_name: known.as_ref().map(|u| u.display_name.clone()).unwrap_or_default(),
            email: known.and_then(|u| u.email).unwrap_or_default(),
            hijri_idx,
            quiet_idx: 0,
            should_quit: false,
            confirmed: false,
        }
    }

    fn step_number(&self) -> usize {
        match self.step {
            Step::Welcome => 0,
            Step::Username => 1,
            Step::DisplayName => 2,
            Step::Email => 3,
            Step::HijriOffset => 4,
            Step::QuietHours => 5,
            Step::Confirm => 6,
        }
    }

    const TOTAL_STEPS: usize = 6;

    fn load_input(&mut self) {
        self.input = match self.step {
            Step::Username => self.username.clone(),
            Step::DisplayName if self.display_name.is_empty() => self.username.clone(),
            Step::DisplayName => self.display_name.clone(),
            Step::Email => self.email.clone(),
            _ => String::new(),
        };
    }

    fn advance(&mut self) {
        self.error = None;
        self.step = match self.step {
            Step::Welcome => Step::Username,
            Step::Username => Step::DisplayName,
            Step::DisplayName => Step::Email,
            Step::Email => Step::HijriOffset,
            Step::HijriOffset => Step::QuietHours,
            Step::QuietHours => Step::Confirm,
            Step::Confirm => {
                self.confirmed = true;
                Step::Confirm
            }
        };
        self.load_input();
    }

    fn go_back(&mut self) {
        self.error = None;
        self.step = match self.step {
            Step::Welcome => {
                self.should_quit = true;
                Step::Welcome
            }
            Step::Username => Step::Welcome,
            Step::DisplayName => Step::Username,
            Step::Email => Step::DisplayName,
            Step::HijriOffset => Step::Email,
            Step::QuietHours => Step::HijriOffset,
            Step::Confirm => Step::QuietHours,
        };
        self.load_input();
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.step {
            Step::Welcome => {
                if key.code == KeyCode::Esc {
                    self.should_quit = true;
                } else {
                    self.advance();
                }
            }

            Step::Username => self.handle_text_input(key, |s| {
                if s.is_empty() {
                    Err("Choose a username".to_string())
                } else if s.chars().any(char::is_whitespace) {
                    Err("Usernames cannot contain spaces".to_string())
                } else {
                    Ok(())
                }
            }),

            Step::DisplayName => self.handle_text_input(key, |_| Ok(())),

            Step::Email => self.handle_text_input(key, |s| {
                if s.is_empty() || s.contains('@') {
                    Ok(())
                } else {
                    Err("That does not look like an email address".to_string())
                }
            }),

            Step::HijriOffset => {
                if let Some(idx) = self.handle_choice(key, HIJRI_CHOICES.len(), self.hijri_idx) {
                    self.hijri_idx = idx;
                }
            }

            Step::QuietHours => {
                if let Some(idx) = self.handle_choice(key, QUIET_CHOICES.len(), self.quiet_idx) {
                    self.quiet_idx = idx;
                }
            }

            Step::Confirm => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.confirmed = true;
                }
                KeyCode::Esc | KeyCode::Char('n') => self.go_back(),
                _ => {}
            },
        }
    }

    /// Arrow/number selection; returns the new index when it changed.
    fn handle_choice(&mut self, key: crossterm::event::KeyEvent, count: usize, current: usize) -> Option<usize> {
        match key.code {
            KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => current.checked_sub(1),
            KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => {
                (current + 1 < count).then_some(current + 1)
            }
            KeyCode::Char(c) => c
                .to_digit(10)
                .map(|d| d as usize)
                .filter(|d| (1..=count).contains(d))
                .map(|d| d - 1),
            KeyCode::Enter => {
                self.advance();
                None
            }
            KeyCode::Esc => {
                self.go_back();
                None
            }
            _ => None,
        }
    }

    fn handle_text_input<F>(&mut self, key: crossterm::event::KeyEvent, validate: F)
    where
        F: Fn(&str) -> std::result::Result<(), String>,
    {
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Enter => {
                let val = self.input.trim().to_string();
                match validate(&val) {
                    Ok(()) => {
                        self.commit_text_input(val);
                        self.advance();
                    }
                    Err(e) => {
                        self.error = Some(e);
                    }
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.error = None;
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.error = None;
            }
            _ => {}
        }
    }

    fn commit_text_input(&mut self, val: String) {
        match self.step {
            Step::Username => self.username = val,
            Step::DisplayName => self.display_name = val,
            Step::Email => self.email = val,
            _ => {}
        }
    }

    fn hijri_offset(&self) -> i32 {
        HIJRI_CHOICES[self.hijri_idx].0
    }
}

// ─── Saving ──────────────────────────────────────────────────────────────────

/// Register (or update) the local user, store quiet hours and write config.
fn finish(conn: &Connection, config: &mut AppConfig, wizard: &SetupWizard) -> Result<()> {
    let email = Some(wizard.email.as_str()).filter(|e| !e.is_empty());
    let display_name = if wizard.display_name.is_empty() {
        wizard.username.as_str()
    } else {
        wizard.display_name.as_str()
    };

    let user = match accounts::find_by_username(conn, &wizard.username)? {
        Some(existing) => {
            let update = accounts::ProfileUpdate {
                display_name: Some(display_name.to_string()),
                email: Some(wizard.email.clone()),
                ..Default::default()
            };
            accounts::update_profile(conn, &existing, update)?.0
        }
        None => accounts::register(conn, &wizard.username, display_name, email)?,
    };

    let mut settings = notifications::settings(conn, user.id)?;
    settings.enable_quiet_hours = wizard.quiet_idx == 1;
    if settings.enable_quiet_hours {
        settings.quiet_hours_start = NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN);
        settings.quiet_hours_end = NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN);
    }
    notifications::update_settings(conn, &settings)?;

    config.user.current = Some(user.username.clone());
    config.display.hijri_offset = wizard.hijri_offset();
    config.save()?;
    MetaRepo::set(conn, SETUP_USER_KEY, &user.username)?;
    info!("setup complete for {}", user.username);
    Ok(())
}

// ─── Rendering ───────────────────────────────────────────────────────────────

fn draw(frame: &mut Frame, wizard: &SetupWizard) {
    let area = frame.area();
    frame.render_widget(Block::default().style(theme::base()), area);

    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(26), Constraint::Min(0)])
        .split(area);
    let hchunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(64), Constraint::Min(0)])
        .split(vchunks[1]);

    let box_area = hchunks[1];
    frame.render_widget(Clear, box_area);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold())
        .style(theme::surface())
        .title(Span::styled(
            "  خَتْمَة  khatma  ·  Setup  ",
            theme::gold().add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    frame.render_widget(outer_block, box_area);

    let inner = Rect {
        x: box_area.x + 2,
        y: box_area.y + 1,
        width: box_area.width.saturating_sub(4),
        height: box_area.height.saturating_sub(2),
    };

    match wizard.step {
        Step::Welcome => draw_welcome(frame, inner),
        Step::HijriOffset => {
            let labels: Vec<&str> = HIJRI_CHOICES.iter().map(|(_, label)| *label).collect();
            draw_choice(
                frame,
                inner,
                "Hijri Date",
                "When does your region start each Islamic month?",
                &labels,
                wizard.hijri_idx,
            );
        }
        Step::QuietHours => draw_choice(
            frame,
            inner,
            "Quiet Hours",
            "Hold email and push notifications overnight?",
            &QUIET_CHOICES,
            wizard.quiet_idx,
        ),
        Step::Confirm => draw_confirm(frame, inner, wizard),
        _ => draw_text_step(frame, inner, wizard),
    }

    draw_progress(frame, inner, wizard.step_number(), SetupWizard::TOTAL_STEPS);
}

fn draw_progress(frame: &mut Frame, area: Rect, current: usize, total: usize) {
    let mut spans = vec![Span::styled("  ", theme::dim())];
    for i in 1..=total {
        if i < current {
            spans.push(Span::styled("● ", theme::green()));
        } else if i == current {
            spans.push(Span::styled("◉ ", theme::gold()));
        } else {
            spans.push(Span::styled("○ ", theme::dim()));
        }
    }
    let progress_area = Rect { height: 1, ..area };
    frame.render_widget(Paragraph::new(Line::from(spans)), progress_area);
}

fn draw_welcome(frame: &mut Frame, area: Rect) {
    let banner = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(theme::gold())
        .lines(vec![Line::from("Khatma")])
        .alignment(Alignment::Center)
        .build();
    let banner_area = Rect {
        x: area.x,
        y: area.y + 2,
        width: area.width,
        height: 4,
    };
    frame.render_widget(banner, banner_area);

    let lines = vec![
        Line::from(Span::styled(
            "بِسۡمِ ٱللَّهِ ٱلرَّحۡمَٰنِ ٱلرَّحِيمِ",
            theme::gold().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Read the whole Qur'an together, one part each.",
            theme::dim(),
        )),
        Line::from(""),
        Line::from(Span::styled("This wizard will set up:", theme::dim())),
        Line::from(vec![
            Span::styled("  ●  ", theme::gold()),
            Span::styled("Your local reader account", theme::dim()),
        ]),
        Line::from(vec![
            Span::styled("  ●  ", theme::gold()),
            Span::styled("Hijri date preference", theme::dim()),
        ]),
        Line::from(vec![
            Span::styled("  ●  ", theme::gold()),
            Span::styled("Notification quiet hours", theme::dim()),
        ]),
        Line::from(""),
        Line::from(Span::styled(today_hijri_string(0), theme::dim())),
        Line::from(""),
        Line::from(Span::styled(
            "Press  Enter  to begin  ·  Esc  to cancel",
            theme::dim(),
        )),
    ];

    let content_area = Rect {
        x: area.x,
        y: area.y + 7,
        width: area.width,
        height: area.height.saturating_sub(7),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), content_area);
}

fn draw_text_step(frame: &mut Frame, area: Rect, wizard: &SetupWizard) {
    let (title, subtitle, hint) = match wizard.step {
        Step::Username => (
            "Username",
            "How others will find you in khatmas and groups",
            "Letters and digits, no spaces",
        ),
        Step::DisplayName => (
            "Display Name",
            "Shown next to your readings and messages",
            "e.g.  Umm Yusuf",
        ),
        Step::Email => (
            "Email",
            "Where email notifications are addressed (optional)",
            "Leave empty to skip",
        ),
        _ => ("", "", ""),
    };

    let cursor = if wizard.input.len() < 40 { "█" } else { "" };
    let mut lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(title, theme::gold().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(subtitle, theme::dim())),
        Line::from(""),
        Line::from(""),
    ];

    let input_display = format!("  {}{}  ", wizard.input, cursor);
    let input_width = area.width.saturating_sub(8) as usize;
    let padded = format!("{:<width$}", input_display, width = input_width);
    let input_style = if wizard.error.is_some() { theme::red() } else { theme::amber() };
    lines.push(Line::from(Span::styled(padded, input_style.add_modifier(Modifier::BOLD))));
    lines.push(Line::from(""));

    match &wizard.error {
        Some(err) => lines.push(Line::from(Span::styled(format!("  ✗  {}", err), theme::red()))),
        None => lines.push(Line::from(Span::styled(hint, theme::dim()))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(""));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Enter  confirm   ·   Esc  back", theme::dim())));

    let content_area = Rect {
        x: area.x,
        y: area.y + 2,
        width: area.width,
        height: area.height.saturating_sub(2),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), content_area);
}

fn draw_choice(frame: &mut Frame, area: Rect, title: &str, subtitle: &str, options: &[&str], selected: usize) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, theme::gold().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(subtitle, theme::dim())),
        Line::from(""),
        Line::from(""),
    ];

    for (i, opt) in options.iter().enumerate() {
        let (marker, style) = if i == selected {
            ("  ◉  ", theme::gold().add_modifier(Modifier::BOLD))
        } else {
            ("  ○  ", theme::dim())
        };
        lines.push(Line::from(vec![
            Span::styled(marker, style),
            Span::styled(*opt, style),
        ]));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑↓  or  1 2 3  choose   ·   Enter  confirm   ·   Esc  back",
        theme::dim(),
    )));

    let content_area = Rect {
        x: area.x,
        y: area.y + 2,
        width: area.width,
        height: area.height.saturating_sub(2),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), content_area);
}

fn draw_confirm(frame: &mut Frame, area: Rect, wizard: &SetupWizard) {
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, theme::dim()),
            Span::styled(value, theme::bold()),
        ])
    };
    let email = if wizard.email.is_empty() { "—".to_string() } else { wizard.email.clone() };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Confirm Settings", theme::gold().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Review your setup:", theme::dim())),
        Line::from(""),
        row("  Username     ", wizard.username.clone()),
        row("  Name         ", wizard.display_name.clone()),
        row("  Email        ", email),
        row("  Hijri date   ", HIJRI_CHOICES[wizard.hijri_idx].1.to_string()),
        row("  Quiet hours  ", QUIET_CHOICES[wizard.quiet_idx].to_string()),
        Line::from(""),
    ];
    if let Some(err) = &wizard.error {
        lines.push(Line::from(Span::styled(format!("  ✗  {}", err), theme::red())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Enter  save   ·   Esc  go back", theme::dim())));

    let content_area = Rect {
        x: area.x,
        y: area.y + 2,
        width: area.width,
        height: area.height.saturating_sub(2),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), content_area);
}

// ─── Public entry point ──────────────────────────────────────────────────────

pub fn run_setup_tui(conn: &Connection, config: &mut AppConfig) -> Result<()> {
    let mut wizard = SetupWizard::new(conn, config);
    let mut terminal = ratatui::init();
    let events = EventHandler::new(100);

    let outcome = loop {
        if let Err(e) = terminal.draw(|frame| draw(frame, &wizard)) {
            break Err(e.into());
        }

        match events.next()? {
            Event::Key(key) => {
                wizard.handle_key(key);
                if wizard.should_quit {
                    break Ok(());
                }
                if wizard.confirmed {
                    match finish(conn, config, &wizard) {
                        Ok(()) => break Ok(()),
                        Err(e) => {
                            wizard.error = Some(e.to_string());
                            wizard.confirmed = false;
                        }
                    }
                }
            }
            Event::Tick | Event::Resize => {}
        }
    };

    ratatui::restore();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn press(wizard: &mut SetupWizard, code: KeyCode) {
        wizard.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(wizard: &mut SetupWizard, text: &str) {
        for c in text.chars() {
            press(wizard, KeyCode::Char(c));
        }
    }

    #[test]
    fn walks_every_step_to_confirm() {
        let conn = crate::db::open_in_memory().unwrap();
        let mut w = SetupWizard::new(&conn, &AppConfig::default());
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.step, Step::Username);

        type_text(&mut w, "amina");
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.step, Step::DisplayName);
        assert_eq!(w.input, "amina");
        press(&mut w, KeyCode::Enter);

        type_text(&mut w, "not-an-email");
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.step, Step::Email);
        assert!(w.error.is_some());

        w.input.clear();
        press(&mut w, KeyCode::Enter);
        press(&mut w, KeyCode::Char('2'));
        press(&mut w, KeyCode::Enter);
        press(&mut w, KeyCode::Down);
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.step, Step::Confirm);
        assert_eq!(w.hijri_offset(), -1);
        assert_eq!(w.quiet_idx, 1);

        press(&mut w, KeyCode::Enter);
        assert!(w.confirmed);
    }

    #[test]
    fn username_rejects_spaces() {
        let conn = crate::db::open_in_memory().unwrap();
        let mut w = SetupWizard::new(&conn, &AppConfig::default());
        press(&mut w, KeyCode::Enter);
        type_text(&mut w, "a b");
        press(&mut w, KeyCode::Enter);
        assert_eq!(w.step, Step::Username);
        assert!(w.error.is_some());
    }

    #[test]
    fn escape_on_welcome_quits() {
        let conn = crate::db::open_in_memory().unwrap();
        let mut w = SetupWizard::new(&conn, &AppConfig::default());
        press(&mut w, KeyCode::Esc);
        assert!(w.should_quit);
    }
}
