use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::io::{self, BufRead, Write};

use crate::config::AppConfig;
use crate::db::repository::MetaRepo;
use crate::error::KhatmaError;
use crate::models::User;
use crate::services::accounts;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

pub mod chat;
pub mod groups;
pub mod khatmas;
pub mod memorials;
pub mod notifications;
pub mod overview;
pub mod quran;
pub mod users;

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

/// Meta key holding the username the setup wizard registered.
pub const SETUP_USER_KEY: &str = "setup_user";

/// Everything a command needs: the database, config, who is acting and
/// whether output should be JSON.
pub struct Session {
    pub conn: Connection,
    pub config: AppConfig,
    pub acting: Option<String>,
    pub json: bool,
}

impl Session {
    pub fn new(conn: Connection, config: AppConfig, explicit_user: Option<String>, json: bool) -> Self {
        let acting = config.acting_user(explicit_user.as_deref()).map(str::to_string);
        Self { conn, config, acting, json }
    }

    /// The acting user, or `NoActor` when nobody is configured.
    pub fn actor(&self) -> Result<User> {
        let name = self.acting.as_deref().ok_or(KhatmaError::NoActor)?;
        accounts::require(&self.conn, name)
    }

    /// Print `value` as JSON when `--json` was given; returns whether it did.
    fn emit<T: Serialize>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }
}

// ─── Setup wizard ────────────────────────────────────────────────────────────

pub fn handle_setup(session: &mut Session, reset: bool) -> Result<()> {
    if !reset {
        if let Some(name) = MetaRepo::get(&session.conn, SETUP_USER_KEY)? {
            if session.config.user.current.is_some() {
                println!("Khatma is already set up for '{}'. Use --reset to reconfigure.", name);
                return Ok(());
            }
        }
    }
    crate::cli::setup_tui::run_setup_tui(&session.conn, &mut session.config)?;
    session.acting = session.config.user.current.clone();
    Ok(())
}

// ─── Shared output bits ──────────────────────────────────────────────────────

fn check(done: bool) -> String {
    if done {
        format!("{}✓\x1b[0m", GREEN)
    } else {
        format!("{}○\x1b[0m", DIM)
    }
}

fn heading(title: &str) {
    println!();
    println_colored!(GOLD, "  {}", title);
    println!();
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("—")
}

/// Ask a yes/no question on stdin; anything but y/yes is a no.
fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(label: &str) -> Result<String> {
    print!("  {}: ", label);
    io::stdout().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().unwrap_or(Ok(String::new()))?;
    Ok(line.trim().to_string())
}
