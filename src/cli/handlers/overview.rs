use anyhow::Result;
use chrono::NaiveDate;

use crate::cli::args::RunCommands;
use crate::services::{dashboard, memorials, reminders};
use crate::utils::format::{format_percent, progress_bar, short_date, truncate_width};
use crate::utils::hijri::today_hijri_string;
use crate::utils::time::{parse_date, today};

use super::{heading, Session, AMBER, BOLD, DIM, GOLD, GREEN};

pub fn handle_dashboard(s: &Session) -> Result<()> {
    let user = s.actor()?;
    let d = dashboard::dashboard(&s.conn, &user)?;
    if s.emit(&d)? {
        return Ok(());
    }

    println!();
    println_colored!(GOLD, "  السلام عليكم, {}", user.label());
    println_colored!(DIM, "  {}", today_hijri_string(s.config.display.hijri_offset));
    println!();
    println_colored!(
        BOLD,
        "  Level {}  ·  {} points  ·  {} day streak  ·  {} unread",
        d.profile.level,
        d.profile.total_points,
        d.profile.consecutive_days,
        d.unread
    );
    println!(
        "  Assigned parts  {}{}\x1b[0m {}/{}  {}",
        if d.assigned.is_done() { GREEN } else { AMBER },
        progress_bar(d.assigned.completed, d.assigned.total, 20),
        d.assigned.completed,
        d.assigned.total,
        format_percent(d.assigned.percent())
    );

    heading(&format!("Khatmas ({} created, {} joined)", d.created.len(), d.joined.len()));
    for k in d.created.iter().chain(d.joined.iter()) {
        let mark = if k.is_completed { format!("{}✓\x1b[0m", GREEN) } else { " ".to_string() };
        println!("  {} #{:<4} {}", mark, k.id, truncate_width(&k.title, 50));
    }
    if !d.groups.is_empty() {
        heading("Groups");
        for g in &d.groups {
            println!("    #{:<4} {}", g.id, g.name);
        }
    }
    if !d.activity.is_empty() {
        heading("Recent activity");
        for a in &d.activity {
            println!("  {}  {}", short_date(&a.at), a.describe());
        }
    }
    if !d.notifications.is_empty() {
        heading("Latest notifications");
        for n in &d.notifications {
            let color = if n.is_read { DIM } else { BOLD };
            println_colored!(color, "  {}  {}", short_date(&n.created_at), n.message);
        }
    }
    println!();
    Ok(())
}

pub fn handle_community(s: &Session) -> Result<()> {
    let c = dashboard::community(&s.conn)?;
    if s.emit(&c)? {
        return Ok(());
    }
    heading("Community");
    println_colored!(
        BOLD,
        "  {} readers  ·  {} khatmas  ·  {} parts read",
        c.total_users,
        c.total_khatmas,
        c.completed_parts
    );
    if !c.leaderboard.is_empty() {
        heading("Most parts read");
        for (i, entry) in c.leaderboard.iter().enumerate() {
            println!("  {:>2}. {:<24} {}", i + 1, entry.display_name, entry.completed_parts);
        }
    }
    if !c.public_khatmas.is_empty() {
        heading("Open public khatmas");
        for k in &c.public_khatmas {
            println!("  #{:<4} {}", k.id, truncate_width(&k.title, 60));
        }
    }
    println!();
    Ok(())
}

pub fn handle_search(s: &Session, query: &str) -> Result<()> {
    let user = s.actor()?;
    let r = dashboard::search(&s.conn, &user, query)?;
    if s.emit(&r)? {
        return Ok(());
    }
    if r.is_empty() {
        println_colored!(DIM, "  Nothing matches \"{}\"", query);
        return Ok(());
    }
    let section = |title: &str, rows: Vec<String>| {
        if rows.is_empty() {
            return;
        }
        println!();
        println_colored!(GOLD, "  {}", title);
        for row in rows {
            println!("    {}", row);
        }
    };
    section("Users", r.users.iter().map(|u| format!("{} ({})", u.username, u.label())).collect());
    section("Khatmas", r.khatmas.iter().map(|k| format!("#{} {}", k.id, k.title)).collect());
    section("Groups", r.groups.iter().map(|g| format!("#{} {}", g.id, g.name)).collect());
    section("Memorials", r.deceased.iter().map(|d| d.name.clone()).collect());
    section(
        "Surahs",
        r.surahs
            .iter()
            .map(|x| format!("{}. {} · {}", x.number, x.name_english, x.name_arabic))
            .collect(),
    );
    println!();
    Ok(())
}

fn job_date(date: Option<&str>) -> Result<NaiveDate> {
    date.map(parse_date).transpose().map(|d| d.unwrap_or_else(today))
}

pub fn handle_run(s: &Session, job: &RunCommands) -> Result<()> {
    match job {
        RunCommands::Reminders { date } => {
            let report = reminders::run_reminders(&s.conn, job_date(date.as_deref())?)?;
            if s.emit(&report)? {
                return Ok(());
            }
            println_colored!(
                GREEN,
                "  ✓ {} reminders sent for {} khatmas",
                report.notified,
                report.campaigns
            );
        }
        RunCommands::Memorials { date } => {
            let created = memorials::run_memorials(&s.conn, job_date(date.as_deref())?)?;
            if s.emit(&created)? {
                return Ok(());
            }
            if created.is_empty() {
                println_colored!(DIM, "  No memorials due");
            }
            for k in &created {
                println_colored!(GREEN, "  ✓ Started '{}' (#{})", k.title, k.id);
            }
        }
    }
    Ok(())
}
