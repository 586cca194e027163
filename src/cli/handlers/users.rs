use anyhow::Result;

use crate::cli::args::{ProfileCommands, ProfileEdit};
use crate::services::{accounts, achievements};
use crate::utils::format::{progress_bar, short_date};

use super::{heading, opt, Session, AMBER, BOLD, DIM, GOLD, GREEN};

pub fn handle_register(s: &Session, username: &str, name: Option<&str>, email: Option<&str>) -> Result<()> {
    let user = accounts::register(&s.conn, username, name.unwrap_or(username), email)?;
    if s.emit(&user)? {
        return Ok(());
    }
    println_colored!(GREEN, "  ✓ Registered {} (#{})", user.username, user.id);
    if s.acting.is_none() {
        println_colored!(DIM, "  Run `khatma setup` or pass --user {} to act as this user", user.username);
    }
    Ok(())
}

pub fn handle_users(s: &Session) -> Result<()> {
    let users = accounts::list_users(&s.conn)?;
    if s.emit(&users)? {
        return Ok(());
    }
    heading(&format!("Users ({})", users.len()));
    for u in &users {
        let marker = if s.acting.as_deref() == Some(u.username.as_str()) { "*" } else { " " };
        println!(
            "  {} {:<20} {:<24} {}",
            marker,
            u.username,
            u.label(),
            opt(u.email.as_deref())
        );
    }
    println!();
    Ok(())
}

pub fn handle_profile(s: &Session, action: Option<&ProfileCommands>) -> Result<()> {
    let user = s.actor()?;
    let (user, profile) = match action {
        Some(ProfileCommands::Edit(edit)) => {
            let update = profile_update(edit);
            let updated = accounts::update_profile(&s.conn, &user, update)?;
            if !s.json {
                println_colored!(GREEN, "  ✓ Profile updated");
            }
            updated
        }
        Some(ProfileCommands::Show) | None => {
            let profile = accounts::profile(&s.conn, &user)?;
            (user, profile)
        }
    };
    if s.emit(&serde_json::json!({ "user": user, "profile": profile }))? {
        return Ok(());
    }

    heading(&format!("{} (@{})", user.label(), user.username));
    println!("  Email:        {}", opt(user.email.as_deref()));
    println!("  Account:      {}", profile.account_type.display_name());
    println!("  Language:     {}", profile.preferred_language);
    println!("  Reading:      {}", profile.reading_preference.display_name());
    println!("  Location:     {}", opt(profile.location.as_deref()));
    if let Some(bio) = &profile.bio {
        println!("  Bio:          {}", bio);
    }
    println!();
    println_colored!(
        BOLD,
        "  Level {}  ·  {} points  ·  {} day streak",
        profile.level,
        profile.total_points,
        profile.consecutive_days
    );
    println_colored!(DIM, "  Member since {}", short_date(&user.created_at));
    println!();
    Ok(())
}

fn profile_update(edit: &ProfileEdit) -> accounts::ProfileUpdate {
    accounts::ProfileUpdate {
        display_name: edit.name.clone(),
        email: edit.email.clone(),
        account_type: edit.account_type,
        preferred_language: edit.language.clone(),
        reading_preference: edit.reading,
        bio: edit.bio.clone(),
        location: edit.location.clone(),
    }
}

pub fn handle_achievements(s: &Session) -> Result<()> {
    let user = s.actor()?;
    let earned = achievements::list(&s.conn, &user)?;
    let available = achievements::available_achievements(&s.conn, &user)?;
    if s.emit(&serde_json::json!({ "earned": earned, "available": available }))? {
        return Ok(());
    }

    heading("Achievements");
    if earned.is_empty() {
        println_colored!(DIM, "  None yet. Complete a khatma to earn your first.");
    }
    for a in &earned {
        println!(
            "  {}★\x1b[0m {:<20} +{:<4} {}",
            GOLD,
            a.achievement_type.display_name(),
            a.points_earned,
            short_date(&a.achieved_at)
        );
    }
    println!();
    println_colored!(GOLD, "  Next milestones");
    for m in &available {
        let color = if m.percent() >= 100 { GREEN } else { AMBER };
        println!(
            "  {:<20} {}{}\x1b[0m {}/{}  (+{})",
            m.title,
            color,
            progress_bar(m.current.min(m.target) as u32, m.target as u32, 10),
            m.current.min(m.target),
            m.target,
            m.points
        );
        println_colored!(DIM, "    {}", m.description);
    }
    println!();
    Ok(())
}
