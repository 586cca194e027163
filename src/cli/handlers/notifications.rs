use anyhow::Result;

use crate::cli::args::NotificationCommands;
use crate::error::KhatmaError;
use crate::models::DeliveryStatus;
use crate::services::notifications;
use crate::utils::format::short_date;
use crate::utils::time::parse_time;

use super::{check, heading, Session, AMBER, BOLD, DIM, GREEN, RED};

pub fn handle_notifications(s: &Session, action: &NotificationCommands) -> Result<()> {
    let conn = &s.conn;
    let user = s.actor()?;
    match action {
        NotificationCommands::List { unread, limit } => {
            let feed = notifications::list(conn, &user, *unread, *limit)?;
            if s.emit(&feed)? {
                return Ok(());
            }
            let count = notifications::unread_count(conn, &user)?;
            heading(&format!("Notifications ({} unread)", count));
            if feed.is_empty() {
                println_colored!(DIM, "  All caught up");
            }
            for n in &feed {
                let color = if n.is_read { DIM } else { BOLD };
                println_colored!(
                    color,
                    "  #{:<4} {}  {:<22} {}",
                    n.id,
                    short_date(&n.created_at),
                    n.notification_type.display_name(),
                    n.message
                );
            }
            println!();
        }
        NotificationCommands::Read { id } => {
            notifications::mark_read(conn, &user, *id)?;
            println_colored!(GREEN, "  ✓ Marked #{} as read", id);
        }
        NotificationCommands::ReadAll => {
            let n = notifications::mark_all_read(conn, &user)?;
            println_colored!(GREEN, "  ✓ Marked {} notifications as read", n);
        }
        NotificationCommands::Delete { id } => {
            notifications::delete(conn, &user, *id)?;
            println_colored!(RED, "  ✗ Deleted #{}", id);
        }
        NotificationCommands::Settings => {
            let settings = notifications::settings(conn, user.id)?;
            if s.emit(&settings)? {
                return Ok(());
            }
            heading("Notification settings");
            for (name, on) in settings.flags() {
                println!("  {} {}", check(on), name);
            }
            println!();
            println_colored!(
                DIM,
                "  Quiet hours {} → {}",
                settings.quiet_hours_start.format("%H:%M"),
                settings.quiet_hours_end.format("%H:%M")
            );
            println!();
        }
        NotificationCommands::Set { flag, value } => {
            let mut settings = notifications::settings(conn, user.id)?;
            settings.set_flag(flag, value.is_on())?;
            notifications::update_settings(conn, &settings)?;
            println_colored!(GREEN, "  ✓ {} turned {}", flag, if value.is_on() { "on" } else { "off" });
        }
        NotificationCommands::Quiet { start, end, on, off } => {
            let mut settings = notifications::settings(conn, user.id)?;
            if let Some(t) = start {
                settings.quiet_hours_start = parse_time(t)?;
            }
            if let Some(t) = end {
                settings.quiet_hours_end = parse_time(t)?;
            }
            if *on || *off {
                settings.enable_quiet_hours = *on;
            } else if start.is_none() && end.is_none() {
                return Err(KhatmaError::invalid("give --start/--end or --on/--off"));
            }
            notifications::update_settings(conn, &settings)?;
            let state = if settings.enable_quiet_hours { "on" } else { "off" };
            println_colored!(
                GREEN,
                "  ✓ Quiet hours {} → {} ({})",
                settings.quiet_hours_start.format("%H:%M"),
                settings.quiet_hours_end.format("%H:%M"),
                state
            );
        }
        NotificationCommands::Outbox { limit } => {
            let sent = notifications::deliveries(conn, &user, *limit)?;
            if s.emit(&sent)? {
                return Ok(());
            }
            heading("Outbox");
            for d in &sent {
                let color = match d.status {
                    DeliveryStatus::Sent => GREEN,
                    DeliveryStatus::Skipped => AMBER,
                    DeliveryStatus::Failed => RED,
                };
                println!(
                    "  {}  {:<6} {}{:<8}\x1b[0m {:<28} {}",
                    short_date(&d.created_at),
                    d.channel.display_name(),
                    color,
                    d.status.display_name(),
                    d.recipient,
                    d.subject
                );
            }
            println!();
        }
    }
    Ok(())
}
