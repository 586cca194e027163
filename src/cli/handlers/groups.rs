use anyhow::Result;

use crate::cli::args::{EventCreate, GroupCommands};
use crate::models::{GroupEvent, JoinStatus, NewEvent, NewGroup, NewKhatma, ReadingGroup};
use crate::services::groups::JoinOutcome;
use crate::services::{accounts, groups, khatmas};
use crate::utils::format::{short_date, truncate_width};
use crate::utils::time::now;

use super::{heading, opt, Session, AMBER, BOLD, DIM, GOLD, GREEN, RED};

pub fn handle_group(s: &Session, action: &GroupCommands) -> Result<()> {
    let conn = &s.conn;
    match action {
        GroupCommands::Create {
            name,
            description,
            private,
            closed,
            max,
            no_chat,
            no_khatmas,
        } => {
            let actor = s.actor()?;
            let mut new = NewGroup::new(name.clone());
            new.description = description.clone();
            new.is_public = !*private;
            new.allow_join_requests = !*closed;
            new.max_members = *max;
            new.enable_chat = !*no_chat;
            new.enable_khatma_creation = !*no_khatmas;
            let g = groups::create(conn, &actor, new)?;
            if s.emit(&g)? {
                return Ok(());
            }
            println_colored!(GREEN, "  ✓ Created group '{}' (#{})", g.name, g.id);
        }
        GroupCommands::List { mine } => {
            let list = if *mine {
                groups::list_for_user(conn, &s.actor()?)?
            } else {
                groups::list_public(conn)?
            };
            if s.emit(&list)? {
                return Ok(());
            }
            heading(&format!("Groups ({})", list.len()));
            for g in &list {
                let members = groups::members(conn, g)?.len();
                let access = if g.is_public { "public" } else { "private" };
                println!(
                    "  #{:<4} {:<32} {:<8} {} members",
                    g.id,
                    truncate_width(&g.name, 32),
                    access,
                    members
                );
            }
            println!();
        }
        GroupCommands::Show { group } => {
            let g = groups::resolve(conn, group)?;
            show(s, &g)?;
        }
        GroupCommands::Members { group } => {
            let g = groups::resolve(conn, group)?;
            let members = groups::members(conn, &g)?;
            if s.emit(&members)? {
                return Ok(());
            }
            heading(&format!("Members of {}", g.name));
            for m in &members {
                let color = if m.role.can_moderate() { GOLD } else { "" };
                println!(
                    "  {:<20} {}{:<10}\x1b[0m joined {}",
                    m.username,
                    color,
                    m.role.display_name(),
                    short_date(&m.joined_at)
                );
            }
            println!();
        }
        GroupCommands::Join { group, message } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            match groups::join(conn, &actor, &g, message.as_deref())? {
                JoinOutcome::Joined => println_colored!(GREEN, "  ✓ Joined '{}'", g.name),
                JoinOutcome::Requested => {
                    println_colored!(AMBER, "  Request sent; a moderator of '{}' will review it", g.name)
                }
            }
        }
        GroupCommands::Requests { group } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            let pending = groups::pending_requests(conn, &actor, &g)?;
            if s.emit(&pending)? {
                return Ok(());
            }
            heading(&format!("Join requests for {}", g.name));
            if pending.is_empty() {
                println_colored!(DIM, "  No pending requests");
            }
            for r in &pending {
                println!("  #{:<4} {:<20} {}", r.id, r.username, short_date(&r.created_at));
                if let Some(msg) = &r.message {
                    println_colored!(DIM, "        \"{}\"", msg);
                }
            }
            println!();
        }
        GroupCommands::Approve { request } | GroupCommands::Reject { request } => {
            let approve = matches!(action, GroupCommands::Approve { .. });
            let actor = s.actor()?;
            let r = groups::process_request(conn, &actor, *request, approve)?;
            match r.status {
                JoinStatus::Approved => println_colored!(GREEN, "  ✓ {} is now a member", r.username),
                _ => println_colored!(AMBER, "  Request from {} rejected", r.username),
            }
        }
        GroupCommands::Leave { group } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            groups::leave(conn, &actor, &g)?;
            println_colored!(AMBER, "  Left '{}'", g.name);
        }
        GroupCommands::Role { group, username, role } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            let target = accounts::require(conn, username)?;
            groups::change_role(conn, &actor, &g, &target, *role)?;
            println_colored!(GREEN, "  ✓ {} is now {}", target.username, role.display_name());
        }
        GroupCommands::Remove { group, username } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            let target = accounts::require(conn, username)?;
            groups::remove_member(conn, &actor, &g, &target)?;
            println_colored!(RED, "  ✗ Removed {} from '{}'", target.username, g.name);
        }
        GroupCommands::Announce { group, title, content, pin } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            let id = groups::announce(conn, &actor, &g, title, content, *pin)?;
            println_colored!(GREEN, "  ✓ Announcement #{} posted to '{}'", id, g.name);
        }
        GroupCommands::Event(args) => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, &args.group)?;
            let new = new_event(s, args)?;
            let e = groups::create_event(conn, &actor, &g, new)?;
            if s.emit(&e)? {
                return Ok(());
            }
            println_colored!(GREEN, "  ✓ Scheduled '{}' (#{}) at {}", e.title, e.id, e.start_time);
        }
        GroupCommands::Events { group } => {
            let g = groups::resolve(conn, group)?;
            let events = groups::upcoming_events(conn, &g, now())?;
            if s.emit(&events)? {
                return Ok(());
            }
            heading(&format!("Upcoming in {}", g.name));
            if events.is_empty() {
                println_colored!(DIM, "  Nothing scheduled");
            }
            for e in &events {
                print_event(e);
            }
            println!();
        }
        GroupCommands::Attend { event } => {
            let actor = s.actor()?;
            if groups::toggle_attendance(conn, &actor, *event)? {
                println_colored!(GREEN, "  ✓ You are attending event #{}", event);
            } else {
                println_colored!(DIM, "  No longer attending event #{}", event);
            }
        }
        GroupCommands::Khatma {
            group,
            title,
            description,
            frequency,
            auto_distribute,
            target,
        } => {
            let actor = s.actor()?;
            let g = groups::resolve(conn, group)?;
            let mut new = NewKhatma::new(title.clone());
            new.description = description.clone();
            new.frequency = *frequency;
            new.auto_distribute_parts = *auto_distribute;
            new.target_completion_date = target.clone();
            let k = groups::create_group_khatma(conn, &actor, &g, new)?;
            if s.emit(&k)? {
                return Ok(());
            }
            let readers = khatmas::participants(conn, &k)?.len();
            println_colored!(
                GREEN,
                "  ✓ Started '{}' (#{}) for {} members of '{}'",
                k.title,
                k.id,
                readers,
                g.name
            );
        }
    }
    Ok(())
}

fn new_event(s: &Session, args: &EventCreate) -> Result<NewEvent> {
    let related_khatma_id = match &args.khatma {
        Some(key) => Some(khatmas::resolve(&s.conn, key)?.id),
        None => None,
    };
    Ok(NewEvent {
        title: args.title.clone(),
        description: args.description.clone(),
        event_type: args.event_type,
        start_time: args.start.clone(),
        end_time: args.end.clone(),
        location: args.location.clone(),
        is_online: args.link.is_some(),
        meeting_link: args.link.clone(),
        related_khatma_id,
    })
}

fn print_event(e: &GroupEvent) {
    println_colored!(BOLD, "  #{:<4} {}", e.id, e.title);
    let place = if e.is_online {
        opt(e.meeting_link.as_deref()).to_string()
    } else {
        opt(e.location.as_deref()).to_string()
    };
    println_colored!(
        DIM,
        "        {} → {}  ·  {}  ·  {} attending",
        e.start_time,
        e.end_time,
        place,
        e.attendees
    );
}

fn show(s: &Session, g: &ReadingGroup) -> Result<()> {
    let d = groups::dashboard(&s.conn, g, now())?;
    if s.emit(&d)? {
        return Ok(());
    }
    heading(&format!("{}  (#{})", g.name, g.id));
    if let Some(desc) = &g.description {
        println!("  {}", desc);
        println!();
    }
    println!(
        "  {} members  ·  {} active khatmas  ·  {} completed  ·  {} events",
        d.member_count, d.active_khatmas, d.completed_khatmas, d.event_count
    );

    let campaigns = groups::khatmas_of(&s.conn, g)?;
    if !campaigns.is_empty() {
        println!();
        println_colored!(GOLD, "  Khatmas");
        for k in &campaigns {
            let progress = khatmas::progress(&s.conn, k.id)?;
            let mark = if k.is_completed { "✓" } else { " " };
            println!("  {} #{:<4} {:<30} {:>2}/{}", mark, k.id, truncate_width(&k.title, 30), progress.completed, progress.total);
        }
    }

    if !d.announcements.is_empty() {
        println!();
        println_colored!(GOLD, "  Announcements");
        for a in &d.announcements {
            let pin = if a.is_pinned { "📌 " } else { "" };
            println!("  {}{}  {}", pin, a.title, short_date(&a.created_at));
            println_colored!(DIM, "    {}", truncate_width(&a.content, 70));
        }
    }
    if !d.upcoming_events.is_empty() {
        println!();
        println_colored!(GOLD, "  Upcoming events");
        for e in &d.upcoming_events {
            print_event(e);
        }
    }
    if !d.recent_chat.is_empty() {
        println!();
        println_colored!(GOLD, "  Recent chat");
        for m in &d.recent_chat {
            println!("  {:<14} {}", m.username, truncate_width(&m.message, 60));
        }
    }
    println!();
    Ok(())
}
