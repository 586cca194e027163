use anyhow::Result;

use crate::cli::args::{KhatmaCommands, KhatmaCreate};
use crate::models::{Khatma, KhatmaType, NewKhatma, Progress, ReadingStatus, Visibility};
use crate::services::{accounts, khatmas, memorials};
use crate::utils::format::{format_part_range, format_percent, progress_bar, short_date, truncate_width};

use super::{check, confirm, heading, opt, Session, AMBER, BOLD, DIM, GOLD, GREEN, RED};

pub fn handle_khatma(s: &Session, action: &KhatmaCommands) -> Result<()> {
    let conn = &s.conn;
    match action {
        KhatmaCommands::Create(args) => {
            let actor = s.actor()?;
            let new = new_khatma(s, args)?;
            let k = khatmas::create(conn, &actor, new)?;
            if s.emit(&k)? {
                return Ok(());
            }
            println_colored!(GREEN, "  ✓ Created khatma '{}' (#{})", k.title, k.id);
            if !k.is_public() {
                println_colored!(DIM, "  Share token: {}", k.sharing_token);
            }
        }
        KhatmaCommands::List { all, mine } => {
            let list = if *mine || (!*all && s.acting.is_some()) {
                khatmas::list_for_user(conn, &s.actor()?)?
            } else {
                khatmas::list_public(conn, *all)?
            };
            if s.emit(&list)? {
                return Ok(());
            }
            heading(&format!("Khatmas ({})", list.len()));
            if list.is_empty() {
                println_colored!(DIM, "  Nothing here yet. Start one with `khatma khatma create <title>`");
            }
            for k in &list {
                print_row(s, k)?;
            }
            println!();
        }
        KhatmaCommands::Show { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::view(conn, &actor, khatma)?;
            show(s, &k)?;
        }
        KhatmaCommands::Parts { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::view(conn, &actor, khatma)?;
            let parts = khatmas::parts(conn, &k)?;
            if s.emit(&parts)? {
                return Ok(());
            }
            let readings = khatmas::readings(conn, &k)?;
            heading(&format!("Parts of {}", k.title));
            for p in &parts {
                let who = p.assignee.as_deref().unwrap_or("unassigned");
                let color = if p.assigned_to == Some(actor.id) { BOLD } else { "" };
                let record = readings
                    .iter()
                    .find(|r| r.part_number == p.part_number && r.status == ReadingStatus::Completed);
                println!(
                    "  {} {:>2}  {}{:<20}\x1b[0m {:<8} {}",
                    check(p.is_completed),
                    p.part_number,
                    color,
                    who,
                    p.completed_at.as_deref().map(short_date).unwrap_or(""),
                    record.map(|r| r.recitation_method.display_name()).unwrap_or("")
                );
                if let Some(r) = record {
                    if let Some(notes) = &r.notes {
                        println_colored!(DIM, "        {}", truncate_width(notes, 60));
                    }
                    if let Some(dua) = &r.dua {
                        println_colored!(DIM, "        dua: {}", truncate_width(dua, 60));
                    }
                }
            }
            println!();
        }
        KhatmaCommands::Share { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::view(conn, &actor, khatma)?;
            if s.emit(&serde_json::json!({ "id": k.id, "token": k.sharing_token }))? {
                return Ok(());
            }
            println!("  {}", k.sharing_token);
            println_colored!(DIM, "  Others can join with `khatma khatma join-link {}`", k.sharing_token);
        }
        KhatmaCommands::Join { khatma, token } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            khatmas::join(conn, &actor, &k, token.as_deref())?;
            println_colored!(GREEN, "  ✓ Joined '{}'", k.title);
        }
        KhatmaCommands::JoinLink { token } => {
            let actor = s.actor()?;
            let k = khatmas::join_by_token(conn, &actor, token)?;
            println_colored!(GREEN, "  ✓ Joined '{}'", k.title);
        }
        KhatmaCommands::Leave { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            khatmas::leave(conn, &actor, &k)?;
            println_colored!(AMBER, "  Left '{}'; your unread parts are open again", k.title);
        }
        KhatmaCommands::Remove { khatma, username } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            let target = accounts::require(conn, username)?;
            khatmas::remove_participant(conn, &actor, &k, &target)?;
            println_colored!(AMBER, "  Removed {} from '{}'", target.username, k.title);
        }
        KhatmaCommands::Assign { khatma, part, username } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            let target = accounts::require(conn, username)?;
            khatmas::assign_part(conn, &actor, &k, *part, &target)?;
            println_colored!(GREEN, "  ✓ Part {} assigned to {}", part, target.username);
        }
        KhatmaCommands::Distribute { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            let shares = khatmas::distribute(conn, &actor, &k)?;
            if s.emit(&shares)? {
                return Ok(());
            }
            heading(&format!("Distribution of {}", k.title));
            for share in &shares {
                let name = accounts::require_id(conn, share.member)?.username;
                println!(
                    "  {:<20} part {:<8} ({})",
                    name,
                    format_part_range(share.first, share.last),
                    share.count()
                );
            }
            println!();
        }
        KhatmaCommands::Done { khatma, part, notes, dua, method } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            let outcome = khatmas::complete_part(conn, &actor, &k, *part, notes.as_deref(), dua.as_deref())?;
            if let Some(method) = method {
                khatmas::set_reading_method(conn, &actor, &k, *part, *method)?;
            }
            if s.emit(&outcome.progress)? {
                return Ok(());
            }
            println_colored!(GREEN, "  ✓ Part {} of '{}' marked as read", part, k.title);
            print_progress(&outcome.progress);
            if outcome.finished {
                println_colored!(GOLD, "  ✦ The khatma is complete. May Allah accept it.");
            }
        }
        KhatmaCommands::Undo { khatma, part } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            let progress = khatmas::uncomplete_part(conn, &actor, &k, *part)?;
            println_colored!(AMBER, "  Part {} reopened", part);
            print_progress(&progress);
        }
        KhatmaCommands::Finish { khatma } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            khatmas::complete(conn, &actor, &k)?;
            println_colored!(GOLD, "  ✦ '{}' is complete. May Allah accept it.", k.title);
        }
        KhatmaCommands::Delete { khatma, yes } => {
            let actor = s.actor()?;
            let k = khatmas::resolve(conn, khatma)?;
            if !*yes && !confirm(&format!("Delete '{}' and all its progress?", k.title))? {
                println_colored!(DIM, "  Cancelled");
                return Ok(());
            }
            khatmas::delete(conn, &actor, &k)?;
            println_colored!(RED, "  ✗ Deleted '{}'", k.title);
        }
    }
    Ok(())
}

fn new_khatma(s: &Session, args: &KhatmaCreate) -> Result<NewKhatma> {
    let mut new = NewKhatma::new(args.title.clone());
    new.description = args.description.clone();
    new.khatma_type = args.khatma_type;
    new.frequency = args.frequency;
    new.visibility = args.visibility;
    new.memorial_prayer = args.prayer.clone();
    new.allow_comments = !args.no_comments;
    new.max_participants = args.max;
    new.send_reminders = !args.no_reminders;
    new.reminder_frequency = args.reminders;
    new.auto_distribute_parts = args.auto_distribute;
    new.start_date = args.start.clone();
    new.end_date = args.end.clone();
    new.target_completion_date = args.target.clone();
    if let Some(key) = &args.deceased {
        let record = memorials::get(&s.conn, &s.actor()?, key)?;
        new.deceased_id = Some(record.id);
        if args.khatma_type == KhatmaType::Regular {
            new.khatma_type = KhatmaType::Memorial;
        }
    }
    Ok(new)
}

fn print_progress(p: &Progress) {
    let color = if p.is_done() { GREEN } else { AMBER };
    println!(
        "  {}{}\x1b[0m {}/{} parts  {}",
        color,
        progress_bar(p.completed, p.total, 20),
        p.completed,
        p.total,
        format_percent(p.percent())
    );
}

fn print_row(s: &Session, k: &Khatma) -> Result<()> {
    let p = khatmas::progress(&s.conn, k.id)?;
    let state = if k.is_completed {
        format!("{}done\x1b[0m", GREEN)
    } else {
        format!("{:>3}/{}", p.completed, p.total)
    };
    println!(
        "  #{:<4} {:<36} {:<10} {}  {}",
        k.id,
        truncate_width(&k.title, 36),
        k.khatma_type.display_name(),
        progress_bar(p.completed, p.total, 10),
        state
    );
    Ok(())
}

fn show(s: &Session, k: &Khatma) -> Result<()> {
    let conn = &s.conn;
    let progress = khatmas::progress(conn, k.id)?;
    let participants = khatmas::participants(conn, k)?;
    if s.emit(&serde_json::json!({
        "khatma": k,
        "progress": progress,
        "participants": participants,
        "readings": khatmas::readings(conn, k)?,
    }))? {
        return Ok(());
    }

    let creator = accounts::require_id(conn, k.creator_id)?;
    heading(&format!("{}  (#{})", k.title, k.id));
    if let Some(d) = &k.description {
        println!("  {}", d);
        println!();
    }
    println!("  Type:          {}", k.khatma_type.display_name());
    println!("  Frequency:     {}", k.frequency.display_name());
    println!("  Visibility:    {}", k.visibility.display_name());
    println!("  Created by:    {} on {}", creator.label(), short_date(&k.created_at));
    if k.has_participant_limit() {
        println!("  Participants:  {}/{}", participants.len(), k.max_participants);
    } else {
        println!("  Participants:  {}", participants.len());
    }
    println!("  Target:        {}", opt(k.target_completion_date.as_deref()));
    if let Some(prayer) = &k.memorial_prayer {
        println!("  Dua:           {}", prayer);
    }
    if k.visibility != Visibility::Public && k.creator_id == s.actor()?.id {
        println_colored!(DIM, "  Share token:   {}", k.sharing_token);
    }
    println!();
    print_progress(&progress);
    if let Some(at) = &k.completed_at {
        println_colored!(GREEN, "  Completed on {}", short_date(at));
    }
    if !participants.is_empty() {
        println!();
        println_colored!(GOLD, "  Readers");
        for p in &participants {
            println!("  {:<20} {:>2} parts read", p.username, p.parts_read);
        }
    }
    println!();
    Ok(())
}
