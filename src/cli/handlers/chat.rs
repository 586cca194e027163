use anyhow::Result;

use crate::cli::args::ChatCommands;
use crate::error::KhatmaError;
use crate::models::{ChatMessage, ChatScope, MessageType};
use crate::services::{chat, groups, khatmas};
use crate::utils::format::short_date;

use super::{heading, Session, DIM, GOLD, GREEN};

pub fn handle_chat(s: &Session, action: &ChatCommands) -> Result<()> {
    let conn = &s.conn;
    let actor = s.actor()?;
    match action {
        ChatCommands::Khatma { khatma, message, limit } => {
            let k = khatmas::view(conn, &actor, khatma)?;
            if let Some(text) = message {
                let m = chat::post_khatma(conn, &actor, &k, text)?;
                return posted(s, &m);
            }
            let history = chat::history(conn, ChatScope::Khatma, k.id, *limit)?;
            print_history(s, &format!("Chat · {}", k.title), &history)?;
        }
        ChatCommands::Group { group, message, limit } => {
            let g = groups::resolve(conn, group)?;
            if let Some(text) = message {
                let m = chat::post_group(conn, &actor, &g, text)?;
                return posted(s, &m);
            }
            if !g.is_public && groups::role_of(conn, g.id, actor.id)?.is_none() {
                return Err(KhatmaError::denied(format!("'{}' is a private group", g.name)));
            }
            let history = chat::history(conn, ChatScope::Group, g.id, *limit)?;
            print_history(s, &format!("Chat · {}", g.name), &history)?;
        }
        ChatCommands::Pin { message, unpin } => {
            let m = chat::pin(conn, &actor, *message, !*unpin)?;
            if s.emit(&m)? {
                return Ok(());
            }
            let verb = if m.is_pinned { "Pinned" } else { "Unpinned" };
            println_colored!(GREEN, "  ✓ {} message #{}", verb, m.id);
        }
    }
    Ok(())
}

fn posted(s: &Session, m: &ChatMessage) -> Result<()> {
    if !s.emit(m)? {
        println_colored!(GREEN, "  ✓ Sent (#{})", m.id);
    }
    Ok(())
}

fn print_history(s: &Session, title: &str, history: &[ChatMessage]) -> Result<()> {
    if s.emit(&history)? {
        return Ok(());
    }
    heading(title);
    if history.is_empty() {
        println_colored!(DIM, "  No messages yet");
    }
    for m in history {
        let when = short_date(&m.created_at);
        match m.message_type {
            MessageType::System => println_colored!(DIM, "  {}  · {}", when, m.message),
            MessageType::Text => {
                let pin = if m.is_pinned { "📌" } else { "  " };
                print!("  {} {}{:<14}\x1b[0m", when, GOLD, m.username);
                println!(" {} {}  \x1b[2m#{}\x1b[0m", pin, m.message, m.id);
            }
        }
    }
    println!();
    Ok(())
}
