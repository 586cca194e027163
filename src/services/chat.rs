use anyhow::Result;
use log::debug;
use rusqlite::Connection;

use crate::db::repository::{ChatRepo, MembershipRepo, ParticipantRepo, Related};
use crate::error::KhatmaError;
use crate::models::{
    ChatMessage, ChatScope, Khatma, MessageType, NotificationType, ReadingGroup, User,
};
use crate::utils::format::truncate_width;

use super::{groups, khatmas, notifications};

const PREVIEW_WIDTH: usize = 60;

fn clean(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(KhatmaError::invalid("message must not be empty"));
    }
    Ok(text)
}

fn stored(conn: &Connection, id: i64) -> Result<ChatMessage> {
    ChatRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("message #{}", id)))
}

pub fn post_khatma(conn: &Connection, actor: &User, khatma: &Khatma, text: &str) -> Result<ChatMessage> {
    let text = clean(text)?;
    if !ParticipantRepo::is_participant(conn, khatma.id, actor.id)? {
        return Err(KhatmaError::denied(format!("join '{}' to comment", khatma.title)));
    }
    if !khatma.allow_comments {
        return Err(KhatmaError::NotAccepting(format!("comments are off for '{}'", khatma.title)).into());
    }
    let id = ChatRepo::insert(conn, ChatScope::Khatma, khatma.id, actor.id, text, MessageType::Text)?;
    stored(conn, id)
}

pub fn post_group(conn: &Connection, actor: &User, group: &ReadingGroup, text: &str) -> Result<ChatMessage> {
    let text = clean(text)?;
    if MembershipRepo::get(conn, group.id, actor.id)?.is_none() {
        return Err(KhatmaError::denied(format!("you are not a member of '{}'", group.name)));
    }
    if !group.enable_chat {
        return Err(KhatmaError::NotAccepting(format!("chat is off for '{}'", group.name)).into());
    }
    let id = ChatRepo::insert(conn, ChatScope::Group, group.id, actor.id, text, MessageType::Text)?;

    let others = MembershipRepo::member_ids_by_join(conn, group.id)?
        .into_iter()
        .filter(|&uid| uid != actor.id);
    let n = notifications::notify_all(
        conn,
        others,
        NotificationType::GroupChat,
        &format!(
            "{} in {}: {}",
            actor.label(),
            group.name,
            truncate_width(text, PREVIEW_WIDTH)
        ),
        Related::group(group.id).with_user(actor.id),
    )?;
    debug!("group chat #{} notified {} members", group.id, n);
    stored(conn, id)
}

/// Record an automatic line such as "X joined the group".
pub fn system_message(conn: &Connection, scope: ChatScope, scope_id: i64, actor_id: i64, text: &str) -> Result<i64> {
    ChatRepo::insert(conn, scope, scope_id, actor_id, text, MessageType::System)
}

/// Latest `limit` messages, oldest first.
pub fn history(conn: &Connection, scope: ChatScope, scope_id: i64, limit: usize) -> Result<Vec<ChatMessage>> {
    ChatRepo::history(conn, scope, scope_id, limit)
}

pub fn pin(conn: &Connection, actor: &User, message_id: i64, pinned: bool) -> Result<ChatMessage> {
    let message = stored(conn, message_id)?;
    let allowed = match message.scope {
        ChatScope::Khatma => khatmas::require(conn, message.scope_id)?.creator_id == actor.id,
        ChatScope::Group => groups::role_of(conn, message.scope_id, actor.id)?
            .is_some_and(|r| r.can_moderate()),
    };
    if !allowed {
        return Err(KhatmaError::denied("only the organizers can pin messages"));
    }
    ChatRepo::set_pinned(conn, message_id, pinned)?;
    stored(conn, message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::domain_error;
    use crate::models::{NewGroup, NewKhatma};
    use crate::services::testing::{db, user};

    #[test]
    fn khatma_chat_requires_participation_and_comments() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = khatmas::create(&conn, &a, NewKhatma::new("K")).unwrap();

        assert!(post_khatma(&conn, &b, &k, "salam").is_err());
        assert!(post_khatma(&conn, &a, &k, "   ").is_err());
        let m = post_khatma(&conn, &a, &k, " salam ").unwrap();
        assert_eq!(m.message, "salam");
        assert_eq!(m.username, "aisha");

        let mut quiet = NewKhatma::new("Quiet");
        quiet.allow_comments = false;
        let q = khatmas::create(&conn, &a, quiet).unwrap();
        let err = post_khatma(&conn, &a, &q, "hi").unwrap_err();
        assert!(matches!(domain_error(&err), Some(KhatmaError::NotAccepting(_))));
    }

    #[test]
    fn group_chat_notifies_other_members() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let g = groups::create(&conn, &a, NewGroup::new("Circle")).unwrap();
        groups::join(&conn, &b, &g, None).unwrap();

        let before_a = notifications::unread_count(&conn, &a).unwrap();
        let before_b = notifications::unread_count(&conn, &b).unwrap();
        post_group(&conn, &b, &g, "See you after Maghrib").unwrap();
        assert_eq!(notifications::unread_count(&conn, &a).unwrap(), before_a + 1);
        assert_eq!(notifications::unread_count(&conn, &b).unwrap(), before_b);

        let log = history(&conn, ChatScope::Group, g.id, 10).unwrap();
        assert_eq!(log.first().unwrap().message_type, MessageType::System);
        assert_eq!(log.last().unwrap().message, "See you after Maghrib");
    }

    #[test]
    fn pinning_is_for_organizers() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = khatmas::create(&conn, &a, NewKhatma::new("K")).unwrap();
        khatmas::join(&conn, &b, &k, None).unwrap();
        let m = post_khatma(&conn, &b, &k, "dua request").unwrap();

        assert!(pin(&conn, &b, m.id, true).is_err());
        assert!(pin(&conn, &a, m.id, true).unwrap().is_pinned);
        assert!(!pin(&conn, &a, m.id, false).unwrap().is_pinned);
    }
}
