use anyhow::Result;
use chrono::NaiveDateTime;
use log::info;
use rusqlite::Connection;

use crate::db::repository::{
    AnnouncementRepo, ChatRepo, EventRepo, GroupRepo, JoinRequestRepo, KhatmaRepo,
    MembershipRepo, ParticipantRepo, Related,
};
use crate::error::KhatmaError;
use crate::models::{
    Announcement, ChatScope, GroupDashboard, GroupEvent, GroupRole, JoinRequest, JoinStatus,
    Khatma, KhatmaType, Membership, NewEvent, NewGroup, NewKhatma, NotificationType,
    ReadingGroup, User, Visibility,
};
use crate::utils::time::{parse_datetime, timestamp};

use super::{chat, khatmas, notifications};

const DASHBOARD_ITEMS: usize = 5;
const UPCOMING_LIMIT: usize = 10;

/// What happened when a user asked to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Requested,
}

// ─── Lookup and roles ────────────────────────────────────────────────────────

pub fn get(conn: &Connection, id: i64) -> Result<Option<ReadingGroup>> {
    GroupRepo::get(conn, id)
}

pub fn require(conn: &Connection, id: i64) -> Result<ReadingGroup> {
    GroupRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("group #{}", id)))
}

/// Resolve a numeric id or an exact group name.
pub fn resolve(conn: &Connection, key: &str) -> Result<ReadingGroup> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        if let Some(g) = GroupRepo::get(conn, id)? {
            return Ok(g);
        }
    }
    GroupRepo::find_by_name(conn, key)?
        .ok_or_else(|| KhatmaError::not_found(format!("group '{}'", key)))
}

/// Active role of a user in a group, if any.
pub fn role_of(conn: &Connection, group_id: i64, user_id: i64) -> Result<Option<GroupRole>> {
    Ok(MembershipRepo::get(conn, group_id, user_id)?.map(|m| m.role))
}

fn require_member(conn: &Connection, group: &ReadingGroup, user: &User) -> Result<GroupRole> {
    role_of(conn, group.id, user.id)?.ok_or_else(|| {
        KhatmaError::denied(format!("{} is not a member of '{}'", user.username, group.name))
    })
}

fn require_moderator(conn: &Connection, group: &ReadingGroup, actor: &User) -> Result<GroupRole> {
    let role = require_member(conn, group, actor)?;
    if !role.can_moderate() {
        return Err(KhatmaError::denied(format!(
            "only admins and moderators of '{}' can do that",
            group.name
        )));
    }
    Ok(role)
}

fn others(conn: &Connection, group_id: i64, except: i64) -> Result<Vec<i64>> {
    Ok(MembershipRepo::member_ids_by_join(conn, group_id)?
        .into_iter()
        .filter(|&uid| uid != except)
        .collect())
}

// ─── Membership ──────────────────────────────────────────────────────────────

pub fn create(conn: &Connection, actor: &User, mut new: NewGroup) -> Result<ReadingGroup> {
    new.name = new.name.trim().to_string();
    if new.name.is_empty() {
        return Err(KhatmaError::invalid("group name must not be empty"));
    }
    if new.max_members < 0 {
        return Err(KhatmaError::invalid("max members cannot be negative"));
    }
    if GroupRepo::find_by_name(conn, &new.name)?.is_some() {
        return Err(KhatmaError::exists(format!("group '{}'", new.name)));
    }

    let tx = conn.unchecked_transaction()?;
    let id = GroupRepo::insert(&tx, actor.id, &new)?;
    MembershipRepo::add(&tx, id, actor.id, GroupRole::Admin)?;
    chat::system_message(
        &tx,
        ChatScope::Group,
        id,
        actor.id,
        &format!("{} created the group", actor.label()),
    )?;
    tx.commit()?;

    info!("{} created group #{} '{}'", actor.username, id, new.name);
    require(conn, id)
}

/// Add a member, post the system line and tell the creator.
fn admit(conn: &Connection, group: &ReadingGroup, user: &User) -> Result<()> {
    MembershipRepo::add(conn, group.id, user.id, GroupRole::Member)?;
    chat::system_message(
        conn,
        ChatScope::Group,
        group.id,
        user.id,
        &format!("{} joined the group", user.label()),
    )?;
    if user.id != group.creator_id {
        notifications::notify(
            conn,
            group.creator_id,
            NotificationType::NewGroupMember,
            &format!("{} joined '{}'", user.label(), group.name),
            Related::group(group.id).with_user(user.id),
        )?;
    }
    Ok(())
}

fn ensure_room(conn: &Connection, group: &ReadingGroup) -> Result<()> {
    if group.max_members > 0 && MembershipRepo::count(conn, group.id)? >= group.max_members {
        return Err(KhatmaError::LimitReached(format!("'{}' is full", group.name)).into());
    }
    Ok(())
}

pub fn join(conn: &Connection, actor: &User, group: &ReadingGroup, message: Option<&str>) -> Result<JoinOutcome> {
    if role_of(conn, group.id, actor.id)?.is_some() {
        return Err(KhatmaError::exists(format!("{} in '{}'", actor.username, group.name)));
    }
    if JoinRequestRepo::has_pending(conn, group.id, actor.id)? {
        return Err(KhatmaError::exists(format!("a pending request to '{}'", group.name)));
    }
    ensure_room(conn, group)?;
    let message = message.map(str::trim).filter(|m| !m.is_empty());

    if group.is_public {
        let tx = conn.unchecked_transaction()?;
        JoinRequestRepo::insert(&tx, group.id, actor.id, message, JoinStatus::Approved)?;
        admit(&tx, group, actor)?;
        tx.commit()?;
        info!("{} joined group #{}", actor.username, group.id);
        return Ok(JoinOutcome::Joined);
    }
    if !group.allow_join_requests {
        return Err(KhatmaError::NotAccepting(format!("'{}' is not taking new members", group.name)).into());
    }

    JoinRequestRepo::insert(conn, group.id, actor.id, message, JoinStatus::Pending)?;
    notifications::notify(
        conn,
        group.creator_id,
        NotificationType::JoinRequest,
        &format!("{} asked to join '{}'", actor.label(), group.name),
        Related::group(group.id).with_user(actor.id),
    )?;
    Ok(JoinOutcome::Requested)
}

pub fn process_request(conn: &Connection, actor: &User, request_id: i64, approve: bool) -> Result<JoinRequest> {
    let request = JoinRequestRepo::get(conn, request_id)?
        .ok_or_else(|| KhatmaError::not_found(format!("join request #{}", request_id)))?;
    let group = require(conn, request.group_id)?;
    require_moderator(conn, &group, actor)?;
    if request.status != JoinStatus::Pending {
        return Err(KhatmaError::invalid(format!(
            "request #{} was already {}",
            request_id,
            request.status.as_str()
        )));
    }
    let requester = super::accounts::require_id(conn, request.user_id)?;

    if approve {
        ensure_room(conn, &group)?;
        let tx = conn.unchecked_transaction()?;
        JoinRequestRepo::resolve(&tx, request_id, JoinStatus::Approved, actor.id)?;
        admit(&tx, &group, &requester)?;
        tx.commit()?;
        notifications::notify(
            conn,
            requester.id,
            NotificationType::JoinRequestApproved,
            &format!("Your request to join '{}' was approved", group.name),
            Related::group(group.id),
        )?;
        info!("{} approved {} into group #{}", actor.username, requester.username, group.id);
    } else {
        JoinRequestRepo::resolve(conn, request_id, JoinStatus::Rejected, actor.id)?;
        notifications::notify(
            conn,
            requester.id,
            NotificationType::JoinRequestRejected,
            &format!("Your request to join '{}' was declined", group.name),
            Related::group(group.id),
        )?;
    }
    JoinRequestRepo::get(conn, request_id)?
        .ok_or_else(|| KhatmaError::not_found(format!("join request #{}", request_id)))
}

pub fn leave(conn: &Connection, actor: &User, group: &ReadingGroup) -> Result<()> {
    if group.creator_id == actor.id {
        return Err(KhatmaError::denied("the creator cannot leave their own group"));
    }
    if role_of(conn, group.id, actor.id)?.is_none() {
        return Err(KhatmaError::not_found(format!("{} in '{}'", actor.username, group.name)));
    }
    let tx = conn.unchecked_transaction()?;
    MembershipRepo::deactivate(&tx, group.id, actor.id)?;
    chat::system_message(
        &tx,
        ChatScope::Group,
        group.id,
        actor.id,
        &format!("{} left the group", actor.label()),
    )?;
    tx.commit()?;

    notifications::notify(
        conn,
        group.creator_id,
        NotificationType::GroupMemberLeft,
        &format!("{} left '{}'", actor.label(), group.name),
        Related::group(group.id).with_user(actor.id),
    )?;
    Ok(())
}

pub fn change_role(conn: &Connection, actor: &User, group: &ReadingGroup, target: &User, role: GroupRole) -> Result<()> {
    if require_member(conn, group, actor)? != GroupRole::Admin {
        return Err(KhatmaError::denied(format!("only admins of '{}' can change roles", group.name)));
    }
    if target.id == group.creator_id {
        return Err(KhatmaError::denied("the creator's role cannot be changed"));
    }
    require_member(conn, group, target)?;
    MembershipRepo::set_role(conn, group.id, target.id, role)?;
    notifications::notify(
        conn,
        target.id,
        NotificationType::RoleChanged,
        &format!("You are now {} of '{}'", role.display_name().to_lowercase(), group.name),
        Related::group(group.id),
    )?;
    Ok(())
}

pub fn remove_member(conn: &Connection, actor: &User, group: &ReadingGroup, target: &User) -> Result<()> {
    let actor_role = require_moderator(conn, group, actor)?;
    if target.id == group.creator_id {
        return Err(KhatmaError::denied("the creator cannot be removed"));
    }
    let target_role = require_member(conn, group, target)?;
    if actor_role == GroupRole::Moderator && target_role == GroupRole::Admin {
        return Err(KhatmaError::denied("moderators cannot remove admins"));
    }
    MembershipRepo::deactivate(conn, group.id, target.id)?;

    notifications::notify(
        conn,
        target.id,
        NotificationType::RemovedFromGroup,
        &format!("You were removed from '{}'", group.name),
        Related::group(group.id),
    )?;
    notifications::notify(
        conn,
        group.creator_id,
        NotificationType::GroupMemberLeft,
        &format!("{} was removed from '{}' by {}", target.label(), group.name, actor.label()),
        Related::group(group.id).with_user(target.id),
    )?;
    Ok(())
}

// ─── Announcements and events ────────────────────────────────────────────────

pub fn announce(
    conn: &Connection,
    actor: &User,
    group: &ReadingGroup,
    title: &str,
    content: &str,
    pinned: bool,
) -> Result<i64> {
    require_moderator(conn, group, actor)?;
    let title = title.trim();
    if title.is_empty() || content.trim().is_empty() {
        return Err(KhatmaError::invalid("an announcement needs a title and content"));
    }
    let id = AnnouncementRepo::insert(conn, group.id, actor.id, title, content.trim(), pinned)?;
    notifications::notify_all(
        conn,
        others(conn, group.id, actor.id)?,
        NotificationType::NewAnnouncement,
        &format!("New announcement in '{}': {}", group.name, title),
        Related::group(group.id),
    )?;
    Ok(id)
}

pub fn announcements(conn: &Connection, group: &ReadingGroup, limit: usize) -> Result<Vec<Announcement>> {
    AnnouncementRepo::list(conn, group.id, limit)
}

pub fn create_event(conn: &Connection, actor: &User, group: &ReadingGroup, mut new: NewEvent) -> Result<GroupEvent> {
    require_moderator(conn, group, actor)?;
    new.title = new.title.trim().to_string();
    if new.title.is_empty() {
        return Err(KhatmaError::invalid("event title must not be empty"));
    }
    let start = parse_datetime(&new.start_time)?;
    let end = parse_datetime(&new.end_time)?;
    if end <= start {
        return Err(KhatmaError::invalid("an event must end after it starts"));
    }
    new.start_time = timestamp(start);
    new.end_time = timestamp(end);

    let id = EventRepo::insert(conn, group.id, actor.id, &new)?;
    notifications::notify_all(
        conn,
        others(conn, group.id, actor.id)?,
        NotificationType::NewEvent,
        &format!("{} on {} in '{}'", new.title, new.start_time, group.name),
        Related::group(group.id),
    )?;
    info!("{} scheduled event #{} in group #{}", actor.username, id, group.id);
    EventRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("event #{}", id)))
}

/// Flip the actor's attendance; returns whether they now attend.
pub fn toggle_attendance(conn: &Connection, actor: &User, event_id: i64) -> Result<bool> {
    let event = EventRepo::get(conn, event_id)?
        .ok_or_else(|| KhatmaError::not_found(format!("event #{}", event_id)))?;
    let group = require(conn, event.group_id)?;
    require_member(conn, &group, actor)?;
    EventRepo::toggle_attendance(conn, event_id, actor.id)
}

pub fn upcoming_events(conn: &Connection, group: &ReadingGroup, now: NaiveDateTime) -> Result<Vec<GroupEvent>> {
    EventRepo::upcoming(conn, group.id, &timestamp(now), UPCOMING_LIMIT)
}

// ─── Group campaigns ─────────────────────────────────────────────────────────

pub fn create_group_khatma(conn: &Connection, actor: &User, group: &ReadingGroup, mut new: NewKhatma) -> Result<Khatma> {
    require_moderator(conn, group, actor)?;
    if !group.enable_khatma_creation {
        return Err(KhatmaError::NotAccepting(format!("'{}' does not allow new khatmas", group.name)).into());
    }
    new.khatma_type = KhatmaType::Group;
    new.visibility = Visibility::Group;
    new.deceased_id = None;

    let khatma = khatmas::create_in(conn, actor, new, Some(group.id))?;
    let members = MembershipRepo::member_ids_by_join(conn, group.id)?;
    let tx = conn.unchecked_transaction()?;
    for &uid in &members {
        ParticipantRepo::add(&tx, khatma.id, uid)?;
    }
    tx.commit()?;

    if khatma.auto_distribute_parts {
        khatmas::apply_distribution(conn, &khatma)?;
    }
    notifications::notify_all(
        conn,
        members.into_iter().filter(|&uid| uid != actor.id),
        NotificationType::NewGroupKhatma,
        &format!("New group khatma '{}' in '{}'", khatma.title, group.name),
        Related::khatma(khatma.id).with_user(actor.id),
    )?;
    Ok(khatma)
}

// ─── Queries ─────────────────────────────────────────────────────────────────

pub fn list_public(conn: &Connection) -> Result<Vec<ReadingGroup>> {
    GroupRepo::list_public(conn)
}

pub fn list_for_user(conn: &Connection, user: &User) -> Result<Vec<ReadingGroup>> {
    GroupRepo::list_for_user(conn, user.id)
}

pub fn members(conn: &Connection, group: &ReadingGroup) -> Result<Vec<Membership>> {
    MembershipRepo::list(conn, group.id)
}

pub fn pending_requests(conn: &Connection, actor: &User, group: &ReadingGroup) -> Result<Vec<JoinRequest>> {
    require_moderator(conn, group, actor)?;
    JoinRequestRepo::pending(conn, group.id)
}

pub fn khatmas_of(conn: &Connection, group: &ReadingGroup) -> Result<Vec<Khatma>> {
    KhatmaRepo::list_for_group(conn, group.id)
}

pub fn dashboard(conn: &Connection, group: &ReadingGroup, now: NaiveDateTime) -> Result<GroupDashboard> {
    let campaigns = khatmas_of(conn, group)?;
    let completed = campaigns.iter().filter(|k| k.is_completed).count() as i64;
    Ok(GroupDashboard {
        group: group.clone(),
        member_count: MembershipRepo::count(conn, group.id)?,
        active_khatmas: campaigns.len() as i64 - completed,
        completed_khatmas: completed,
        event_count: EventRepo::count(conn, group.id)?,
        announcements: AnnouncementRepo::list(conn, group.id, DASHBOARD_ITEMS)?,
        upcoming_events: EventRepo::upcoming(conn, group.id, &timestamp(now), DASHBOARD_ITEMS)?,
        recent_chat: ChatRepo::history(conn, ChatScope::Group, group.id, DASHBOARD_ITEMS)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::domain_error;
    use crate::models::EventType;
    use crate::services::testing::{db, user};
    use chrono::NaiveDate;

    fn kind(err: &anyhow::Error) -> &KhatmaError {
        domain_error(err).expect("domain error")
    }

    fn private_group(conn: &Connection, owner: &User) -> ReadingGroup {
        let mut new = NewGroup::new("Family circle");
        new.is_public = false;
        create(conn, owner, new).unwrap()
    }

    fn event(start: &str, end: &str) -> NewEvent {
        NewEvent {
            title: "Khatm gathering".into(),
            description: None,
            event_type: EventType::Meeting,
            start_time: start.into(),
            end_time: end.into(),
            location: Some("Masjid".into()),
            is_online: false,
            meeting_link: None,
            related_khatma_id: None,
        }
    }

    #[test]
    fn creator_is_admin() {
        let conn = db();
        let a = user(&conn, "aisha");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        assert_eq!(role_of(&conn, g.id, a.id).unwrap(), Some(GroupRole::Admin));
        assert!(matches!(
            kind(&create(&conn, &a, NewGroup::new("Circle")).unwrap_err()),
            KhatmaError::AlreadyExists(_)
        ));
    }

    #[test]
    fn public_join_is_immediate() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        assert_eq!(join(&conn, &b, &g, None).unwrap(), JoinOutcome::Joined);
        assert_eq!(members(&conn, &g).unwrap().len(), 2);
        assert!(matches!(kind(&join(&conn, &b, &g, None).unwrap_err()), KhatmaError::AlreadyExists(_)));
        let feed = notifications::list(&conn, &a, true, 10).unwrap();
        assert_eq!(feed[0].notification_type, NotificationType::NewGroupMember);
    }

    #[test]
    fn member_limit() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let mut new = NewGroup::new("Tiny");
        new.max_members = 1;
        let g = create(&conn, &a, new).unwrap();
        assert!(matches!(kind(&join(&conn, &b, &g, None).unwrap_err()), KhatmaError::LimitReached(_)));
    }

    #[test]
    fn private_join_goes_through_request() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let g = private_group(&conn, &a);

        assert_eq!(join(&conn, &b, &g, Some("please")).unwrap(), JoinOutcome::Requested);
        assert!(matches!(kind(&join(&conn, &b, &g, None).unwrap_err()), KhatmaError::AlreadyExists(_)));
        assert_eq!(join(&conn, &c, &g, None).unwrap(), JoinOutcome::Requested);

        let pending = pending_requests(&conn, &a, &g).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].message.as_deref(), Some("please"));
        assert!(pending_requests(&conn, &b, &g).is_err());

        let approved = process_request(&conn, &a, pending[0].id, true).unwrap();
        assert_eq!(approved.status, JoinStatus::Approved);
        assert_eq!(approved.processed_by, Some(a.id));
        assert_eq!(role_of(&conn, g.id, b.id).unwrap(), Some(GroupRole::Member));

        process_request(&conn, &a, pending[1].id, false).unwrap();
        assert_eq!(role_of(&conn, g.id, c.id).unwrap(), None);
        let feed = notifications::list(&conn, &c, true, 10).unwrap();
        assert_eq!(feed[0].notification_type, NotificationType::JoinRequestRejected);

        let again = process_request(&conn, &a, pending[1].id, true).unwrap_err();
        assert!(matches!(kind(&again), KhatmaError::InvalidInput(_)));
    }

    #[test]
    fn closed_group_refuses() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let mut new = NewGroup::new("Closed");
        new.is_public = false;
        new.allow_join_requests = false;
        let g = create(&conn, &a, new).unwrap();
        assert!(matches!(kind(&join(&conn, &b, &g, None).unwrap_err()), KhatmaError::NotAccepting(_)));
    }

    #[test]
    fn roles_and_removal() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let d = user(&conn, "dina");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        for u in [&b, &c, &d] {
            join(&conn, u, &g, None).unwrap();
        }

        change_role(&conn, &a, &g, &b, GroupRole::Moderator).unwrap();
        change_role(&conn, &a, &g, &c, GroupRole::Admin).unwrap();
        assert!(change_role(&conn, &b, &g, &d, GroupRole::Moderator).is_err());
        assert!(change_role(&conn, &c, &g, &a, GroupRole::Member).is_err());

        assert!(remove_member(&conn, &b, &g, &c).is_err());
        assert!(remove_member(&conn, &c, &g, &a).is_err());
        remove_member(&conn, &b, &g, &d).unwrap();
        assert_eq!(role_of(&conn, g.id, d.id).unwrap(), None);

        let names: Vec<String> = members(&conn, &g).unwrap().into_iter().map(|m| m.username).collect();
        assert_eq!(names, vec!["aisha", "camil", "bashir"]);

        assert!(leave(&conn, &a, &g).is_err());
        leave(&conn, &b, &g).unwrap();
        assert_eq!(members(&conn, &g).unwrap().len(), 2);
        // a departed member can come back
        join(&conn, &b, &g, None).unwrap();
        assert_eq!(role_of(&conn, g.id, b.id).unwrap(), Some(GroupRole::Member));
    }

    #[test]
    fn events_validate_times_and_attendance() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        join(&conn, &b, &g, None).unwrap();

        let bad = create_event(&conn, &a, &g, event("2030-01-01 20:00", "2030-01-01 19:00")).unwrap_err();
        assert!(matches!(kind(&bad), KhatmaError::InvalidInput(_)));
        assert!(create_event(&conn, &b, &g, event("2030-01-01 19:00", "2030-01-01 20:00")).is_err());

        let e = create_event(&conn, &a, &g, event("2030-01-01 19:00", "2030-01-01 21:00")).unwrap();
        assert_eq!(e.start_time, "2030-01-01 19:00:00");
        assert!(toggle_attendance(&conn, &b, e.id).unwrap());
        assert!(!toggle_attendance(&conn, &b, e.id).unwrap());
        assert!(toggle_attendance(&conn, &c, e.id).is_err());

        let now = NaiveDate::from_ymd_opt(2029, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(upcoming_events(&conn, &g, now).unwrap().len(), 1);
        let later = NaiveDate::from_ymd_opt(2030, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(upcoming_events(&conn, &g, later).unwrap().is_empty());
    }

    #[test]
    fn announcements_pinned_first() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        join(&conn, &b, &g, None).unwrap();
        announce(&conn, &a, &g, "Pinned", "read daily", true).unwrap();
        announce(&conn, &a, &g, "Later", "new schedule", false).unwrap();
        assert!(announce(&conn, &b, &g, "Nope", "x", false).is_err());

        let list = announcements(&conn, &g, 10).unwrap();
        assert_eq!(list[0].title, "Pinned");
        assert_eq!(list[1].title, "Later");
        let feed = notifications::list(&conn, &b, true, 10).unwrap();
        assert_eq!(feed[0].notification_type, NotificationType::NewAnnouncement);
    }

    #[test]
    fn group_khatma_enrolls_and_distributes() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        join(&conn, &b, &g, None).unwrap();
        join(&conn, &c, &g, None).unwrap();

        let mut new = NewKhatma::new("Circle khatma");
        new.auto_distribute_parts = true;
        let k = create_group_khatma(&conn, &a, &g, new).unwrap();
        assert_eq!(k.khatma_type, KhatmaType::Group);
        assert_eq!(k.visibility, Visibility::Group);
        assert!(k.is_group_khatma);
        assert_eq!(khatmas::participants(&conn, &k).unwrap().len(), 3);

        let parts = khatmas::parts(&conn, &k).unwrap();
        let by_b = parts.iter().filter(|p| p.assigned_to == Some(b.id)).count();
        assert_eq!(by_b, 10);

        let outsider = user(&conn, "dina");
        assert!(!khatmas::can_view(&conn, &k, &outsider).unwrap());
        let err = khatmas::join(&conn, &outsider, &k, None).unwrap_err();
        assert!(matches!(kind(&err), KhatmaError::NotAccepting(_)));

        assert!(create_group_khatma(&conn, &b, &g, NewKhatma::new("Other")).is_err());
    }

    #[test]
    fn dashboard_counts() {
        let conn = db();
        let a = user(&conn, "aisha");
        let g = create(&conn, &a, NewGroup::new("Circle")).unwrap();
        let k = create_group_khatma(&conn, &a, &g, NewKhatma::new("One")).unwrap();
        create_group_khatma(&conn, &a, &g, NewKhatma::new("Two")).unwrap();
        khatmas::complete(&conn, &a, &k).unwrap();

        let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let d = dashboard(&conn, &g, now).unwrap();
        assert_eq!(d.member_count, 1);
        assert_eq!(d.active_khatmas, 1);
        assert_eq!(d.completed_khatmas, 1);
        assert_eq!(d.recent_chat.len(), 1);
        let titles: Vec<String> = khatmas_of(&conn, &g).unwrap().into_iter().map(|k| k.title).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"One".to_string()) && titles.contains(&"Two".to_string()));
    }
}
