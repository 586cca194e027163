use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::Connection;

use crate::db::repository::{
    ChatRepo, DeceasedRepo, KhatmaRepo, MembershipRepo, PartRepo, ParticipantRepo, ReadingRepo,
    Related,
};
use crate::error::KhatmaError;
use crate::models::{
    ChatScope, Khatma, KhatmaPart, KhatmaType, NewKhatma, NotificationType, Participant, Progress,
    QuranReading, ReadingStatus, RecitationMethod, User, Visibility, TOTAL_PARTS,
};
use crate::utils::format::format_part_range;
use crate::utils::time::{now_timestamp, today};

use super::distribution::{distribute_parts, plan_summary, Share};
use super::{accounts, achievements, notifications};

/// What `complete_part` changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOutcome {
    pub progress: Progress,
    /// The campaign became complete with this part.
    pub finished: bool,
}

// ─── Lookup and permissions ──────────────────────────────────────────────────

pub fn get(conn: &Connection, id: i64) -> Result<Option<Khatma>> {
    KhatmaRepo::get(conn, id)
}

pub fn require(conn: &Connection, id: i64) -> Result<Khatma> {
    KhatmaRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("khatma #{}", id)))
}

/// Resolve a numeric id or an exact title.
pub fn resolve(conn: &Connection, key: &str) -> Result<Khatma> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        if let Some(k) = KhatmaRepo::get(conn, id)? {
            return Ok(k);
        }
    }
    KhatmaRepo::find_by_title(conn, key)?
        .ok_or_else(|| KhatmaError::not_found(format!("khatma '{}'", key)))
}

pub fn find_by_token(conn: &Connection, token: &str) -> Result<Option<Khatma>> {
    KhatmaRepo::find_by_token(conn, token)
}

fn require_creator(khatma: &Khatma, actor: &User, action: &str) -> Result<()> {
    if khatma.creator_id != actor.id {
        return Err(KhatmaError::denied(format!(
            "only the creator of '{}' can {}",
            khatma.title, action
        )));
    }
    Ok(())
}

fn require_part_number(part: u32) -> Result<()> {
    if !(1..=TOTAL_PARTS).contains(&part) {
        return Err(KhatmaError::invalid(format!("part must be between 1 and {}", TOTAL_PARTS)));
    }
    Ok(())
}

fn in_group(conn: &Connection, khatma: &Khatma, user_id: i64) -> Result<bool> {
    match khatma.group_id {
        Some(gid) => Ok(MembershipRepo::get(conn, gid, user_id)?.is_some()),
        None => Ok(false),
    }
}

/// Public campaigns are visible to everyone; others to their creator,
/// participants and, for group campaigns, group members.
pub fn can_view(conn: &Connection, khatma: &Khatma, user: &User) -> Result<bool> {
    if khatma.is_public() || khatma.creator_id == user.id {
        return Ok(true);
    }
    if ParticipantRepo::is_participant(conn, khatma.id, user.id)? {
        return Ok(true);
    }
    if khatma.visibility == Visibility::Group {
        return in_group(conn, khatma, user.id);
    }
    Ok(false)
}

/// Fetch a campaign the actor may see.
pub fn view(conn: &Connection, actor: &User, key: &str) -> Result<Khatma> {
    let khatma = resolve(conn, key)?;
    if !can_view(conn, &khatma, actor)? {
        return Err(KhatmaError::denied(format!("'{}' is not shared with you", khatma.title)));
    }
    Ok(khatma)
}

// ─── Queries ─────────────────────────────────────────────────────────────────

pub fn list_public(conn: &Connection, include_completed: bool) -> Result<Vec<Khatma>> {
    KhatmaRepo::list_public(conn, include_completed)
}

/// Campaigns the user created, then those they joined.
pub fn list_for_user(conn: &Connection, user: &User) -> Result<Vec<Khatma>> {
    let mut all = KhatmaRepo::list_created_by(conn, user.id)?;
    all.extend(KhatmaRepo::list_joined_by(conn, user.id)?);
    Ok(all)
}

pub fn parts(conn: &Connection, khatma: &Khatma) -> Result<Vec<KhatmaPart>> {
    PartRepo::list(conn, khatma.id)
}

pub fn participants(conn: &Connection, khatma: &Khatma) -> Result<Vec<Participant>> {
    ParticipantRepo::list(conn, khatma.id)
}

/// Reading records in part order, including reopened ones.
pub fn readings(conn: &Connection, khatma: &Khatma) -> Result<Vec<QuranReading>> {
    ReadingRepo::list_for_khatma(conn, khatma.id)
}

pub fn progress(conn: &Connection, khatma_id: i64) -> Result<Progress> {
    let (completed, total) = PartRepo::counts(conn, khatma_id)?;
    Ok(Progress { completed, total })
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

pub fn create(conn: &Connection, actor: &User, new: NewKhatma) -> Result<Khatma> {
    create_in(conn, actor, new, None)
}

/// Shared by personal and group campaigns; `group_id` marks the latter.
pub(crate) fn create_in(
    conn: &Connection,
    actor: &User,
    mut new: NewKhatma,
    group_id: Option<i64>,
) -> Result<Khatma> {
    new.title = new.title.trim().to_string();
    if new.title.is_empty() {
        return Err(KhatmaError::invalid("title must not be empty"));
    }
    if new.max_participants < 0 {
        return Err(KhatmaError::invalid("max participants cannot be negative"));
    }
    let group_scoped = new.visibility == Visibility::Group || new.khatma_type == KhatmaType::Group;
    if group_scoped && group_id.is_none() {
        return Err(KhatmaError::invalid("group khatmas are started from a reading group"));
    }
    if KhatmaRepo::find_by_title(conn, &new.title)?.is_some() {
        return Err(KhatmaError::exists(format!("khatma '{}'", new.title)));
    }
    if new.khatma_type == KhatmaType::Memorial {
        let id = new
            .deceased_id
            .ok_or_else(|| KhatmaError::invalid("a memorial khatma needs a deceased record"))?;
        let deceased = DeceasedRepo::get(conn, id)?
            .ok_or_else(|| KhatmaError::not_found(format!("deceased #{}", id)))?;
        if deceased.added_by != actor.id {
            return Err(KhatmaError::denied(format!("'{}' was added by someone else", deceased.name)));
        }
    }

    let tx = conn.unchecked_transaction()?;
    let id = KhatmaRepo::insert(&tx, actor.id, &new, group_id)?;
    PartRepo::create_all(&tx, id)?;
    ParticipantRepo::add(&tx, id, actor.id)?;
    tx.commit()?;

    notifications::notify(
        conn,
        actor.id,
        NotificationType::KhatmaProgress,
        &format!("Your khatma '{}' has been created", new.title),
        Related::khatma(id),
    )?;
    info!("{} created khatma #{} '{}'", actor.username, id, new.title);
    require(conn, id)
}

pub fn join(conn: &Connection, actor: &User, khatma: &Khatma, token: Option<&str>) -> Result<()> {
    if ParticipantRepo::is_participant(conn, khatma.id, actor.id)? {
        return Err(KhatmaError::exists(format!("{} in '{}'", actor.username, khatma.title)));
    }
    if khatma.has_participant_limit()
        && ParticipantRepo::count(conn, khatma.id)? >= khatma.max_participants
    {
        return Err(KhatmaError::LimitReached(format!("'{}' is full", khatma.title)).into());
    }
    let allowed = match khatma.visibility {
        Visibility::Public => true,
        Visibility::Private | Visibility::Family => {
            token.is_some_and(|t| t.trim().eq_ignore_ascii_case(&khatma.sharing_token))
        }
        Visibility::Group => in_group(conn, khatma, actor.id)?,
    };
    if !allowed {
        let reason = match khatma.visibility {
            Visibility::Group => format!("'{}' is open only to members of its group", khatma.title),
            other => format!(
                "'{}' is {}; ask the creator for the sharing link",
                khatma.title,
                other.display_name().to_lowercase()
            ),
        };
        return Err(KhatmaError::NotAccepting(reason).into());
    }

    ParticipantRepo::add(conn, khatma.id, actor.id)?;
    notifications::notify(
        conn,
        khatma.creator_id,
        NotificationType::KhatmaProgress,
        &format!("{} joined '{}'", actor.label(), khatma.title),
        Related::khatma(khatma.id).with_user(actor.id),
    )?;
    info!("{} joined khatma #{}", actor.username, khatma.id);
    Ok(())
}

pub fn join_by_token(conn: &Connection, actor: &User, token: &str) -> Result<Khatma> {
    let khatma = KhatmaRepo::find_by_token(conn, token)?
        .ok_or_else(|| KhatmaError::not_found("khatma for that sharing link"))?;
    join(conn, actor, &khatma, Some(token))?;
    Ok(khatma)
}

pub fn leave(conn: &Connection, actor: &User, khatma: &Khatma) -> Result<()> {
    if khatma.creator_id == actor.id {
        return Err(KhatmaError::denied("the creator cannot leave their own khatma"));
    }
    if !ParticipantRepo::is_participant(conn, khatma.id, actor.id)? {
        return Err(KhatmaError::not_found(format!("{} in '{}'", actor.username, khatma.title)));
    }
    let tx = conn.unchecked_transaction()?;
    PartRepo::unassign_user(&tx, khatma.id, actor.id)?;
    ParticipantRepo::remove(&tx, khatma.id, actor.id)?;
    tx.commit()?;

    notifications::notify(
        conn,
        khatma.creator_id,
        NotificationType::KhatmaProgress,
        &format!("{} left '{}'", actor.label(), khatma.title),
        Related::khatma(khatma.id).with_user(actor.id),
    )?;
    Ok(())
}

pub fn remove_participant(conn: &Connection, actor: &User, khatma: &Khatma, target: &User) -> Result<()> {
    require_creator(khatma, actor, "remove participants")?;
    if target.id == khatma.creator_id {
        return Err(KhatmaError::denied("the creator cannot be removed"));
    }
    if !ParticipantRepo::is_participant(conn, khatma.id, target.id)? {
        return Err(KhatmaError::not_found(format!("{} in '{}'", target.username, khatma.title)));
    }
    let tx = conn.unchecked_transaction()?;
    let freed = PartRepo::unassign_user(&tx, khatma.id, target.id)?;
    ParticipantRepo::remove(&tx, khatma.id, target.id)?;
    tx.commit()?;
    debug!("removed {} from #{}, {} parts freed", target.username, khatma.id, freed);

    notifications::notify(
        conn,
        target.id,
        NotificationType::KhatmaProgress,
        &format!("You were removed from '{}'", khatma.title),
        Related::khatma(khatma.id),
    )?;
    Ok(())
}

pub fn assign_part(conn: &Connection, actor: &User, khatma: &Khatma, part: u32, assignee: &User) -> Result<()> {
    require_creator(khatma, actor, "assign parts")?;
    require_part_number(part)?;
    if !ParticipantRepo::is_participant(conn, khatma.id, assignee.id)? {
        return Err(KhatmaError::invalid(format!(
            "{} has not joined '{}'",
            assignee.username, khatma.title
        )));
    }
    PartRepo::assign(conn, khatma.id, part, Some(assignee.id))?;
    notifications::notify(
        conn,
        assignee.id,
        NotificationType::PartAssigned,
        &format!("You have been assigned part {} of '{}'", part, khatma.title),
        Related::khatma(khatma.id),
    )?;
    Ok(())
}

/// Spread all parts over the participants in join order.
pub fn distribute(conn: &Connection, actor: &User, khatma: &Khatma) -> Result<Vec<Share<i64>>> {
    require_creator(khatma, actor, "distribute parts")?;
    apply_distribution(conn, khatma)
}

pub(crate) fn apply_distribution(conn: &Connection, khatma: &Khatma) -> Result<Vec<Share<i64>>> {
    let members: Vec<i64> = ParticipantRepo::list(conn, khatma.id)?
        .iter()
        .map(|p| p.user_id)
        .collect();
    let plan = distribute_parts(TOTAL_PARTS, &members);

    let tx = conn.unchecked_transaction()?;
    for &(part, uid) in &plan {
        PartRepo::assign(&tx, khatma.id, part, Some(uid))?;
    }
    tx.commit()?;

    let summary = plan_summary(&plan);
    for share in &summary {
        notifications::notify(
            conn,
            share.member,
            NotificationType::PartAssigned,
            &format!(
                "You have been assigned part {} of '{}'",
                format_part_range(share.first, share.last),
                khatma.title
            ),
            Related::khatma(khatma.id),
        )?;
    }
    info!("distributed #{} across {} members", khatma.id, summary.len());
    Ok(summary)
}

pub fn complete_part(
    conn: &Connection,
    actor: &User,
    khatma: &Khatma,
    part: u32,
    notes: Option<&str>,
    dua: Option<&str>,
) -> Result<CompletionOutcome> {
    complete_part_on(conn, actor, khatma, part, notes, dua, today())
}

pub fn complete_part_on(
    conn: &Connection,
    actor: &User,
    khatma: &Khatma,
    part: u32,
    notes: Option<&str>,
    dua: Option<&str>,
    on: NaiveDate,
) -> Result<CompletionOutcome> {
    require_part_number(part)?;
    let row = PartRepo::get(conn, khatma.id, part)?
        .ok_or_else(|| KhatmaError::not_found(format!("part {} of '{}'", part, khatma.title)))?;
    let is_assignee = row.assigned_to == Some(actor.id);
    if !is_assignee && khatma.creator_id != actor.id {
        return Err(KhatmaError::denied(format!("part {} is not assigned to you", part)));
    }
    if row.is_completed {
        return Err(KhatmaError::exists(format!("completion of part {}", part)));
    }
    let reader = row.assigned_to.unwrap_or(khatma.creator_id);

    let tx = conn.unchecked_transaction()?;
    mark_part_done(&tx, khatma.id, part, reader, notes, dua)?;
    tx.commit()?;

    notifications::notify(
        conn,
        khatma.creator_id,
        NotificationType::PartCompleted,
        &format!("{} completed part {} of '{}'", actor.label(), part, khatma.title),
        Related::khatma(khatma.id).with_user(actor.id),
    )?;
    info!("{} completed part {} of #{}", actor.username, part, khatma.id);

    let progress = progress(conn, khatma.id)?;
    let mut finished = false;
    if progress.is_done() && !require(conn, khatma.id)?.is_completed {
        finish(conn, khatma, on)?;
        finished = true;
    }
    accounts::record_activity(conn, actor.id, on)?;
    Ok(CompletionOutcome { progress, finished })
}

fn mark_part_done(
    conn: &Connection,
    khatma_id: i64,
    part: u32,
    reader: i64,
    notes: Option<&str>,
    dua: Option<&str>,
) -> Result<()> {
    let now = now_timestamp();
    PartRepo::set_completed(conn, khatma_id, part, Some(&now))?;
    ReadingRepo::upsert_completed(conn, khatma_id, reader, part, notes, dua, &now)?;
    // a reader removed from the campaign keeps the record but no counter
    ParticipantRepo::recount(conn, khatma_id, reader)
}

/// Mark the campaign complete, tell the creator and hand out achievements.
fn finish(conn: &Connection, khatma: &Khatma, on: NaiveDate) -> Result<()> {
    KhatmaRepo::set_completed(conn, khatma.id, Some(&now_timestamp()))?;
    notifications::notify(
        conn,
        khatma.creator_id,
        NotificationType::KhatmaCompleted,
        &format!("Khatma '{}' is complete. May it be accepted!", khatma.title),
        Related::khatma(khatma.id),
    )?;
    let fresh = require(conn, khatma.id)?;
    achievements::award_for_completion(conn, &fresh, on)?;
    info!("khatma #{} completed", khatma.id);
    Ok(())
}

/// Record how a completed part was read. The reader or the creator may set it.
pub fn set_reading_method(
    conn: &Connection,
    actor: &User,
    khatma: &Khatma,
    part: u32,
    method: RecitationMethod,
) -> Result<()> {
    require_part_number(part)?;
    let record = readings(conn, khatma)?
        .into_iter()
        .find(|r| r.part_number == part && r.status == ReadingStatus::Completed)
        .ok_or_else(|| KhatmaError::invalid(format!("part {} has not been read yet", part)))?;
    if record.user_id != actor.id && khatma.creator_id != actor.id {
        return Err(KhatmaError::denied(format!("part {} was read by someone else", part)));
    }
    ReadingRepo::set_method(conn, khatma.id, record.user_id, part, method)?;
    debug!("part {} of #{} read by {}", part, khatma.id, method.as_str());
    Ok(())
}

pub fn uncomplete_part(conn: &Connection, actor: &User, khatma: &Khatma, part: u32) -> Result<Progress> {
    require_creator(khatma, actor, "reopen parts")?;
    require_part_number(part)?;
    let row = PartRepo::get(conn, khatma.id, part)?
        .ok_or_else(|| KhatmaError::not_found(format!("part {} of '{}'", part, khatma.title)))?;
    if !row.is_completed {
        return Err(KhatmaError::invalid(format!("part {} is not completed", part)));
    }

    let tx = conn.unchecked_transaction()?;
    PartRepo::set_completed(&tx, khatma.id, part, None)?;
    for reader in ReadingRepo::reopen_part(&tx, khatma.id, part)? {
        ParticipantRepo::recount(&tx, khatma.id, reader)?;
    }
    if require(&tx, khatma.id)?.is_completed {
        KhatmaRepo::set_completed(&tx, khatma.id, None)?;
        info!("khatma #{} reopened", khatma.id);
    }
    tx.commit()?;
    progress(conn, khatma.id)
}

/// Complete every remaining part and the campaign itself.
pub fn complete(conn: &Connection, actor: &User, khatma: &Khatma) -> Result<Progress> {
    require_creator(khatma, actor, "complete it")?;
    let current = require(conn, khatma.id)?;
    if current.is_completed {
        return Err(KhatmaError::exists(format!("completion of '{}'", khatma.title)));
    }

    let tx = conn.unchecked_transaction()?;
    for part in PartRepo::list(&tx, khatma.id)?.into_iter().filter(|p| !p.is_completed) {
        let reader = part.assigned_to.unwrap_or(khatma.creator_id);
        mark_part_done(&tx, khatma.id, part.part_number, reader, None, None)?;
    }
    tx.commit()?;

    let on = today();
    finish(conn, khatma, on)?;
    accounts::record_activity(conn, actor.id, on)?;
    progress(conn, khatma.id)
}

pub fn delete(conn: &Connection, actor: &User, khatma: &Khatma) -> Result<()> {
    require_creator(khatma, actor, "delete it")?;
    let tx = conn.unchecked_transaction()?;
    ChatRepo::delete_scope(&tx, ChatScope::Khatma, khatma.id)?;
    KhatmaRepo::delete(&tx, khatma.id)?;
    tx.commit()?;
    info!("{} deleted khatma #{}", actor.username, khatma.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::domain_error;
    use crate::models::{AchievementType, MemorialFrequency, NewDeceased, NewGroup};
    use crate::services::{groups, memorials};
    use crate::services::testing::{db, user};

    fn kind(err: &anyhow::Error) -> &KhatmaError {
        domain_error(err).expect("domain error")
    }

    #[test]
    fn create_makes_thirty_parts_and_creator_participant() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("Friday khatma")).unwrap();
        assert_eq!(parts(&conn, &k).unwrap().len(), 30);
        let ps = participants(&conn, &k).unwrap();
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].user_id, a.id);
        assert_eq!(progress(&conn, k.id).unwrap(), Progress { completed: 0, total: 30 });
        assert_eq!(k.sharing_token.len(), 32);
    }

    #[test]
    fn duplicate_title_rejected() {
        let conn = db();
        let a = user(&conn, "aisha");
        create(&conn, &a, NewKhatma::new("Same")).unwrap();
        let err = create(&conn, &a, NewKhatma::new(" Same ")).unwrap_err();
        assert!(matches!(kind(&err), KhatmaError::AlreadyExists(_)));
    }

    #[test]
    fn memorial_requires_owned_deceased() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let mut new = NewKhatma::new("For grandfather");
        new.khatma_type = KhatmaType::Memorial;
        assert!(matches!(kind(&create(&conn, &a, new.clone()).unwrap_err()), KhatmaError::InvalidInput(_)));

        let d = memorials::add(
            &conn,
            &b,
            NewDeceased {
                name: "Ibrahim".into(),
                death_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                birth_date: None,
                relation: None,
                biography: None,
                memorial_day: false,
                memorial_frequency: MemorialFrequency::Yearly,
            },
        )
        .unwrap();
        new.deceased_id = Some(d.id);
        assert!(matches!(kind(&create(&conn, &a, new.clone()).unwrap_err()), KhatmaError::PermissionDenied(_)));
        assert!(create(&conn, &b, new).is_ok());
    }

    #[test]
    fn join_rules() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");

        let mut new = NewKhatma::new("Small");
        new.max_participants = 2;
        let k = create(&conn, &a, new).unwrap();
        join(&conn, &b, &k, None).unwrap();
        assert!(matches!(kind(&join(&conn, &b, &k, None).unwrap_err()), KhatmaError::AlreadyExists(_)));
        assert!(matches!(kind(&join(&conn, &c, &k, None).unwrap_err()), KhatmaError::LimitReached(_)));

        let mut new = NewKhatma::new("Family only");
        new.visibility = Visibility::Family;
        let fam = create(&conn, &a, new).unwrap();
        assert!(matches!(kind(&join(&conn, &c, &fam, None).unwrap_err()), KhatmaError::NotAccepting(_)));
        assert!(matches!(kind(&join(&conn, &c, &fam, Some("wrong")).unwrap_err()), KhatmaError::NotAccepting(_)));
        let joined = join_by_token(&conn, &c, &fam.sharing_token).unwrap();
        assert_eq!(joined.id, fam.id);
        assert!(can_view(&conn, &fam, &c).unwrap());
        assert!(!can_view(&conn, &fam, &b).unwrap());
    }

    #[test]
    fn leave_and_remove() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        assert!(matches!(kind(&leave(&conn, &a, &k).unwrap_err()), KhatmaError::PermissionDenied(_)));

        join(&conn, &b, &k, None).unwrap();
        assign_part(&conn, &a, &k, 5, &b).unwrap();
        leave(&conn, &b, &k).unwrap();
        assert_eq!(PartRepo::get(&conn, k.id, 5).unwrap().unwrap().assigned_to, None);

        join(&conn, &b, &k, None).unwrap();
        assert!(remove_participant(&conn, &b, &k, &a).is_err());
        assert!(matches!(
            kind(&remove_participant(&conn, &a, &k, &a).unwrap_err()),
            KhatmaError::PermissionDenied(_)
        ));
        remove_participant(&conn, &a, &k, &b).unwrap();
        assert_eq!(participants(&conn, &k).unwrap().len(), 1);
    }

    #[test]
    fn assign_requires_creator_and_participant() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        assert!(matches!(kind(&assign_part(&conn, &a, &k, 3, &b).unwrap_err()), KhatmaError::InvalidInput(_)));
        join(&conn, &b, &k, None).unwrap();
        assert!(matches!(kind(&assign_part(&conn, &b, &k, 3, &b).unwrap_err()), KhatmaError::PermissionDenied(_)));
        assert!(matches!(kind(&assign_part(&conn, &a, &k, 31, &b).unwrap_err()), KhatmaError::InvalidInput(_)));
        assign_part(&conn, &a, &k, 3, &b).unwrap();
        let part = PartRepo::get(&conn, k.id, 3).unwrap().unwrap();
        assert_eq!(part.assignee.as_deref(), Some("bashir"));
    }

    #[test]
    fn distribute_splits_in_join_order() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let d = user(&conn, "dina");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        for u in [&b, &c, &d] {
            join(&conn, u, &k, None).unwrap();
        }
        let shares = distribute(&conn, &a, &k).unwrap();
        let runs: Vec<(i64, u32, u32)> = shares.iter().map(|s| (s.member, s.first, s.last)).collect();
        assert_eq!(runs, vec![(a.id, 1, 8), (b.id, 9, 16), (c.id, 17, 23), (d.id, 24, 30)]);
        assert!(parts(&conn, &k).unwrap().iter().all(|p| p.assigned_to.is_some()));
        assert!(distribute(&conn, &b, &k).is_err());
    }

    #[test]
    fn completing_every_part_completes_once() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        join(&conn, &b, &k, None).unwrap();
        distribute(&conn, &a, &k).unwrap();

        // outside Ramadan so only the base awards apply
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(matches!(
            kind(&complete_part_on(&conn, &b, &k, 1, None, None, day).unwrap_err()),
            KhatmaError::PermissionDenied(_)
        ));
        let mut last = None;
        for part in 1..=30 {
            let who = if part <= 15 { &a } else { &b };
            last = Some(complete_part_on(&conn, who, &k, part, None, Some("ameen"), day).unwrap());
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.progress.percent(), 100.0);
        assert!(require(&conn, k.id).unwrap().is_completed);

        let ps = participants(&conn, &k).unwrap();
        assert!(ps.iter().all(|p| p.parts_read == 15));
        let kinds: Vec<AchievementType> = achievements::list(&conn, &a)
            .unwrap()
            .iter()
            .map(|x| x.achievement_type)
            .collect();
        assert!(kinds.contains(&AchievementType::FirstKhatma));
        assert!(kinds.contains(&AchievementType::FullQuran));
        assert!(!kinds.contains(&AchievementType::RamadanKhatma));

        let again = complete_part_on(&conn, &a, &k, 1, None, None, day).unwrap_err();
        assert!(matches!(kind(&again), KhatmaError::AlreadyExists(_)));
    }

    fn read_all(conn: &Connection, who: &User, k: &Khatma, day: NaiveDate) -> CompletionOutcome {
        let mut last = None;
        for part in 1..=30 {
            last = Some(complete_part_on(conn, who, k, part, None, None, day).unwrap());
        }
        last.unwrap()
    }

    fn earned(conn: &Connection, who: &User, of: AchievementType) -> usize {
        achievements::list(conn, who)
            .unwrap()
            .iter()
            .filter(|x| x.achievement_type == of)
            .count()
    }

    #[test]
    fn reopening_and_finishing_again_awards_nothing_new() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(read_all(&conn, &a, &k, day).finished);
        assert_eq!(accounts::profile(&conn, &a).unwrap().total_points, 150);

        for _ in 0..3 {
            uncomplete_part(&conn, &a, &k, 30).unwrap();
            assert!(complete_part_on(&conn, &a, &k, 30, None, None, day).unwrap().finished);
        }
        assert_eq!(earned(&conn, &a, AchievementType::FullQuran), 1);
        assert_eq!(earned(&conn, &a, AchievementType::FirstKhatma), 1);
        let profile = accounts::profile(&conn, &a).unwrap();
        assert_eq!(profile.total_points, 150);
        assert_eq!(profile.level, 2);
    }

    #[test]
    fn ramadan_completion_adds_ramadan_award() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("Taraweeh khatm")).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        assert!(read_all(&conn, &a, &k, day).finished);

        assert_eq!(earned(&conn, &a, AchievementType::RamadanKhatma), 1);
        let profile = accounts::profile(&conn, &a).unwrap();
        assert_eq!(profile.total_points, 50 + 75 + 100);
        assert_eq!(profile.level, 2);
    }

    #[test]
    fn memorial_completion_rewards_creator() {
        let conn = db();
        let a = user(&conn, "aisha");
        let d = memorials::add(
            &conn,
            &a,
            NewDeceased {
                name: "Ibrahim".into(),
                death_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                birth_date: None,
                relation: None,
                biography: None,
                memorial_day: false,
                memorial_frequency: MemorialFrequency::Yearly,
            },
        )
        .unwrap();
        let mut new = NewKhatma::new("For Ibrahim");
        new.khatma_type = KhatmaType::Memorial;
        new.deceased_id = Some(d.id);
        let k = create(&conn, &a, new).unwrap();
        read_all(&conn, &a, &k, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());

        assert_eq!(earned(&conn, &a, AchievementType::MemorialKhatma), 1);
        assert_eq!(earned(&conn, &a, AchievementType::RamadanKhatma), 0);
        assert_eq!(accounts::profile(&conn, &a).unwrap().total_points, 50 + 100 + 30);
    }

    #[test]
    fn group_completion_rewards_community() {
        let conn = db();
        let a = user(&conn, "aisha");
        let group = groups::create(&conn, &a, NewGroup::new("Circle")).unwrap();
        let k = groups::create_group_khatma(&conn, &a, &group, NewKhatma::new("Circle khatm")).unwrap();
        read_all(&conn, &a, &k, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());

        assert_eq!(earned(&conn, &a, AchievementType::CommunityKhatma), 1);
        assert_eq!(accounts::profile(&conn, &a).unwrap().total_points, 50 + 40 + 100);
    }

    #[test]
    fn group_visibility_needs_a_group() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");

        let mut new = NewKhatma::new("Loose");
        new.visibility = Visibility::Group;
        assert!(matches!(kind(&create(&conn, &a, new).unwrap_err()), KhatmaError::InvalidInput(_)));
        let mut new = NewKhatma::new("Loose");
        new.khatma_type = KhatmaType::Group;
        assert!(matches!(kind(&create(&conn, &a, new).unwrap_err()), KhatmaError::InvalidInput(_)));
        assert!(KhatmaRepo::find_by_title(&conn, "Loose").unwrap().is_none());

        let group = groups::create(&conn, &a, NewGroup::new("Circle")).unwrap();
        let k = groups::create_group_khatma(&conn, &a, &group, NewKhatma::new("Members")).unwrap();
        let err = join(&conn, &b, &k, Some(&k.sharing_token)).unwrap_err();
        match kind(&err) {
            KhatmaError::NotAccepting(msg) => assert!(msg.contains("members of its group")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reading_records_keep_notes_and_method() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        join(&conn, &b, &k, None).unwrap();
        assign_part(&conn, &a, &k, 3, &b).unwrap();

        let err = set_reading_method(&conn, &b, &k, 3, RecitationMethod::Listening).unwrap_err();
        assert!(matches!(kind(&err), KhatmaError::InvalidInput(_)));
        complete_part(&conn, &b, &k, 3, Some("after fajr"), Some("for my parents")).unwrap();
        complete_part(&conn, &a, &k, 4, None, None).unwrap();

        set_reading_method(&conn, &b, &k, 3, RecitationMethod::Listening).unwrap();
        let err = set_reading_method(&conn, &b, &k, 4, RecitationMethod::Tajweed).unwrap_err();
        assert!(matches!(kind(&err), KhatmaError::PermissionDenied(_)));
        set_reading_method(&conn, &a, &k, 4, RecitationMethod::Tajweed).unwrap();

        let records = readings(&conn, &k).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].part_number, records[0].user_id), (3, b.id));
        assert_eq!(records[0].recitation_method, RecitationMethod::Listening);
        assert_eq!(records[0].notes.as_deref(), Some("after fajr"));
        assert_eq!(records[0].dua.as_deref(), Some("for my parents"));
        assert_eq!(records[1].recitation_method, RecitationMethod::Tajweed);

        uncomplete_part(&conn, &a, &k, 3).unwrap();
        assert_eq!(readings(&conn, &k).unwrap()[0].status, ReadingStatus::InProgress);
    }

    #[test]
    fn uncomplete_reopens_campaign() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        complete(&conn, &a, &k).unwrap();
        assert!(require(&conn, k.id).unwrap().is_completed);

        let p = uncomplete_part(&conn, &a, &k, 7).unwrap();
        assert_eq!(p, Progress { completed: 29, total: 30 });
        let fresh = require(&conn, k.id).unwrap();
        assert!(!fresh.is_completed);
        assert!(fresh.completed_at.is_none());
        assert_eq!(participants(&conn, &k).unwrap()[0].parts_read, 29);
        assert!(uncomplete_part(&conn, &a, &k, 7).is_err());
    }

    #[test]
    fn delete_cascades() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("K")).unwrap();
        delete(&conn, &a, &k).unwrap();
        assert!(get(&conn, k.id).unwrap().is_none());
        assert!(PartRepo::list(&conn, k.id).unwrap().is_empty());
    }

    #[test]
    fn resolve_by_id_or_title() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = create(&conn, &a, NewKhatma::new("Laylat al-Qadr")).unwrap();
        assert_eq!(resolve(&conn, &k.id.to_string()).unwrap().id, k.id);
        assert_eq!(resolve(&conn, "Laylat al-Qadr").unwrap().id, k.id);
        assert!(resolve(&conn, "nothing").is_err());
    }
}
