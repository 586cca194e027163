use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    parse_column, Announcement, GroupEvent, GroupRole, JoinRequest, JoinStatus, Membership,
    NewEvent, NewGroup, ReadingGroup,
};
use crate::utils::time::now_timestamp;

use super::users::like_pattern;

const GROUP_COLUMNS: &str = "g.id, g.name, g.description, g.creator_id, g.is_active, g.is_public,
    g.allow_join_requests, g.max_members, g.enable_chat, g.enable_khatma_creation, g.created_at";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<ReadingGroup> {
    Ok(ReadingGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        creator_id: row.get(3)?,
        is_active: row.get(4)?,
        is_public: row.get(5)?,
        allow_join_requests: row.get(6)?,
        max_members: row.get(7)?,
        enable_chat: row.get(8)?,
        enable_khatma_creation: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn collect_groups(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<ReadingGroup>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, group_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(anyhow::Error::from)
}

pub struct GroupRepo;

impl GroupRepo {
    pub fn insert(conn: &Connection, creator_id: i64, new: &NewGroup) -> Result<i64> {
        conn.execute(
            "INSERT INTO reading_groups (name, description, creator_id, is_public,
                    allow_join_requests, max_members, enable_chat, enable_khatma_creation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.name,
                new.description,
                creator_id,
                new.is_public,
                new.allow_join_requests,
                new.max_members,
                new.enable_chat,
                new.enable_khatma_creation,
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<ReadingGroup>> {
        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM reading_groups g WHERE g.id = ?1"),
            params![id],
            group_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<ReadingGroup>> {
        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM reading_groups g WHERE g.name = ?1"),
            params![name],
            group_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn list_public(conn: &Connection) -> Result<Vec<ReadingGroup>> {
        collect_groups(
            conn,
            &format!(
                "SELECT {GROUP_COLUMNS} FROM reading_groups g
                 WHERE g.is_public = 1 AND g.is_active = 1 ORDER BY g.name"
            ),
            params![],
        )
    }

    pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<ReadingGroup>> {
        collect_groups(
            conn,
            &format!(
                "SELECT {GROUP_COLUMNS} FROM reading_groups g
                 JOIN group_memberships m ON m.group_id = g.id
                 WHERE m.user_id = ?1 AND m.is_active = 1 ORDER BY g.name"
            ),
            params![user_id],
        )
    }

    pub fn search(conn: &Connection, needle: &str, limit: usize) -> Result<Vec<ReadingGroup>> {
        collect_groups(
            conn,
            &format!(
                "SELECT {GROUP_COLUMNS} FROM reading_groups g
                 WHERE g.name LIKE ?1 ESCAPE '\\' OR g.description LIKE ?1 ESCAPE '\\'
                 ORDER BY g.name LIMIT ?2"
            ),
            params![like_pattern(needle), limit as i64],
        )
    }
}

// ─── Memberships ─────────────────────────────────────────────────────────────

pub struct MembershipRepo;

impl MembershipRepo {
    /// Insert or reactivate a membership.
    pub fn add(conn: &Connection, group_id: i64, user_id: i64, role: GroupRole) -> Result<()> {
        conn.execute(
            "INSERT INTO group_memberships (group_id, user_id, role, joined_at, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT(group_id, user_id) DO UPDATE SET role = ?3, joined_at = ?4, is_active = 1",
            params![group_id, user_id, role.as_str(), now_timestamp()],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, group_id: i64, user_id: i64) -> Result<Option<Membership>> {
        conn.query_row(
            "SELECT m.group_id, m.user_id, u.username, m.role, m.joined_at, m.is_active
             FROM group_memberships m JOIN users u ON u.id = m.user_id
             WHERE m.group_id = ?1 AND m.user_id = ?2 AND m.is_active = 1",
            params![group_id, user_id],
            membership_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// Active members, admins first, then by username.
    pub fn list(conn: &Connection, group_id: i64) -> Result<Vec<Membership>> {
        let mut stmt = conn.prepare(
            "SELECT m.group_id, m.user_id, u.username, m.role, m.joined_at, m.is_active
             FROM group_memberships m JOIN users u ON u.id = m.user_id
             WHERE m.group_id = ?1 AND m.is_active = 1
             ORDER BY CASE m.role WHEN 'admin' THEN 0 WHEN 'moderator' THEN 1 ELSE 2 END,
                      u.username",
        )?;
        let rows = stmt.query_map(params![group_id], membership_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    /// Active member ids in join order.
    pub fn member_ids_by_join(conn: &Connection, group_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT user_id FROM group_memberships
             WHERE group_id = ?1 AND is_active = 1 ORDER BY joined_at, rowid",
        )?;
        let rows = stmt.query_map(params![group_id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn count(conn: &Connection, group_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM group_memberships WHERE group_id = ?1 AND is_active = 1",
            params![group_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn set_role(conn: &Connection, group_id: i64, user_id: i64, role: GroupRole) -> Result<()> {
        conn.execute(
            "UPDATE group_memberships SET role = ?1 WHERE group_id = ?2 AND user_id = ?3",
            params![role.as_str(), group_id, user_id],
        )?;
        Ok(())
    }

    pub fn deactivate(conn: &Connection, group_id: i64, user_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE group_memberships SET is_active = 0 WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
        )?;
        Ok(())
    }
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        group_id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        role: parse_column(3, row.get(3)?)?,
        joined_at: row.get(4)?,
        is_active: row.get(5)?,
    })
}

// ─── Join requests ───────────────────────────────────────────────────────────

const REQUEST_COLUMNS: &str = "r.id, r.group_id, r.user_id, u.username, r.message, r.status,
    r.created_at, r.processed_at, r.processed_by";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<JoinRequest> {
    Ok(JoinRequest {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        message: row.get(4)?,
        status: parse_column(5, row.get(5)?)?,
        created_at: row.get(6)?,
        processed_at: row.get(7)?,
        processed_by: row.get(8)?,
    })
}

pub struct JoinRequestRepo;

impl JoinRequestRepo {
    pub fn insert(
        conn: &Connection,
        group_id: i64,
        user_id: i64,
        message: Option<&str>,
        status: JoinStatus,
    ) -> Result<i64> {
        let now = now_timestamp();
        let processed_at = (status != JoinStatus::Pending).then(|| now.clone());
        conn.execute(
            "INSERT INTO join_requests (group_id, user_id, message, status, created_at, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![group_id, user_id, message, status.as_str(), now, processed_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<JoinRequest>> {
        conn.query_row(
            &format!(
                "SELECT {REQUEST_COLUMNS} FROM join_requests r JOIN users u ON u.id = r.user_id
                 WHERE r.id = ?1"
            ),
            params![id],
            request_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn has_pending(conn: &Connection, group_id: i64, user_id: i64) -> Result<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM join_requests
             WHERE group_id = ?1 AND user_id = ?2 AND status = 'pending'",
            params![group_id, user_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn pending(conn: &Connection, group_id: i64) -> Result<Vec<JoinRequest>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM join_requests r JOIN users u ON u.id = r.user_id
             WHERE r.group_id = ?1 AND r.status = 'pending' ORDER BY r.created_at, r.id"
        ))?;
        let rows = stmt.query_map(params![group_id], request_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn resolve(conn: &Connection, id: i64, status: JoinStatus, processed_by: i64) -> Result<()> {
        conn.execute(
            "UPDATE join_requests SET status = ?1, processed_at = ?2, processed_by = ?3 WHERE id = ?4",
            params![status.as_str(), now_timestamp(), processed_by, id],
        )?;
        Ok(())
    }
}

// ─── Announcements ───────────────────────────────────────────────────────────

pub struct AnnouncementRepo;

impl AnnouncementRepo {
    pub fn insert(
        conn: &Connection,
        group_id: i64,
        creator_id: i64,
        title: &str,
        content: &str,
        pinned: bool,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO group_announcements (group_id, creator_id, title, content, is_pinned, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![group_id, creator_id, title, content, pinned, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Pinned first, newest first.
    pub fn list(conn: &Connection, group_id: i64, limit: usize) -> Result<Vec<Announcement>> {
        let mut stmt = conn.prepare(
            "SELECT id, group_id, creator_id, title, content, is_pinned, created_at
             FROM group_announcements WHERE group_id = ?1
             ORDER BY is_pinned DESC, created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![group_id, limit as i64], |row| {
            Ok(Announcement {
                id: row.get(0)?,
                group_id: row.get(1)?,
                creator_id: row.get(2)?,
                title: row.get(3)?,
                content: row.get(4)?,
                is_pinned: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "e.id, e.group_id, e.creator_id, e.title, e.description, e.event_type,
    e.start_time, e.end_time, e.location, e.is_online, e.meeting_link, e.related_khatma_id,
    (SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id), e.created_at";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<GroupEvent> {
    Ok(GroupEvent {
        id: row.get(0)?,
        group_id: row.get(1)?,
        creator_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        event_type: parse_column(5, row.get(5)?)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        location: row.get(8)?,
        is_online: row.get(9)?,
        meeting_link: row.get(10)?,
        related_khatma_id: row.get(11)?,
        attendees: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub struct EventRepo;

impl EventRepo {
    pub fn insert(conn: &Connection, group_id: i64, creator_id: i64, new: &NewEvent) -> Result<i64> {
        conn.execute(
            "INSERT INTO group_events (group_id, creator_id, title, description, event_type,
                    start_time, end_time, location, is_online, meeting_link, related_khatma_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                group_id,
                creator_id,
                new.title,
                new.description,
                new.event_type.as_str(),
                new.start_time,
                new.end_time,
                new.location,
                new.is_online,
                new.meeting_link,
                new.related_khatma_id,
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<GroupEvent>> {
        conn.query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM group_events e WHERE e.id = ?1"),
            params![id],
            event_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// Events that have not started yet, soonest first.
    pub fn upcoming(conn: &Connection, group_id: i64, now: &str, limit: usize) -> Result<Vec<GroupEvent>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM group_events e
             WHERE e.group_id = ?1 AND e.start_time >= ?2
             ORDER BY e.start_time, e.id LIMIT ?3"
        ))?;
        let rows = stmt.query_map(params![group_id, now, limit as i64], event_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn count(conn: &Connection, group_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM group_events WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    /// Flip attendance; returns whether the user now attends.
    pub fn toggle_attendance(conn: &Connection, event_id: i64, user_id: i64) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM event_attendees WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, user_id],
        )?;
        if removed > 0 {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO event_attendees (event_id, user_id) VALUES (?1, ?2)",
            params![event_id, user_id],
        )?;
        Ok(true)
    }
}
