use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    parse_column, Activity, ActivityKind, Khatma, KhatmaPart, LeaderboardEntry, NewKhatma,
    Participant, QuranReading, ReadingStatus, RecitationMethod, TOTAL_PARTS,
};
use crate::utils::time::now_timestamp;

use super::users::like_pattern;

const KHATMA_COLUMNS: &str = "k.id, k.title, k.creator_id, k.description, k.khatma_type,
    k.frequency, k.visibility, k.group_id, k.is_group_khatma, k.auto_distribute_parts,
    k.deceased_id, k.memorial_prayer, k.allow_comments, k.max_participants, k.send_reminders,
    k.reminder_frequency, k.is_completed, k.completed_at, k.start_date, k.end_date,
    k.target_completion_date, k.sharing_token, k.created_at";

fn khatma_from_row(row: &Row<'_>) -> rusqlite::Result<Khatma> {
    Ok(Khatma {
        id: row.get(0)?,
        title: row.get(1)?,
        creator_id: row.get(2)?,
        description: row.get(3)?,
        khatma_type: parse_column(4, row.get(4)?)?,
        frequency: parse_column(5, row.get(5)?)?,
        visibility: parse_column(6, row.get(6)?)?,
        group_id: row.get(7)?,
        is_group_khatma: row.get(8)?,
        auto_distribute_parts: row.get(9)?,
        deceased_id: row.get(10)?,
        memorial_prayer: row.get(11)?,
        allow_comments: row.get(12)?,
        max_participants: row.get(13)?,
        send_reminders: row.get(14)?,
        reminder_frequency: parse_column(15, row.get(15)?)?,
        is_completed: row.get(16)?,
        completed_at: row.get(17)?,
        start_date: row.get(18)?,
        end_date: row.get(19)?,
        target_completion_date: row.get(20)?,
        sharing_token: row.get(21)?,
        created_at: row.get(22)?,
    })
}

fn collect_khatmas(
    conn: &Connection,
    sql: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<Khatma>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, khatma_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(anyhow::Error::from)
}

pub struct KhatmaRepo;

impl KhatmaRepo {
    pub fn insert(
        conn: &Connection,
        creator_id: i64,
        new: &NewKhatma,
        group_id: Option<i64>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO khatmas (title, creator_id, description, khatma_type, frequency, visibility,
                    group_id, is_group_khatma, auto_distribute_parts, deceased_id, memorial_prayer,
                    allow_comments, max_participants, send_reminders, reminder_frequency,
                    start_date, end_date, target_completion_date, sharing_token, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                     lower(hex(randomblob(16))), ?19)",
            params![
                new.title,
                creator_id,
                new.description,
                new.khatma_type.as_str(),
                new.frequency.as_str(),
                new.visibility.as_str(),
                group_id,
                group_id.is_some(),
                new.auto_distribute_parts,
                new.deceased_id,
                new.memorial_prayer,
                new.allow_comments,
                new.max_participants,
                new.send_reminders,
                new.reminder_frequency.as_str(),
                new.start_date,
                new.end_date,
                new.target_completion_date,
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Khatma>> {
        conn.query_row(
            &format!("SELECT {KHATMA_COLUMNS} FROM khatmas k WHERE k.id = ?1"),
            params![id],
            khatma_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn find_by_title(conn: &Connection, title: &str) -> Result<Option<Khatma>> {
        conn.query_row(
            &format!("SELECT {KHATMA_COLUMNS} FROM khatmas k WHERE k.title = ?1"),
            params![title],
            khatma_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn find_by_token(conn: &Connection, token: &str) -> Result<Option<Khatma>> {
        conn.query_row(
            &format!("SELECT {KHATMA_COLUMNS} FROM khatmas k WHERE k.sharing_token = ?1"),
            params![token.trim().to_lowercase()],
            khatma_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn list_public(conn: &Connection, include_completed: bool) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k
                 WHERE k.visibility = 'public' AND (?1 OR k.is_completed = 0)
                 ORDER BY k.created_at DESC, k.id DESC"
            ),
            params![include_completed],
        )
    }

    pub fn list_created_by(conn: &Connection, user_id: i64) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k WHERE k.creator_id = ?1
                 ORDER BY k.created_at DESC, k.id DESC"
            ),
            params![user_id],
        )
    }

    /// Campaigns the user takes part in without having created them.
    pub fn list_joined_by(conn: &Connection, user_id: i64) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k
                 JOIN participants p ON p.khatma_id = k.id
                 WHERE p.user_id = ?1 AND k.creator_id != ?1
                 ORDER BY p.joined_at DESC, k.id DESC"
            ),
            params![user_id],
        )
    }

    pub fn list_for_group(conn: &Connection, group_id: i64) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k WHERE k.group_id = ?1
                 ORDER BY k.created_at DESC, k.id DESC"
            ),
            params![group_id],
        )
    }

    /// Open campaigns that want reminders at some frequency.
    pub fn list_reminder_candidates(conn: &Connection) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k
                 WHERE k.send_reminders = 1 AND k.reminder_frequency != 'never'
                   AND k.is_completed = 0
                 ORDER BY k.id"
            ),
            params![],
        )
    }

    /// Title or description matches that `viewer_id` is allowed to see.
    pub fn search_visible(conn: &Connection, needle: &str, viewer_id: i64, limit: usize) -> Result<Vec<Khatma>> {
        collect_khatmas(
            conn,
            &format!(
                "SELECT {KHATMA_COLUMNS} FROM khatmas k
                 WHERE (k.title LIKE ?1 ESCAPE '\\' OR k.description LIKE ?1 ESCAPE '\\')
                   AND (k.visibility = 'public'
                        OR k.creator_id = ?2
                        OR EXISTS (SELECT 1 FROM participants p
                                   WHERE p.khatma_id = k.id AND p.user_id = ?2)
                        OR (k.visibility = 'group' AND EXISTS (
                                SELECT 1 FROM group_memberships m
                                WHERE m.group_id = k.group_id AND m.user_id = ?2 AND m.is_active = 1)))
                 ORDER BY k.created_at DESC, k.id DESC LIMIT ?3"
            ),
            params![like_pattern(needle), viewer_id, limit as i64],
        )
    }

    pub fn set_completed(conn: &Connection, id: i64, completed_at: Option<&str>) -> Result<()> {
        conn.execute(
            "UPDATE khatmas SET is_completed = ?1, completed_at = ?2 WHERE id = ?3",
            params![completed_at.is_some(), completed_at, id],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM khatmas WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM khatmas", [], |row| row.get(0))
            .map_err(anyhow::Error::from)
    }

    pub fn count_created_by(conn: &Connection, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM khatmas WHERE creator_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn count_completed_created_by(conn: &Connection, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM khatmas WHERE creator_id = ?1 AND is_completed = 1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }
}

// ─── Parts ───────────────────────────────────────────────────────────────────

const PART_COLUMNS: &str = "p.id, p.khatma_id, p.part_number, p.assigned_to, u.username,
    p.is_completed, p.completed_at";

fn part_from_row(row: &Row<'_>) -> rusqlite::Result<KhatmaPart> {
    Ok(KhatmaPart {
        id: row.get(0)?,
        khatma_id: row.get(1)?,
        part_number: row.get(2)?,
        assigned_to: row.get(3)?,
        assignee: row.get(4)?,
        is_completed: row.get(5)?,
        completed_at: row.get(6)?,
    })
}

pub struct PartRepo;

impl PartRepo {
    pub fn create_all(conn: &Connection, khatma_id: i64) -> Result<()> {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO khatma_parts (khatma_id, part_number) VALUES (?1, ?2)",
        )?;
        for part in 1..=TOTAL_PARTS {
            stmt.execute(params![khatma_id, part])?;
        }
        Ok(())
    }

    pub fn list(conn: &Connection, khatma_id: i64) -> Result<Vec<KhatmaPart>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PART_COLUMNS} FROM khatma_parts p
             LEFT JOIN users u ON u.id = p.assigned_to
             WHERE p.khatma_id = ?1 ORDER BY p.part_number"
        ))?;
        let rows = stmt.query_map(params![khatma_id], part_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn get(conn: &Connection, khatma_id: i64, part_number: u32) -> Result<Option<KhatmaPart>> {
        conn.query_row(
            &format!(
                "SELECT {PART_COLUMNS} FROM khatma_parts p
                 LEFT JOIN users u ON u.id = p.assigned_to
                 WHERE p.khatma_id = ?1 AND p.part_number = ?2"
            ),
            params![khatma_id, part_number],
            part_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// Parts assigned to a user across every campaign, open campaigns first.
    pub fn list_assigned_to(conn: &Connection, user_id: i64) -> Result<Vec<(String, KhatmaPart)>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PART_COLUMNS}, k.title FROM khatma_parts p
             JOIN khatmas k ON k.id = p.khatma_id
             LEFT JOIN users u ON u.id = p.assigned_to
             WHERE p.assigned_to = ?1
             ORDER BY k.is_completed, p.is_completed, k.id, p.part_number"
        ))?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(7)?, part_from_row(row)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn assign(
        conn: &Connection,
        khatma_id: i64,
        part_number: u32,
        user_id: Option<i64>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE khatma_parts SET assigned_to = ?1 WHERE khatma_id = ?2 AND part_number = ?3",
            params![user_id, khatma_id, part_number],
        )?;
        Ok(())
    }

    pub fn unassign_user(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<usize> {
        let n = conn.execute(
            "UPDATE khatma_parts SET assigned_to = NULL WHERE khatma_id = ?1 AND assigned_to = ?2",
            params![khatma_id, user_id],
        )?;
        Ok(n)
    }

    pub fn set_completed(
        conn: &Connection,
        khatma_id: i64,
        part_number: u32,
        completed_at: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE khatma_parts SET is_completed = ?1, completed_at = ?2
             WHERE khatma_id = ?3 AND part_number = ?4",
            params![completed_at.is_some(), completed_at, khatma_id, part_number],
        )?;
        Ok(())
    }

    /// (completed, total) for one campaign.
    pub fn counts(conn: &Connection, khatma_id: i64) -> Result<(u32, u32)> {
        conn.query_row(
            "SELECT COALESCE(SUM(is_completed), 0), COUNT(*) FROM khatma_parts WHERE khatma_id = ?1",
            params![khatma_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(anyhow::Error::from)
    }

    /// (completed, total) over every part assigned to the user.
    pub fn assigned_counts(conn: &Connection, user_id: i64) -> Result<(u32, u32)> {
        conn.query_row(
            "SELECT COALESCE(SUM(is_completed), 0), COUNT(*) FROM khatma_parts WHERE assigned_to = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn count_open_assigned(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM khatma_parts
             WHERE khatma_id = ?1 AND assigned_to = ?2 AND is_completed = 0",
            params![khatma_id, user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn count_completed_total(conn: &Connection) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM khatma_parts WHERE is_completed = 1",
            [],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }
}

// ─── Participants ────────────────────────────────────────────────────────────

pub struct ParticipantRepo;

impl ParticipantRepo {
    pub fn add(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<bool> {
        let n = conn.execute(
            "INSERT OR IGNORE INTO participants (khatma_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![khatma_id, user_id, now_timestamp()],
        )?;
        Ok(n > 0)
    }

    pub fn remove(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM participants WHERE khatma_id = ?1 AND user_id = ?2",
            params![khatma_id, user_id],
        )?;
        Ok(())
    }

    pub fn is_participant(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE khatma_id = ?1 AND user_id = ?2",
            params![khatma_id, user_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Participants in join order.
    pub fn list(conn: &Connection, khatma_id: i64) -> Result<Vec<Participant>> {
        let mut stmt = conn.prepare(
            "SELECT p.khatma_id, p.user_id, u.username, p.parts_read, p.joined_at
             FROM participants p JOIN users u ON u.id = p.user_id
             WHERE p.khatma_id = ?1 ORDER BY p.joined_at, p.rowid",
        )?;
        let rows = stmt.query_map(params![khatma_id], |row| {
            Ok(Participant {
                khatma_id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                parts_read: row.get(3)?,
                joined_at: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn count(conn: &Connection, khatma_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE khatma_id = ?1",
            params![khatma_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    /// Campaigns joined, own campaigns excluded.
    pub fn count_joined(conn: &Connection, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM participants p JOIN khatmas k ON k.id = p.khatma_id
             WHERE p.user_id = ?1 AND k.creator_id != ?1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    /// Set `parts_read` from the user's completed reading records.
    pub fn recount(conn: &Connection, khatma_id: i64, user_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE participants SET parts_read = (
                 SELECT COUNT(*) FROM quran_readings
                 WHERE khatma_id = ?1 AND user_id = ?2 AND status = 'completed')
             WHERE khatma_id = ?1 AND user_id = ?2",
            params![khatma_id, user_id],
        )?;
        Ok(())
    }

    /// Participants with at least one completed part.
    pub fn contributors(conn: &Connection, khatma_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT user_id FROM participants WHERE khatma_id = ?1 AND parts_read > 0
             ORDER BY joined_at, rowid",
        )?;
        let rows = stmt.query_map(params![khatma_id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}

// ─── Reading records ─────────────────────────────────────────────────────────

pub struct ReadingRepo;

impl ReadingRepo {
    pub fn upsert_completed(
        conn: &Connection,
        khatma_id: i64,
        user_id: i64,
        part_number: u32,
        notes: Option<&str>,
        dua: Option<&str>,
        completed_at: &str,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO quran_readings
                 (khatma_id, user_id, part_number, status, notes, dua, started_at, completed_at)
             VALUES (?1, ?2, ?3, 'completed', ?4, ?5, ?6, ?6)
             ON CONFLICT(khatma_id, user_id, part_number) DO UPDATE SET
                 status = 'completed',
                 notes = COALESCE(?4, notes),
                 dua = COALESCE(?5, dua),
                 completed_at = ?6",
            params![khatma_id, user_id, part_number, notes, dua, completed_at],
        )?;
        Ok(())
    }

    /// Put every record for a part back to in-progress; returns affected readers.
    pub fn reopen_part(conn: &Connection, khatma_id: i64, part_number: u32) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT user_id FROM quran_readings WHERE khatma_id = ?1 AND part_number = ?2",
        )?;
        let users = stmt
            .query_map(params![khatma_id, part_number], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        conn.execute(
            "UPDATE quran_readings SET status = ?1, completed_at = NULL
             WHERE khatma_id = ?2 AND part_number = ?3",
            params![ReadingStatus::InProgress.as_str(), khatma_id, part_number],
        )?;
        Ok(users)
    }

    pub fn set_method(
        conn: &Connection,
        khatma_id: i64,
        user_id: i64,
        part_number: u32,
        method: RecitationMethod,
    ) -> Result<()> {
        conn.execute(
            "UPDATE quran_readings SET recitation_method = ?1
             WHERE khatma_id = ?2 AND user_id = ?3 AND part_number = ?4",
            params![method.as_str(), khatma_id, user_id, part_number],
        )?;
        Ok(())
    }

    pub fn list_for_khatma(conn: &Connection, khatma_id: i64) -> Result<Vec<QuranReading>> {
        let mut stmt = conn.prepare(
            "SELECT id, khatma_id, user_id, part_number, status, recitation_method, notes, dua,
                    started_at, completed_at
             FROM quran_readings WHERE khatma_id = ?1 ORDER BY part_number, id",
        )?;
        let rows = stmt.query_map(params![khatma_id], |row| {
            Ok(QuranReading {
                id: row.get(0)?,
                khatma_id: row.get(1)?,
                user_id: row.get(2)?,
                part_number: row.get(3)?,
                status: parse_column(4, row.get(4)?)?,
                recitation_method: parse_column(5, row.get(5)?)?,
                notes: row.get(6)?,
                dua: row.get(7)?,
                started_at: row.get(8)?,
                completed_at: row.get(9)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn count_completed_by(conn: &Connection, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM quran_readings WHERE user_id = ?1 AND status = 'completed'",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    /// Top readers by completed parts.
    pub fn leaderboard(conn: &Connection, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = conn.prepare(
            "SELECT u.username, u.display_name, COUNT(r.id) AS done
             FROM quran_readings r JOIN users u ON u.id = r.user_id
             WHERE r.status = 'completed'
             GROUP BY u.id ORDER BY done DESC, u.username LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(LeaderboardEntry {
                username: row.get(0)?,
                display_name: row.get(1)?,
                completed_parts: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    /// Part completions and created campaigns, newest first.
    pub fn recent_activity(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Activity>> {
        let mut stmt = conn.prepare(
            "SELECT kind, khatma_id, title, part_number, at FROM (
                 SELECT 'part_completed' AS kind, r.khatma_id, k.title, r.part_number,
                        r.completed_at AS at, r.id AS seq
                 FROM quran_readings r JOIN khatmas k ON k.id = r.khatma_id
                 WHERE r.user_id = ?1 AND r.status = 'completed'
                 UNION ALL
                 SELECT 'khatma_created', k.id, k.title, NULL, k.created_at, k.id
                 FROM khatmas k WHERE k.creator_id = ?1
             ) ORDER BY at DESC, seq DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(Activity {
                kind: parse_column::<ActivityKind>(0, row.get(0)?)?,
                khatma_id: row.get(1)?,
                khatma_title: row.get(2)?,
                part_number: row.get(3)?,
                at: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}

// ─── Reminder runs ───────────────────────────────────────────────────────────

pub struct ReminderRepo;

impl ReminderRepo {
    pub fn last_run(conn: &Connection, khatma_id: i64) -> Result<Option<String>> {
        conn.query_row(
            "SELECT last_run FROM reminder_runs WHERE khatma_id = ?1",
            params![khatma_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn record_run(conn: &Connection, khatma_id: i64, date: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO reminder_runs (khatma_id, last_run) VALUES (?1, ?2)
             ON CONFLICT(khatma_id) DO UPDATE SET last_run = ?2",
            params![khatma_id, date],
        )?;
        Ok(())
    }
}
