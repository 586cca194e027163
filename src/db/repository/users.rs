use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{parse_column, Achievement, AchievementType, Profile, User};
use crate::utils::time::now_timestamp;

const USER_COLUMNS: &str = "id, username, display_name, email, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub struct UserRepo;

impl UserRepo {
    pub fn insert(
        conn: &Connection,
        username: &str,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO users (username, display_name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![username, display_name, email, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn update_identity(
        conn: &Connection,
        id: i64,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE users SET display_name = ?1, email = ?2 WHERE id = ?3",
            params![display_name, email, id],
        )?;
        Ok(())
    }

    /// Case-insensitive match on username or display name.
    pub fn search(conn: &Connection, needle: &str, limit: usize) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username LIKE ?1 ESCAPE '\\' OR display_name LIKE ?1 ESCAPE '\\'
             ORDER BY username LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![like_pattern(needle), limit as i64], user_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(anyhow::Error::from)
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// ─── Profiles ────────────────────────────────────────────────────────────────

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        account_type: parse_column(1, row.get(1)?)?,
        preferred_language: row.get(2)?,
        reading_preference: parse_column(3, row.get(3)?)?,
        bio: row.get(4)?,
        location: row.get(5)?,
        total_points: row.get(6)?,
        level: row.get(7)?,
        consecutive_days: row.get(8)?,
        last_activity_date: row.get(9)?,
    })
}

pub struct ProfileRepo;

impl ProfileRepo {
    pub fn create(conn: &Connection, user_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO profiles (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, user_id: i64) -> Result<Option<Profile>> {
        conn.query_row(
            "SELECT user_id, account_type, preferred_language, reading_preference, bio, location,
                    total_points, level, consecutive_days, last_activity_date
             FROM profiles WHERE user_id = ?1",
            params![user_id],
            profile_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn save(conn: &Connection, profile: &Profile) -> Result<()> {
        conn.execute(
            "UPDATE profiles SET account_type = ?1, preferred_language = ?2,
                    reading_preference = ?3, bio = ?4, location = ?5, total_points = ?6,
                    level = ?7, consecutive_days = ?8, last_activity_date = ?9
             WHERE user_id = ?10",
            params![
                profile.account_type.as_str(),
                profile.preferred_language,
                profile.reading_preference.as_str(),
                profile.bio,
                profile.location,
                profile.total_points,
                profile.level,
                profile.consecutive_days,
                profile.last_activity_date,
                profile.user_id,
            ],
        )?;
        Ok(())
    }
}

// ─── Achievements ────────────────────────────────────────────────────────────

pub struct AchievementRepo;

impl AchievementRepo {
    pub fn insert(
        conn: &Connection,
        user_id: i64,
        kind: AchievementType,
        points: i64,
        related_khatma_id: Option<i64>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO achievements (user_id, achievement_type, points_earned, related_khatma_id, achieved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, kind.as_str(), points, related_khatma_id, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn has(conn: &Connection, user_id: i64, kind: AchievementType) -> Result<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM achievements WHERE user_id = ?1 AND achievement_type = ?2",
            params![user_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn has_for_khatma(
        conn: &Connection,
        user_id: i64,
        kind: AchievementType,
        khatma_id: i64,
    ) -> Result<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM achievements
             WHERE user_id = ?1 AND achievement_type = ?2 AND related_khatma_id = ?3",
            params![user_id, kind.as_str(), khatma_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Achievement>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, achievement_type, points_earned, related_khatma_id, achieved_at
             FROM achievements WHERE user_id = ?1 ORDER BY achieved_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Achievement {
                id: row.get(0)?,
                user_id: row.get(1)?,
                achievement_type: parse_column(2, row.get(2)?)?,
                points_earned: row.get(3)?,
                related_khatma_id: row.get(4)?,
                achieved_at: row.get(5)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}
