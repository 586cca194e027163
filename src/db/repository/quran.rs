use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    parse_column, Ayah, Bookmark, QuranPart, ReadingSettings, SearchIn, Surah,
};
use crate::utils::time::now_timestamp;

use super::users::like_pattern;

const SURAH_COLUMNS: &str =
    "number, name_arabic, name_english, revelation_type, verses_count, revelation_order";

fn surah_from_row(row: &Row<'_>) -> rusqlite::Result<Surah> {
    Ok(Surah {
        number: row.get(0)?,
        name_arabic: row.get(1)?,
        name_english: row.get(2)?,
        revelation_type: parse_column(3, row.get(3)?)?,
        verses_count: row.get(4)?,
        revelation_order: row.get(5)?,
    })
}

const AYAH_COLUMNS: &str =
    "a.id, a.surah_number, a.ayah_number, a.part_number, a.text_uthmani, a.text_simple, a.translation, a.page";

fn ayah_from_row(row: &Row<'_>) -> rusqlite::Result<Ayah> {
    Ok(Ayah {
        id: row.get(0)?,
        surah_number: row.get(1)?,
        ayah_number: row.get(2)?,
        part_number: row.get(3)?,
        text_uthmani: row.get(4)?,
        text_simple: row.get(5)?,
        translation: row.get(6)?,
        page: row.get(7)?,
    })
}

/// One parsed verse ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct AyahRecord {
    pub surah_number: u32,
    pub ayah_number: u32,
    pub part_number: u32,
    pub text: String,
    pub page: u32,
}

pub struct QuranRepo;

impl QuranRepo {
    pub fn upsert_part(conn: &Connection, part_number: u32, name: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO quran_parts (part_number, name) VALUES (?1, ?2)
             ON CONFLICT(part_number) DO UPDATE SET name = ?2",
            params![part_number, name],
        )?;
        Ok(())
    }

    pub fn upsert_surah(conn: &Connection, surah: &Surah) -> Result<()> {
        conn.execute(
            "INSERT INTO surahs (number, name_arabic, name_english, revelation_type, verses_count, revelation_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(number) DO UPDATE SET name_arabic = ?2, name_english = ?3,
                 revelation_type = ?4, verses_count = ?5, revelation_order = ?6",
            params![
                surah.number,
                surah.name_arabic,
                surah.name_english,
                surah.revelation_type.as_str(),
                surah.verses_count,
                surah.revelation_order,
            ],
        )?;
        Ok(())
    }

    pub fn parts(conn: &Connection) -> Result<Vec<QuranPart>> {
        let mut stmt = conn.prepare(
            "SELECT p.part_number, p.name,
                    (SELECT COUNT(*) FROM ayahs a WHERE a.part_number = p.part_number)
             FROM quran_parts p ORDER BY p.part_number",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(QuranPart {
                part_number: row.get(0)?,
                name: row.get(1)?,
                ayah_count: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn surahs(conn: &Connection) -> Result<Vec<Surah>> {
        let mut stmt = conn.prepare(&format!("SELECT {SURAH_COLUMNS} FROM surahs ORDER BY number"))?;
        let rows = stmt.query_map([], surah_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn surah(conn: &Connection, number: u32) -> Result<Option<Surah>> {
        conn.query_row(
            &format!("SELECT {SURAH_COLUMNS} FROM surahs WHERE number = ?1"),
            params![number],
            surah_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn search_surahs(conn: &Connection, needle: &str, limit: usize) -> Result<Vec<Surah>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SURAH_COLUMNS} FROM surahs
             WHERE name_arabic LIKE ?1 ESCAPE '\\' OR name_english LIKE ?1 ESCAPE '\\'
             ORDER BY number LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![like_pattern(needle), limit as i64], surah_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    /// Replace every ayah of one part with `records`.
    pub fn replace_part(conn: &Connection, part_number: u32, records: &[AyahRecord]) -> Result<usize> {
        conn.execute("DELETE FROM ayahs WHERE part_number = ?1", params![part_number])?;
        let mut stmt = conn.prepare(
            "INSERT INTO ayahs (surah_number, ayah_number, part_number, text_uthmani, text_simple, page)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5)
             ON CONFLICT(surah_number, ayah_number) DO UPDATE SET
                 part_number = ?3, text_uthmani = ?4, text_simple = ?4, page = ?5",
        )?;
        for r in records {
            stmt.execute(params![r.surah_number, r.ayah_number, r.part_number, r.text, r.page])?;
        }
        Ok(records.len())
    }

    pub fn ayahs_for_surah(conn: &Connection, surah: u32) -> Result<Vec<Ayah>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {AYAH_COLUMNS} FROM ayahs a WHERE a.surah_number = ?1 ORDER BY a.ayah_number"
        ))?;
        let rows = stmt.query_map(params![surah], ayah_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn ayahs_for_part(conn: &Connection, part: u32) -> Result<Vec<Ayah>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {AYAH_COLUMNS} FROM ayahs a WHERE a.part_number = ?1
             ORDER BY a.surah_number, a.ayah_number"
        ))?;
        let rows = stmt.query_map(params![part], ayah_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn ayah(conn: &Connection, surah: u32, ayah: u32) -> Result<Option<Ayah>> {
        conn.query_row(
            &format!("SELECT {AYAH_COLUMNS} FROM ayahs a WHERE a.surah_number = ?1 AND a.ayah_number = ?2"),
            params![surah, ayah],
            ayah_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set_ayah_text(conn: &Connection, id: i64, text: &str) -> Result<()> {
        conn.execute(
            "UPDATE ayahs SET text_uthmani = ?1, text_simple = ?1 WHERE id = ?2",
            params![text, id],
        )?;
        Ok(())
    }

    pub fn set_translation(conn: &Connection, surah: u32, ayah: u32, translation: &str) -> Result<bool> {
        let n = conn.execute(
            "UPDATE ayahs SET translation = ?1 WHERE surah_number = ?2 AND ayah_number = ?3",
            params![translation, surah, ayah],
        )?;
        Ok(n > 0)
    }

    /// One page of matches plus the total match count.
    pub fn search_ayahs(
        conn: &Connection,
        needle: &str,
        field: SearchIn,
        surah: Option<u32>,
        part: Option<u32>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Ayah>, i64)> {
        let text_clause = match field {
            SearchIn::Text => "(a.text_uthmani LIKE ?1 ESCAPE '\\' OR a.text_simple LIKE ?1 ESCAPE '\\')",
            SearchIn::Translation => "a.translation LIKE ?1 ESCAPE '\\'",
            SearchIn::Both => {
                "(a.text_uthmani LIKE ?1 ESCAPE '\\' OR a.text_simple LIKE ?1 ESCAPE '\\'
                  OR a.translation LIKE ?1 ESCAPE '\\')"
            }
        };
        let filter = format!(
            "{text_clause} AND (?2 IS NULL OR a.surah_number = ?2) AND (?3 IS NULL OR a.part_number = ?3)"
        );
        let pattern = like_pattern(needle);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM ayahs a WHERE {filter}"),
            params![pattern, surah, part],
            |row| row.get(0),
        )?;

        let offset = i64::try_from(page.saturating_sub(1).saturating_mul(per_page)).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&format!(
            "SELECT {AYAH_COLUMNS} FROM ayahs a WHERE {filter}
             ORDER BY a.surah_number, a.ayah_number LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt.query_map(
            params![pattern, surah, part, i64::try_from(per_page).unwrap_or(i64::MAX), offset],
            ayah_from_row,
        )?;
        let ayahs = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((ayahs, total))
    }

    pub fn count_table(conn: &Connection, table: QuranTable) -> Result<i64> {
        let sql = match table {
            QuranTable::Parts => "SELECT COUNT(*) FROM quran_parts",
            QuranTable::Surahs => "SELECT COUNT(*) FROM surahs",
            QuranTable::Ayahs => "SELECT COUNT(*) FROM ayahs",
        };
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(anyhow::Error::from)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum QuranTable {
    Parts,
    Surahs,
    Ayahs,
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

pub struct BookmarkRepo;

impl BookmarkRepo {
    /// Returns false when the ayah was already bookmarked.
    pub fn add(conn: &Connection, user_id: i64, surah: u32, ayah: u32, note: Option<&str>) -> Result<bool> {
        let n = conn.execute(
            "INSERT OR IGNORE INTO bookmarks (user_id, surah_number, ayah_number, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, surah, ayah, note, now_timestamp()],
        )?;
        Ok(n > 0)
    }

    pub fn list(conn: &Connection, user_id: i64) -> Result<Vec<Bookmark>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, surah_number, ayah_number, note, created_at
             FROM bookmarks WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Bookmark {
                id: row.get(0)?,
                user_id: row.get(1)?,
                surah_number: row.get(2)?,
                ayah_number: row.get(3)?,
                note: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn remove(conn: &Connection, user_id: i64, surah: u32, ayah: u32) -> Result<bool> {
        let n = conn.execute(
            "DELETE FROM bookmarks WHERE user_id = ?1 AND surah_number = ?2 AND ayah_number = ?3",
            params![user_id, surah, ayah],
        )?;
        Ok(n > 0)
    }
}

// ─── Reading settings ────────────────────────────────────────────────────────

pub struct ReadingSettingsRepo;

impl ReadingSettingsRepo {
    pub fn get(conn: &Connection, user_id: i64) -> Result<Option<ReadingSettings>> {
        conn.query_row(
            "SELECT user_id, font_type, font_size, theme, show_translation, last_read_surah, last_read_ayah
             FROM reading_settings WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(ReadingSettings {
                    user_id: row.get(0)?,
                    font_type: parse_column(1, row.get(1)?)?,
                    font_size: row.get(2)?,
                    theme: parse_column(3, row.get(3)?)?,
                    show_translation: row.get(4)?,
                    last_read_surah: row.get(5)?,
                    last_read_ayah: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn save(conn: &Connection, s: &ReadingSettings) -> Result<()> {
        conn.execute(
            "INSERT INTO reading_settings (user_id, font_type, font_size, theme, show_translation,
                    last_read_surah, last_read_ayah)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET font_type = ?2, font_size = ?3, theme = ?4,
                    show_translation = ?5, last_read_surah = ?6, last_read_ayah = ?7",
            params![
                s.user_id,
                s.font_type.as_str(),
                s.font_size,
                s.theme.as_str(),
                s.show_translation,
                s.last_read_surah,
                s.last_read_ayah,
            ],
        )?;
        Ok(())
    }
}
