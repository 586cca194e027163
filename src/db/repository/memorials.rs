use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{parse_column, Deceased, NewDeceased};
use crate::utils::time::{date_string, now_timestamp, parse_date};

use super::users::like_pattern;

const DECEASED_COLUMNS: &str = "id, name, death_date, birth_date, relation, biography,
    memorial_day, memorial_frequency, added_by, created_at";

fn deceased_from_row(row: &Row<'_>) -> rusqlite::Result<Deceased> {
    let death: String = row.get(2)?;
    let birth: Option<String> = row.get(3)?;
    Ok(Deceased {
        id: row.get(0)?,
        name: row.get(1)?,
        death_date: parse_date(&death).map_err(|e| conversion_error(2, e))?,
        birth_date: birth
            .map(|b| parse_date(&b))
            .transpose()
            .map_err(|e| conversion_error(3, e))?,
        relation: row.get(4)?,
        biography: row.get(5)?,
        memorial_day: row.get(6)?,
        memorial_frequency: parse_column(7, row.get(7)?)?,
        added_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn conversion_error(idx: usize, e: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(e.to_string()),
    )
}

pub struct DeceasedRepo;

impl DeceasedRepo {
    pub fn insert(conn: &Connection, added_by: i64, new: &NewDeceased) -> Result<i64> {
        conn.execute(
            "INSERT INTO deceased (name, death_date, birth_date, relation, biography, memorial_day,
                    memorial_frequency, added_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.name,
                date_string(new.death_date),
                new.birth_date.map(date_string),
                new.relation,
                new.biography,
                new.memorial_day,
                new.memorial_frequency.as_str(),
                added_by,
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Deceased>> {
        conn.query_row(
            &format!("SELECT {DECEASED_COLUMNS} FROM deceased WHERE id = ?1"),
            params![id],
            deceased_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Deceased>> {
        conn.query_row(
            &format!("SELECT {DECEASED_COLUMNS} FROM deceased WHERE name = ?1"),
            params![name],
            deceased_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn list_by(conn: &Connection, user_id: i64) -> Result<Vec<Deceased>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DECEASED_COLUMNS} FROM deceased WHERE added_by = ?1 ORDER BY death_date DESC, id"
        ))?;
        let rows = stmt.query_map(params![user_id], deceased_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn list_with_memorials(conn: &Connection) -> Result<Vec<Deceased>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DECEASED_COLUMNS} FROM deceased WHERE memorial_day = 1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([], deceased_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn search(conn: &Connection, needle: &str, limit: usize) -> Result<Vec<Deceased>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DECEASED_COLUMNS} FROM deceased WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![like_pattern(needle), limit as i64], deceased_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM deceased WHERE id = ?1", params![id])?;
        Ok(())
    }
}
