use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites() {
        let conn = crate::db::open_in_memory().unwrap();
        assert_eq!(MetaRepo::get(&conn, "quran_imported_at").unwrap(), None);
        MetaRepo::set(&conn, "quran_imported_at", "a").unwrap();
        MetaRepo::set(&conn, "quran_imported_at", "b").unwrap();
        assert_eq!(MetaRepo::get(&conn, "quran_imported_at").unwrap().as_deref(), Some("b"));
    }
}
