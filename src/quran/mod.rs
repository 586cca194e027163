//! Qur'an reference data: the 30 parts, the 114 surahs, juz boundaries and
//! the text import pipeline.

pub mod import;
pub mod juz;
pub mod surahs;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::repository::QuranRepo;
use crate::models::Surah;

pub use import::{import_file, import_lines, strip_bismillah, ImportReport};
pub use juz::{part_bounds, part_for_ayah, part_name};
pub use surahs::verse_count;

/// Insert or refresh the part names and the surah table. Safe to rerun.
pub fn seed_reference(conn: &Connection) -> Result<()> {
    for (i, name) in juz::PART_NAMES.iter().enumerate() {
        QuranRepo::upsert_part(conn, i as u32 + 1, name)?;
    }
    for row in surahs::SURAHS.iter() {
        QuranRepo::upsert_surah(conn, &surah_from_row(row))?;
    }
    Ok(())
}

fn surah_from_row(row: &surahs::SurahRow) -> Surah {
    let &(number, arabic, english, revelation_type, verses_count, revelation_order) = row;
    Surah {
        number,
        name_arabic: arabic.to_string(),
        name_english: english.to_string(),
        revelation_type,
        verses_count,
        revelation_order,
    }
}
