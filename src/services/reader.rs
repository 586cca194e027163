use anyhow::Result;
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{
    BookmarkRepo, QuranRepo, QuranTable, ReadingSettingsRepo,
};
use crate::error::KhatmaError;
use crate::models::{Ayah, Bookmark, QuranPart, ReadingSettings, SearchIn, Surah, User};
use crate::quran::verse_count;

pub const SEARCH_PER_PAGE: usize = 20;
/// Verses in a complete text.
pub const TOTAL_AYAHS: i64 = 6236;
const FONT_SIZES: std::ops::RangeInclusive<u32> = 12..=72;

#[derive(Debug, Clone, Serialize)]
pub struct SurahDetail {
    pub surah: Surah,
    pub ayahs: Vec<Ayah>,
    pub previous: Option<Surah>,
    pub next: Option<Surah>,
}

/// The ayahs of one surah that fall inside a part.
#[derive(Debug, Clone, Serialize)]
pub struct SurahSection {
    pub surah: Surah,
    pub ayahs: Vec<Ayah>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartDetail {
    pub part: QuranPart,
    pub sections: Vec<SurahSection>,
    pub previous: Option<u32>,
    pub next: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub ayahs: Vec<Ayah>,
    pub total: i64,
    pub page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataStatus {
    pub parts: i64,
    pub surahs: i64,
    pub ayahs: i64,
    /// (part number, ayahs loaded)
    pub per_part: Vec<(u32, i64)>,
}

impl DataStatus {
    pub fn is_complete(&self) -> bool {
        self.parts == 30 && self.surahs == 114 && self.ayahs == TOTAL_AYAHS
    }

    pub fn missing_parts(&self) -> Vec<u32> {
        self.per_part.iter().filter(|(_, n)| *n == 0).map(|(p, _)| *p).collect()
    }
}

fn require_surah(conn: &Connection, number: u32) -> Result<Surah> {
    QuranRepo::surah(conn, number)?.ok_or_else(|| KhatmaError::not_found(format!("surah {}", number)))
}

fn require_ayah_ref(surah: u32, ayah: u32) -> Result<()> {
    let count = verse_count(surah).ok_or_else(|| KhatmaError::not_found(format!("surah {}", surah)))?;
    if ayah == 0 || ayah > count {
        return Err(KhatmaError::invalid(format!("surah {} has {} ayahs", surah, count)));
    }
    Ok(())
}

pub fn surahs(conn: &Connection) -> Result<Vec<Surah>> {
    QuranRepo::surahs(conn)
}

pub fn parts(conn: &Connection) -> Result<Vec<QuranPart>> {
    QuranRepo::parts(conn)
}

pub fn surah_detail(conn: &Connection, number: u32) -> Result<SurahDetail> {
    let surah = require_surah(conn, number)?;
    Ok(SurahDetail {
        ayahs: QuranRepo::ayahs_for_surah(conn, number)?,
        previous: match number.checked_sub(1) {
            Some(n) if n >= 1 => QuranRepo::surah(conn, n)?,
            _ => None,
        },
        next: QuranRepo::surah(conn, number + 1)?,
        surah,
    })
}

pub fn part_detail(conn: &Connection, number: u32) -> Result<PartDetail> {
    let part = QuranRepo::parts(conn)?
        .into_iter()
        .find(|p| p.part_number == number)
        .ok_or_else(|| KhatmaError::not_found(format!("part {}", number)))?;

    let mut sections: Vec<SurahSection> = Vec::new();
    for ayah in QuranRepo::ayahs_for_part(conn, number)? {
        match sections.last_mut() {
            Some(s) if s.surah.number == ayah.surah_number => s.ayahs.push(ayah),
            _ => {
                let surah = require_surah(conn, ayah.surah_number)?;
                sections.push(SurahSection { surah, ayahs: vec![ayah] });
            }
        }
    }
    Ok(PartDetail {
        part,
        sections,
        previous: (number > 1).then(|| number - 1),
        next: (number < 30).then(|| number + 1),
    })
}

pub fn search(
    conn: &Connection,
    query: &str,
    field: SearchIn,
    surah: Option<u32>,
    part: Option<u32>,
    page: usize,
) -> Result<SearchPage> {
    let query = query.trim();
    if query.is_empty() {
        return Err(KhatmaError::invalid("search text must not be empty"));
    }
    let page = page.max(1);
    let (ayahs, total) = QuranRepo::search_ayahs(conn, query, field, surah, part, page, SEARCH_PER_PAGE)?;
    debug!("search '{}' in {}: {} hits", query, field.as_str(), total);
    Ok(SearchPage {
        ayahs,
        total,
        page,
        pages: (total as usize).div_ceil(SEARCH_PER_PAGE),
    })
}

// ─── Bookmarks ───────────────────────────────────────────────────────────────

/// Returns false when the ayah was already bookmarked.
pub fn add_bookmark(conn: &Connection, user: &User, surah: u32, ayah: u32, note: Option<&str>) -> Result<bool> {
    require_ayah_ref(surah, ayah)?;
    BookmarkRepo::add(conn, user.id, surah, ayah, note.map(str::trim).filter(|n| !n.is_empty()))
}

pub fn bookmarks(conn: &Connection, user: &User) -> Result<Vec<Bookmark>> {
    BookmarkRepo::list(conn, user.id)
}

pub fn remove_bookmark(conn: &Connection, user: &User, surah: u32, ayah: u32) -> Result<()> {
    if !BookmarkRepo::remove(conn, user.id, surah, ayah)? {
        return Err(KhatmaError::not_found(format!("bookmark {}:{}", surah, ayah)));
    }
    Ok(())
}

// ─── Reading settings ────────────────────────────────────────────────────────

pub fn reading_settings(conn: &Connection, user: &User) -> Result<ReadingSettings> {
    Ok(ReadingSettingsRepo::get(conn, user.id)?.unwrap_or_else(|| ReadingSettings::defaults_for(user.id)))
}

pub fn update_reading_settings(conn: &Connection, settings: &ReadingSettings) -> Result<()> {
    if !FONT_SIZES.contains(&settings.font_size) {
        return Err(KhatmaError::invalid(format!(
            "font size must be between {} and {}",
            FONT_SIZES.start(),
            FONT_SIZES.end()
        )));
    }
    ReadingSettingsRepo::save(conn, settings)
}

pub fn mark_last_read(conn: &Connection, user: &User, surah: u32, ayah: u32) -> Result<ReadingSettings> {
    require_ayah_ref(surah, ayah)?;
    let mut settings = reading_settings(conn, user)?;
    settings.last_read_surah = Some(surah);
    settings.last_read_ayah = Some(ayah);
    ReadingSettingsRepo::save(conn, &settings)?;
    Ok(settings)
}

// ─── Data status ─────────────────────────────────────────────────────────────

pub fn status(conn: &Connection) -> Result<DataStatus> {
    Ok(DataStatus {
        parts: QuranRepo::count_table(conn, QuranTable::Parts)?,
        surahs: QuranRepo::count_table(conn, QuranTable::Surahs)?,
        ayahs: QuranRepo::count_table(conn, QuranTable::Ayahs)?,
        per_part: QuranRepo::parts(conn)?
            .into_iter()
            .map(|p| (p.part_number, p.ayah_count))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FontType;
    use crate::quran::import_lines;
    use crate::services::testing::{db, user};

    fn seeded() -> Connection {
        let mut conn = db();
        let lines = [
            "1|1|بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ",
            "1|2|الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ",
            "2|1|الم",
            "2|2|ذَٰلِكَ الْكِتَابُ لَا رَيْبَ فِيهِ",
            "2|142|سَيَقُولُ السُّفَهَاءُ",
        ];
        import_lines(&mut conn, lines.iter().copied(), &[]).unwrap();
        QuranRepo::set_translation(&conn, 1, 2, "All praise is for Allah, Lord of the worlds").unwrap();
        conn
    }

    #[test]
    fn surah_detail_links_neighbours() {
        let conn = seeded();
        let first = surah_detail(&conn, 1).unwrap();
        assert!(first.previous.is_none());
        assert_eq!(first.next.unwrap().number, 2);
        assert_eq!(first.ayahs.len(), 2);
        assert!(surah_detail(&conn, 115).is_err());
        assert!(surah_detail(&conn, 114).unwrap().next.is_none());
    }

    #[test]
    fn part_detail_groups_by_surah() {
        let conn = seeded();
        let one = part_detail(&conn, 1).unwrap();
        let numbers: Vec<u32> = one.sections.iter().map(|s| s.surah.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(one.previous, None);
        assert_eq!(one.next, Some(2));
        let two = part_detail(&conn, 2).unwrap();
        assert_eq!(two.sections[0].ayahs[0].ayah_number, 142);
        assert!(part_detail(&conn, 31).is_err());
    }

    #[test]
    fn search_by_field_and_filter() {
        let conn = seeded();
        let hits = search(&conn, "lord", SearchIn::Translation, None, None, 1).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.pages, 1);
        assert_eq!(hits.ayahs[0].reference(), "1:2");
        assert_eq!(search(&conn, "lord", SearchIn::Text, None, None, 1).unwrap().total, 0);
        assert_eq!(search(&conn, "الم", SearchIn::Both, Some(2), None, 1).unwrap().total, 1);
        assert_eq!(search(&conn, "الم", SearchIn::Both, None, Some(2), 1).unwrap().total, 0);
        assert!(search(&conn, " ", SearchIn::Both, None, None, 1).is_err());
    }

    #[test]
    fn far_pages_come_back_empty() {
        let conn = seeded();
        let hits = search(&conn, "lord", SearchIn::Translation, None, None, usize::MAX).unwrap();
        assert_eq!(hits.total, 1);
        assert!(hits.ayahs.is_empty());
        assert_eq!(hits.page, usize::MAX);

        let (ayahs, total) =
            QuranRepo::search_ayahs(&conn, "lord", SearchIn::Translation, None, None, 2, usize::MAX).unwrap();
        assert_eq!(total, 1);
        assert!(ayahs.is_empty());
    }

    #[test]
    fn bookmarks_are_unique_and_checked() {
        let conn = seeded();
        let u = user(&conn, "ruqayya");
        assert!(add_bookmark(&conn, &u, 2, 255, Some("Ayat al-Kursi")).unwrap());
        assert!(!add_bookmark(&conn, &u, 2, 255, None).unwrap());
        assert!(add_bookmark(&conn, &u, 1, 8, None).is_err());
        assert_eq!(bookmarks(&conn, &u).unwrap().len(), 1);
        remove_bookmark(&conn, &u, 2, 255).unwrap();
        assert!(remove_bookmark(&conn, &u, 2, 255).is_err());
    }

    #[test]
    fn settings_default_and_last_read() {
        let conn = seeded();
        let u = user(&conn, "hamza");
        let mut s = reading_settings(&conn, &u).unwrap();
        assert_eq!(s.font_type, FontType::Uthmani);
        s.font_size = 200;
        assert!(update_reading_settings(&conn, &s).is_err());
        s.font_size = 30;
        s.font_type = FontType::Naskh;
        update_reading_settings(&conn, &s).unwrap();

        let s = mark_last_read(&conn, &u, 18, 10).unwrap();
        assert_eq!(s.font_type, FontType::Naskh);
        assert_eq!((s.last_read_surah, s.last_read_ayah), (Some(18), Some(10)));
        assert!(mark_last_read(&conn, &u, 18, 111).is_err());
    }

    #[test]
    fn status_reports_counts() {
        let conn = seeded();
        let s = status(&conn).unwrap();
        assert_eq!((s.parts, s.surahs, s.ayahs), (30, 114, 5));
        assert!(!s.is_complete());
        assert_eq!(s.missing_parts().len(), 28);
    }
}
