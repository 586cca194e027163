use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::db::repository::{AyahRecord, QuranRepo};

use super::juz::part_for_ayah;
use super::surahs::verse_count;

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub lines_read: usize,
    pub ayahs_imported: usize,
    pub skipped: usize,
    /// Ayahs written per part; parts with nothing to import are absent.
    pub per_part: BTreeMap<u32, usize>,
}

/// Import a `surah|ayah|text` file.
pub fn import_file(conn: &mut Connection, path: &Path, only_parts: &[u32]) -> Result<ImportReport> {
    let file = File::open(path).with_context(|| format!("Opening Qur'an text {:?}", path))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .with_context(|| format!("Reading {:?}", path))?;
    import_lines(conn, lines.iter().map(String::as_str), only_parts)
}

/// Parse lines and replace the ayahs of every touched part, one transaction per part.
///
/// An empty `only_parts` means all thirty.
pub fn import_lines<'a>(
    conn: &mut Connection,
    lines: impl IntoIterator<Item = &'a str>,
    only_parts: &[u32],
) -> Result<ImportReport> {
    let wanted: BTreeSet<u32> = only_parts.iter().copied().collect();
    let mut report = ImportReport::default();
    let mut by_part: BTreeMap<u32, Vec<AyahRecord>> = BTreeMap::new();

    for (n, line) in lines.into_iter().enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        report.lines_read += 1;
        match parse_line(line) {
            Some(record) => {
                if wanted.is_empty() || wanted.contains(&record.part_number) {
                    by_part.entry(record.part_number).or_default().push(record);
                }
            }
            None => {
                warn!("skipping malformed line {}: {:?}", n + 1, line);
                report.skipped += 1;
            }
        }
    }

    for (part, records) in by_part {
        let tx = conn.transaction()?;
        let written = QuranRepo::replace_part(&tx, part, &records)?;
        tx.commit()?;
        debug!("part {}: {} ayahs", part, written);
        report.ayahs_imported += written;
        report.per_part.insert(part, written);
    }

    info!(
        "imported {} ayahs from {} lines ({} skipped)",
        report.ayahs_imported, report.lines_read, report.skipped
    );
    Ok(report)
}

/// `None` for any line that is not a well-formed, in-range verse.
fn parse_line(line: &str) -> Option<AyahRecord> {
    let fields: Vec<&str> = line.split('|').collect();
    let [surah, ayah, text] = fields.as_slice() else {
        return None;
    };
    let surah: u32 = surah.trim().parse().ok()?;
    let ayah: u32 = ayah.trim().parse().ok()?;
    let text = text.trim();
    if ayah == 0 || ayah > verse_count(surah)? || text.is_empty() {
        return None;
    }
    Some(AyahRecord {
        surah_number: surah,
        ayah_number: ayah,
        part_number: part_for_ayah(surah, ayah),
        text: text.to_string(),
        // roughly fifteen ayahs to a page
        page: 1 + ayah / 15,
    })
}

const BASMALA: [&str; 3] = [
    "بِسْمِ اللَّهِ الرَّحْمَـٰنِ الرَّحِيمِ",
    "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ",
    "بسم الله الرحمن الرحيم",
];

/// Drop the leading basmala from each surah's first ayah.
///
/// Surah 1 keeps it (there it is the first ayah) and surah 9 never has one.
/// Returns how many ayahs changed.
pub fn strip_bismillah(conn: &Connection) -> Result<usize> {
    let mut changed = 0;
    for surah in (2..=114u32).filter(|&s| s != 9) {
        let Some(ayah) = QuranRepo::ayah(conn, surah, 1)? else {
            debug!("surah {} has no first ayah loaded", surah);
            continue;
        };
        if let Some(rest) = without_basmala(&ayah.text_uthmani) {
            QuranRepo::set_ayah_text(conn, ayah.id, rest)?;
            changed += 1;
        }
    }
    info!("removed basmala from {} surahs", changed);
    Ok(changed)
}

fn without_basmala(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    BASMALA.iter().find_map(|b| {
        let rest = trimmed.strip_prefix(b)?.trim();
        (!rest.is_empty()).then_some(rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use std::io::Write;

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(parse_line("1|1|الحمد").is_some());
        assert!(parse_line("1|1").is_none());
        assert!(parse_line("1|1|a|b").is_none());
        assert!(parse_line("x|1|text").is_none());
        assert!(parse_line("115|1|text").is_none());
        assert!(parse_line("1|8|text").is_none());
        assert!(parse_line("1|0|text").is_none());
    }

    #[test]
    fn parse_assigns_part() {
        let rec = parse_line("2|142|سَيَقُولُ").unwrap();
        assert_eq!(rec.part_number, 2);
        assert_eq!(rec.page, 10);
    }

    #[test]
    fn import_counts_and_filters() {
        let mut conn = open_in_memory().unwrap();
        let lines = ["1|1|a", "1|2|b", "78|1|c", "bogus", "2|300|d", ""];
        let report = import_lines(&mut conn, lines, &[]).unwrap();
        assert_eq!(report.lines_read, 5);
        assert_eq!(report.ayahs_imported, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.per_part.get(&1), Some(&2));
        assert_eq!(report.per_part.get(&30), Some(&1));

        let report = import_lines(&mut conn, ["1|1|x", "78|1|y"], &[30]).unwrap();
        assert_eq!(report.ayahs_imported, 1);
        let ayah = QuranRepo::ayah(&conn, 1, 1).unwrap().unwrap();
        assert_eq!(ayah.text_uthmani, "a");
    }

    #[test]
    fn reimport_replaces_part() {
        let mut conn = open_in_memory().unwrap();
        import_lines(&mut conn, ["1|1|a", "1|2|b"], &[]).unwrap();
        import_lines(&mut conn, ["1|1|z"], &[]).unwrap();
        assert_eq!(QuranRepo::ayahs_for_part(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn import_from_file() {
        let mut conn = open_in_memory().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "114|1|قُلْ أَعُوذُ بِرَبِّ النَّاسِ").unwrap();
        writeln!(file, "114|2|مَلِكِ النَّاسِ").unwrap();
        let report = import_file(&mut conn, file.path(), &[]).unwrap();
        assert_eq!(report.ayahs_imported, 2);
        assert!(import_file(&mut conn, Path::new("/no/such/file"), &[]).is_err());
    }

    #[test]
    fn strip_skips_fatiha_and_tawba() {
        let mut conn = open_in_memory().unwrap();
        let b = BASMALA[0];
        let lines = [
            format!("1|1|{b}"),
            format!("2|1|{b} الم"),
            format!("9|1|بَرَاءَةٌ"),
            format!("112|1|{b} قُلْ هُوَ اللَّهُ أَحَدٌ"),
        ];
        import_lines(&mut conn, lines.iter().map(String::as_str), &[]).unwrap();
        assert_eq!(strip_bismillah(&conn).unwrap(), 2);
        assert_eq!(QuranRepo::ayah(&conn, 2, 1).unwrap().unwrap().text_uthmani, "الم");
        assert_eq!(QuranRepo::ayah(&conn, 1, 1).unwrap().unwrap().text_uthmani, b);
        // second pass finds nothing left to strip
        assert_eq!(strip_bismillah(&conn).unwrap(), 0);
    }
}
