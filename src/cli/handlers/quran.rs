use anyhow::Result;
use std::path::PathBuf;

use crate::cli::args::QuranCommands;
use crate::db::repository::MetaRepo;
use crate::error::KhatmaError;
use crate::models::{Ayah, Surah};
use crate::quran::{import_file, part_bounds, strip_bismillah};
use crate::services::reader;
use crate::utils::format::short_date;
use crate::utils::time::now_timestamp;

use super::{check, heading, opt, Session, AMBER, BOLD, DIM, GOLD, GREEN, RED};

const IMPORTED_AT_KEY: &str = "quran_imported_at";

pub fn handle_quran(s: &mut Session, action: &QuranCommands) -> Result<()> {
    match action {
        QuranCommands::Import { path, parts } => handle_import(s, path.clone(), parts),
        other => handle_read(s, other),
    }
}

fn handle_import(s: &mut Session, path: Option<PathBuf>, parts: &[u32]) -> Result<()> {
    let path = path
        .or_else(|| s.config.quran.text_path.clone())
        .ok_or_else(|| KhatmaError::invalid("no text file given and no [quran] text_path configured"))?;
    let report = import_file(&mut s.conn, &path, parts)?;
    MetaRepo::set(&s.conn, IMPORTED_AT_KEY, &now_timestamp())?;
    if s.emit(&report)? {
        return Ok(());
    }
    println_colored!(
        GREEN,
        "  ✓ Imported {} ayahs from {} lines into {} parts",
        report.ayahs_imported,
        report.lines_read,
        report.per_part.len()
    );
    if report.skipped > 0 {
        println_colored!(AMBER, "  {} lines skipped (run with RUST_LOG=khatma=warn for details)", report.skipped);
    }
    Ok(())
}

fn handle_read(s: &Session, action: &QuranCommands) -> Result<()> {
    let conn = &s.conn;
    let lang = s.config.display.language.as_str();
    match action {
        QuranCommands::Import { .. } => unreachable!(),
        QuranCommands::StripBismillah => {
            let changed = strip_bismillah(conn)?;
            println_colored!(GREEN, "  ✓ Basmala removed from {} surahs", changed);
        }
        QuranCommands::Status => {
            let status = reader::status(conn)?;
            if s.emit(&status)? {
                return Ok(());
            }
            heading("Qur'an data");
            println!("  Parts:   {}/30", status.parts);
            println!("  Surahs:  {}/114", status.surahs);
            println!("  Ayahs:   {}/{}", status.ayahs, reader::TOTAL_AYAHS);
            let imported = MetaRepo::get(conn, IMPORTED_AT_KEY)?;
            println_colored!(DIM, "  Last import: {}", opt(imported.as_deref()));
            println!();
            if status.is_complete() {
                println_colored!(GREEN, "  ✓ Complete text loaded");
            } else {
                let missing = status.missing_parts();
                if !missing.is_empty() {
                    let list: Vec<String> = missing.iter().map(u32::to_string).collect();
                    println_colored!(RED, "  Parts with no text: {}", list.join(", "));
                }
                println_colored!(AMBER, "  Load text with `khatma quran import <file>`");
            }
            println!();
        }
        QuranCommands::Surahs => {
            let list = reader::surahs(conn)?;
            if s.emit(&list)? {
                return Ok(());
            }
            heading("Surahs");
            for surah in &list {
                println!(
                    "  {:>3}  {:<24} {:>3} ayahs  {}",
                    surah.number,
                    surah.name_for(lang),
                    surah.verses_count,
                    surah.revelation_type.display_name()
                );
            }
            println!();
        }
        QuranCommands::Surah { number } => {
            let detail = reader::surah_detail(conn, *number)?;
            if s.emit(&detail)? {
                return Ok(());
            }
            let show_translation = match s.actor() {
                Ok(user) => reader::reading_settings(conn, &user)?.show_translation,
                Err(_) => true,
            };
            heading(&surah_title(&detail.surah));
            print_ayahs(&detail.ayahs, show_translation);
            let nav = |x: &Option<Surah>| x.as_ref().map(|n| format!("{}. {}", n.number, n.name_for(lang)));
            println_colored!(
                DIM,
                "  ← {}   → {}",
                nav(&detail.previous).unwrap_or_default(),
                nav(&detail.next).unwrap_or_default()
            );
            println!();
        }
        QuranCommands::Part { number } => {
            let detail = reader::part_detail(conn, *number)?;
            if s.emit(&detail)? {
                return Ok(());
            }
            heading(&format!("Part {} · {}", detail.part.part_number, detail.part.name));
            if let Some(((surah, ayah), _)) = part_bounds(*number) {
                println_colored!(DIM, "  Begins at {}:{}", surah, ayah);
                println!();
            }
            if detail.sections.is_empty() {
                println_colored!(AMBER, "  No text loaded for this part");
            }
            for section in &detail.sections {
                println_colored!(GOLD, "  {}", surah_title(&section.surah));
                print_ayahs(&section.ayahs, true);
            }
        }
        QuranCommands::Search { text, field, surah, part, page } => {
            let found = reader::search(conn, text, *field, *surah, *part, *page)?;
            if s.emit(&found)? {
                return Ok(());
            }
            heading(&format!(
                "{} matches for \"{}\" (page {}/{})",
                found.total,
                text,
                found.page,
                found.pages.max(1)
            ));
            print_ayahs(&found.ayahs, true);
        }
        QuranCommands::Bookmark { surah, ayah, note } => {
            let user = s.actor()?;
            if reader::add_bookmark(conn, &user, *surah, *ayah, note.as_deref())? {
                println_colored!(GREEN, "  ✓ Bookmarked {}:{}", surah, ayah);
            } else {
                println_colored!(DIM, "  {}:{} is already bookmarked", surah, ayah);
            }
        }
        QuranCommands::Bookmarks => {
            let user = s.actor()?;
            let list = reader::bookmarks(conn, &user)?;
            if s.emit(&list)? {
                return Ok(());
            }
            heading("Bookmarks");
            for b in &list {
                println!(
                    "  {:>3}:{:<4} {}  {}",
                    b.surah_number,
                    b.ayah_number,
                    short_date(&b.created_at),
                    opt(b.note.as_deref())
                );
            }
            println!();
        }
        QuranCommands::Unbookmark { surah, ayah } => {
            let user = s.actor()?;
            reader::remove_bookmark(conn, &user, *surah, *ayah)?;
            println_colored!(AMBER, "  Bookmark {}:{} removed", surah, ayah);
        }
        QuranCommands::Settings { font, size, theme, translation } => {
            let user = s.actor()?;
            let mut settings = reader::reading_settings(conn, &user)?;
            let changed = font.is_some() || size.is_some() || theme.is_some() || translation.is_some();
            if let Some(f) = font {
                settings.font_type = *f;
            }
            if let Some(n) = size {
                settings.font_size = *n;
            }
            if let Some(t) = theme {
                settings.theme = *t;
            }
            if let Some(t) = translation {
                settings.show_translation = t.is_on();
            }
            if changed {
                reader::update_reading_settings(conn, &settings)?;
            }
            if s.emit(&settings)? {
                return Ok(());
            }
            heading("Reading settings");
            println!("  Font:         {} {}pt", settings.font_type.display_name(), settings.font_size);
            println!("  Theme:        {}", settings.theme.display_name());
            println!("  {} translation", check(settings.show_translation));
            if let (Some(surah), Some(ayah)) = (settings.last_read_surah, settings.last_read_ayah) {
                println!("  Last read:    {}:{}", surah, ayah);
            }
            println!();
        }
        QuranCommands::LastRead { surah, ayah } => {
            let user = s.actor()?;
            reader::mark_last_read(conn, &user, *surah, *ayah)?;
            println_colored!(GREEN, "  ✓ Last read set to {}:{}", surah, ayah);
        }
    }
    Ok(())
}

fn surah_title(surah: &Surah) -> String {
    format!(
        "{}. {} · {} ({} ayahs)",
        surah.number, surah.name_english, surah.name_arabic, surah.verses_count
    )
}

fn print_ayahs(ayahs: &[Ayah], show_translation: bool) {
    for a in ayahs {
        println!("  {}{:>7}\x1b[0m  {}", BOLD, a.reference(), a.text_uthmani);
        if show_translation {
            if let Some(t) = &a.translation {
                println_colored!(DIM, "           {}", t);
            }
        }
    }
    println!();
}
