use anyhow::Result;
use chrono::{Days, NaiveDate};
use log::{debug, info};
use rusqlite::Connection;

use crate::db::repository::{DeceasedRepo, KhatmaRepo, Related};
use crate::error::KhatmaError;
use crate::models::{
    Deceased, Khatma, KhatmaType, NewDeceased, NewKhatma, NotificationType, User, Visibility,
};
use crate::utils::time::{date_string, today};

use super::{accounts, khatmas, notifications};

/// Days a scheduled memorial campaign aims to finish in.
const MEMORIAL_TARGET_DAYS: u64 = 30;

pub fn add(conn: &Connection, actor: &User, mut new: NewDeceased) -> Result<Deceased> {
    new.name = new.name.trim().to_string();
    if new.name.is_empty() {
        return Err(KhatmaError::invalid("name must not be empty"));
    }
    if new.death_date > today() {
        return Err(KhatmaError::invalid("date of death cannot be in the future"));
    }
    if new.birth_date.is_some_and(|b| b > new.death_date) {
        return Err(KhatmaError::invalid("date of birth must come before date of death"));
    }
    if DeceasedRepo::find_by_name(conn, &new.name)?.is_some() {
        return Err(KhatmaError::exists(format!("memorial record '{}'", new.name)));
    }
    let id = DeceasedRepo::insert(conn, actor.id, &new)?;
    info!("{} added memorial record #{}", actor.username, id);
    DeceasedRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("deceased #{}", id)))
}

pub fn list(conn: &Connection, actor: &User) -> Result<Vec<Deceased>> {
    DeceasedRepo::list_by(conn, actor.id)
}

/// A record the actor added, looked up by id or exact name.
pub fn get(conn: &Connection, actor: &User, key: &str) -> Result<Deceased> {
    let key = key.trim();
    let found = match key.parse::<i64>() {
        Ok(id) => DeceasedRepo::get(conn, id)?,
        Err(_) => DeceasedRepo::find_by_name(conn, key)?,
    };
    let record = found.ok_or_else(|| KhatmaError::not_found(format!("memorial record '{}'", key)))?;
    if record.added_by != actor.id {
        return Err(KhatmaError::denied(format!("'{}' was added by someone else", record.name)));
    }
    Ok(record)
}

pub fn delete(conn: &Connection, actor: &User, key: &str) -> Result<()> {
    let record = get(conn, actor, key)?;
    DeceasedRepo::delete(conn, record.id)?;
    info!("{} deleted memorial record #{}", actor.username, record.id);
    Ok(())
}

fn memorial_title(record: &Deceased, on: NaiveDate) -> String {
    format!("Memorial khatma for {} ({})", record.name, date_string(on))
}

/// Start a public memorial campaign for every record due on `on`.
///
/// Titles carry the date, so running twice on the same day creates nothing new.
pub fn run_memorials(conn: &Connection, on: NaiveDate) -> Result<Vec<Khatma>> {
    let mut created = Vec::new();
    for record in DeceasedRepo::list_with_memorials(conn)? {
        if !record.is_memorial_due(on) {
            continue;
        }
        let title = memorial_title(&record, on);
        if KhatmaRepo::find_by_title(conn, &title)?.is_some() {
            debug!("memorial '{}' already started", title);
            continue;
        }
        let owner = accounts::require_id(conn, record.added_by)?;

        let mut new = NewKhatma::new(title);
        new.khatma_type = KhatmaType::Memorial;
        new.visibility = Visibility::Public;
        new.deceased_id = Some(record.id);
        new.description = Some(format!(
            "{} memorial for {}",
            record.memorial_frequency.display_name(),
            record.name
        ));
        new.start_date = Some(date_string(on));
        new.target_completion_date = on
            .checked_add_days(Days::new(MEMORIAL_TARGET_DAYS))
            .map(date_string);

        let khatma = khatmas::create(conn, &owner, new)?;
        notifications::notify(
            conn,
            owner.id,
            NotificationType::MemorialKhatma,
            &format!("A memorial khatma for {} has started", record.name),
            Related::khatma(khatma.id),
        )?;
        info!("started memorial khatma #{} for deceased #{}", khatma.id, record.id);
        created.push(khatma);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemorialFrequency;
    use crate::services::testing::{db, user};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(name: &str, frequency: MemorialFrequency) -> NewDeceased {
        NewDeceased {
            name: name.into(),
            death_date: date(2020, 3, 14),
            birth_date: Some(date(1940, 6, 1)),
            relation: Some("grandfather".into()),
            biography: None,
            memorial_day: true,
            memorial_frequency: frequency,
        }
    }

    #[test]
    fn add_validates_and_owns() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let d = add(&conn, &a, record("Ibrahim", MemorialFrequency::Yearly)).unwrap();
        assert_eq!(d.age_at_death(), Some(79));
        assert!(add(&conn, &a, record("Ibrahim", MemorialFrequency::Yearly)).is_err());

        let mut bad = record("Later", MemorialFrequency::Yearly);
        bad.birth_date = Some(date(2021, 1, 1));
        assert!(add(&conn, &a, bad).is_err());

        assert_eq!(get(&conn, &a, "Ibrahim").unwrap().id, d.id);
        assert!(get(&conn, &b, &d.id.to_string()).is_err());
        assert!(delete(&conn, &b, "Ibrahim").is_err());
        delete(&conn, &a, "Ibrahim").unwrap();
        assert!(list(&conn, &a).unwrap().is_empty());
    }

    #[test]
    fn yearly_memorial_runs_once_per_day() {
        let conn = db();
        let a = user(&conn, "aisha");
        add(&conn, &a, record("Ibrahim", MemorialFrequency::Yearly)).unwrap();

        assert!(run_memorials(&conn, date(2024, 3, 13)).unwrap().is_empty());
        let created = run_memorials(&conn, date(2024, 3, 14)).unwrap();
        assert_eq!(created.len(), 1);
        let k = &created[0];
        assert_eq!(k.khatma_type, KhatmaType::Memorial);
        assert!(k.is_public());
        assert_eq!(k.target_completion_date.as_deref(), Some("2024-04-13"));
        assert!(run_memorials(&conn, date(2024, 3, 14)).unwrap().is_empty());

        let feed = notifications::list(&conn, &a, true, 5).unwrap();
        assert_eq!(feed[0].notification_type, NotificationType::MemorialKhatma);
    }

    #[test]
    fn disabled_records_are_ignored() {
        let conn = db();
        let a = user(&conn, "aisha");
        let mut r = record("Khadija", MemorialFrequency::Daily);
        r.memorial_day = false;
        add(&conn, &a, r).unwrap();
        assert!(run_memorials(&conn, date(2024, 1, 1)).unwrap().is_empty());
    }
}
