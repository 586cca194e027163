use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;

use crate::db::repository::{ProfileRepo, Related, UserRepo};
use crate::error::KhatmaError;
use crate::models::{AccountType, NotificationType, Profile, ReadingPreference, User};
use crate::utils::time::{date_string, parse_date};

use super::notifications;

/// Partial profile edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub account_type: Option<AccountType>,
    pub preferred_language: Option<String>,
    pub reading_preference: Option<ReadingPreference>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(KhatmaError::invalid("username must not be empty"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(KhatmaError::invalid("username must not contain spaces"));
    }
    Ok(())
}

fn clean_email(email: Option<&str>) -> Result<Option<String>> {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
        None => Ok(None),
        Some(e) if e.contains('@') => Ok(Some(e.to_string())),
        Some(e) => Err(KhatmaError::invalid(format!("'{}' is not an email address", e))),
    }
}

pub fn register(
    conn: &Connection,
    username: &str,
    display_name: &str,
    email: Option<&str>,
) -> Result<User> {
    let username = username.trim();
    validate_username(username)?;
    if UserRepo::find_by_username(conn, username)?.is_some() {
        return Err(KhatmaError::exists(format!("user '{}'", username)));
    }
    let email = clean_email(email)?;

    let tx = conn.unchecked_transaction()?;
    let id = UserRepo::insert(&tx, username, display_name.trim(), email.as_deref())?;
    ProfileRepo::create(&tx, id)?;
    notifications::settings(&tx, id)?;
    tx.commit()?;

    let user = require_id(conn, id)?;
    notifications::notify(
        conn,
        id,
        NotificationType::Welcome,
        &format!("Welcome to Khatma, {}!", user.label()),
        Related::default(),
    )?;
    info!("registered user {}", username);
    Ok(user)
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    UserRepo::find_by_username(conn, username.trim())
}

pub fn require(conn: &Connection, username: &str) -> Result<User> {
    find_by_username(conn, username)?
        .ok_or_else(|| KhatmaError::not_found(format!("user '{}'", username.trim())))
}

pub fn require_id(conn: &Connection, id: i64) -> Result<User> {
    UserRepo::get(conn, id)?.ok_or_else(|| KhatmaError::not_found(format!("user #{}", id)))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    UserRepo::list(conn)
}

pub fn profile(conn: &Connection, user: &User) -> Result<Profile> {
    if let Some(p) = ProfileRepo::get(conn, user.id)? {
        return Ok(p);
    }
    ProfileRepo::create(conn, user.id)?;
    ProfileRepo::get(conn, user.id)?
        .ok_or_else(|| KhatmaError::not_found(format!("profile of {}", user.username)))
}

pub fn update_profile(conn: &Connection, user: &User, update: ProfileUpdate) -> Result<(User, Profile)> {
    let mut profile = profile(conn, user)?;
    let display_name = update.display_name.unwrap_or_else(|| user.display_name.clone());
    let email = match update.email {
        Some(e) => clean_email(Some(&e))?,
        None => user.email.clone(),
    };
    UserRepo::update_identity(conn, user.id, display_name.trim(), email.as_deref())?;

    if let Some(t) = update.account_type {
        profile.account_type = t;
    }
    if let Some(lang) = update.preferred_language {
        profile.preferred_language = lang;
    }
    if let Some(pref) = update.reading_preference {
        profile.reading_preference = pref;
    }
    if let Some(bio) = update.bio {
        profile.bio = Some(bio).filter(|b| !b.trim().is_empty());
    }
    if let Some(loc) = update.location {
        profile.location = Some(loc).filter(|l| !l.trim().is_empty());
    }
    ProfileRepo::save(conn, &profile)?;
    Ok((require_id(conn, user.id)?, profile))
}

/// Advance the consecutive-day streak for activity on `today`.
pub fn record_activity(conn: &Connection, user_id: i64, today: NaiveDate) -> Result<i64> {
    let user = require_id(conn, user_id)?;
    let mut profile = profile(conn, &user)?;
    let last = profile
        .last_activity_date
        .as_deref()
        .and_then(|d| parse_date(d).ok());

    profile.consecutive_days = match last {
        Some(d) if d == today => return Ok(profile.consecutive_days),
        Some(d) if today.pred_opt() == Some(d) => profile.consecutive_days + 1,
        _ => 1,
    };
    profile.last_activity_date = Some(date_string(today));
    ProfileRepo::save(conn, &profile)?;
    Ok(profile.consecutive_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::domain_error;
    use crate::services::testing::db;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn register_creates_profile_and_welcome() {
        let conn = db();
        let u = register(&conn, "yusuf", "Yusuf", Some("y@example.org")).unwrap();
        let p = profile(&conn, &u).unwrap();
        assert_eq!(p.level, 1);
        let feed = notifications::list(&conn, &u, false, 10).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].notification_type, NotificationType::Welcome);
    }

    #[test]
    fn register_rejects_bad_names() {
        let conn = db();
        register(&conn, "maryam", "", None).unwrap();
        let dup = register(&conn, "maryam", "", None).unwrap_err();
        assert!(matches!(domain_error(&dup), Some(KhatmaError::AlreadyExists(_))));
        assert!(register(&conn, "two words", "", None).is_err());
        assert!(register(&conn, "  ", "", None).is_err());
        assert!(register(&conn, "x", "", Some("not-an-email")).is_err());
    }

    #[test]
    fn require_reports_not_found() {
        let conn = db();
        let err = require(&conn, "ghost").unwrap_err();
        assert!(matches!(domain_error(&err), Some(KhatmaError::NotFound(_))));
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let conn = db();
        let u = register(&conn, "zaid", "", None).unwrap();
        assert_eq!(record_activity(&conn, u.id, day(1)).unwrap(), 1);
        assert_eq!(record_activity(&conn, u.id, day(1)).unwrap(), 1);
        assert_eq!(record_activity(&conn, u.id, day(2)).unwrap(), 2);
        assert_eq!(record_activity(&conn, u.id, day(3)).unwrap(), 3);
        assert_eq!(record_activity(&conn, u.id, day(5)).unwrap(), 1);
    }

    #[test]
    fn update_profile_is_partial() {
        let conn = db();
        let u = register(&conn, "khalid", "Khalid", Some("k@example.org")).unwrap();
        let (u2, p) = update_profile(
            &conn,
            &u,
            ProfileUpdate {
                account_type: Some(AccountType::Mosque),
                location: Some("Cairo".into()),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(u2.email.as_deref(), Some("k@example.org"));
        assert_eq!(u2.display_name, "Khalid");
        assert_eq!(p.account_type, AccountType::Mosque);
        assert_eq!(p.location.as_deref(), Some("Cairo"));
    }
}
