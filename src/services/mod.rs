//! Rule-checked operations. Each function acts on behalf of a user, checks
//! the campaign/group rules, writes through the repositories and emits
//! notifications.

pub mod accounts;
pub mod achievements;
pub mod chat;
pub mod dashboard;
pub mod distribution;
pub mod groups;
pub mod khatmas;
pub mod memorials;
pub mod notifications;
pub mod reader;
pub mod reminders;

use std::sync::OnceLock;

use crate::config::AppConfig;

/// Process-wide knobs taken from the config file at startup.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub from_email: String,
    pub deliver_external: bool,
    pub hijri_offset: i32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            from_email: "noreply@khatma.local".to_string(),
            deliver_external: true,
            hijri_offset: 0,
        }
    }
}

static OPTIONS: OnceLock<RuntimeOptions> = OnceLock::new();

/// Install options from the loaded config. Later calls are ignored.
pub fn configure(config: &AppConfig) {
    let _ = OPTIONS.set(RuntimeOptions {
        from_email: config.notifications.from_email.clone(),
        deliver_external: config.notifications.deliver_external,
        hijri_offset: config.display.hijri_offset,
    });
}

pub fn options() -> &'static RuntimeOptions {
    OPTIONS.get_or_init(RuntimeOptions::default)
}

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::Connection;

    use crate::db::open_in_memory;
    use crate::models::User;

    use super::accounts;

    pub fn db() -> Connection {
        open_in_memory().unwrap()
    }

    pub fn user(conn: &Connection, name: &str) -> User {
        accounts::register(conn, name, name, Some(&format!("{name}@example.org"))).unwrap()
    }
}
