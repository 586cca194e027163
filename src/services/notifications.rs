use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, warn};
use rusqlite::Connection;

use crate::db::repository::{NotificationRepo, OutboxRepo, Related, SettingsRepo, UserRepo};
use crate::error::KhatmaError;
use crate::models::{
    Channel, Delivery, DeliveryStatus, Notification, NotificationSettings, NotificationType, User,
};
use crate::utils::time;

use super::options;

/// An outward channel a notification can be handed to.
pub trait DeliveryChannel {
    fn channel(&self) -> Channel;

    /// Hand the notification over and record the attempt.
    fn deliver(&self, conn: &Connection, user: &User, notification: &Notification)
        -> Result<DeliveryStatus>;
}

fn subject_for(notification: &Notification) -> String {
    format!("[Khatma] {}", notification.notification_type.display_name())
}

/// Writes email hand-offs to the outbox; users without an address are skipped.
pub struct EmailChannel {
    pub from: String,
}

impl DeliveryChannel for EmailChannel {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn deliver(&self, conn: &Connection, user: &User, n: &Notification) -> Result<DeliveryStatus> {
        let subject = subject_for(n);
        let (recipient, status) = match user.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(addr) => (addr.to_string(), DeliveryStatus::Sent),
            None => (String::new(), DeliveryStatus::Skipped),
        };
        OutboxRepo::record(conn, n.id, Channel::Email, &recipient, &subject, status)?;
        debug!("email {} from {} to {:?}: {}", status.as_str(), self.from, recipient, subject);
        Ok(status)
    }
}

/// Writes push hand-offs to the outbox, addressed by username.
pub struct PushChannel;

impl DeliveryChannel for PushChannel {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    fn deliver(&self, conn: &Connection, user: &User, n: &Notification) -> Result<DeliveryStatus> {
        OutboxRepo::record(
            conn,
            n.id,
            Channel::Push,
            &user.username,
            &subject_for(n),
            DeliveryStatus::Sent,
        )?;
        Ok(DeliveryStatus::Sent)
    }
}

pub fn default_channels() -> Vec<Box<dyn DeliveryChannel>> {
    vec![
        Box::new(EmailChannel { from: options().from_email.clone() }),
        Box::new(PushChannel),
    ]
}

/// Store a notification in the user's feed and fan it out to external channels.
pub fn notify(
    conn: &Connection,
    user_id: i64,
    kind: NotificationType,
    message: &str,
    related: Related,
) -> Result<i64> {
    let channels = if options().deliver_external {
        default_channels()
    } else {
        Vec::new()
    };
    notify_at(conn, time::now(), &channels, user_id, kind, message, related)
}

/// `notify` with an explicit clock and channel set.
pub fn notify_at(
    conn: &Connection,
    now: NaiveDateTime,
    channels: &[Box<dyn DeliveryChannel>],
    user_id: i64,
    kind: NotificationType,
    message: &str,
    related: Related,
) -> Result<i64> {
    let id = NotificationRepo::insert(conn, user_id, kind, message, related)?;
    if channels.is_empty() {
        return Ok(id);
    }

    let settings = settings(conn, user_id)?;
    if settings.is_quiet_hours(now.time()) {
        debug!("quiet hours for user {}, holding external delivery of {}", user_id, id);
        return Ok(id);
    }

    let (Some(user), Some(notification)) = (UserRepo::get(conn, user_id)?, NotificationRepo::get(conn, id)?)
    else {
        return Ok(id);
    };
    for channel in channels {
        if !settings.should_notify(kind, channel.channel()) {
            debug!("{} disabled for {} ({})", channel.channel().as_str(), user.username, kind.as_str());
            continue;
        }
        if let Err(e) = channel.deliver(conn, &user, &notification) {
            warn!("{} delivery of notification {} failed: {}", channel.channel().as_str(), id, e);
            OutboxRepo::record(
                conn,
                id,
                channel.channel(),
                &user.username,
                &subject_for(&notification),
                DeliveryStatus::Failed,
            )?;
        }
    }
    Ok(id)
}

/// Notify several users with the same message.
pub fn notify_all(
    conn: &Connection,
    user_ids: impl IntoIterator<Item = i64>,
    kind: NotificationType,
    message: &str,
    related: Related,
) -> Result<usize> {
    let mut n = 0;
    for uid in user_ids {
        notify(conn, uid, kind, message, related)?;
        n += 1;
    }
    Ok(n)
}

// ─── Feed ────────────────────────────────────────────────────────────────────

pub fn list(conn: &Connection, user: &User, unread_only: bool, limit: usize) -> Result<Vec<Notification>> {
    NotificationRepo::list(conn, user.id, unread_only, limit)
}

fn owned(conn: &Connection, user: &User, id: i64) -> Result<Notification> {
    let n = NotificationRepo::get(conn, id)?
        .ok_or_else(|| KhatmaError::not_found(format!("notification {}", id)))?;
    if n.user_id != user.id {
        return Err(KhatmaError::not_found(format!("notification {}", id)));
    }
    Ok(n)
}

pub fn mark_read(conn: &Connection, user: &User, id: i64) -> Result<()> {
    owned(conn, user, id)?;
    NotificationRepo::mark_read(conn, id)
}

pub fn mark_all_read(conn: &Connection, user: &User) -> Result<usize> {
    NotificationRepo::mark_all_read(conn, user.id)
}

pub fn unread_count(conn: &Connection, user: &User) -> Result<i64> {
    NotificationRepo::unread_count(conn, user.id)
}

pub fn delete(conn: &Connection, user: &User, id: i64) -> Result<()> {
    owned(conn, user, id)?;
    NotificationRepo::delete(conn, id)
}

pub fn deliveries(conn: &Connection, user: &User, limit: usize) -> Result<Vec<Delivery>> {
    OutboxRepo::list_for_user(conn, user.id, limit)
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Stored settings, created with defaults on first access.
pub fn settings(conn: &Connection, user_id: i64) -> Result<NotificationSettings> {
    if let Some(s) = SettingsRepo::get(conn, user_id)? {
        return Ok(s);
    }
    let defaults = NotificationSettings::defaults_for(user_id);
    SettingsRepo::save(conn, &defaults)?;
    Ok(defaults)
}

pub fn update_settings(conn: &Connection, settings: &NotificationSettings) -> Result<()> {
    SettingsRepo::save(conn, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{db, user};
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn outbox(conn: &Connection, user: &User) -> Vec<Delivery> {
        OutboxRepo::list_for_user(conn, user.id, 100).unwrap()
    }

    #[test]
    fn fan_out_records_enabled_channels() {
        let conn = db();
        let u = user(&conn, "amina");
        let before = outbox(&conn, &u).len();
        notify_at(
            &conn, at(12), &default_channels(), u.id,
            NotificationType::PartAssigned, "part 3", Related::default(),
        )
        .unwrap();
        let all = outbox(&conn, &u);
        assert_eq!(all.len(), before + 2);
        let sent = &all[..2];
        assert!(sent.iter().any(|d| d.channel == Channel::Email && d.recipient == "amina@example.org"));
        assert!(sent.iter().any(|d| d.channel == Channel::Push && d.recipient == "amina"));
    }

    #[test]
    fn quiet_hours_hold_external_but_keep_feed() {
        let conn = db();
        let u = user(&conn, "bilal");
        let mut s = settings(&conn, u.id).unwrap();
        s.enable_quiet_hours = true;
        update_settings(&conn, &s).unwrap();
        let before = outbox(&conn, &u).len();
        let unread = unread_count(&conn, &u).unwrap();

        notify_at(
            &conn, at(23), &default_channels(), u.id,
            NotificationType::System, "late", Related::default(),
        )
        .unwrap();
        assert_eq!(outbox(&conn, &u).len(), before);
        assert_eq!(unread_count(&conn, &u).unwrap(), unread + 1);
    }

    #[test]
    fn disabled_type_skips_channel() {
        let conn = db();
        let u = user(&conn, "dawud");
        let mut s = settings(&conn, u.id).unwrap();
        s.push_notifications = false;
        update_settings(&conn, &s).unwrap();
        let before = outbox(&conn, &u).len();
        notify_at(
            &conn, at(12), &default_channels(), u.id,
            NotificationType::NewEvent, "event", Related::group(1),
        )
        .unwrap();
        let all = outbox(&conn, &u);
        assert_eq!(all.len(), before + 1);
        assert_eq!(all[0].channel, Channel::Email);
    }

    #[test]
    fn email_without_address_is_skipped() {
        let conn = db();
        let u = crate::services::accounts::register(&conn, "hafsa", "Hafsa", None).unwrap();
        notify_at(
            &conn, at(12), &default_channels(), u.id,
            NotificationType::System, "hello", Related::default(),
        )
        .unwrap();
        let email = outbox(&conn, &u)
            .into_iter()
            .find(|d| d.channel == Channel::Email)
            .unwrap();
        assert_eq!(email.status, DeliveryStatus::Skipped);
    }

    #[test]
    fn feed_operations_are_owner_scoped() {
        let conn = db();
        let a = user(&conn, "a1");
        let b = user(&conn, "b1");
        let id = notify(&conn, a.id, NotificationType::System, "x", Related::default()).unwrap();
        assert!(mark_read(&conn, &b, id).is_err());
        mark_read(&conn, &a, id).unwrap();
        assert!(list(&conn, &a, true, 50).unwrap().iter().all(|n| n.id != id));
        mark_all_read(&conn, &a).unwrap();
        assert_eq!(unread_count(&conn, &a).unwrap(), 0);
        delete(&conn, &a, id).unwrap();
        assert!(NotificationRepo::get(&conn, id).unwrap().is_none());
    }
}
