use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    parse_column, Channel, Delivery, DeliveryStatus, Notification, NotificationSettings,
    NotificationType,
};
use crate::utils::time::{now_timestamp, parse_time};

/// Optional links carried by a notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Related {
    pub khatma_id: Option<i64>,
    pub group_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl Related {
    pub fn khatma(id: i64) -> Self {
        Self { khatma_id: Some(id), ..Self::default() }
    }

    pub fn group(id: i64) -> Self {
        Self { group_id: Some(id), ..Self::default() }
    }

    pub fn with_user(mut self, id: i64) -> Self {
        self.user_id = Some(id);
        self
    }

    /// `khatma://<id>` or `group://<id>`, stored as the action link.
    pub fn action_url(&self) -> Option<String> {
        match (self.khatma_id, self.group_id) {
            (Some(k), _) => Some(format!("khatma://{}", k)),
            (None, Some(g)) => Some(format!("group://{}", g)),
            _ => None,
        }
    }
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        notification_type: parse_column(2, row.get(2)?)?,
        message: row.get(3)?,
        is_read: row.get(4)?,
        related_khatma_id: row.get(5)?,
        related_group_id: row.get(6)?,
        related_user_id: row.get(7)?,
        action_url: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub struct NotificationRepo;

impl NotificationRepo {
    pub fn insert(
        conn: &Connection,
        user_id: i64,
        kind: NotificationType,
        message: &str,
        related: Related,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO notifications (user_id, notification_type, message, related_khatma_id,
                    related_group_id, related_user_id, action_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                kind.as_str(),
                message,
                related.khatma_id,
                related.group_id,
                related.user_id,
                related.action_url(),
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Notification>> {
        conn.query_row(
            "SELECT id, user_id, notification_type, message, is_read, related_khatma_id,
                    related_group_id, related_user_id, action_url, created_at
             FROM notifications WHERE id = ?1",
            params![id],
            notification_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// Newest first.
    pub fn list(
        conn: &Connection,
        user_id: i64,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, notification_type, message, is_read, related_khatma_id,
                    related_group_id, related_user_id, action_url, created_at
             FROM notifications WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
             ORDER BY created_at DESC, id DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, unread_only, limit as i64], notification_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn mark_read(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn mark_all_read(conn: &Connection, user_id: i64) -> Result<usize> {
        let n = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            params![user_id],
        )?;
        Ok(n)
    }

    pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(())
    }
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub struct SettingsRepo;

impl SettingsRepo {
    pub fn get(conn: &Connection, user_id: i64) -> Result<Option<NotificationSettings>> {
        let row = conn
            .query_row(
                "SELECT khatma_progress, khatma_completed, part_assigned, part_completed,
                        memorial_khatma, group_member_changes, join_requests, group_announcements,
                        group_events, system_notifications, achievements, email_notifications,
                        push_notifications, in_app_notifications, enable_quiet_hours,
                        quiet_hours_start, quiet_hours_end
                 FROM notification_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let mut flags = [false; 15];
                    for (i, flag) in flags.iter_mut().enumerate() {
                        *flag = row.get(i)?;
                    }
                    Ok((flags, row.get::<_, String>(15)?, row.get::<_, String>(16)?))
                },
            )
            .optional()?;

        let Some((f, start, end)) = row else {
            return Ok(None);
        };
        Ok(Some(NotificationSettings {
            user_id,
            khatma_progress: f[0],
            khatma_completed: f[1],
            part_assigned: f[2],
            part_completed: f[3],
            memorial_khatma: f[4],
            group_member_changes: f[5],
            join_requests: f[6],
            group_announcements: f[7],
            group_events: f[8],
            system_notifications: f[9],
            achievements: f[10],
            email_notifications: f[11],
            push_notifications: f[12],
            in_app_notifications: f[13],
            enable_quiet_hours: f[14],
            quiet_hours_start: parse_time(&start)?,
            quiet_hours_end: parse_time(&end)?,
        }))
    }

    pub fn save(conn: &Connection, s: &NotificationSettings) -> Result<()> {
        conn.execute(
            "INSERT INTO notification_settings (user_id, khatma_progress, khatma_completed,
                    part_assigned, part_completed, memorial_khatma, group_member_changes,
                    join_requests, group_announcements, group_events, system_notifications,
                    achievements, email_notifications, push_notifications, in_app_notifications,
                    enable_quiet_hours, quiet_hours_start, quiet_hours_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT(user_id) DO UPDATE SET
                    khatma_progress = ?2, khatma_completed = ?3, part_assigned = ?4,
                    part_completed = ?5, memorial_khatma = ?6, group_member_changes = ?7,
                    join_requests = ?8, group_announcements = ?9, group_events = ?10,
                    system_notifications = ?11, achievements = ?12, email_notifications = ?13,
                    push_notifications = ?14, in_app_notifications = ?15, enable_quiet_hours = ?16,
                    quiet_hours_start = ?17, quiet_hours_end = ?18",
            params![
                s.user_id,
                s.khatma_progress,
                s.khatma_completed,
                s.part_assigned,
                s.part_completed,
                s.memorial_khatma,
                s.group_member_changes,
                s.join_requests,
                s.group_announcements,
                s.group_events,
                s.system_notifications,
                s.achievements,
                s.email_notifications,
                s.push_notifications,
                s.in_app_notifications,
                s.enable_quiet_hours,
                s.quiet_hours_start.format("%H:%M").to_string(),
                s.quiet_hours_end.format("%H:%M").to_string(),
            ],
        )?;
        Ok(())
    }
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

pub struct OutboxRepo;

impl OutboxRepo {
    pub fn record(
        conn: &Connection,
        notification_id: i64,
        channel: Channel,
        recipient: &str,
        subject: &str,
        status: DeliveryStatus,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO deliveries (notification_id, channel, recipient, subject, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification_id,
                channel.as_str(),
                recipient,
                subject,
                status.as_str(),
                now_timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Deliveries addressed to one user, newest first.
    pub fn list_for_user(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Delivery>> {
        let mut stmt = conn.prepare(
            "SELECT d.id, d.notification_id, d.channel, d.recipient, d.subject, d.status, d.created_at
             FROM deliveries d JOIN notifications n ON n.id = d.notification_id
             WHERE n.user_id = ?1 ORDER BY d.created_at DESC, d.id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(Delivery {
                id: row.get(0)?,
                notification_id: row.get(1)?,
                channel: parse_column(2, row.get(2)?)?,
                recipient: row.get(3)?,
                subject: row.get(4)?,
                status: parse_column(5, row.get(5)?)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}
