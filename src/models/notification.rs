use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

text_enum! {
    NotificationType, "notification type" {
        KhatmaProgress => ("khatma_progress", "Khatma progress"),
        KhatmaCompleted => ("khatma_completed", "Khatma completed"),
        PartAssigned => ("part_assigned", "Part assigned"),
        PartCompleted => ("part_completed", "Part completed"),
        MemorialKhatma => ("memorial_khatma", "Memorial khatma"),
        NewGroupMember => ("new_group_member", "New group member"),
        GroupMemberLeft => ("group_member_left", "Member left group"),
        JoinRequest => ("join_request", "Join request"),
        JoinRequestApproved => ("join_request_approved", "Join request approved"),
        JoinRequestRejected => ("join_request_rejected", "Join request rejected"),
        RoleChanged => ("role_changed", "Role changed"),
        RemovedFromGroup => ("removed_from_group", "Removed from group"),
        NewAnnouncement => ("new_announcement", "New announcement"),
        NewEvent => ("new_event", "New event"),
        NewGroupKhatma => ("new_group_khatma", "New group khatma"),
        GroupChat => ("group_chat", "Group chat"),
        System => ("system", "System"),
        Welcome => ("welcome", "Welcome"),
        Achievement => ("achievement", "Achievement"),
    }
}

text_enum! {
    Channel, "channel" {
        Email => ("email", "Email"),
        Push => ("push", "Push"),
        InApp => ("in_app", "In-app"),
    }
}

text_enum! {
    DeliveryStatus, "delivery status" {
        Sent => ("sent", "Sent"),
        Skipped => ("skipped", "Skipped"),
        Failed => ("failed", "Failed"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub related_khatma_id: Option<i64>,
    pub related_group_id: Option<i64>,
    pub related_user_id: Option<i64>,
    pub action_url: Option<String>,
    pub created_at: String,
}

/// One email/push hand-off recorded in the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub notification_id: i64,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub status: DeliveryStatus,
    pub created_at: String,
}

/// Per-user notification preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub user_id: i64,
    pub khatma_progress: bool,
    pub khatma_completed: bool,
    pub part_assigned: bool,
    pub part_completed: bool,
    pub memorial_khatma: bool,
    pub group_member_changes: bool,
    pub join_requests: bool,
    pub group_announcements: bool,
    pub group_events: bool,
    pub system_notifications: bool,
    pub achievements: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub in_app_notifications: bool,
    pub enable_quiet_hours: bool,
    pub quiet_hours_start: NaiveTime,
    pub quiet_hours_end: NaiveTime,
}

impl NotificationSettings {
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            khatma_progress: true,
            khatma_completed: true,
            part_assigned: true,
            part_completed: true,
            memorial_khatma: true,
            group_member_changes: true,
            join_requests: true,
            group_announcements: true,
            group_events: true,
            system_notifications: true,
            achievements: true,
            email_notifications: true,
            push_notifications: true,
            in_app_notifications: true,
            enable_quiet_hours: false,
            quiet_hours_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            quiet_hours_end: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    fn channel_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email_notifications,
            Channel::Push => self.push_notifications,
            Channel::InApp => self.in_app_notifications,
        }
    }

    /// Whether a notification of `kind` may go out on `channel`.
    ///
    /// The channel master switch is checked first, then the per-type toggle.
    pub fn should_notify(&self, kind: NotificationType, channel: Channel) -> bool {
        if !self.channel_enabled(channel) {
            return false;
        }
        match kind {
            NotificationType::KhatmaProgress | NotificationType::KhatmaCompleted => {
                self.khatma_progress || self.khatma_completed
            }
            NotificationType::PartAssigned => self.part_assigned,
            NotificationType::PartCompleted => self.part_completed,
            NotificationType::MemorialKhatma => self.memorial_khatma,
            NotificationType::NewGroupMember
            | NotificationType::GroupMemberLeft
            | NotificationType::RoleChanged
            | NotificationType::RemovedFromGroup => self.group_member_changes,
            NotificationType::JoinRequest
            | NotificationType::JoinRequestApproved
            | NotificationType::JoinRequestRejected => self.join_requests,
            NotificationType::NewAnnouncement => self.group_announcements,
            NotificationType::NewEvent => self.group_events,
            NotificationType::System => self.system_notifications,
            NotificationType::Welcome | NotificationType::Achievement => self.achievements,
            NotificationType::NewGroupKhatma | NotificationType::GroupChat => true,
        }
    }

    /// Quiet hours may wrap past midnight (22:00 → 07:00).
    pub fn is_quiet_hours(&self, now: NaiveTime) -> bool {
        if !self.enable_quiet_hours {
            return false;
        }
        let (start, end) = (self.quiet_hours_start, self.quiet_hours_end);
        if start <= end {
            start <= now && now <= end
        } else {
            now >= start || now <= end
        }
    }

    /// Set a toggle by its column name; used by `notify settings --set`.
    pub fn set_flag(&mut self, name: &str, value: bool) -> anyhow::Result<()> {
        let slot = match name.trim().replace('-', "_").as_str() {
            "khatma_progress" => &mut self.khatma_progress,
            "khatma_completed" => &mut self.khatma_completed,
            "part_assigned" => &mut self.part_assigned,
            "part_completed" => &mut self.part_completed,
            "memorial_khatma" => &mut self.memorial_khatma,
            "group_member_changes" => &mut self.group_member_changes,
            "join_requests" => &mut self.join_requests,
            "group_announcements" => &mut self.group_announcements,
            "group_events" => &mut self.group_events,
            "system_notifications" | "system" => &mut self.system_notifications,
            "achievements" => &mut self.achievements,
            "email" | "email_notifications" => &mut self.email_notifications,
            "push" | "push_notifications" => &mut self.push_notifications,
            "in_app" | "in_app_notifications" => &mut self.in_app_notifications,
            "quiet_hours" | "enable_quiet_hours" => &mut self.enable_quiet_hours,
            other => return Err(anyhow::anyhow!("Unknown notification setting: {}", other)),
        };
        *slot = value;
        Ok(())
    }

    pub fn flags(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("khatma_progress", self.khatma_progress),
            ("khatma_completed", self.khatma_completed),
            ("part_assigned", self.part_assigned),
            ("part_completed", self.part_completed),
            ("memorial_khatma", self.memorial_khatma),
            ("group_member_changes", self.group_member_changes),
            ("join_requests", self.join_requests),
            ("group_announcements", self.group_announcements),
            ("group_events", self.group_events),
            ("system_notifications", self.system_notifications),
            ("achievements", self.achievements),
            ("email_notifications", self.email_notifications),
            ("push_notifications", self.push_notifications),
            ("in_app_notifications", self.in_app_notifications),
            ("enable_quiet_hours", self.enable_quiet_hours),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn channel_switch_overrides_type_toggle() {
        let mut s = NotificationSettings::defaults_for(1);
        s.email_notifications = false;
        assert!(!s.should_notify(NotificationType::PartAssigned, Channel::Email));
        assert!(s.should_notify(NotificationType::PartAssigned, Channel::Push));
    }

    #[test]
    fn khatma_progress_and_completed_share_a_rule() {
        let mut s = NotificationSettings::defaults_for(1);
        s.khatma_progress = false;
        assert!(s.should_notify(NotificationType::KhatmaCompleted, Channel::InApp));
        s.khatma_completed = false;
        assert!(!s.should_notify(NotificationType::KhatmaProgress, Channel::InApp));
        assert!(!s.should_notify(NotificationType::KhatmaCompleted, Channel::InApp));
    }

    #[test]
    fn member_change_types_follow_one_toggle() {
        let mut s = NotificationSettings::defaults_for(1);
        s.group_member_changes = false;
        for kind in [
            NotificationType::NewGroupMember,
            NotificationType::GroupMemberLeft,
            NotificationType::RoleChanged,
            NotificationType::RemovedFromGroup,
        ] {
            assert!(!s.should_notify(kind, Channel::Push), "{kind:?}");
        }
        assert!(s.should_notify(NotificationType::JoinRequest, Channel::Push));
    }

    #[test]
    fn welcome_rides_on_achievements_toggle() {
        let mut s = NotificationSettings::defaults_for(1);
        s.achievements = false;
        assert!(!s.should_notify(NotificationType::Welcome, Channel::Email));
        assert!(!s.should_notify(NotificationType::Achievement, Channel::Email));
    }

    #[test]
    fn unlisted_types_default_to_allowed() {
        let mut s = NotificationSettings::defaults_for(1);
        s.group_announcements = false;
        s.group_member_changes = false;
        assert!(s.should_notify(NotificationType::GroupChat, Channel::Email));
        assert!(s.should_notify(NotificationType::NewGroupKhatma, Channel::Email));
    }

    #[test]
    fn quiet_hours_disabled_never_quiet() {
        let s = NotificationSettings::defaults_for(1);
        assert!(!s.is_quiet_hours(at(23, 30)));
    }

    #[test]
    fn quiet_hours_wrap_midnight() {
        let mut s = NotificationSettings::defaults_for(1);
        s.enable_quiet_hours = true;
        assert!(s.is_quiet_hours(at(22, 0)));
        assert!(s.is_quiet_hours(at(3, 15)));
        assert!(s.is_quiet_hours(at(7, 0)));
        assert!(!s.is_quiet_hours(at(7, 1)));
        assert!(!s.is_quiet_hours(at(12, 0)));
    }

    #[test]
    fn quiet_hours_same_day_window() {
        let mut s = NotificationSettings::defaults_for(1);
        s.enable_quiet_hours = true;
        s.quiet_hours_start = at(13, 0);
        s.quiet_hours_end = at(15, 0);
        assert!(s.is_quiet_hours(at(14, 0)));
        assert!(!s.is_quiet_hours(at(12, 59)));
        assert!(!s.is_quiet_hours(at(22, 0)));
    }

    #[test]
    fn set_flag_by_name() {
        let mut s = NotificationSettings::defaults_for(1);
        s.set_flag("push", false).unwrap();
        s.set_flag("group-events", false).unwrap();
        assert!(!s.push_notifications);
        assert!(!s.group_events);
        assert!(s.set_flag("sms", true).is_err());
    }
}
