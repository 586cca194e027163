use serde::{Deserialize, Serialize};

text_enum! {
    GroupRole, "group role" {
        Member => ("member", "Member"),
        Moderator => ("moderator", "Moderator"),
        Admin => ("admin", "Admin"),
    }
}

impl GroupRole {
    /// Admins and moderators run the group day to day.
    pub fn can_moderate(&self) -> bool {
        matches!(self, GroupRole::Admin | GroupRole::Moderator)
    }

    /// Ordering used when listing members: admins first.
    pub fn rank(&self) -> u8 {
        match self {
            GroupRole::Admin => 0,
            GroupRole::Moderator => 1,
            GroupRole::Member => 2,
        }
    }
}

text_enum! {
    JoinStatus, "join request status" {
        Pending => ("pending", "Pending"),
        Approved => ("approved", "Approved"),
        Rejected => ("rejected", "Rejected"),
    }
}

text_enum! {
    EventType, "event type" {
        Meeting => ("meeting", "Meeting"),
        KhatmaStart => ("khatma_start", "Khatma start"),
        KhatmaCompletion => ("khatma_completion", "Khatma completion"),
        Lecture => ("lecture", "Lecture"),
        Other => ("other", "Other"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: i64,
    pub is_active: bool,
    pub is_public: bool,
    pub allow_join_requests: bool,
    pub max_members: i64,
    pub enable_chat: bool,
    pub enable_khatma_creation: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub allow_join_requests: bool,
    pub max_members: i64,
    pub enable_chat: bool,
    pub enable_khatma_creation: bool,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_public: true,
            allow_join_requests: true,
            max_members: 0,
            enable_chat: true,
            enable_khatma_creation: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub is_online: bool,
    pub meeting_link: Option<String>,
    pub related_khatma_id: Option<i64>,
}

/// Summary shown on a group's page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDashboard {
    pub group: ReadingGroup,
    pub member_count: i64,
    pub active_khatmas: i64,
    pub completed_khatmas: i64,
    pub event_count: i64,
    pub announcements: Vec<Announcement>,
    pub upcoming_events: Vec<GroupEvent>,
    pub recent_chat: Vec<crate::models::ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: i64,
    pub user_id: i64,
    pub username: String,
    pub role: GroupRole,
    pub joined_at: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub username: String,
    pub message: Option<String>,
    pub status: JoinStatus,
    pub created_at: String,
    pub processed_at: Option<String>,
    pub processed_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub group_id: i64,
    pub creator_id: i64,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEvent {
    pub id: i64,
    pub group_id: i64,
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub is_online: bool,
    pub meeting_link: Option<String>,
    pub related_khatma_id: Option<i64>,
    pub attendees: i64,
    pub created_at: String,
}
