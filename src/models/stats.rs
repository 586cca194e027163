use serde::{Deserialize, Serialize};

use super::{Achievement, Khatma, Notification, Profile, ReadingGroup, Surah, User};
use super::{Deceased, Progress};

text_enum! {
    ActivityKind, "activity" {
        PartCompleted => ("part_completed", "Completed part"),
        KhatmaCreated => ("khatma_created", "Created khatma"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub khatma_id: i64,
    pub khatma_title: String,
    pub part_number: Option<u32>,
    pub at: String,
}

impl Activity {
    pub fn describe(&self) -> String {
        match (self.kind, self.part_number) {
            (ActivityKind::PartCompleted, Some(part)) => {
                format!("Completed part {} of {}", part, self.khatma_title)
            }
            _ => format!("{} {}", self.kind.display_name(), self.khatma_title),
        }
    }
}

/// Everything the personal dashboard shows for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub user: User,
    pub profile: Profile,
    pub created: Vec<Khatma>,
    pub joined: Vec<Khatma>,
    pub groups: Vec<ReadingGroup>,
    pub assigned: Progress,
    pub activity: Vec<Activity>,
    pub achievements: Vec<Achievement>,
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub display_name: String,
    pub completed_parts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub public_khatmas: Vec<Khatma>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_users: i64,
    pub total_khatmas: i64,
    pub completed_parts: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub users: Vec<User>,
    pub khatmas: Vec<Khatma>,
    pub groups: Vec<ReadingGroup>,
    pub deceased: Vec<Deceased>,
    pub surahs: Vec<Surah>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.khatmas.is_empty()
            && self.groups.is_empty()
            && self.deceased.is_empty()
            && self.surahs.is_empty()
    }
}
