use serde::{Deserialize, Serialize};

/// A khatma always covers the whole Qur'an.
pub const TOTAL_PARTS: u32 = 30;

text_enum! {
    KhatmaType, "khatma type" {
        Regular => ("regular", "Regular"),
        Memorial => ("memorial", "Memorial"),
        Charity => ("charity", "Charity"),
        Birth => ("birth", "Birth"),
        Healing => ("healing", "Healing"),
        Graduation => ("graduation", "Graduation"),
        Wedding => ("wedding", "Wedding"),
        Group => ("group", "Group"),
    }
}

text_enum! {
    Frequency, "frequency" {
        Once => ("once", "Once"),
        Daily => ("daily", "Daily"),
        Weekly => ("weekly", "Weekly"),
        Monthly => ("monthly", "Monthly"),
        Yearly => ("yearly", "Yearly"),
        Ramadan => ("ramadan", "Ramadan"),
        Friday => ("friday", "Every Friday"),
    }
}

text_enum! {
    Visibility, "visibility" {
        Public => ("public", "Public"),
        Private => ("private", "Private (invite only)"),
        Family => ("family", "Family"),
        Group => ("group", "Group members"),
    }
}

text_enum! {
    ReminderFrequency, "reminder frequency" {
        Daily => ("daily", "Daily"),
        Weekly => ("weekly", "Weekly"),
        Never => ("never", "Never"),
    }
}

text_enum! {
    ReadingStatus, "reading status" {
        NotStarted => ("not_started", "Not started"),
        InProgress => ("in_progress", "In progress"),
        Completed => ("completed", "Completed"),
        Skipped => ("skipped", "Skipped"),
    }
}

text_enum! {
    RecitationMethod, "recitation method" {
        Reading => ("reading", "Reading"),
        Listening => ("listening", "Listening"),
        Memorization => ("memorization", "Memorization"),
        Tajweed => ("tajweed", "Tajweed"),
        Translation => ("translation", "Translation"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Khatma {
    pub id: i64,
    pub title: String,
    pub creator_id: i64,
    pub description: Option<String>,
    pub khatma_type: KhatmaType,
    pub frequency: Frequency,
    pub visibility: Visibility,
    pub group_id: Option<i64>,
    pub is_group_khatma: bool,
    pub auto_distribute_parts: bool,
    pub deceased_id: Option<i64>,
    pub memorial_prayer: Option<String>,
    pub allow_comments: bool,
    pub max_participants: i64,
    pub send_reminders: bool,
    pub reminder_frequency: ReminderFrequency,
    pub is_completed: bool,
    pub completed_at: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub target_completion_date: Option<String>,
    pub sharing_token: String,
    pub created_at: String,
}

impl Khatma {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn has_participant_limit(&self) -> bool {
        self.max_participants > 0
    }
}

/// Fields a caller chooses when starting a campaign.
#[derive(Debug, Clone)]
pub struct NewKhatma {
    pub title: String,
    pub description: Option<String>,
    pub khatma_type: KhatmaType,
    pub frequency: Frequency,
    pub visibility: Visibility,
    pub deceased_id: Option<i64>,
    pub memorial_prayer: Option<String>,
    pub allow_comments: bool,
    pub max_participants: i64,
    pub send_reminders: bool,
    pub reminder_frequency: ReminderFrequency,
    pub auto_distribute_parts: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub target_completion_date: Option<String>,
}

impl NewKhatma {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            khatma_type: KhatmaType::Regular,
            frequency: Frequency::Once,
            visibility: Visibility::Public,
            deceased_id: None,
            memorial_prayer: None,
            allow_comments: true,
            max_participants: 0,
            send_reminders: true,
            reminder_frequency: ReminderFrequency::Daily,
            auto_distribute_parts: false,
            start_date: None,
            end_date: None,
            target_completion_date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KhatmaPart {
    pub id: i64,
    pub khatma_id: i64,
    pub part_number: u32,
    pub assigned_to: Option<i64>,
    /// Username of the assignee, joined in for display
    pub assignee: Option<String>,
    pub is_completed: bool,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub khatma_id: i64,
    pub user_id: i64,
    pub username: String,
    pub parts_read: i64,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuranReading {
    pub id: i64,
    pub khatma_id: i64,
    pub user_id: i64,
    pub part_number: u32,
    pub status: ReadingStatus,
    pub recitation_method: RecitationMethod,
    pub notes: Option<String>,
    pub dua: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_handles_empty() {
        assert_eq!(Progress::default().percent(), 0.0);
        assert!(!Progress::default().is_done());
    }

    #[test]
    fn progress_percent_counts_parts() {
        let p = Progress { completed: 15, total: 30 };
        assert_eq!(p.percent(), 50.0);
        assert!(Progress { completed: 30, total: 30 }.is_done());
    }
}
