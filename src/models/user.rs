use serde::{Deserialize, Serialize};

text_enum! {
    AccountType, "account type" {
        Individual => ("individual", "Individual"),
        Family => ("family", "Family"),
        Charity => ("charity", "Charity"),
        Mosque => ("mosque", "Mosque"),
        School => ("school", "School"),
        Organization => ("organization", "Organization"),
    }
}

text_enum! {
    ReadingPreference, "reading preference" {
        Uthmani => ("uthmani", "Uthmani script"),
        Simple => ("simple", "Simple script"),
        Tajweed => ("tajweed", "With tajweed marks"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl User {
    /// Display name, falling back to the username when empty
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub account_type: AccountType,
    pub preferred_language: String,
    pub reading_preference: ReadingPreference,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub total_points: i64,
    pub level: i64,
    pub consecutive_days: i64,
    pub last_activity_date: Option<String>,
}
