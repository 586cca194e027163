use serde::{Deserialize, Serialize};

text_enum! {
    AchievementType, "achievement" {
        FirstKhatma => ("first_khatma", "First khatma"),
        MemorialKhatma => ("memorial_khatma", "Memorial khatma"),
        FullQuran => ("full_quran", "Full Qur'an"),
        RamadanKhatma => ("ramadan_khatma", "Ramadan khatma"),
        CommunityKhatma => ("community_khatma", "Community khatma"),
    }
}

impl AchievementType {
    pub fn points(&self) -> i64 {
        match self {
            AchievementType::FirstKhatma => 100,
            AchievementType::FullQuran => 50,
            AchievementType::MemorialKhatma => 30,
            AchievementType::RamadanKhatma => 75,
            AchievementType::CommunityKhatma => 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub achievement_type: AchievementType,
    pub points_earned: i64,
    pub related_khatma_id: Option<i64>,
    pub achieved_at: String,
}

/// A milestone not yet reached, with progress toward it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableAchievement {
    pub title: String,
    pub description: String,
    pub current: i64,
    pub target: i64,
    pub points: i64,
}

impl AvailableAchievement {
    pub fn percent(&self) -> u32 {
        if self.target <= 0 {
            return 100;
        }
        ((self.current.min(self.target) * 100) / self.target) as u32
    }
}
