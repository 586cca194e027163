/// Declares a string-backed enum stored as lowercase text in SQLite.
///
/// Generates `all()`, `as_str()`, `display_name()`, `Display` and `FromStr`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $variant:ident => ($text:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub fn all() -> Vec<$name> {
                vec![$( $name::$variant ),+]
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            pub fn display_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.display_name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_lowercase().replace('-', "_");
                match lowered.as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(anyhow::anyhow!("Unknown {}: {}", $what, s)),
                }
            }
        }
    };
}

pub mod achievement;
pub mod chat;
pub mod group;
pub mod khatma;
pub mod memorial;
pub mod notification;
pub mod quran;
pub mod stats;
pub mod user;

pub use achievement::{Achievement, AchievementType, AvailableAchievement};
pub use chat::{ChatMessage, ChatScope, MessageType};
pub use group::{
    Announcement, EventType, GroupDashboard, GroupEvent, GroupRole, JoinRequest, JoinStatus,
    Membership, NewEvent, NewGroup, ReadingGroup,
};
pub use khatma::{
    Frequency, Khatma, KhatmaPart, KhatmaType, NewKhatma, Participant, Progress, QuranReading,
    ReadingStatus, RecitationMethod, ReminderFrequency, Visibility, TOTAL_PARTS,
};
pub use memorial::{Deceased, MemorialFrequency, NewDeceased};
pub use notification::{
    Channel, Delivery, DeliveryStatus, Notification, NotificationSettings, NotificationType,
};
pub use quran::{
    Ayah, Bookmark, FontType, QuranPart, ReaderTheme, ReadingSettings, RevelationType, SearchIn,
    Surah,
};
pub use stats::{Activity, ActivityKind, Community, Dashboard, LeaderboardEntry, SearchResults};
pub use user::{AccountType, Profile, ReadingPreference, User};

/// Read a text column and parse it into one of the enums above.
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::<dyn std::error::Error + Send + Sync>::from(e.to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn text_enums_parse_loosely() {
        assert_eq!(GroupRole::from_str("Moderator").unwrap(), GroupRole::Moderator);
        assert_eq!(
            NotificationType::from_str("join-request-approved").unwrap(),
            NotificationType::JoinRequestApproved
        );
        assert!(KhatmaType::from_str("picnic").is_err());
    }

    #[test]
    fn all_lists_every_variant_once() {
        let kinds = NotificationType::all();
        let mut names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }
}
