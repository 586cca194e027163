mod chat;
mod groups;
mod khatmas;
mod memorials;
mod meta;
mod notifications;
mod quran;
mod users;

pub use chat::ChatRepo;
pub use groups::{AnnouncementRepo, EventRepo, GroupRepo, JoinRequestRepo, MembershipRepo};
pub use khatmas::{KhatmaRepo, ParticipantRepo, PartRepo, ReadingRepo, ReminderRepo};
pub use memorials::DeceasedRepo;
pub use meta::MetaRepo;
pub use notifications::{NotificationRepo, OutboxRepo, Related, SettingsRepo};
pub use quran::{AyahRecord, BookmarkRepo, QuranRepo, QuranTable, ReadingSettingsRepo};
pub use users::{like_pattern, AchievementRepo, ProfileRepo, UserRepo};
