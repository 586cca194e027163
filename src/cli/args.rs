use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{
    AccountType, EventType, FontType, Frequency, GroupRole, KhatmaType, MemorialFrequency,
    ReaderTheme, ReadingPreference, RecitationMethod, ReminderFrequency, SearchIn, Visibility,
};

#[derive(Parser, Debug)]
#[command(name = "khatma", version, author, about = "Organize collective Qur'an reading campaigns from the terminal")]
pub struct Cli {
    /// Act as this user instead of the one saved in config
    #[arg(long, short, global = true)]
    pub user: Option<String>,

    /// Print results as JSON instead of colored text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// First-run setup wizard (local user, Hijri offset, quiet hours)
    Setup {
        /// Run the wizard again even if a user is configured
        #[arg(long)]
        reset: bool,
    },
    /// Register a new user
    Register {
        username: String,
        /// Display name (defaults to the username)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List registered users
    Users,
    /// Show or edit the acting user's profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileCommands>,
    },
    /// Earned achievements and progress toward the next ones
    Achievements,
    /// Reading campaigns
    Khatma {
        #[command(subcommand)]
        action: KhatmaCommands,
    },
    /// Reading groups
    Group {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Campaign and group chat
    Chat {
        #[command(subcommand)]
        action: ChatCommands,
    },
    /// Notification feed and preferences
    #[command(alias = "notify")]
    Notifications {
        #[command(subcommand)]
        action: NotificationCommands,
    },
    /// Qur'an text: import, browse, search, bookmarks
    Quran {
        #[command(subcommand)]
        action: QuranCommands,
    },
    /// Records of the deceased and their memorial campaigns
    Memorial {
        #[command(subcommand)]
        action: MemorialCommands,
    },
    /// Personal overview: campaigns, assigned parts, activity
    Dashboard,
    /// Public campaigns, leaderboard and totals
    Community,
    /// Search users, campaigns, groups, memorials and surahs
    Search { query: String },
    /// Scheduled jobs (run from cron or by hand)
    Run {
        #[command(subcommand)]
        job: RunCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the profile (default)
    Show,
    /// Change profile fields
    Edit(ProfileEdit),
}

#[derive(Args, Debug, Default)]
pub struct ProfileEdit {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long = "type")]
    pub account_type: Option<AccountType>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long)]
    pub reading: Option<ReadingPreference>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

// ─── Khatma ──────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct KhatmaCreate {
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "type", default_value = "regular")]
    pub khatma_type: KhatmaType,
    #[arg(long, default_value = "once")]
    pub frequency: Frequency,
    #[arg(long, default_value = "public")]
    pub visibility: Visibility,
    /// Memorial record (id or name) this campaign is dedicated to
    #[arg(long)]
    pub deceased: Option<String>,
    /// Dua shown with a memorial campaign
    #[arg(long)]
    pub prayer: Option<String>,
    /// Participant limit; 0 means unlimited
    #[arg(long, default_value_t = 0)]
    pub max: i64,
    /// Disable the campaign chat
    #[arg(long)]
    pub no_comments: bool,
    /// Never send reading reminders
    #[arg(long)]
    pub no_reminders: bool,
    #[arg(long, default_value = "daily")]
    pub reminders: ReminderFrequency,
    /// Spread parts over participants whenever someone joins
    #[arg(long)]
    pub auto_distribute: bool,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum KhatmaCommands {
    /// Start a new campaign
    Create(KhatmaCreate),
    /// List your campaigns, or public ones
    List {
        /// Public campaigns, including completed ones
        #[arg(long)]
        all: bool,
        /// Only campaigns you created or joined
        #[arg(long)]
        mine: bool,
    },
    /// Campaign details and progress
    Show { khatma: String },
    /// Part table with assignees
    Parts { khatma: String },
    /// Print the sharing token for invite-only campaigns
    Share { khatma: String },
    /// Join a campaign
    Join {
        khatma: String,
        /// Sharing token, required for private and family campaigns
        #[arg(long)]
        token: Option<String>,
    },
    /// Join through a sharing token alone
    JoinLink { token: String },
    /// Leave a campaign; your incomplete parts are released
    Leave { khatma: String },
    /// Remove a participant (creator only)
    Remove { khatma: String, username: String },
    /// Assign a part to a participant (creator only)
    Assign { khatma: String, part: u32, username: String },
    /// Split all parts over the participants (creator only)
    Distribute { khatma: String },
    /// Mark a part as read
    Done {
        khatma: String,
        part: u32,
        #[arg(long)]
        notes: Option<String>,
        /// A dua to record with the reading
        #[arg(long)]
        dua: Option<String>,
        /// How the part was read: reading, listening, memorization, tajweed or translation
        #[arg(long)]
        method: Option<RecitationMethod>,
    },
    /// Reopen a completed part (creator only)
    Undo { khatma: String, part: u32 },
    /// Mark every remaining part read and close the campaign (creator only)
    Finish { khatma: String },
    /// Delete a campaign (creator only)
    Delete {
        khatma: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct EventCreate {
    pub group: String,
    pub title: String,
    /// YYYY-MM-DD HH:MM
    #[arg(long)]
    pub start: String,
    /// YYYY-MM-DD HH:MM
    #[arg(long)]
    pub end: String,
    #[arg(long = "type", default_value = "meeting")]
    pub event_type: EventType,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Meeting link; marks the event as online
    #[arg(long)]
    pub link: Option<String>,
    /// Campaign (id or title) the event belongs to
    #[arg(long)]
    pub khatma: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a reading group
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Hidden from the public list
        #[arg(long)]
        private: bool,
        /// Refuse join requests
        #[arg(long)]
        closed: bool,
        /// Member limit; 0 means unlimited
        #[arg(long, default_value_t = 0)]
        max: i64,
        #[arg(long)]
        no_chat: bool,
        /// Do not allow group khatmas
        #[arg(long)]
        no_khatmas: bool,
    },
    /// List public groups, or your own
    List {
        #[arg(long)]
        mine: bool,
    },
    /// Group page: counts, announcements, events, recent chat
    Show { group: String },
    Members { group: String },
    /// Join a public group or ask to join a private one
    Join {
        group: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Pending join requests (moderators)
    Requests { group: String },
    Approve { request: i64 },
    Reject { request: i64 },
    Leave { group: String },
    /// Change a member's role (admins)
    Role { group: String, username: String, role: GroupRole },
    /// Remove a member (moderators)
    Remove { group: String, username: String },
    /// Post an announcement (moderators)
    Announce {
        group: String,
        title: String,
        content: String,
        #[arg(long)]
        pin: bool,
    },
    /// Schedule a group event (moderators)
    Event(EventCreate),
    /// Upcoming events
    Events { group: String },
    /// Toggle your attendance for an event
    Attend { event: i64 },
    /// Start a campaign for the whole group
    Khatma {
        group: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "once")]
        frequency: Frequency,
        /// Spread parts over members right away
        #[arg(long)]
        auto_distribute: bool,
        #[arg(long)]
        target: Option<String>,
    },
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum ChatCommands {
    /// Read a campaign chat, or post when a message is given
    Khatma {
        khatma: String,
        message: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Read a group chat, or post when a message is given
    Group {
        group: String,
        message: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Pin or unpin a message
    Pin {
        message: i64,
        #[arg(long)]
        unpin: bool,
    },
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// Show the feed
    List {
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Mark one notification read
    Read { id: i64 },
    /// Mark everything read
    ReadAll,
    Delete { id: i64 },
    /// Show notification preferences
    Settings,
    /// Turn one preference on or off, e.g. `set push off`
    Set { flag: String, value: Toggle },
    /// Configure quiet hours
    Quiet {
        /// HH:MM
        #[arg(long)]
        start: Option<String>,
        /// HH:MM
        #[arg(long)]
        end: Option<String>,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Email/push hand-offs recorded for you
    Outbox {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

// ─── Quran ───────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum QuranCommands {
    /// Load `surah|ayah|text` lines into the database
    Import {
        /// Text file; defaults to `[quran] text_path` from config
        path: Option<PathBuf>,
        /// Only replace these parts, e.g. `--parts 1,2,30`
        #[arg(long, value_delimiter = ',')]
        parts: Vec<u32>,
    },
    /// Remove the leading basmala from each surah's first ayah
    StripBismillah,
    /// How much of the text is loaded
    Status,
    /// List all surahs
    Surahs,
    /// Read a surah
    Surah { number: u32 },
    /// Read a part (juz)
    Part { number: u32 },
    /// Search ayah text and translations
    Search {
        text: String,
        #[arg(long = "in", default_value = "both")]
        field: SearchIn,
        #[arg(long)]
        surah: Option<u32>,
        #[arg(long)]
        part: Option<u32>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Bookmark {
        surah: u32,
        ayah: u32,
        #[arg(long)]
        note: Option<String>,
    },
    Bookmarks,
    Unbookmark { surah: u32, ayah: u32 },
    /// Show or change reading settings
    Settings {
        #[arg(long)]
        font: Option<FontType>,
        #[arg(long)]
        size: Option<u32>,
        #[arg(long)]
        theme: Option<ReaderTheme>,
        #[arg(long)]
        translation: Option<Toggle>,
    },
    /// Remember where you stopped reading
    LastRead { surah: u32, ayah: u32 },
}

// ─── Memorials ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum MemorialCommands {
    /// Record someone who has passed away
    Add {
        name: String,
        /// Date of death, YYYY-MM-DD
        #[arg(long)]
        died: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        born: Option<String>,
        #[arg(long)]
        relation: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Do not start scheduled memorial campaigns
        #[arg(long)]
        no_memorial_day: bool,
        #[arg(long, default_value = "yearly")]
        frequency: MemorialFrequency,
    },
    List,
    Show { deceased: String },
    Delete { deceased: String },
}

// ─── Scheduled jobs ──────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Send due reading reminders
    Reminders {
        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Start memorial campaigns due today
    Memorials {
        #[arg(long)]
        date: Option<String>,
    },
}
