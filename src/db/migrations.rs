use anyhow::Result;
use rusqlite::Connection;

use crate::quran::seed_reference;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL DEFAULT '',
            email         TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            user_id             INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            account_type        TEXT NOT NULL DEFAULT 'individual'
                                CHECK(account_type IN ('individual','family','charity','mosque','school','organization')),
            preferred_language  TEXT NOT NULL DEFAULT 'ar',
            reading_preference  TEXT NOT NULL DEFAULT 'uthmani'
                                CHECK(reading_preference IN ('uthmani','simple','tajweed')),
            bio                 TEXT,
            location            TEXT,
            total_points        INTEGER NOT NULL DEFAULT 0,
            level               INTEGER NOT NULL DEFAULT 1,
            consecutive_days    INTEGER NOT NULL DEFAULT 0,
            last_activity_date  TEXT
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            achievement_type   TEXT NOT NULL
                               CHECK(achievement_type IN ('first_khatma','memorial_khatma','full_quran','ramadan_khatma','community_khatma')),
            points_earned      INTEGER NOT NULL DEFAULT 0,
            related_khatma_id  INTEGER REFERENCES khatmas(id) ON DELETE SET NULL,
            achieved_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS deceased (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            name                TEXT NOT NULL UNIQUE,
            death_date          TEXT NOT NULL,
            birth_date          TEXT,
            relation            TEXT,
            biography           TEXT,
            memorial_day        INTEGER NOT NULL DEFAULT 1,
            memorial_frequency  TEXT NOT NULL DEFAULT 'yearly'
                                CHECK(memorial_frequency IN ('yearly','monthly','weekly','daily')),
            added_by            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reading_groups (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            name                    TEXT NOT NULL UNIQUE,
            description             TEXT,
            creator_id              INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            is_active               INTEGER NOT NULL DEFAULT 1,
            is_public               INTEGER NOT NULL DEFAULT 1,
            allow_join_requests     INTEGER NOT NULL DEFAULT 1,
            max_members             INTEGER NOT NULL DEFAULT 0,
            enable_chat             INTEGER NOT NULL DEFAULT 1,
            enable_khatma_creation  INTEGER NOT NULL DEFAULT 1,
            created_at              TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS group_memberships (
            group_id   INTEGER NOT NULL REFERENCES reading_groups(id) ON DELETE CASCADE,
            user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role       TEXT NOT NULL DEFAULT 'member' CHECK(role IN ('member','moderator','admin')),
            joined_at  TEXT NOT NULL,
            is_active  INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (group_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS join_requests (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id      INTEGER NOT NULL REFERENCES reading_groups(id) ON DELETE CASCADE,
            user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message       TEXT,
            status        TEXT NOT NULL DEFAULT 'pending'
                          CHECK(status IN ('pending','approved','rejected')),
            created_at    TEXT NOT NULL,
            processed_at  TEXT,
            processed_by  INTEGER REFERENCES users(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS group_announcements (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id    INTEGER NOT NULL REFERENCES reading_groups(id) ON DELETE CASCADE,
            creator_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            is_pinned   INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS khatmas (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            title                   TEXT NOT NULL UNIQUE,
            creator_id              INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            description             TEXT,
            khatma_type             TEXT NOT NULL DEFAULT 'regular'
                                    CHECK(khatma_type IN ('regular','memorial','charity','birth','healing','graduation','wedding','group')),
            frequency               TEXT NOT NULL DEFAULT 'once'
                                    CHECK(frequency IN ('once','daily','weekly','monthly','yearly','ramadan','friday')),
            visibility              TEXT NOT NULL DEFAULT 'public'
                                    CHECK(visibility IN ('public','private','family','group')),
            group_id                INTEGER REFERENCES reading_groups(id) ON DELETE CASCADE,
            is_group_khatma         INTEGER NOT NULL DEFAULT 0,
            auto_distribute_parts   INTEGER NOT NULL DEFAULT 0,
            deceased_id             INTEGER REFERENCES deceased(id) ON DELETE SET NULL,
            memorial_prayer         TEXT,
            allow_comments          INTEGER NOT NULL DEFAULT 1,
            max_participants        INTEGER NOT NULL DEFAULT 0,
            send_reminders          INTEGER NOT NULL DEFAULT 1,
            reminder_frequency      TEXT NOT NULL DEFAULT 'daily'
                                    CHECK(reminder_frequency IN ('daily','weekly','never')),
            is_completed            INTEGER NOT NULL DEFAULT 0,
            completed_at            TEXT,
            start_date              TEXT,
            end_date                TEXT,
            target_completion_date  TEXT,
            sharing_token           TEXT NOT NULL UNIQUE,
            created_at              TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS khatma_parts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            khatma_id     INTEGER NOT NULL REFERENCES khatmas(id) ON DELETE CASCADE,
            part_number   INTEGER NOT NULL CHECK(part_number BETWEEN 1 AND 30),
            assigned_to   INTEGER REFERENCES users(id) ON DELETE SET NULL,
            is_completed  INTEGER NOT NULL DEFAULT 0,
            completed_at  TEXT,
            UNIQUE(khatma_id, part_number)
        );

        CREATE TABLE IF NOT EXISTS participants (
            khatma_id   INTEGER NOT NULL REFERENCES khatmas(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            parts_read  INTEGER NOT NULL DEFAULT 0,
            joined_at   TEXT NOT NULL,
            PRIMARY KEY (khatma_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS quran_readings (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            khatma_id          INTEGER NOT NULL REFERENCES khatmas(id) ON DELETE CASCADE,
            user_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            part_number        INTEGER NOT NULL,
            status             TEXT NOT NULL DEFAULT 'not_started'
                               CHECK(status IN ('not_started','in_progress','completed','skipped')),
            recitation_method  TEXT NOT NULL DEFAULT 'reading'
                               CHECK(recitation_method IN ('reading','listening','memorization','tajweed','translation')),
            notes              TEXT,
            dua                TEXT,
            started_at         TEXT NOT NULL,
            completed_at       TEXT,
            UNIQUE(khatma_id, user_id, part_number)
        );

        CREATE TABLE IF NOT EXISTS group_events (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id           INTEGER NOT NULL REFERENCES reading_groups(id) ON DELETE CASCADE,
            creator_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title              TEXT NOT NULL,
            description        TEXT,
            event_type         TEXT NOT NULL DEFAULT 'meeting'
                               CHECK(event_type IN ('meeting','khatma_start','khatma_completion','lecture','other')),
            start_time         TEXT NOT NULL,
            end_time           TEXT NOT NULL,
            location           TEXT,
            is_online          INTEGER NOT NULL DEFAULT 0,
            meeting_link       TEXT,
            related_khatma_id  INTEGER REFERENCES khatmas(id) ON DELETE SET NULL,
            created_at         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_attendees (
            event_id  INTEGER NOT NULL REFERENCES group_events(id) ON DELETE CASCADE,
            user_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (event_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS chat_messages (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            scope         TEXT NOT NULL CHECK(scope IN ('khatma','group')),
            scope_id      INTEGER NOT NULL,
            user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message       TEXT NOT NULL,
            message_type  TEXT NOT NULL DEFAULT 'text' CHECK(message_type IN ('text','system')),
            is_pinned     INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_scope ON chat_messages(scope, scope_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            notification_type  TEXT NOT NULL,
            message            TEXT NOT NULL,
            is_read            INTEGER NOT NULL DEFAULT 0,
            related_khatma_id  INTEGER,
            related_group_id   INTEGER,
            related_user_id    INTEGER,
            action_url         TEXT,
            created_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, is_read);

        CREATE TABLE IF NOT EXISTS notification_settings (
            user_id               INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            khatma_progress       INTEGER NOT NULL DEFAULT 1,
            khatma_completed      INTEGER NOT NULL DEFAULT 1,
            part_assigned         INTEGER NOT NULL DEFAULT 1,
            part_completed        INTEGER NOT NULL DEFAULT 1,
            memorial_khatma       INTEGER NOT NULL DEFAULT 1,
            group_member_changes  INTEGER NOT NULL DEFAULT 1,
            join_requests         INTEGER NOT NULL DEFAULT 1,
            group_announcements   INTEGER NOT NULL DEFAULT 1,
            group_events          INTEGER NOT NULL DEFAULT 1,
            system_notifications  INTEGER NOT NULL DEFAULT 1,
            achievements          INTEGER NOT NULL DEFAULT 1,
            email_notifications   INTEGER NOT NULL DEFAULT 1,
            push_notifications    INTEGER NOT NULL DEFAULT 1,
            in_app_notifications  INTEGER NOT NULL DEFAULT 1,
            enable_quiet_hours    INTEGER NOT NULL DEFAULT 0,
            quiet_hours_start     TEXT NOT NULL DEFAULT '22:00',
            quiet_hours_end       TEXT NOT NULL DEFAULT '07:00'
        );

        CREATE TABLE IF NOT EXISTS deliveries (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            notification_id  INTEGER NOT NULL REFERENCES notifications(id) ON DELETE CASCADE,
            channel          TEXT NOT NULL CHECK(channel IN ('email','push','in_app')),
            recipient        TEXT NOT NULL,
            subject          TEXT NOT NULL,
            status           TEXT NOT NULL CHECK(status IN ('sent','skipped','failed')),
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS quran_parts (
            part_number  INTEGER PRIMARY KEY CHECK(part_number BETWEEN 1 AND 30),
            name         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS surahs (
            number            INTEGER PRIMARY KEY CHECK(number BETWEEN 1 AND 114),
            name_arabic       TEXT NOT NULL,
            name_english      TEXT NOT NULL,
            revelation_type   TEXT NOT NULL CHECK(revelation_type IN ('meccan','medinan')),
            verses_count      INTEGER NOT NULL,
            revelation_order  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ayahs (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            surah_number  INTEGER NOT NULL REFERENCES surahs(number),
            ayah_number   INTEGER NOT NULL,
            part_number   INTEGER NOT NULL REFERENCES quran_parts(part_number),
            text_uthmani  TEXT NOT NULL,
            text_simple   TEXT,
            translation   TEXT,
            page          INTEGER,
            UNIQUE(surah_number, ayah_number)
        );
        CREATE INDEX IF NOT EXISTS idx_ayahs_part ON ayahs(part_number);

        CREATE TABLE IF NOT EXISTS bookmarks (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            surah_number  INTEGER NOT NULL,
            ayah_number   INTEGER NOT NULL,
            note          TEXT,
            created_at    TEXT NOT NULL,
            UNIQUE(user_id, surah_number, ayah_number)
        );

        CREATE TABLE IF NOT EXISTS reading_settings (
            user_id           INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            font_type         TEXT NOT NULL DEFAULT 'uthmani' CHECK(font_type IN ('uthmani','indopak','naskh')),
            font_size         INTEGER NOT NULL DEFAULT 24,
            theme             TEXT NOT NULL DEFAULT 'light' CHECK(theme IN ('light','dark','sepia')),
            show_translation  INTEGER NOT NULL DEFAULT 1,
            last_read_surah   INTEGER,
            last_read_ayah    INTEGER
        );

        CREATE TABLE IF NOT EXISTS reminder_runs (
            khatma_id  INTEGER PRIMARY KEY REFERENCES khatmas(id) ON DELETE CASCADE,
            last_run   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;

    seed_reference(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let parts: i64 = conn
            .query_row("SELECT COUNT(*) FROM quran_parts", [], |r| r.get(0))
            .unwrap();
        let surahs: i64 = conn
            .query_row("SELECT COUNT(*) FROM surahs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(parts, 30);
        assert_eq!(surahs, 114);
    }

    #[test]
    fn part_numbers_are_checked() {
        let conn = crate::db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO users (username, created_at) VALUES ('a', '2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO khatmas (title, creator_id, sharing_token, created_at)
             VALUES ('t', 1, 'tok', '2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        let bad = conn.execute(
            "INSERT INTO khatma_parts (khatma_id, part_number) VALUES (1, 31)",
            [],
        );
        assert!(bad.is_err());
    }
}
