use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{KhatmaRepo, ParticipantRepo, PartRepo, Related, ReminderRepo};
use crate::models::{Khatma, NotificationType, ReminderFrequency};
use crate::utils::time::{date_string, parse_date};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    /// Campaigns whose reminder was due
    pub campaigns: usize,
    /// Reminders sent across those campaigns
    pub notified: usize,
}

fn is_due(frequency: ReminderFrequency, last_run: Option<NaiveDate>, today: NaiveDate) -> bool {
    match (frequency, last_run) {
        (ReminderFrequency::Never, _) => false,
        (_, None) => true,
        (ReminderFrequency::Daily, Some(last)) => last < today,
        (ReminderFrequency::Weekly, Some(last)) => (today - last).num_days() >= 7,
    }
}

fn remind(conn: &Connection, khatma: &Khatma) -> Result<usize> {
    let mut sent = 0;
    for p in ParticipantRepo::list(conn, khatma.id)? {
        let open = PartRepo::count_open_assigned(conn, khatma.id, p.user_id)?;
        if open == 0 {
            continue;
        }
        let noun = if open == 1 { "part" } else { "parts" };
        super::notifications::notify(
            conn,
            p.user_id,
            NotificationType::KhatmaProgress,
            &format!("Reminder: {} {} left to read in '{}'", open, noun, khatma.title),
            Related::khatma(khatma.id),
        )?;
        sent += 1;
    }
    Ok(sent)
}

/// Send due reminders for open campaigns and record each run.
pub fn run_reminders(conn: &Connection, today: NaiveDate) -> Result<ReminderReport> {
    let mut report = ReminderReport::default();
    for khatma in KhatmaRepo::list_reminder_candidates(conn)? {
        let last = ReminderRepo::last_run(conn, khatma.id)?.and_then(|d| parse_date(&d).ok());
        if !is_due(khatma.reminder_frequency, last, today) {
            debug!("reminder for #{} not due (last {:?})", khatma.id, last);
            continue;
        }
        report.notified += remind(conn, &khatma)?;
        report.campaigns += 1;
        ReminderRepo::record_run(conn, khatma.id, &date_string(today))?;
    }
    info!(
        "reminders: {} campaigns due, {} notifications",
        report.campaigns, report.notified
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewKhatma;
    use crate::services::khatmas;
    use crate::services::testing::{db, user};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    #[test]
    fn due_rules() {
        assert!(is_due(ReminderFrequency::Daily, None, day(1)));
        assert!(!is_due(ReminderFrequency::Daily, Some(day(1)), day(1)));
        assert!(is_due(ReminderFrequency::Daily, Some(day(1)), day(2)));
        assert!(!is_due(ReminderFrequency::Weekly, Some(day(1)), day(7)));
        assert!(is_due(ReminderFrequency::Weekly, Some(day(1)), day(8)));
        assert!(!is_due(ReminderFrequency::Never, None, day(1)));
    }

    #[test]
    fn only_readers_with_open_parts_are_reminded() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let c = user(&conn, "camil");
        let k = khatmas::create(&conn, &a, NewKhatma::new("K")).unwrap();
        khatmas::join(&conn, &b, &k, None).unwrap();
        khatmas::join(&conn, &c, &k, None).unwrap();
        khatmas::assign_part(&conn, &a, &k, 1, &b).unwrap();

        let report = run_reminders(&conn, day(1)).unwrap();
        assert_eq!(report, ReminderReport { campaigns: 1, notified: 1 });
        assert_eq!(run_reminders(&conn, day(1)).unwrap().campaigns, 0);
        assert_eq!(run_reminders(&conn, day(2)).unwrap().notified, 1);

        khatmas::complete_part_on(&conn, &b, &k, 1, None, None, day(2)).unwrap();
        assert_eq!(run_reminders(&conn, day(3)).unwrap().notified, 0);
    }

    #[test]
    fn completed_and_silent_campaigns_are_skipped() {
        let conn = db();
        let a = user(&conn, "aisha");
        let mut quiet = NewKhatma::new("Quiet");
        quiet.send_reminders = false;
        khatmas::create(&conn, &a, quiet).unwrap();
        let done = khatmas::create(&conn, &a, NewKhatma::new("Done")).unwrap();
        khatmas::complete(&conn, &a, &done).unwrap();
        assert_eq!(run_reminders(&conn, day(1)).unwrap(), ReminderReport::default());
    }
}
