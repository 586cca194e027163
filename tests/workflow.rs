use chrono::NaiveDate;
use rusqlite::Connection;
use tempfile::TempDir;

use khatma::db;
use khatma::error::{domain_error, KhatmaError};
use khatma::models::{
    AchievementType, GroupRole, JoinStatus, MemorialFrequency, NewDeceased, NewGroup, NewKhatma,
    SearchIn, User, Visibility,
};
use khatma::quran::import_file;
use khatma::services::groups::JoinOutcome;
use khatma::services::{accounts, achievements, groups, khatmas, memorials, notifications, reader, reminders};

fn open() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open(&dir.path().join("khatma.db")).unwrap();
    (dir, conn)
}

fn register(conn: &Connection, name: &str) -> User {
    accounts::register(conn, name, name, None).unwrap()
}

// Outside Ramadan, so only the base awards apply.
fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 10).unwrap()
}

#[test]
fn campaign_from_creation_to_completion() {
    let (_dir, conn) = open();
    let amina = register(&conn, "amina");
    let bilal = register(&conn, "bilal");

    let k = khatmas::create(&conn, &amina, NewKhatma::new("Family khatm")).unwrap();
    khatmas::join(&conn, &bilal, &k, None).unwrap();
    let shares = khatmas::distribute(&conn, &amina, &k).unwrap();
    assert_eq!(shares.len(), 2);
    assert_eq!((shares[0].first, shares[0].last), (1, 15));
    assert_eq!((shares[1].first, shares[1].last), (16, 30));

    // bilal cannot read amina's share
    let err = khatmas::complete_part(&conn, &bilal, &k, 1, None, None).unwrap_err();
    assert!(matches!(domain_error(&err), Some(KhatmaError::PermissionDenied(_))));

    let mut finished = false;
    for part in khatmas::parts(&conn, &k).unwrap() {
        let reader = if part.assigned_to == Some(amina.id) { &amina } else { &bilal };
        let outcome =
            khatmas::complete_part_on(&conn, reader, &k, part.part_number, None, None, day()).unwrap();
        finished = outcome.finished;
    }
    assert!(finished);
    assert!(khatmas::require(&conn, k.id).unwrap().is_completed);

    let earned: Vec<AchievementType> = achievements::list(&conn, &amina)
        .unwrap()
        .into_iter()
        .map(|a| a.achievement_type)
        .collect();
    assert!(earned.contains(&AchievementType::FullQuran));
    assert!(earned.contains(&AchievementType::FirstKhatma));
    assert_eq!(accounts::profile(&conn, &amina).unwrap().level, 2);

    let participants = khatmas::participants(&conn, &k).unwrap();
    assert!(participants.iter().all(|p| p.parts_read == 15));

    // reopening a part reopens the campaign
    khatmas::uncomplete_part(&conn, &amina, &k, 30).unwrap();
    assert!(!khatmas::require(&conn, k.id).unwrap().is_completed);
}

#[test]
fn private_campaign_needs_sharing_token() {
    let (_dir, conn) = open();
    let amina = register(&conn, "amina");
    let yusuf = register(&conn, "yusuf");

    let mut new = NewKhatma::new("Quiet circle");
    new.visibility = Visibility::Private;
    let k = khatmas::create(&conn, &amina, new).unwrap();

    let err = khatmas::join(&conn, &yusuf, &k, None).unwrap_err();
    assert!(matches!(domain_error(&err), Some(KhatmaError::NotAccepting(_))));

    let joined = khatmas::join_by_token(&conn, &yusuf, &k.sharing_token).unwrap();
    assert_eq!(joined.id, k.id);
    assert_eq!(khatmas::participants(&conn, &k).unwrap().len(), 2);
}

#[test]
fn private_group_request_then_group_campaign() {
    let (_dir, conn) = open();
    let amina = register(&conn, "amina");
    let bilal = register(&conn, "bilal");

    let mut new = NewGroup::new("Masjid circle");
    new.is_public = false;
    let group = groups::create(&conn, &amina, new).unwrap();

    assert_eq!(groups::join(&conn, &bilal, &group, Some("salaam")).unwrap(), JoinOutcome::Requested);
    let pending = groups::pending_requests(&conn, &amina, &group).unwrap();
    assert_eq!(pending.len(), 1);
    let approved = groups::process_request(&conn, &amina, pending[0].id, true).unwrap();
    assert_eq!(approved.status, JoinStatus::Approved);
    assert_eq!(groups::role_of(&conn, group.id, bilal.id).unwrap(), Some(GroupRole::Member));

    // members cannot start group campaigns
    let err = groups::create_group_khatma(&conn, &bilal, &group, NewKhatma::new("Not mine")).unwrap_err();
    assert!(matches!(domain_error(&err), Some(KhatmaError::PermissionDenied(_))));

    let mut campaign = NewKhatma::new("Circle khatm");
    campaign.auto_distribute_parts = true;
    let k = groups::create_group_khatma(&conn, &amina, &group, campaign).unwrap();
    assert!(k.is_group_khatma);
    let parts = khatmas::parts(&conn, &k).unwrap();
    assert!(parts.iter().all(|p| p.assigned_to.is_some()));
    assert_eq!(parts.iter().filter(|p| p.assigned_to == Some(bilal.id)).count(), 15);

    let unread = notifications::unread_count(&conn, &bilal).unwrap();
    assert!(unread >= 2);
}

#[test]
fn memorials_start_once_and_reminders_follow() {
    let (_dir, conn) = open();
    let amina = register(&conn, "amina");
    memorials::add(
        &conn,
        &amina,
        NewDeceased {
            name: "Khadija".to_string(),
            death_date: NaiveDate::from_ymd_opt(2020, 8, 10).unwrap(),
            birth_date: None,
            relation: Some("grandmother".to_string()),
            biography: None,
            memorial_day: true,
            memorial_frequency: MemorialFrequency::Yearly,
        },
    )
    .unwrap();

    let started = memorials::run_memorials(&conn, day()).unwrap();
    assert_eq!(started.len(), 1);
    assert!(started[0].title.contains("Khadija"));
    assert!(memorials::run_memorials(&conn, day()).unwrap().is_empty());

    khatmas::distribute(&conn, &amina, &started[0]).unwrap();
    let report = reminders::run_reminders(&conn, day()).unwrap();
    assert_eq!(report.campaigns, 1);
    assert_eq!(report.notified, 1);
    // daily reminders do not repeat on the same day
    assert_eq!(reminders::run_reminders(&conn, day()).unwrap().campaigns, 0);
}

#[test]
fn import_text_then_read_and_search() {
    let (dir, mut conn) = open();
    let path = dir.path().join("quran.txt");
    std::fs::write(
        &path,
        "1|1|بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ\n\
         1|2|الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ\n\
         1|99|out of range\n\
         not a verse\n",
    )
    .unwrap();

    let report = import_file(&mut conn, &path, &[]).unwrap();
    assert_eq!(report.lines_read, 4);
    assert_eq!(report.ayahs_imported, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.per_part.get(&1), Some(&2));

    let status = reader::status(&conn).unwrap();
    assert!(!status.is_complete());
    assert_eq!(status.ayahs, 2);

    let found = reader::search(&conn, "الْحَمْدُ", SearchIn::Text, None, None, 1).unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.ayahs[0].ayah_number, 2);

    let amina = register(&conn, "amina");
    assert!(reader::add_bookmark(&conn, &amina, 1, 2, Some("daily")).unwrap());
    assert!(!reader::add_bookmark(&conn, &amina, 1, 2, None).unwrap());
    assert_eq!(reader::bookmarks(&conn, &amina).unwrap().len(), 1);
}
