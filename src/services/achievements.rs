use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;

use crate::db::repository::{
    AchievementRepo, KhatmaRepo, ParticipantRepo, ProfileRepo, ReadingRepo, Related,
};
use crate::models::{
    Achievement, AchievementType, AvailableAchievement, Khatma, KhatmaType, NotificationType,
    User,
};
use crate::utils::hijri;

use super::{accounts, notifications, options};

pub fn level_for_points(points: i64) -> i64 {
    match points {
        p if p < 100 => 1,
        p if p < 250 => 2,
        p if p < 500 => 3,
        p if p < 1000 => 4,
        _ => 5,
    }
}

/// Record an achievement and credit its points. `first_khatma` is granted once
/// per user, every other kind once per user and campaign.
///
/// Returns whether anything was awarded.
pub fn award(
    conn: &Connection,
    user_id: i64,
    kind: AchievementType,
    khatma_id: Option<i64>,
) -> Result<bool> {
    if kind == AchievementType::FirstKhatma && AchievementRepo::has(conn, user_id, kind)? {
        return Ok(false);
    }
    if let Some(kid) = khatma_id {
        if AchievementRepo::has_for_khatma(conn, user_id, kind, kid)? {
            return Ok(false);
        }
    }
    let user = accounts::require_id(conn, user_id)?;
    let mut profile = accounts::profile(conn, &user)?;
    AchievementRepo::insert(conn, user_id, kind, kind.points(), khatma_id)?;
    profile.total_points += kind.points();
    profile.level = level_for_points(profile.total_points);
    ProfileRepo::save(conn, &profile)?;

    let related = khatma_id.map(Related::khatma).unwrap_or_default();
    notifications::notify(
        conn,
        user_id,
        NotificationType::Achievement,
        &format!("Achievement unlocked: {} (+{} points)", kind.display_name(), kind.points()),
        related,
    )?;
    info!("{} earned {}", user.username, kind.as_str());
    Ok(true)
}

/// Awards due when `khatma` has just been completed on `today`.
pub fn award_for_completion(conn: &Connection, khatma: &Khatma, today: NaiveDate) -> Result<()> {
    let contributors = ParticipantRepo::contributors(conn, khatma.id)?;
    let ramadan = hijri::is_ramadan(today, options().hijri_offset);

    for &uid in &contributors {
        award(conn, uid, AchievementType::FullQuran, Some(khatma.id))?;
        if ramadan {
            award(conn, uid, AchievementType::RamadanKhatma, Some(khatma.id))?;
        }
        if khatma.is_group_khatma {
            award(conn, uid, AchievementType::CommunityKhatma, Some(khatma.id))?;
        }
    }

    if KhatmaRepo::count_completed_created_by(conn, khatma.creator_id)? >= 1 {
        award(conn, khatma.creator_id, AchievementType::FirstKhatma, Some(khatma.id))?;
    }
    if khatma.khatma_type == KhatmaType::Memorial {
        award(conn, khatma.creator_id, AchievementType::MemorialKhatma, Some(khatma.id))?;
    }
    Ok(())
}

pub fn list(conn: &Connection, user: &User) -> Result<Vec<Achievement>> {
    AchievementRepo::list_for_user(conn, user.id)
}

/// Milestones with the user's progress toward each.
pub fn available_achievements(conn: &Connection, user: &User) -> Result<Vec<AvailableAchievement>> {
    let parts = ReadingRepo::count_completed_by(conn, user.id)?;
    let joined = ParticipantRepo::count_joined(conn, user.id)?;
    let created = KhatmaRepo::count_created_by(conn, user.id)?;

    let milestone = |title: &str, description: &str, current: i64, target: i64, points: i64| {
        AvailableAchievement {
            title: title.to_string(),
            description: description.to_string(),
            current,
            target,
            points,
        }
    };
    Ok(vec![
        milestone("Dedicated reader", "Complete 5 parts", parts, 5, 50),
        milestone("Community member", "Join 3 khatmas", joined, 3, 30),
        milestone("Khatma organizer", "Create 2 khatmas", created, 2, 40),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{db, user};

    #[test]
    fn levels_step_at_thresholds() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(249), 2);
        assert_eq!(level_for_points(250), 3);
        assert_eq!(level_for_points(999), 4);
        assert_eq!(level_for_points(1000), 5);
    }

    #[test]
    fn award_credits_points_and_level() {
        let conn = db();
        let u = user(&conn, "sumayya");
        assert!(award(&conn, u.id, AchievementType::FirstKhatma, None).unwrap());
        assert!(award(&conn, u.id, AchievementType::FullQuran, None).unwrap());
        let p = accounts::profile(&conn, &u).unwrap();
        assert_eq!(p.total_points, 150);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn first_khatma_only_once() {
        let conn = db();
        let u = user(&conn, "ammar");
        assert!(award(&conn, u.id, AchievementType::FirstKhatma, None).unwrap());
        assert!(!award(&conn, u.id, AchievementType::FirstKhatma, None).unwrap());
        assert_eq!(list(&conn, &u).unwrap().len(), 1);
    }

    #[test]
    fn milestones_start_empty() {
        let conn = db();
        let u = user(&conn, "nusayba");
        let m = available_achievements(&conn, &u).unwrap();
        assert_eq!(m.len(), 3);
        assert!(m.iter().all(|a| a.current == 0 && a.percent() == 0));
    }
}
