use anyhow::Result;
use rusqlite::Connection;

use crate::db::repository::{
    DeceasedRepo, GroupRepo, KhatmaRepo, PartRepo, QuranRepo, ReadingRepo, UserRepo,
};
use crate::models::{Community, Dashboard, Progress, SearchResults, User};

use super::{accounts, achievements, notifications};

const ACTIVITY_LIMIT: usize = 10;
const FEED_LIMIT: usize = 5;
const LEADERBOARD_LIMIT: usize = 10;
const SEARCH_LIMIT: usize = 10;

pub fn dashboard(conn: &Connection, user: &User) -> Result<Dashboard> {
    let (completed, total) = PartRepo::assigned_counts(conn, user.id)?;
    Ok(Dashboard {
        user: user.clone(),
        profile: accounts::profile(conn, user)?,
        created: KhatmaRepo::list_created_by(conn, user.id)?,
        joined: KhatmaRepo::list_joined_by(conn, user.id)?,
        groups: GroupRepo::list_for_user(conn, user.id)?,
        assigned: Progress { completed, total },
        activity: ReadingRepo::recent_activity(conn, user.id, ACTIVITY_LIMIT)?,
        achievements: achievements::list(conn, user)?,
        notifications: notifications::list(conn, user, false, FEED_LIMIT)?,
        unread: notifications::unread_count(conn, user)?,
    })
}

pub fn community(conn: &Connection) -> Result<Community> {
    Ok(Community {
        public_khatmas: KhatmaRepo::list_public(conn, false)?,
        leaderboard: ReadingRepo::leaderboard(conn, LEADERBOARD_LIMIT)?,
        total_users: UserRepo::count(conn)?,
        total_khatmas: KhatmaRepo::count(conn)?,
        completed_parts: PartRepo::count_completed_total(conn)?,
    })
}

/// Substring search across every searchable table; campaigns the actor
/// cannot see are filtered out before the limit applies.
pub fn search(conn: &Connection, actor: &User, query: &str) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchResults::default());
    }
    Ok(SearchResults {
        users: UserRepo::search(conn, query, SEARCH_LIMIT)?,
        khatmas: KhatmaRepo::search_visible(conn, query, actor.id, SEARCH_LIMIT)?,
        groups: GroupRepo::search(conn, query, SEARCH_LIMIT)?,
        deceased: DeceasedRepo::search(conn, query, SEARCH_LIMIT)?,
        surahs: QuranRepo::search_surahs(conn, query, SEARCH_LIMIT)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, NewGroup, NewKhatma, Visibility};
    use crate::services::testing::{db, user};
    use crate::services::{groups, khatmas};

    #[test]
    fn dashboard_collects_activity() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        let k = khatmas::create(&conn, &a, NewKhatma::new("Weekly reading")).unwrap();
        khatmas::join(&conn, &b, &k, None).unwrap();
        khatmas::assign_part(&conn, &a, &k, 2, &b).unwrap();
        khatmas::assign_part(&conn, &a, &k, 3, &b).unwrap();
        khatmas::complete_part(&conn, &b, &k, 2, None, None).unwrap();

        let d = dashboard(&conn, &b).unwrap();
        assert!(d.created.is_empty());
        assert_eq!(d.joined.len(), 1);
        assert_eq!(d.assigned, Progress { completed: 1, total: 2 });
        assert_eq!(d.activity[0].kind, ActivityKind::PartCompleted);
        assert_eq!(d.profile.consecutive_days, 1);

        let mine = dashboard(&conn, &a).unwrap();
        assert_eq!(mine.created.len(), 1);
        assert_eq!(mine.activity[0].kind, ActivityKind::KhatmaCreated);
    }

    #[test]
    fn community_totals_and_leaderboard() {
        let conn = db();
        let a = user(&conn, "aisha");
        let k = khatmas::create(&conn, &a, NewKhatma::new("K")).unwrap();
        khatmas::complete_part(&conn, &a, &k, 1, None, None).unwrap();
        let c = community(&conn).unwrap();
        assert_eq!(c.total_users, 1);
        assert_eq!(c.total_khatmas, 1);
        assert_eq!(c.completed_parts, 1);
        assert_eq!(c.leaderboard[0].username, "aisha");
        assert_eq!(c.leaderboard[0].completed_parts, 1);
    }

    #[test]
    fn search_spans_categories_and_hides_private() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        khatmas::create(&conn, &a, NewKhatma::new("Cave readers")).unwrap();
        let mut hidden = NewKhatma::new("Cave for family");
        hidden.visibility = Visibility::Family;
        khatmas::create(&conn, &a, hidden).unwrap();

        let r = search(&conn, &b, "cave").unwrap();
        assert_eq!(r.khatmas.len(), 1);
        assert_eq!(r.surahs.len(), 1);
        assert_eq!(search(&conn, &a, "CAVE").unwrap().khatmas.len(), 2);
        assert_eq!(search(&conn, &b, "aish").unwrap().users.len(), 1);
        assert!(search(&conn, &b, "   ").unwrap().is_empty());
        assert!(search(&conn, &b, "zzzz").unwrap().is_empty());
    }

    #[test]
    fn hidden_matches_do_not_crowd_out_visible_ones() {
        let conn = db();
        let a = user(&conn, "aisha");
        let b = user(&conn, "bashir");
        khatmas::create(&conn, &a, NewKhatma::new("Yasin open")).unwrap();
        for i in 0..SEARCH_LIMIT + 2 {
            let mut new = NewKhatma::new(format!("Yasin private {i}"));
            new.visibility = Visibility::Private;
            khatmas::create(&conn, &a, new).unwrap();
        }
        let group = groups::create(&conn, &a, NewGroup::new("Circle")).unwrap();
        groups::create_group_khatma(&conn, &a, &group, NewKhatma::new("Yasin circle")).unwrap();

        let titles: Vec<String> = search(&conn, &b, "yasin").unwrap().khatmas.into_iter().map(|k| k.title).collect();
        assert_eq!(titles, vec!["Yasin open".to_string()]);

        groups::join(&conn, &b, &group, None).unwrap();
        let seen = search(&conn, &b, "yasin").unwrap().khatmas;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].title, "Yasin circle");
        assert_eq!(search(&conn, &a, "yasin").unwrap().khatmas.len(), SEARCH_LIMIT);
    }
}
