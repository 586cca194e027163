//! Splitting a campaign's parts across its members.
//!
//! Members are taken in join order. With `n` members and `total` parts each
//! member gets `total / n` parts and the first `total % n` members one extra;
//! every member's share is a contiguous run starting where the previous one
//! ended.

use serde::Serialize;

/// One `(part_number, member)` pair per assigned part, parts ascending.
pub fn distribute_parts<T: Copy>(total_parts: u32, members: &[T]) -> Vec<(u32, T)> {
    if members.is_empty() || total_parts == 0 {
        return Vec::new();
    }
    let n = members.len().min(total_parts as usize) as u32;
    let base = total_parts / n;
    let remainder = total_parts % n;

    let mut plan = Vec::with_capacity(total_parts as usize);
    let mut next = 1;
    for (i, &member) in members.iter().take(n as usize).enumerate() {
        let share = base + u32::from((i as u32) < remainder);
        for part in next..next + share {
            plan.push((part, member));
        }
        next += share;
    }
    plan
}

/// A member's run of parts, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share<T> {
    pub member: T,
    pub first: u32,
    pub last: u32,
}

impl<T> Share<T> {
    pub fn count(&self) -> u32 {
        self.last - self.first + 1
    }
}

/// Collapse a plan into one run per member, in plan order.
pub fn plan_summary<T: Copy + PartialEq>(plan: &[(u32, T)]) -> Vec<Share<T>> {
    let mut shares: Vec<Share<T>> = Vec::new();
    for &(part, member) in plan {
        match shares.last_mut() {
            Some(s) if s.member == member && s.last + 1 == part => s.last = part,
            _ => shares.push(Share { member, first: part, last: part }),
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(plan: &[(u32, char)], members: &[char]) -> Vec<usize> {
        members
            .iter()
            .map(|m| plan.iter().filter(|(_, who)| who == m).count())
            .collect()
    }

    #[test]
    fn even_split() {
        let plan = distribute_parts(30, &['a', 'b', 'c']);
        assert_eq!(counts(&plan, &['a', 'b', 'c']), vec![10, 10, 10]);
        assert_eq!(plan[0], (1, 'a'));
        assert_eq!(plan[10], (11, 'b'));
        assert_eq!(plan[29], (30, 'c'));
    }

    #[test]
    fn remainder_goes_to_earliest_members() {
        let members = ['a', 'b', 'c', 'd'];
        let plan = distribute_parts(30, &members);
        assert_eq!(counts(&plan, &members), vec![8, 8, 7, 7]);
        let summary = plan_summary(&plan);
        assert_eq!(
            summary,
            vec![
                Share { member: 'a', first: 1, last: 8 },
                Share { member: 'b', first: 9, last: 16 },
                Share { member: 'c', first: 17, last: 23 },
                Share { member: 'd', first: 24, last: 30 },
            ]
        );
    }

    #[test]
    fn every_part_assigned_once() {
        for n in 1..=30usize {
            let members: Vec<usize> = (0..n).collect();
            let plan = distribute_parts(30, &members);
            let parts: Vec<u32> = plan.iter().map(|(p, _)| *p).collect();
            assert_eq!(parts, (1..=30).collect::<Vec<_>>(), "n = {n}");
        }
    }

    #[test]
    fn more_members_than_parts() {
        let members: Vec<u32> = (0..40).collect();
        let plan = distribute_parts(30, &members);
        assert_eq!(plan.len(), 30);
        assert!(plan.iter().all(|&(part, who)| part == who + 1));
    }

    #[test]
    fn no_members_no_plan() {
        assert!(distribute_parts::<u8>(30, &[]).is_empty());
        assert!(plan_summary::<u8>(&[]).is_empty());
    }

    #[test]
    fn single_member_takes_everything() {
        let plan = distribute_parts(30, &[7i64]);
        assert_eq!(plan_summary(&plan), vec![Share { member: 7, first: 1, last: 30 }]);
        assert_eq!(plan_summary(&plan)[0].count(), 30);
    }
}
