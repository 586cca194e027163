/// First (surah, ayah) of each of the 30 parts.
pub const JUZ_STARTS: [(u32, u32); 30] = [
    (1, 1),
    (2, 142),
    (2, 253),
    (3, 92),
    (4, 24),
    (4, 148),
    (5, 82),
    (6, 111),
    (7, 88),
    (8, 41),
    (9, 93),
    (11, 6),
    (12, 53),
    (15, 1),
    (17, 1),
    (18, 75),
    (21, 1),
    (23, 1),
    (25, 21),
    (27, 56),
    (29, 46),
    (33, 31),
    (36, 28),
    (39, 32),
    (41, 47),
    (46, 1),
    (51, 31),
    (58, 1),
    (67, 1),
    (78, 1),
];

/// Traditional names of the parts, taken from their opening words.
pub const PART_NAMES: [&str; 30] = [
    "الم",
    "سيقول",
    "تلك الرسل",
    "لن تنالوا",
    "والمحصنات",
    "لا يحب الله",
    "وإذا سمعوا",
    "ولو أننا",
    "قال الملأ",
    "واعلموا",
    "يعتذرون",
    "وما من دابة",
    "وما أبرئ",
    "ربما",
    "سبحان الذي",
    "قال ألم",
    "اقترب للناس",
    "قد أفلح",
    "وقال الذين",
    "أمن خلق",
    "اتل ما أوحي",
    "ومن يقنت",
    "وما لي",
    "فمن أظلم",
    "إليه يرد",
    "حم",
    "قال فما خطبكم",
    "قد سمع الله",
    "تبارك الذي",
    "عم",
];

/// Part containing the given ayah: the last boundary not after it.
///
/// Positions before 1:1 (surah or ayah 0) fall into part 1.
pub fn part_for_ayah(surah: u32, ayah: u32) -> u32 {
    let mut part = 1;
    for (i, &start) in JUZ_STARTS.iter().enumerate() {
        if (surah, ayah) < start {
            break;
        }
        part = i as u32 + 1;
    }
    part
}

/// Start of `part` and the start of the next one (`None` for part 30).
pub fn part_bounds(part: u32) -> Option<((u32, u32), Option<(u32, u32)>)> {
    if !(1..=30).contains(&part) {
        return None;
    }
    let idx = part as usize - 1;
    Some((JUZ_STARTS[idx], JUZ_STARTS.get(idx + 1).copied()))
}

pub fn part_name(part: u32) -> Option<&'static str> {
    PART_NAMES.get((part as usize).checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_start_their_own_part() {
        for (i, &(s, a)) in JUZ_STARTS.iter().enumerate() {
            assert_eq!(part_for_ayah(s, a), i as u32 + 1);
        }
    }

    #[test]
    fn ayah_before_boundary_stays_in_previous_part() {
        assert_eq!(part_for_ayah(2, 141), 1);
        assert_eq!(part_for_ayah(2, 252), 2);
        assert_eq!(part_for_ayah(18, 74), 15);
        assert_eq!(part_for_ayah(77, 50), 29);
    }

    #[test]
    fn last_ayah_is_in_part_30() {
        assert_eq!(part_for_ayah(114, 6), 30);
    }

    #[test]
    fn bounds_chain_together() {
        assert_eq!(part_bounds(1), Some(((1, 1), Some((2, 142)))));
        assert_eq!(part_bounds(30), Some(((78, 1), None)));
        assert_eq!(part_bounds(0), None);
        assert_eq!(part_name(30), Some("عم"));
    }
}
