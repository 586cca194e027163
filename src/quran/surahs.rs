use crate::models::RevelationType;

/// (number, Arabic name, English name, revelation type, verse count, revelation order)
pub type SurahRow = (u32, &'static str, &'static str, RevelationType, u32, u32);

pub const SURAHS: [SurahRow; 114] = [
    (1, "الفاتحة", "The Opening", RevelationType::Meccan, 7, 5),
    (2, "البقرة", "The Cow", RevelationType::Medinan, 286, 87),
    (3, "آل عمران", "The Family of Imran", RevelationType::Medinan, 200, 89),
    (4, "النساء", "The Women", RevelationType::Medinan, 176, 92),
    (5, "المائدة", "The Table Spread", RevelationType::Medinan, 120, 112),
    (6, "الأنعام", "The Cattle", RevelationType::Meccan, 165, 55),
    (7, "الأعراف", "The Heights", RevelationType::Meccan, 206, 39),
    (8, "الأنفال", "The Spoils of War", RevelationType::Medinan, 75, 88),
    (9, "التوبة", "The Repentance", RevelationType::Medinan, 129, 113),
    (10, "يونس", "Jonah", RevelationType::Meccan, 109, 51),
    (11, "هود", "Hud", RevelationType::Meccan, 123, 52),
    (12, "يوسف", "Joseph", RevelationType::Meccan, 111, 53),
    (13, "الرعد", "The Thunder", RevelationType::Medinan, 43, 96),
    (14, "إبراهيم", "Abraham", RevelationType::Meccan, 52, 72),
    (15, "الحجر", "The Rocky Tract", RevelationType::Meccan, 99, 54),
    (16, "النحل", "The Bee", RevelationType::Meccan, 128, 70),
    (17, "الإسراء", "The Night Journey", RevelationType::Meccan, 111, 50),
    (18, "الكهف", "The Cave", RevelationType::Meccan, 110, 69),
    (19, "مريم", "Mary", RevelationType::Meccan, 98, 44),
    (20, "طه", "Ta-Ha", RevelationType::Meccan, 135, 45),
    (21, "الأنبياء", "The Prophets", RevelationType::Meccan, 112, 73),
    (22, "الحج", "The Pilgrimage", RevelationType::Medinan, 78, 103),
    (23, "المؤمنون", "The Believers", RevelationType::Meccan, 118, 74),
    (24, "النور", "The Light", RevelationType::Medinan, 64, 102),
    (25, "الفرقان", "The Criterion", RevelationType::Meccan, 77, 42),
    (26, "الشعراء", "The Poets", RevelationType::Meccan, 227, 47),
    (27, "النمل", "The Ant", RevelationType::Meccan, 93, 48),
    (28, "القصص", "The Stories", RevelationType::Meccan, 88, 49),
    (29, "العنكبوت", "The Spider", RevelationType::Meccan, 69, 85),
    (30, "الروم", "The Romans", RevelationType::Meccan, 60, 84),
    (31, "لقمان", "Luqman", RevelationType::Meccan, 34, 57),
    (32, "السجدة", "The Prostration", RevelationType::Meccan, 30, 75),
    (33, "الأحزاب", "The Combined Forces", RevelationType::Medinan, 73, 90),
    (34, "سبأ", "Sheba", RevelationType::Meccan, 54, 58),
    (35, "فاطر", "Originator", RevelationType::Meccan, 45, 43),
    (36, "يس", "Ya-Sin", RevelationType::Meccan, 83, 41),
    (37, "الصافات", "Those Who Set The Ranks", RevelationType::Meccan, 182, 56),
    (38, "ص", "Sad", RevelationType::Meccan, 88, 38),
    (39, "الزمر", "The Troops", RevelationType::Meccan, 75, 59),
    (40, "غافر", "The Forgiver", RevelationType::Meccan, 85, 60),
    (41, "فصلت", "Explained in Detail", RevelationType::Meccan, 54, 61),
    (42, "الشورى", "The Consultation", RevelationType::Meccan, 53, 62),
    (43, "الزخرف", "The Ornaments of Gold", RevelationType::Meccan, 89, 63),
    (44, "الدخان", "The Smoke", RevelationType::Meccan, 59, 64),
    (45, "الجاثية", "The Crouching", RevelationType::Meccan, 37, 65),
    (46, "الأحقاف", "The Wind-Curved Sandhills", RevelationType::Meccan, 35, 66),
    (47, "محمد", "Muhammad", RevelationType::Medinan, 38, 95),
    (48, "الفتح", "The Victory", RevelationType::Medinan, 29, 111),
    (49, "الحجرات", "The Rooms", RevelationType::Medinan, 18, 106),
    (50, "ق", "Qaf", RevelationType::Meccan, 45, 34),
    (51, "الذاريات", "The Winnowing Winds", RevelationType::Meccan, 60, 67),
    (52, "الطور", "The Mount", RevelationType::Meccan, 49, 76),
    (53, "النجم", "The Star", RevelationType::Meccan, 62, 23),
    (54, "القمر", "The Moon", RevelationType::Meccan, 55, 37),
    (55, "الرحمن", "The Beneficent", RevelationType::Medinan, 78, 97),
    (56, "الواقعة", "The Inevitable", RevelationType::Meccan, 96, 46),
    (57, "الحديد", "The Iron", RevelationType::Medinan, 29, 94),
    (58, "المجادلة", "The Pleading Woman", RevelationType::Medinan, 22, 105),
    (59, "الحشر", "The Exile", RevelationType::Medinan, 24, 101),
    (60, "الممتحنة", "She That Is To Be Examined", RevelationType::Medinan, 13, 91),
    (61, "الصف", "The Ranks", RevelationType::Medinan, 14, 109),
    (62, "الجمعة", "The Congregation", RevelationType::Medinan, 11, 110),
    (63, "المنافقون", "The Hypocrites", RevelationType::Medinan, 11, 104),
    (64, "التغابن", "The Mutual Disillusion", RevelationType::Medinan, 18, 108),
    (65, "الطلاق", "The Divorce", RevelationType::Medinan, 12, 99),
    (66, "التحريم", "The Prohibition", RevelationType::Medinan, 12, 107),
    (67, "الملك", "The Sovereignty", RevelationType::Meccan, 30, 77),
    (68, "القلم", "The Pen", RevelationType::Meccan, 52, 2),
    (69, "الحاقة", "The Reality", RevelationType::Meccan, 52, 78),
    (70, "المعارج", "The Ascending Stairways", RevelationType::Meccan, 44, 79),
    (71, "نوح", "Noah", RevelationType::Meccan, 28, 71),
    (72, "الجن", "The Jinn", RevelationType::Meccan, 28, 40),
    (73, "المزمل", "The Enshrouded One", RevelationType::Meccan, 20, 3),
    (74, "المدثر", "The Cloaked One", RevelationType::Meccan, 56, 4),
    (75, "القيامة", "The Resurrection", RevelationType::Meccan, 40, 31),
    (76, "الإنسان", "The Human", RevelationType::Medinan, 31, 98),
    (77, "المرسلات", "The Emissaries", RevelationType::Meccan, 50, 33),
    (78, "النبأ", "The Tidings", RevelationType::Meccan, 40, 80),
    (79, "النازعات", "Those Who Drag Forth", RevelationType::Meccan, 46, 81),
    (80, "عبس", "He Frowned", RevelationType::Meccan, 42, 24),
    (81, "التكوير", "The Overthrowing", RevelationType::Meccan, 29, 7),
    (82, "الانفطار", "The Cleaving", RevelationType::Meccan, 19, 82),
    (83, "المطففين", "The Defrauding", RevelationType::Meccan, 36, 86),
    (84, "الانشقاق", "The Sundering", RevelationType::Meccan, 25, 83),
    (85, "البروج", "The Mansions of the Stars", RevelationType::Meccan, 22, 27),
    (86, "الطارق", "The Nightcomer", RevelationType::Meccan, 17, 36),
    (87, "الأعلى", "The Most High", RevelationType::Meccan, 19, 8),
    (88, "الغاشية", "The Overwhelming", RevelationType::Meccan, 26, 68),
    (89, "الفجر", "The Dawn", RevelationType::Meccan, 30, 10),
    (90, "البلد", "The City", RevelationType::Meccan, 20, 35),
    (91, "الشمس", "The Sun", RevelationType::Meccan, 15, 26),
    (92, "الليل", "The Night", RevelationType::Meccan, 21, 9),
    (93, "الضحى", "The Morning Hours", RevelationType::Meccan, 11, 11),
    (94, "الشرح", "The Relief", RevelationType::Meccan, 8, 12),
    (95, "التين", "The Fig", RevelationType::Meccan, 8, 28),
    (96, "العلق", "The Clot", RevelationType::Meccan, 19, 1),
    (97, "القدر", "The Power", RevelationType::Meccan, 5, 25),
    (98, "البينة", "The Clear Proof", RevelationType::Medinan, 8, 100),
    (99, "الزلزلة", "The Earthquake", RevelationType::Medinan, 8, 93),
    (100, "العاديات", "The Coursers", RevelationType::Meccan, 11, 14),
    (101, "القارعة", "The Calamity", RevelationType::Meccan, 11, 30),
    (102, "التكاثر", "The Rivalry in World Increase", RevelationType::Meccan, 8, 16),
    (103, "العصر", "The Declining Day", RevelationType::Meccan, 3, 13),
    (104, "الهمزة", "The Traducer", RevelationType::Meccan, 9, 32),
    (105, "الفيل", "The Elephant", RevelationType::Meccan, 5, 19),
    (106, "قريش", "Quraysh", RevelationType::Meccan, 4, 29),
    (107, "الماعون", "Small Kindnesses", RevelationType::Meccan, 7, 17),
    (108, "الكوثر", "Abundance", RevelationType::Meccan, 3, 15),
    (109, "الكافرون", "The Disbelievers", RevelationType::Meccan, 6, 18),
    (110, "النصر", "The Divine Support", RevelationType::Medinan, 3, 114),
    (111, "المسد", "The Palm Fiber", RevelationType::Meccan, 5, 6),
    (112, "الإخلاص", "The Sincerity", RevelationType::Meccan, 4, 22),
    (113, "الفلق", "The Daybreak", RevelationType::Meccan, 5, 20),
    (114, "الناس", "Mankind", RevelationType::Meccan, 6, 21),
];

pub fn surah_row(number: u32) -> Option<&'static SurahRow> {
    SURAHS.get((number as usize).checked_sub(1)?)
}

/// Verse count of a surah, `None` for numbers outside 1..=114.
pub fn verse_count(number: u32) -> Option<u32> {
    surah_row(number).map(|row| row.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_numbered_in_order() {
        for (i, row) in SURAHS.iter().enumerate() {
            assert_eq!(row.0 as usize, i + 1);
        }
    }

    #[test]
    fn verse_total_is_6236() {
        let total: u32 = SURAHS.iter().map(|row| row.4).sum();
        assert_eq!(total, 6236);
    }

    #[test]
    fn lookup_bounds() {
        assert_eq!(verse_count(1), Some(7));
        assert_eq!(verse_count(2), Some(286));
        assert_eq!(verse_count(0), None);
        assert_eq!(verse_count(115), None);
    }
}
