use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

text_enum! {
    MemorialFrequency, "memorial frequency" {
        Yearly => ("yearly", "Yearly"),
        Monthly => ("monthly", "Monthly"),
        Weekly => ("weekly", "Weekly"),
        Daily => ("daily", "Daily"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deceased {
    pub id: i64,
    pub name: String,
    pub death_date: NaiveDate,
    pub birth_date: Option<NaiveDate>,
    pub relation: Option<String>,
    pub biography: Option<String>,
    /// Whether scheduled memorial campaigns are created at all.
    pub memorial_day: bool,
    pub memorial_frequency: MemorialFrequency,
    pub added_by: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewDeceased {
    pub name: String,
    pub death_date: NaiveDate,
    pub birth_date: Option<NaiveDate>,
    pub relation: Option<String>,
    pub biography: Option<String>,
    pub memorial_day: bool,
    pub memorial_frequency: MemorialFrequency,
}

impl Deceased {
    /// Whole years between birth and death, when the birth date is known.
    pub fn age_at_death(&self) -> Option<i32> {
        let birth = self.birth_date?;
        let mut age = self.death_date.year() - birth.year();
        if (self.death_date.month(), self.death_date.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        Some(age.max(0))
    }

    pub fn is_memorial_due(&self, today: NaiveDate) -> bool {
        if !self.memorial_day || today < self.death_date {
            return false;
        }
        let death = self.death_date;
        match self.memorial_frequency {
            MemorialFrequency::Yearly => today.month() == death.month() && today.day() == death.day(),
            MemorialFrequency::Monthly => today.day() == death.day(),
            MemorialFrequency::Weekly => (today - death).num_days() % 7 == 0,
            MemorialFrequency::Daily => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deceased(freq: MemorialFrequency) -> Deceased {
        Deceased {
            id: 1,
            name: "Fatima".into(),
            death_date: date(2020, 3, 15),
            birth_date: Some(date(1950, 6, 1)),
            relation: None,
            biography: None,
            memorial_day: true,
            memorial_frequency: freq,
            added_by: 1,
            created_at: String::new(),
        }
    }

    #[test]
    fn age_counts_whole_years() {
        assert_eq!(deceased(MemorialFrequency::Yearly).age_at_death(), Some(69));
        let mut d = deceased(MemorialFrequency::Yearly);
        d.birth_date = None;
        assert_eq!(d.age_at_death(), None);
    }

    #[test]
    fn yearly_matches_anniversary_only() {
        let d = deceased(MemorialFrequency::Yearly);
        assert!(d.is_memorial_due(date(2024, 3, 15)));
        assert!(!d.is_memorial_due(date(2024, 4, 15)));
    }

    #[test]
    fn monthly_matches_day_of_month() {
        let d = deceased(MemorialFrequency::Monthly);
        assert!(d.is_memorial_due(date(2024, 8, 15)));
        assert!(!d.is_memorial_due(date(2024, 8, 16)));
    }

    #[test]
    fn weekly_counts_whole_weeks() {
        let d = deceased(MemorialFrequency::Weekly);
        assert!(d.is_memorial_due(date(2020, 3, 22)));
        assert!(!d.is_memorial_due(date(2020, 3, 23)));
    }

    #[test]
    fn disabled_or_before_death_is_never_due() {
        let mut d = deceased(MemorialFrequency::Daily);
        assert!(d.is_memorial_due(date(2024, 1, 1)));
        assert!(!d.is_memorial_due(date(2019, 1, 1)));
        d.memorial_day = false;
        assert!(!d.is_memorial_due(date(2024, 1, 1)));
    }
}
