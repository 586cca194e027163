use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

pub const RAMADAN: usize = 9;

fn hijri_month_name(month: usize) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month - 1]
    } else {
        "Unknown"
    }
}

pub struct HijriInfo {
    pub day: usize,
    pub month: usize,
    pub year: usize,
    pub month_name: String,
}

impl HijriInfo {
    pub fn formatted(&self) -> String {
        format!("{} {} {}", self.day, self.month_name, self.year)
    }

    pub fn is_ramadan(&self) -> bool {
        self.month == RAMADAN
    }
}

/// Convert a Gregorian date, shifted by `offset_days` for local moon sighting.
pub fn to_hijri(date: NaiveDate, offset_days: i32) -> Result<HijriInfo> {
    let adjusted = date + Duration::days(offset_days as i64);
    let hd = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .map_err(|e| anyhow::anyhow!("Hijri conversion error: {}", e))?;

    let month = hd.month();
    Ok(HijriInfo {
        day: hd.day(),
        month,
        year: hd.year(),
        month_name: hijri_month_name(month).to_string(),
    })
}

/// Whether `date` falls in Ramadan. Conversion failures count as "no".
pub fn is_ramadan(date: NaiveDate, offset_days: i32) -> bool {
    match to_hijri(date, offset_days) {
        Ok(info) => info.is_ramadan(),
        Err(e) => {
            log::warn!("hijri conversion failed for {}: {}", date, e);
            false
        }
    }
}

/// Returns the Hijri date string for today, with an optional day offset.
pub fn today_hijri_string(offset_days: i32) -> String {
    let today = chrono::Local::now().date_naive();
    match to_hijri(today, offset_days) {
        Ok(info) => info.formatted(),
        Err(_) => {
            let hd = HijriDate::today();
            format!("{} {} {}", hd.day(), hijri_month_name(hd.month()), hd.year())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_bounded() {
        assert_eq!(hijri_month_name(9), "Ramadan");
        assert_eq!(hijri_month_name(0), "Unknown");
        assert_eq!(hijri_month_name(13), "Unknown");
    }

    #[test]
    fn mid_ramadan_1445_is_ramadan() {
        // 1 Ramadan 1445 fell on 11 March 2024; the 25th sits well inside the month.
        let date = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        assert!(is_ramadan(date, 0));
        let date = NaiveDate::from_ymd_opt(2024, 6, 25).unwrap();
        assert!(!is_ramadan(date, 0));
    }
}
