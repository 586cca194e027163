use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Storage format for every timestamp column.
pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FMT: &str = "%Y-%m-%d";

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FMT).to_string()
}

pub fn now_timestamp() -> String {
    timestamp(now())
}

pub fn date_string(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT)
        .map_err(|e| anyhow!("Bad date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Accepts "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DDTHH:MM".
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| anyhow!("Bad date/time '{}' (expected YYYY-MM-DD HH:MM)", s))
}

pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| anyhow!("Bad time '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_datetime_shapes() {
        let a = parse_datetime("2024-05-01 18:30").unwrap();
        let b = parse_datetime("2024-05-01T18:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(timestamp(a), "2024-05-01 18:30:00");
        assert!(parse_datetime("tomorrow").is_err());
    }

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_time("22:00").unwrap(), parse_time("22:00:00").unwrap());
        assert!(parse_time("25:00").is_err());
    }
}
