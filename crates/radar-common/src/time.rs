//! Nominal date and time of radar products.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H%M%S";

/// Nominal date (`YYYYMMDD`) and time (`HHmmss`), each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominalDateTime {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

impl NominalDateTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date from a `YYYYMMDD` string, or clear it with `None`.
    pub fn set_date(&mut self, value: Option<&str>) -> RadarResult<()> {
        self.date = match value {
            Some(s) => Some(parse_date(s)?),
            None => None,
        };
        Ok(())
    }

    /// Set the time from a `HHmmss` string, or clear it with `None`.
    pub fn set_time(&mut self, value: Option<&str>) -> RadarResult<()> {
        self.time = match value {
            Some(s) => Some(parse_time(s)?),
            None => None,
        };
        Ok(())
    }

    /// The date formatted as `YYYYMMDD`.
    pub fn date(&self) -> Option<String> {
        self.date.map(|d| d.format(DATE_FORMAT).to_string())
    }

    /// The time formatted as `HHmmss`.
    pub fn time(&self) -> Option<String> {
        self.time.map(|t| t.format(TIME_FORMAT).to_string())
    }

    /// Combined date and time when both are set.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match (self.date, self.time) {
            (Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }

    pub fn set_datetime(&mut self, datetime: NaiveDateTime) {
        self.date = Some(datetime.date());
        self.time = Some(datetime.time());
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }
}

fn parse_date(s: &str) -> RadarResult<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RadarError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| RadarError::InvalidDate(s.to_string()))
}

fn parse_time(s: &str) -> RadarResult<NaiveTime> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RadarError::InvalidTime(s.to_string()));
    }
    NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|_| RadarError::InvalidTime(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_and_time_roundtrip() {
        let mut dt = NominalDateTime::new();
        dt.set_date(Some("20240115")).unwrap();
        dt.set_time(Some("123000")).unwrap();
        assert_eq!(dt.date().as_deref(), Some("20240115"));
        assert_eq!(dt.time().as_deref(), Some("123000"));
        assert!(dt.is_complete());
        assert_eq!(
            dt.datetime().unwrap().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2024-01-15T12:30:00"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut dt = NominalDateTime::new();
        assert!(matches!(dt.set_date(Some("2024-01-15")), Err(RadarError::InvalidDate(_))));
        assert!(matches!(dt.set_date(Some("20241315")), Err(RadarError::InvalidDate(_))));
        assert!(matches!(dt.set_time(Some("1230")), Err(RadarError::InvalidTime(_))));
        assert!(matches!(dt.set_time(Some("250000")), Err(RadarError::InvalidTime(_))));
        assert_eq!(dt.date(), None);
    }

    #[test]
    fn test_clear() {
        let mut dt = NominalDateTime::new();
        dt.set_date(Some("20240115")).unwrap();
        dt.set_date(None).unwrap();
        assert_eq!(dt.date(), None);
        assert!(!dt.is_complete());
    }
}
