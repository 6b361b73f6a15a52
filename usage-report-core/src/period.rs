//! Report periods and date ranges.

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// How far back a report looks when no start date is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// Just the end date
    #[default]
    Daily,
    /// The seven days ending on the end date
    Weekly,
    /// The thirty days ending on the end date
    Monthly,
    /// Explicit start and end dates
    Custom,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Custom => "custom",
        }
    }

    /// Days before the end date that the period starts.
    fn lookback_days(&self) -> u64 {
        match self {
            ReportPeriod::Daily => 0,
            ReportPeriod::Weekly => 6,
            ReportPeriod::Monthly | ReportPeriod::Custom => 29,
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(ReportPeriod::Daily),
            "weekly" => Ok(ReportPeriod::Weekly),
            "monthly" => Ok(ReportPeriod::Monthly),
            "custom" => Ok(ReportPeriod::Custom),
            _ => Err(format!("unknown report period: {}", s)),
        }
    }
}

/// Inclusive range of calendar dates covered by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Fill in missing dates for a report run.
///
/// The end date defaults to the day before `today`. The start date defaults
/// to the end date minus the period's lookback.
pub fn resolve_date_range(
    period: ReportPeriod,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange> {
    let end = match end {
        Some(end) => end,
        None => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| Error::Config(format!("no day before {}", today)))?,
    };
    let start = match start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(period.lookback_days()))
            .ok_or_else(|| Error::Config(format!("period start before {} overflows", end)))?,
    };
    DateRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_daily_defaults_to_yesterday() {
        let range = resolve_date_range(ReportPeriod::Daily, None, None, date("2025-12-10")).unwrap();
        assert_eq!(range, DateRange::single(date("2025-12-09")));
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_weekly_lookback() {
        let range =
            resolve_date_range(ReportPeriod::Weekly, None, Some(date("2025-12-09")), date("2026-01-01"))
                .unwrap();
        assert_eq!(range.start, date("2025-12-03"));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn test_monthly_lookback() {
        let range = resolve_date_range(ReportPeriod::Monthly, None, None, date("2025-03-01")).unwrap();
        assert_eq!(range.end, date("2025-02-28"));
        assert_eq!(range.days(), 30);
    }

    #[test]
    fn test_explicit_dates_win() {
        let range = resolve_date_range(
            ReportPeriod::Daily,
            Some(date("2025-11-01")),
            Some(date("2025-11-15")),
            date("2025-12-10"),
        )
        .unwrap();
        assert_eq!(range.start, date("2025-11-01"));
        assert!(range.contains(date("2025-11-15")));
        assert!(!range.contains(date("2025-11-16")));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = resolve_date_range(
            ReportPeriod::Custom,
            Some(date("2025-12-10")),
            Some(date("2025-12-01")),
            date("2025-12-20"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange { .. }));
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("Weekly".parse::<ReportPeriod>().unwrap(), ReportPeriod::Weekly);
        assert!("fortnightly".parse::<ReportPeriod>().is_err());
    }
}
