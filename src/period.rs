// Time buckets: truncating timestamps to a calendar granularity.
//
// Granularity codes follow the pandas period aliases the exported datasets
// were originally bucketed with (M = month, W = week, ...). A bucket is the
// start instant of its period, so bucket ordering is plain chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::error::PipelineError;

/// Size of a time bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Year,
    Quarter,
    #[default]
    Month,
    /// Monday-start weeks.
    Week,
    Day,
    Hour,
    Minute,
}

impl Granularity {
    pub fn code(&self) -> &'static str {
        match self {
            Granularity::Year => "Y",
            Granularity::Quarter => "Q",
            Granularity::Month => "M",
            Granularity::Week => "W",
            Granularity::Day => "D",
            Granularity::Hour => "H",
            Granularity::Minute => "T",
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    ///
    /// Bucketing happens in UTC. Timestamps carrying another offset were
    /// already converted on parse, so a `-05:00` post late on the 31st lands
    /// in the following month.
    pub fn truncate(&self, ts: DateTime<Utc>) -> TimeBucket {
        let naive = ts.naive_utc();
        let date = naive.date();
        let start = match self {
            Granularity::Year => midnight(date - Duration::days(date.ordinal0() as i64)),
            Granularity::Quarter => {
                let first_month = (date.month0() / 3) * 3 + 1;
                midnight(first_of_month(date, first_month))
            }
            Granularity::Month => midnight(date - Duration::days(date.day0() as i64)),
            Granularity::Week => midnight(
                date - Duration::days(date.weekday().num_days_from_monday() as i64),
            ),
            Granularity::Day => midnight(date),
            Granularity::Hour => midnight(date) + Duration::hours(naive.hour() as i64),
            Granularity::Minute => {
                midnight(date)
                    + Duration::hours(naive.hour() as i64)
                    + Duration::minutes(naive.minute() as i64)
            }
        };
        TimeBucket {
            start,
            granularity: *self,
        }
    }
}

impl FromStr for Granularity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Y" | "A" => Ok(Granularity::Year),
            "Q" => Ok(Granularity::Quarter),
            "M" => Ok(Granularity::Month),
            "W" => Ok(Granularity::Week),
            "D" => Ok(Granularity::Day),
            "H" | "h" => Ok(Granularity::Hour),
            "T" | "min" => Ok(Granularity::Minute),
            other => Err(PipelineError::UnknownGranularity(other.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

// month is always in 1..=12 here, so the fallback never triggers.
fn first_of_month(date: NaiveDate, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// A truncated timestamp. Ordering is chronological by period start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket {
    pub start: NaiveDateTime,
    pub granularity: Granularity,
}

impl TimeBucket {
    /// The full period string, e.g. `2021-03`, `2021Q1` or
    /// `2021-03-01/2021-03-07` for weeks.
    pub fn period_string(&self) -> String {
        let s = self.start;
        match self.granularity {
            Granularity::Year => s.format("%Y").to_string(),
            Granularity::Quarter => format!("{}Q{}", s.year(), s.month0() / 3 + 1),
            Granularity::Month => s.format("%Y-%m").to_string(),
            Granularity::Week => {
                let end = s + Duration::days(6);
                format!("{}/{}", s.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            Granularity::Day => s.format("%Y-%m-%d").to_string(),
            Granularity::Hour => s.format("%Y-%m-%d %H:00").to_string(),
            Granularity::Minute => s.format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    /// Column label for the score table: the period string cut at `/`, with
    /// spaces replaced by underscores.
    pub fn label(&self) -> String {
        let period = self.period_string();
        let head = period.split('/').next().unwrap_or(&period);
        head.replace(' ', "_")
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.period_string())
    }
}
