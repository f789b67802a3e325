// Inclusive time-window filter applied to each event's own timestamp.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::PipelineError;

/// A closed `[start, end]` window. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// `None` means no window is configured and every event passes.
pub fn allows(interval: Option<&Interval>, ts: DateTime<Utc>) -> bool {
    interval.is_none_or(|i| i.contains(ts))
}

impl FromStr for Interval {
    type Err = PipelineError;

    /// Parse `"start,end"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(',')
            .ok_or_else(|| PipelineError::InvalidInterval(s.to_string()))?;
        let start = parse_timestamp(start)?;
        let end = parse_timestamp(end)?;
        if start > end {
            return Err(PipelineError::InvalidInterval(s.to_string()));
        }
        Ok(Interval { start, end })
    }
}

/// Parse a timestamp as UTC. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// (space or `T` separator, no offset) and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, PipelineError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(PipelineError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let interval: Interval = "2021-01-01,2021-02-01".parse().unwrap();
        assert!(interval.contains(parse_timestamp("2021-01-01").unwrap()));
        assert!(interval.contains(parse_timestamp("2021-02-01T00:00:00Z").unwrap()));
        assert!(!interval.contains(parse_timestamp("2021-02-01T00:00:01Z").unwrap()));
    }

    #[test]
    fn test_mixed_formats() {
        let interval: Interval = "2021-01-01 10:00:00, 2021-01-02T00:00:00+02:00"
            .parse()
            .unwrap();
        assert_eq!(interval.end.to_rfc3339(), "2021-01-01T22:00:00+00:00");
    }

    #[test]
    fn test_rejects_reversed_and_unsplit() {
        assert!("2021-02-01,2021-01-01".parse::<Interval>().is_err());
        assert!("2021-02-01".parse::<Interval>().is_err());
        assert!("soon,later".parse::<Interval>().is_err());
    }

    #[test]
    fn test_no_interval_allows_everything() {
        assert!(allows(None, parse_timestamp("1999-01-01").unwrap()));
    }

    #[test]
    fn test_twitter_timestamp() {
        let ts = parse_timestamp("2021-03-05T14:05:00.000Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-05T14:05:00+00:00");
    }
}
