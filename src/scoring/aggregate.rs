// Temporal aggregator: first pass over the event log.
//
// Buckets every in-window repost by time, counts reposts per (author, bucket)
// and runs the decay recurrence over the sorted bucket list for each author.
// Authors are kept in first-seen order, which becomes the canonical user
// order for every later stage.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::info;

use super::decay::ScoreState;
use super::table::{ScoreRow, ScoreTable};
use crate::events::{self, interval, EventSource, Interval, PassStats, RepostEvent};
use crate::period::{Granularity, TimeBucket};

/// Result of a scoring pass that found at least one in-window repost.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: ScoreTable,
    /// Most recent avatar URL seen for each reposted author.
    pub avatars: HashMap<String, String>,
    /// Complete reposts inside the interval.
    pub counted_events: usize,
}

pub struct TemporalAggregator {
    pub granularity: Granularity,
    pub interval: Option<Interval>,
    pub alpha: f64,
}

/// Raw tallies gathered before scoring.
#[derive(Default)]
struct Tally {
    users: Vec<String>,
    index: HashMap<String, usize>,
    avatars: HashMap<String, String>,
    counts: HashMap<(usize, TimeBucket), u64>,
    buckets: BTreeSet<TimeBucket>,
    counted: usize,
}

impl TemporalAggregator {
    pub fn new(granularity: Granularity, interval: Option<Interval>, alpha: f64) -> Self {
        Self {
            granularity,
            interval,
            alpha,
        }
    }

    /// Score an in-memory event sequence. `None` means nothing was in range.
    pub fn from_events<I>(&self, events: I) -> Option<Aggregation>
    where
        I: IntoIterator<Item = RepostEvent>,
    {
        let mut tally = Tally::default();
        for event in events {
            self.observe(&mut tally, event);
        }
        self.score(tally, &ProgressBar::hidden())
    }

    /// Replay `source` once and score it.
    pub fn from_source(
        &self,
        source: &dyn EventSource,
        progress: &ProgressBar,
    ) -> Result<(Option<Aggregation>, PassStats)> {
        let mut tally = Tally::default();
        let stats = events::replay_reposts(source, |event| self.observe(&mut tally, event))?;
        info!(
            reposts = stats.reposts,
            in_range = tally.counted,
            authors = tally.users.len(),
            "Scoring pass read"
        );
        Ok((self.score(tally, progress), stats))
    }

    fn observe(&self, tally: &mut Tally, event: RepostEvent) {
        let RepostEvent {
            timestamp,
            reposted_author,
            reposted_author_avatar,
            ..
        } = event;

        let idx = match tally.index.get(&reposted_author) {
            Some(&idx) => idx,
            None => {
                let idx = tally.users.len();
                tally.users.push(reposted_author.clone());
                tally.index.insert(reposted_author.clone(), idx);
                idx
            }
        };
        tally.avatars.insert(reposted_author, reposted_author_avatar);

        if interval::allows(self.interval.as_ref(), timestamp) {
            let bucket = self.granularity.truncate(timestamp);
            tally.buckets.insert(bucket);
            *tally.counts.entry((idx, bucket)).or_insert(0) += 1;
            tally.counted += 1;
        }
    }

    fn score(&self, tally: Tally, progress: &ProgressBar) -> Option<Aggregation> {
        if tally.counted == 0 {
            return None;
        }

        let buckets: Vec<TimeBucket> = tally.buckets.into_iter().collect();
        let mut state = ScoreState::new(self.alpha);
        let mut rows = Vec::with_capacity(tally.users.len());

        progress.set_length(tally.users.len() as u64);
        for (idx, user) in tally.users.iter().enumerate() {
            let scores = buckets
                .iter()
                .map(|bucket| {
                    let count = tally.counts.get(&(idx, *bucket)).copied().unwrap_or(0);
                    state.advance(user, count)
                })
                .collect();

            rows.push(ScoreRow {
                avatar_url: tally.avatars.get(user).cloned().unwrap_or_default(),
                user_id: user.clone(),
                scores,
            });
            progress.inc(1);
        }
        progress.finish_and_clear();

        Some(Aggregation {
            table: ScoreTable { buckets, rows },
            avatars: tally.avatars,
            counted_events: tally.counted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::interval::parse_timestamp;

    fn repost(ts: &str, author: &str, avatar: &str, by: &str) -> RepostEvent {
        RepostEvent {
            timestamp: parse_timestamp(ts).unwrap(),
            reposted_author: author.to_string(),
            reposted_author_avatar: avatar.to_string(),
            reposting_author: by.to_string(),
        }
    }

    #[test]
    fn test_buckets_are_shared_across_users() {
        let agg = TemporalAggregator::new(Granularity::Month, None, 0.0)
            .from_events(vec![
                repost("2021-02-10", "a", "img", "x"),
                repost("2021-01-10", "b", "img", "x"),
            ])
            .unwrap();
        let labels: Vec<String> = agg.table.buckets.iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["2021-01", "2021-02"]);
        assert_eq!(agg.table.row("a").unwrap().scores, vec![0.0, 1.0]);
        assert_eq!(agg.table.row("b").unwrap().scores, vec![1.0, 0.0]);
    }

    #[test]
    fn test_rows_follow_first_seen_order() {
        let agg = TemporalAggregator::new(Granularity::Day, None, 0.0)
            .from_events(vec![
                repost("2021-01-01", "zed", "i", "x"),
                repost("2021-01-01", "amy", "i", "x"),
                repost("2021-01-02", "zed", "i", "x"),
            ])
            .unwrap();
        assert_eq!(agg.table.user_ids(), vec!["zed", "amy"]);
    }

    #[test]
    fn test_last_avatar_wins() {
        let agg = TemporalAggregator::new(Granularity::Month, None, 0.0)
            .from_events(vec![
                repost("2021-01-01", "a", "old.jpg", "x"),
                repost("2021-01-02", "a", "new.jpg", "y"),
            ])
            .unwrap();
        assert_eq!(agg.avatars["a"], "new.jpg");
        assert_eq!(agg.table.rows[0].avatar_url, "new.jpg");
    }

    #[test]
    fn test_decay_across_gap() {
        let agg = TemporalAggregator::new(Granularity::Month, None, 0.5)
            .from_events(vec![
                repost("2021-01-01", "a", "i", "x"),
                repost("2021-01-02", "a", "i", "y"),
                repost("2021-02-01", "b", "i", "y"),
                repost("2021-03-01", "b", "i", "y"),
            ])
            .unwrap();
        // a has no reposts after January: Jan=2, Feb=0.5*2, Mar=0.5*1
        assert_eq!(agg.table.row("a").unwrap().scores, vec![2.0, 1.0, 0.5]);
        assert_eq!(agg.table.row("b").unwrap().scores, vec![0.0, 1.0, 1.5]);
    }

    #[test]
    fn test_buckets_only_from_observed_periods() {
        let agg = TemporalAggregator::new(Granularity::Month, None, 0.5)
            .from_events(vec![
                repost("2021-01-01", "a", "i", "x"),
                repost("2021-01-02", "a", "i", "y"),
                repost("2021-03-01", "b", "i", "y"),
            ])
            .unwrap();
        assert_eq!(agg.table.buckets.len(), 2);
        assert_eq!(agg.table.row("a").unwrap().scores, vec![2.0, 1.0]);
    }

    #[test]
    fn test_out_of_range_repost_still_updates_avatar() {
        let interval: Interval = "2021-01-01,2021-01-31".parse().unwrap();
        let agg = TemporalAggregator::new(Granularity::Month, Some(interval), 0.0)
            .from_events(vec![
                repost("2021-01-05", "a", "old.jpg", "x"),
                repost("2021-01-06", "a", "old.jpg", "y"),
                repost("2021-04-01", "a", "new.jpg", "z"),
            ])
            .unwrap();
        assert_eq!(agg.counted_events, 2);
        let row = agg.table.row("a").unwrap();
        assert_eq!(row.scores, vec![2.0]);
        assert_eq!(row.avatar_url, "new.jpg");
    }

    #[test]
    fn test_nothing_in_range_is_empty() {
        let interval: Interval = "2022-01-01,2022-12-31".parse().unwrap();
        let agg = TemporalAggregator::new(Granularity::Month, Some(interval), 0.0)
            .from_events(vec![repost("2021-01-01", "a", "i", "x")]);
        assert!(agg.is_none());
        assert!(TemporalAggregator::new(Granularity::Month, None, 0.0)
            .from_events(Vec::new())
            .is_none());
    }

    #[test]
    fn test_out_of_range_author_keeps_zero_row() {
        let interval: Interval = "2021-01-01,2021-01-31".parse().unwrap();
        let agg = TemporalAggregator::new(Granularity::Month, Some(interval), 0.005)
            .from_events(vec![
                repost("2021-01-05", "a", "i", "x"),
                repost("2021-06-05", "b", "i", "x"),
            ])
            .unwrap();
        assert_eq!(agg.counted_events, 1);
        assert_eq!(agg.table.row("b").unwrap().total(), 0.0);
    }
}
