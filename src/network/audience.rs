// Co-audience network builder: second pass over the event log.
//
// For every elite author, collect the distinct accounts that reposted them
// anywhere in the log (buckets play no part here). Each audience starts out
// containing the author themself. The interval window is checked against
// every event's own timestamp.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info};

use crate::events::{self, interval, EventSource, Interval, RepostEvent};
use crate::scoring::threshold::EliteSet;

/// Audience sets indexed by elite position.
#[derive(Debug, Clone, PartialEq)]
pub struct AudienceSets {
    labels: Vec<String>,
    sets: Vec<BTreeSet<String>>,
}

impl AudienceSets {
    /// Seed every elite author's audience with their own id.
    pub fn seeded(elite: &EliteSet) -> Self {
        let labels = elite.order().to_vec();
        let sets = labels
            .iter()
            .map(|user| BTreeSet::from([user.clone()]))
            .collect();
        Self { labels, sets }
    }

    /// Build directly from already-decoded events.
    pub fn from_events<I>(elite: &EliteSet, interval: Option<&Interval>, events: I) -> Self
    where
        I: IntoIterator<Item = RepostEvent>,
    {
        let mut audiences = Self::seeded(elite);
        for event in events {
            audiences.record(elite, interval, &event);
        }
        audiences
    }

    /// Add the reposter to the reposted author's audience if the author is
    /// elite and the event falls inside the window. Returns whether it counted.
    pub fn record(
        &mut self,
        elite: &EliteSet,
        interval: Option<&Interval>,
        event: &RepostEvent,
    ) -> bool {
        if !interval::allows(interval, event.timestamp) {
            return false;
        }
        match elite.position(&event.reposted_author) {
            Some(idx) => {
                self.sets[idx].insert(event.reposting_author.clone());
                true
            }
            None => false,
        }
    }

    /// Elite ids, in matrix order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn audience(&self, idx: usize) -> &BTreeSet<String> {
        &self.sets[idx]
    }

    pub fn get(&self, user: &str) -> Option<&BTreeSet<String>> {
        self.labels
            .iter()
            .position(|l| l == user)
            .map(|idx| &self.sets[idx])
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Replay `source` a second time and collect audiences for the elite set.
pub fn build(
    source: &dyn EventSource,
    elite: &EliteSet,
    interval: Option<&Interval>,
) -> Result<AudienceSets> {
    let mut audiences = AudienceSets::seeded(elite);
    let mut linked = 0usize;

    events::replay_reposts(source, |event| {
        if audiences.record(elite, interval, &event) {
            linked += 1;
        }
    })?;

    info!(
        elite = elite.len(),
        reposts_linked = linked,
        "Co-audience network built"
    );
    for (label, set) in audiences.labels.iter().zip(&audiences.sets) {
        debug!(user = %label, audience = set.len(), "Audience size");
    }
    Ok(audiences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::interval::parse_timestamp;

    fn repost(ts: &str, author: &str, by: &str) -> RepostEvent {
        RepostEvent {
            timestamp: parse_timestamp(ts).unwrap(),
            reposted_author: author.to_string(),
            reposted_author_avatar: "img".to_string(),
            reposting_author: by.to_string(),
        }
    }

    #[test]
    fn test_audience_includes_self_and_dedups() {
        let elite = EliteSet::from_ordered(vec!["a".to_string()]);
        let aud = AudienceSets::from_events(
            &elite,
            None,
            vec![
                repost("2021-01-01", "a", "b"),
                repost("2021-01-02", "a", "c"),
                repost("2021-02-01", "a", "b"),
            ],
        );
        let got: Vec<&str> = aud.audience(0).iter().map(String::as_str).collect();
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_non_elite_authors_ignored() {
        let elite = EliteSet::from_ordered(vec!["a".to_string()]);
        let aud = AudienceSets::from_events(&elite, None, vec![repost("2021-01-01", "z", "b")]);
        assert_eq!(aud.audience(0).len(), 1);
        assert!(aud.get("z").is_none());
    }

    #[test]
    fn test_interval_checked_per_event() {
        let elite = EliteSet::from_ordered(vec!["a".to_string()]);
        let window: Interval = "2021-01-01,2021-01-31".parse().unwrap();
        // The in-window event comes first; the later out-of-window event
        // must be judged on its own timestamp.
        let aud = AudienceSets::from_events(
            &elite,
            Some(&window),
            vec![
                repost("2021-01-15", "a", "inside"),
                repost("2021-05-01", "a", "outside"),
            ],
        );
        assert!(aud.audience(0).contains("inside"));
        assert!(!aud.audience(0).contains("outside"));
    }
}
