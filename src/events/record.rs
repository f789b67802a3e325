// Raw tweet records and repost extraction.
//
// Input lines are tweets already flattened by the upstream collector: each
// referenced tweet carries its own expanded `author` object. Only the few
// fields the pipeline needs are modelled; everything else is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::interval::parse_timestamp;

/// One line of input: a single tweet, an array of tweets, or an API page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawLine {
    Page { data: Vec<RawTweet> },
    Many(Vec<RawTweet>),
    Single(RawTweet),
}

impl RawLine {
    pub fn tweets(&self) -> &[RawTweet] {
        match self {
            RawLine::Page { data } => data,
            RawLine::Many(tweets) => tweets,
            RawLine::Single(tweet) => std::slice::from_ref(tweet),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTweet {
    pub created_at: Option<String>,
    pub author: Option<RawAuthor>,
    pub referenced_tweets: Option<Vec<RawReference>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub username: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReference {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub author: Option<RawAuthor>,
}

impl RawReference {
    pub fn is_retweet(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.contains("retweeted"))
    }
}

/// A repost: `reposting_author` rebroadcast a post by `reposted_author`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepostEvent {
    pub timestamp: DateTime<Utc>,
    pub reposted_author: String,
    pub reposted_author_avatar: String,
    pub reposting_author: String,
}

impl RawTweet {
    /// One entry per retweet reference: `Some` when every required field is
    /// present and the timestamp parses, `None` for an incomplete record.
    pub fn repost_events(&self) -> impl Iterator<Item = Option<RepostEvent>> + '_ {
        self.referenced_tweets
            .iter()
            .flatten()
            .filter(|r| r.is_retweet())
            .map(move |r| self.build_event(r))
    }

    fn build_event(&self, reference: &RawReference) -> Option<RepostEvent> {
        let timestamp = parse_timestamp(self.created_at.as_deref()?).ok()?;
        let original = reference.author.as_ref()?;
        let reposted_author = non_empty(original.username.as_deref())?;
        let reposted_author_avatar = non_empty(original.profile_image_url.as_deref())?;
        let reposting_author = non_empty(self.author.as_ref()?.username.as_deref())?;

        Some(RepostEvent {
            timestamp,
            reposted_author,
            reposted_author_avatar,
            reposting_author,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETWEET: &str = r#"{
        "id": "1",
        "created_at": "2021-03-05T14:05:00.000Z",
        "author": {"username": "bob"},
        "referenced_tweets": [
            {"type": "retweeted", "id": "0", "author": {"username": "alice", "profile_image_url": "https://img/alice.jpg"}}
        ]
    }"#;

    #[test]
    fn test_extracts_retweet() {
        let line: RawLine = serde_json::from_str(RETWEET).unwrap();
        let events: Vec<_> = line.tweets()[0].repost_events().collect();
        assert_eq!(events.len(), 1);
        let event = events[0].clone().unwrap();
        assert_eq!(event.reposted_author, "alice");
        assert_eq!(event.reposting_author, "bob");
        assert_eq!(event.reposted_author_avatar, "https://img/alice.jpg");
    }

    #[test]
    fn test_quotes_and_replies_are_not_reposts() {
        let json = r#"{
            "created_at": "2021-03-05T14:05:00.000Z",
            "author": {"username": "bob"},
            "referenced_tweets": [
                {"type": "quoted", "author": {"username": "alice", "profile_image_url": "x"}},
                {"type": "replied_to", "author": {"username": "carol", "profile_image_url": "y"}}
            ]
        }"#;
        let line: RawLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.tweets()[0].repost_events().count(), 0);
    }

    #[test]
    fn test_missing_avatar_is_incomplete() {
        let json = r#"{
            "created_at": "2021-03-05T14:05:00.000Z",
            "author": {"username": "bob"},
            "referenced_tweets": [{"type": "retweeted", "author": {"username": "alice"}}]
        }"#;
        let line: RawLine = serde_json::from_str(json).unwrap();
        let events: Vec<_> = line.tweets()[0].repost_events().collect();
        assert_eq!(events, vec![None]);
    }

    #[test]
    fn test_page_of_tweets() {
        let json = format!(r#"{{"data": [{RETWEET}, {RETWEET}]}}"#);
        let line: RawLine = serde_json::from_str(&json).unwrap();
        assert_eq!(line.tweets().len(), 2);
    }

    #[test]
    fn test_tweet_without_references() {
        let json = r#"{"created_at": "2021-03-05T14:05:00.000Z", "author": {"username": "bob"}, "text": "hi"}"#;
        let line: RawLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.tweets()[0].repost_events().count(), 0);
    }
}
