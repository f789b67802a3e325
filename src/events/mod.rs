// Event input: raw tweet records, repost extraction, rewindable sources.
//
// The scoring pass and the network pass both replay the same source, so the
// input has to be readable twice (a file re-opened, or stdin buffered once).

pub mod interval;
pub mod record;
pub mod source;

pub use interval::Interval;
pub use record::RepostEvent;
pub use source::{EventSource, FileSource, MemorySource};

use anyhow::Result;
use tracing::debug;

use crate::error::PipelineError;
use record::RawLine;

/// Counters for one full pass over an event source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub lines: usize,
    pub reposts: usize,
    /// Retweet references dropped for missing fields.
    pub incomplete: usize,
}

/// Replay every complete repost event in `source`, in input order.
///
/// A line that is not valid JSON aborts the pass with
/// `PipelineError::MalformedRecord`. Incomplete references are skipped.
pub fn replay_reposts<F>(source: &dyn EventSource, mut visit: F) -> Result<PassStats>
where
    F: FnMut(RepostEvent),
{
    let mut stats = PassStats::default();

    for (idx, line) in source.replay()?.enumerate() {
        let line = line?;
        stats.lines += 1;
        if line.trim().is_empty() {
            continue;
        }

        let parsed: RawLine = serde_json::from_str(&line).map_err(|source| {
            PipelineError::MalformedRecord {
                line: idx + 1,
                source,
            }
        })?;

        for tweet in parsed.tweets() {
            for extracted in tweet.repost_events() {
                match extracted {
                    Some(event) => {
                        stats.reposts += 1;
                        visit(event);
                    }
                    None => stats.incomplete += 1,
                }
            }
        }
    }

    debug!(
        lines = stats.lines,
        reposts = stats.reposts,
        incomplete = stats.incomplete,
        "Event pass complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_line_is_fatal_with_line_number() {
        let source = MemorySource::from_lines(vec![
            r#"{"created_at": "2021-03-01T00:00:00.000Z"}"#.to_string(),
            "{not json".to_string(),
        ]);
        let err = replay_reposts(&source, |_| {}).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MalformedRecord { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let source = MemorySource::from_lines(vec![String::new(), "   ".to_string()]);
        let stats = replay_reposts(&source, |_| {}).unwrap();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.reposts, 0);
    }
}
