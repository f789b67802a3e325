// Fatal error taxonomy for the pipeline.
//
// Most functions return anyhow::Result; these variants exist for the failures
// a caller may want to match on after downcasting. Incomplete records and
// degenerate denominators are handled locally and never show up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input line is not valid JSON. Fatal for the whole run.
    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid interval {0:?}: expected \"start,end\" with start <= end")]
    InvalidInterval(String),

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("unknown granularity code {0:?} (expected one of Y, Q, M, W, D, H, T)")]
    UnknownGranularity(String),

    #[error("unknown clustering method {0:?}")]
    UnknownClusterMethod(String),

    #[error("unknown clustering algorithm {0:?} (expected nn_chain or generic)")]
    UnknownClusterAlgorithm(String),

    /// The clustering collaborator refused or failed. No partial output is kept.
    #[error("clustering failed: {0}")]
    Clustering(String),
}
