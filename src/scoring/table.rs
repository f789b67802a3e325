// Score table types shared by the aggregator, the selector and the CSV writer.

use crate::period::TimeBucket;

/// Fixed leading columns of the score table.
pub const AVATAR_COLUMN: &str = "profile_image_url";
pub const AUTHOR_COLUMN: &str = "author_name";

/// Per-bucket decayed scores for one reposted author.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub avatar_url: String,
    pub user_id: String,
    /// Aligned with `ScoreTable::buckets`.
    pub scores: Vec<f64>,
}

impl ScoreRow {
    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }
}

/// User x bucket score matrix. Row order is the canonical user order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    pub buckets: Vec<TimeBucket>,
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![AVATAR_COLUMN.to_string(), AUTHOR_COLUMN.to_string()];
        header.extend(self.buckets.iter().map(TimeBucket::label));
        header
    }

    pub fn row(&self, user_id: &str) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.user_id == user_id)
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.user_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
