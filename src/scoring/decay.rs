// Decay score accumulator.
//
// Each user's score carries over from bucket to bucket:
//
//   score_k = count_k + alpha * score_{k-1}
//
// so after k buckets the score is sum(count_i * alpha^(k-i)). With alpha <= 0
// history is ignored and the score is just the current bucket's count.

use std::collections::HashMap;

/// One step of the recurrence.
pub fn update(previous: f64, count: u64, alpha: f64) -> f64 {
    if alpha > 0.0 {
        count as f64 + alpha * previous
    } else {
        count as f64
    }
}

/// Running per-user scores for a single scoring pass.
///
/// Holds "score as of the last bucket processed" for each user. A user that
/// has not been seen yet starts from 0.
#[derive(Debug, Clone)]
pub struct ScoreState {
    alpha: f64,
    scores: HashMap<String, f64>,
}

impl ScoreState {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            scores: HashMap::new(),
        }
    }

    /// Fold one bucket's count into the user's score and return the new value.
    pub fn advance(&mut self, user: &str, count: u64) -> f64 {
        let alpha = self.alpha;
        let slot = self.scores.entry(user.to_string()).or_insert(0.0);
        *slot = update(*slot, count, alpha);
        *slot
    }

    pub fn get(&self, user: &str) -> f64 {
        self.scores.get(user).copied().unwrap_or(0.0)
    }
}
