// Threshold selector: keep the "elite" authors whose summed bucket scores
// reach the configured threshold.
//
// Retained rows keep the aggregator's row order, and that order is frozen
// into the EliteSet. Audience sets, matrix rows and cluster labels are all
// indexed by it.

use std::collections::HashMap;

use super::table::ScoreTable;

/// Selected authors in their canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EliteSet {
    order: Vec<String>,
    positions: HashMap<String, usize>,
}

impl EliteSet {
    pub fn from_ordered(users: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for user in users {
            if !set.positions.contains_key(&user) {
                set.positions.insert(user.clone(), set.order.len());
                set.order.push(user);
            }
        }
        set
    }

    pub fn contains(&self, user: &str) -> bool {
        self.positions.contains_key(user)
    }

    /// Matrix index of `user`.
    pub fn position(&self, user: &str) -> Option<usize> {
        self.positions.get(user).copied()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Retained authors plus the filtered score table (same buckets, fewer rows).
#[derive(Debug, Clone)]
pub struct Selection {
    pub elite: EliteSet,
    pub table: ScoreTable,
}

/// Keep rows with `sum(scores) >= threshold`.
pub fn select(table: &ScoreTable, threshold: f64) -> Selection {
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| row.total() >= threshold)
        .cloned()
        .collect();

    let elite = EliteSet::from_ordered(rows.iter().map(|r| r.user_id.clone()));
    Selection {
        elite,
        table: ScoreTable {
            buckets: table.buckets.clone(),
            rows,
        },
    }
}
