//! Ranked entries and the total order used to rank them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An identity paired with its current count.
///
/// Two entries are equal iff both `id` and `score` match. Ordering between
/// entries is *rank* order (see [`rank_order`]), so the entry that sorts first
/// is the one at the top of a chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoredEntry {
    /// The thing being ranked (e.g. a song id).
    pub id: i64,
    /// Its current count.
    pub score: i64,
}

impl ScoredEntry {
    #[must_use]
    pub const fn new(id: i64, score: i64) -> Self {
        Self { id, score }
    }
}

/// Rank order: score descending, then id ascending.
///
/// Distinct ids never compare equal, so an ordered set keyed by this order
/// never collapses two different entries into one.
#[inline]
#[must_use]
pub fn rank_order(a: &ScoredEntry, b: &ScoredEntry) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

impl PartialOrd for ScoredEntry {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredEntry {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self, other)
    }
}

impl From<(i64, i64)> for ScoredEntry {
    fn from((id, score): (i64, i64)) -> Self {
        Self { id, score }
    }
}

impl From<ScoredEntry> for (i64, i64) {
    fn from(e: ScoredEntry) -> Self {
        (e.id, e.score)
    }
}
