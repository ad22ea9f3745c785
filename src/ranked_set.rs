//! Bounded Top-K set with replace-on-update and retraction by identity.
//!
//! [`RankedBoundedSet`] keeps at most `k` [`ScoredEntry`] values, unique by id,
//! ordered by [`rank_order`](crate::entry::rank_order). It pairs two structures:
//!
//! - a `BTreeSet<ScoredEntry>` holding the entries in rank order, and
//! - a `HashMap<i64, i64>` mapping each present id to its current score.
//!
//! The index makes membership O(1) and lets removal locate the tree node from
//! the id alone, so a retraction carrying a stale score still hits.
//!
//! # Admission
//! `add` inserts first and enforces the bound afterwards, evicting whatever
//! ranks last. An entry that would rank below a full set's last place is
//! therefore admitted and immediately evicted, leaving membership unchanged.
//!
//! # Example
//! ```
//! use ironrank::{RankedBoundedSet, ScoredEntry};
//!
//! let mut top = RankedBoundedSet::new(2);
//! top.add(ScoredEntry::new(1, 10));
//! top.add(ScoredEntry::new(2, 30));
//! top.add(ScoredEntry::new(3, 20));
//!
//! let ids: Vec<i64> = top.iter().map(|e| e.id).collect();
//! assert_eq!(ids, vec![2, 3]);
//! ```

use crate::entry::ScoredEntry;
use std::collections::{BTreeSet, HashMap, btree_set};
use std::iter::Copied;
use tracing::{debug, trace};

/// Bound used by the charts: a top five.
pub const DEFAULT_K: usize = 5;

/// At most `k` entries, unique by id, iterated in rank order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedBoundedSet {
    k: usize,
    ranked: BTreeSet<ScoredEntry>,
    index: HashMap<i64, i64>,
}

impl Default for RankedBoundedSet {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl RankedBoundedSet {
    /// Create an empty set bounded to `k` entries.
    ///
    /// `k == 0` is allowed; such a set admits nothing.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ranked: BTreeSet::new(),
            index: HashMap::with_capacity(k.saturating_add(1)),
        }
    }

    /// Insert or replace `entry`, then trim back to `k`.
    ///
    /// Returns the evicted entry, if the bound forced one out. The evicted entry
    /// can be `entry` itself when it ranks below every current member of a full
    /// set.
    pub fn add(&mut self, entry: ScoredEntry) -> Option<ScoredEntry> {
        if let Some(prev) = self.index.remove(&entry.id) {
            self.ranked.remove(&ScoredEntry::new(entry.id, prev));
        }
        self.ranked.insert(entry);
        self.index.insert(entry.id, entry.score);
        trace!(id = entry.id, score = entry.score, len = self.ranked.len(), "ranked add");

        if self.ranked.len() <= self.k {
            return None;
        }
        let last = self.ranked.pop_last()?;
        self.index.remove(&last.id);
        debug!(id = last.id, score = last.score, k = self.k, "evicted lowest ranked entry");
        Some(last)
    }

    /// Retract the entry with `entry.id`, whatever its current score.
    ///
    /// Returns the entry actually removed, or `None` when the id is absent.
    pub fn remove(&mut self, entry: ScoredEntry) -> Option<ScoredEntry> {
        self.remove_id(entry.id)
    }

    /// Retract by id alone.
    pub fn remove_id(&mut self, id: i64) -> Option<ScoredEntry> {
        let score = self.index.remove(&id)?;
        let current = ScoredEntry::new(id, score);
        self.ranked.remove(&current);
        trace!(id, score, len = self.ranked.len(), "ranked remove");
        Some(current)
    }

    /// Entries in rank order. Each call is a fresh, non-consuming traversal.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.ranked.iter().copied(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// The bound `k`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ranked.len() >= self.k
    }

    #[must_use]
    pub fn contains_id(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Current score of `id`, if present.
    #[must_use]
    pub fn score_of(&self, id: i64) -> Option<i64> {
        self.index.get(&id).copied()
    }

    /// Top-ranked entry.
    #[must_use]
    pub fn first(&self) -> Option<ScoredEntry> {
        self.ranked.first().copied()
    }

    /// Lowest-ranked entry; the next eviction candidate when full.
    #[must_use]
    pub fn last(&self) -> Option<ScoredEntry> {
        self.ranked.last().copied()
    }

    /// Snapshot in rank order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ScoredEntry> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.ranked.clear();
        self.index.clear();
    }
}

/// Rank-order iterator over a [`RankedBoundedSet`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    inner: Copied<btree_set::Iter<'a, ScoredEntry>>,
}

impl Iterator for Iter<'_> {
    type Item = ScoredEntry;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a RankedBoundedSet {
    type Item = ScoredEntry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<ScoredEntry> for RankedBoundedSet {
    fn extend<I: IntoIterator<Item = ScoredEntry>>(&mut self, iter: I) {
        for e in iter {
            self.add(e);
        }
    }
}
