//! Testing utilities for charts and ranked sets.
//!
//! - **Assertions**: [`assert_chart_eq`] compares a chart against expected
//!   `(id, score)` pairs in rank order; [`assert_rank_invariants`] checks the
//!   bound, id uniqueness and rank ordering of any set.
//! - **Fixtures**: [`sample_songs`] and [`plays`] build inputs for the charts
//!   driver.
//!
//! ```
//! use ironrank::testing::*;
//! use ironrank::{RankedBoundedSet, ScoredEntry};
//!
//! let mut s = RankedBoundedSet::new(3);
//! s.add(ScoredEntry::new(2, 5));
//! s.add(ScoredEntry::new(1, 5));
//! assert_rank_invariants(&s);
//! assert_chart_eq(&s, &[(1, 5), (2, 5)]);
//! ```

use crate::charts::{PlayEvent, Song};
use crate::ranked_set::RankedBoundedSet;
use std::collections::HashSet;

/// Assert that `actual` holds exactly `expected` `(id, score)` pairs, in order.
///
/// # Panics
///
/// Panics if the chart differs in length, content or order.
pub fn assert_chart_eq(actual: &RankedBoundedSet, expected: &[(i64, i64)]) {
    let actual: Vec<(i64, i64)> = actual.iter().map(Into::into).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Chart length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Chart mismatch at rank {}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}",
            i + 1
        );
    }
}

/// Assert size ≤ capacity, unique ids, and rank order (score descending, id
/// ascending on ties).
///
/// # Panics
///
/// Panics on the first violated invariant.
pub fn assert_rank_invariants(set: &RankedBoundedSet) {
    let entries = set.to_vec();
    assert!(
        entries.len() <= set.capacity(),
        "Bound exceeded: {} entries with capacity {}: {entries:?}",
        entries.len(),
        set.capacity()
    );
    let ids: HashSet<i64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), entries.len(), "Duplicate id in {entries:?}");
    for w in entries.windows(2) {
        let (a, b) = (w[0], w[1]);
        assert!(
            a.score > b.score || (a.score == b.score && a.id < b.id),
            "Rank order violated between {a:?} and {b:?} in {entries:?}"
        );
    }
}

/// A small song table spanning three genres, with mixed-case genre names.
#[must_use]
pub fn sample_songs() -> Vec<Song> {
    vec![
        Song::new(1, "Fresh Fruit", "Dead Kennedys", "Fresh Fruit for Rotting Vegetables", "Punk"),
        Song::new(2, "Wait", "Hot Water Music", "Exister", "punk"),
        Song::new(3, "Rebel Yell", "Billy Idol", "Rebel Yell", "Rock"),
        Song::new(4, "Be Quick or Be Dead", "Iron Maiden", "Fear of the Dark", "Metal"),
        Song::new(5, "Master of Puppets", "Metallica", "Master of Puppets", "METAL"),
        Song::new(6, "Ace of Spades", "Motorhead", "Ace of Spades", "Rock"),
        Song::new(7, "Holiday", "Green Day", "American Idiot", "Punk"),
    ]
}

/// `count` chartable plays of `song_id`, each `duration_ms` long.
#[must_use]
pub fn plays(song_id: i64, count: usize, duration_ms: u64) -> Vec<PlayEvent> {
    vec![PlayEvent::new(song_id, duration_ms); count]
}
