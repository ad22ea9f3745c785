//! Keyed, retracting aggregation over per-key accumulators.
//!
//! An upstream table that changes a value from `old` to `new` drives two hooks
//! on the aggregate owned for the grouping key:
//!
//! 1. [`RetractingAggregate::on_remove`] with `old` (skipped on first observation)
//! 2. [`RetractingAggregate::on_add`] with `new`
//!
//! [`Aggregator`] is the stateless recipe (create / add / subtract), in the same
//! shape as a combiner; [`KeyedAggregate`] owns one accumulator per key and
//! applies the recipe. [`KeyedTopK`] is the instantiation used for charts.

use crate::entry::ScoredEntry;
use crate::ranked_set::{DEFAULT_K, RankedBoundedSet};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Recipe for an accumulator that supports retraction.
pub trait Aggregator<V, A>: Send + Sync {
    /// Fresh accumulator for a key seen for the first time.
    fn create(&self) -> A;
    /// Fold `v` into `acc`.
    fn add(&self, acc: &mut A, v: V);
    /// Retract a value previously folded into `acc`.
    fn subtract(&self, acc: &mut A, v: V);
}

/// The two hooks an incremental aggregation engine calls per change event.
pub trait RetractingAggregate<K, V> {
    type Output;

    /// Route `value` into the accumulator for `key`, creating it on first touch.
    fn on_add(&mut self, key: K, value: V) -> &Self::Output;

    /// Retract `value` from the accumulator for `key`. `None` if `key` was never
    /// seen; absent keys are not created.
    fn on_remove(&mut self, key: &K, value: V) -> Option<&Self::Output>;
}

/// Top-K recipe: accumulator is a [`RankedBoundedSet`] bounded to `k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopKAggregator {
    pub k: usize,
}

impl TopKAggregator {
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for TopKAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl Aggregator<ScoredEntry, RankedBoundedSet> for TopKAggregator {
    fn create(&self) -> RankedBoundedSet {
        RankedBoundedSet::new(self.k)
    }

    fn add(&self, acc: &mut RankedBoundedSet, v: ScoredEntry) {
        acc.add(v);
    }

    fn subtract(&self, acc: &mut RankedBoundedSet, v: ScoredEntry) {
        acc.remove(v);
    }
}

/// One accumulator per grouping key, owned exclusively by this value.
///
/// No state is shared between keys; mutation needs `&mut self`, so callers
/// that process keys on several workers give each worker its own instance.
#[derive(Clone, Debug)]
pub struct KeyedAggregate<K, A, G> {
    agg: G,
    accs: HashMap<K, A>,
}

/// Per-key Top-K charts.
pub type KeyedTopK<K> = KeyedAggregate<K, RankedBoundedSet, TopKAggregator>;

impl<K> KeyedTopK<K>
where
    K: Eq + Hash,
{
    /// Per-key Top-K bounded to `k`.
    #[must_use]
    pub fn top_k(k: usize) -> Self {
        Self::new(TopKAggregator::new(k))
    }
}

impl<K, A, G> KeyedAggregate<K, A, G>
where
    K: Eq + Hash,
{
    #[must_use]
    pub fn new(agg: G) -> Self {
        Self {
            agg,
            accs: HashMap::new(),
        }
    }

    #[must_use]
    pub fn aggregator(&self) -> &G {
        &self.agg
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&A> {
        self.accs.get(key)
    }

    /// Install an accumulator directly, e.g. one decoded from a store.
    pub fn insert(&mut self, key: K, acc: A) -> Option<A> {
        self.accs.insert(key, acc)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.accs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &A)> {
        self.accs.iter()
    }
}

impl<K, V, A, G> RetractingAggregate<K, V> for KeyedAggregate<K, A, G>
where
    K: Eq + Hash + Debug,
    G: Aggregator<V, A>,
{
    type Output = A;

    fn on_add(&mut self, key: K, value: V) -> &A {
        let acc = match self.accs.entry(key) {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                debug!(key = ?v.key(), "first observation for grouping key");
                v.insert(self.agg.create())
            }
        };
        self.agg.add(acc, value);
        acc
    }

    fn on_remove(&mut self, key: &K, value: V) -> Option<&A> {
        let acc = self.accs.get_mut(key)?;
        self.agg.subtract(acc, value);
        Some(acc)
    }
}
