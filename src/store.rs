//! Materialized-view state store holding encoded aggregates per key.
//!
//! A [`StateStore`] is what the persistence side of the charts sees: per
//! grouping key, the [`encode`](crate::codec::encode) output of that key's
//! current Top-K. Queries decode on demand.

use crate::codec::TopKCodec;
use crate::ranked_set::RankedBoundedSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named key → bytes map with deterministic iteration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStore {
    name: String,
    entries: BTreeMap<String, Vec<u8>>,
}

impl StateStore {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn delete(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current Top-K for `key`; an absent key reads as an empty chart.
    ///
    /// # Errors
    /// Returns an error if the stored bytes are not a valid encoding.
    pub fn query_top_k(&self, key: &str, codec: &TopKCodec) -> Result<RankedBoundedSet> {
        codec
            .decode_opt(self.get(key))
            .with_context(|| format!("decode top-k for key {key:?} in store {}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::entry::ScoredEntry;

    #[test]
    fn query_decodes_what_was_put() -> Result<()> {
        let mut set = RankedBoundedSet::new(5);
        set.add(ScoredEntry::new(3, 30));
        set.add(ScoredEntry::new(4, 40));

        let mut store = StateStore::new("top-five-songs");
        store.put("all", encode(&set));
        assert_eq!(store.query_top_k("all", &TopKCodec::new(5))?, set);
        assert!(store.query_top_k("missing", &TopKCodec::new(5))?.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_value_names_key_and_store() {
        let mut store = StateStore::new("charts");
        store.put("punk", vec![1, 2, 3]);
        let err = store
            .query_top_k("punk", &TopKCodec::default())
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("punk"));
        assert!(msg.contains("charts"));
    }
}
