//! # Ironrank
//!
//! Continuously updated **Top-K charts** over keyed counters, with a compact,
//! deterministic binary form for checkpointing and restore.
//!
//! ## Key Features
//!
//! - **Bounded ranked set** - at most K entries, O(log K) add/remove, ties broken by id
//! - **Retraction by identity** - removal resolves the id, not the caller's last-known score
//! - **Byte-exact codec** - 16-byte big-endian `(id, score)` records in rank order
//! - **Keyed aggregation** - one independent Top-K per grouping key behind `on_add`/`on_remove`
//! - **Charts driver** - play events → per-song counts → per-genre and overall charts
//! - **Checkpointing** - state stores persisted with checksums (feature `checkpointing`)
//!
//! ## Quick Start
//!
//! ```
//! use ironrank::*;
//!
//! let mut top = RankedBoundedSet::new(3);
//! for (id, score) in [(1, 10), (2, 9), (3, 8), (4, 12)] {
//!     top.add(ScoredEntry::new(id, score));
//! }
//! let bytes = encode(&top);
//! assert_eq!(bytes.len(), 3 * RECORD_LEN);
//!
//! let back = TopKCodec::new(3).decode(&bytes).unwrap();
//! let ids: Vec<i64> = back.iter().map(|e| e.id).collect();
//! assert_eq!(ids, vec![4, 1, 2]);
//! ```
//!
//! ## Keyed aggregation
//!
//! An upstream table that changes a value from `old` to `new` calls
//! `on_remove(key, old)` (when there was an old value) and then
//! `on_add(key, new)`:
//!
//! ```
//! use ironrank::*;
//!
//! let mut charts: KeyedTopK<String> = KeyedTopK::top_k(5);
//! charts.on_add("punk".to_string(), ScoredEntry::new(7, 1));
//! // song 7's count goes 1 -> 2
//! charts.on_remove(&"punk".to_string(), ScoredEntry::new(7, 1));
//! let punk = charts.on_add("punk".to_string(), ScoredEntry::new(7, 2));
//! assert_eq!(punk.score_of(7), Some(2));
//! ```
//!
//! ## Module Overview
//!
//! - [`entry`] - `ScoredEntry` and the rank order
//! - [`ranked_set`] - the bounded ranked set
//! - [`codec`] - binary encoding of a ranked set
//! - [`aggregate`] - per-key aggregation with retraction
//! - [`store`] - materialized view of encoded aggregates
//! - [`charts`] - the music charts driver
//! - [`config`] - driver configuration
//! - [`checkpoint`] - persisting stores to disk
//! - [`metrics`] - counters for what the driver did
//! - [`io`] - JSON Lines input
//! - [`testing`] - assertions and fixtures for tests

pub mod aggregate;
pub mod charts;
#[cfg(feature = "checkpointing")]
pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod entry;
pub mod io;
pub mod metrics;
pub mod ranked_set;
pub mod store;
pub mod testing;

pub use aggregate::{Aggregator, KeyedAggregate, KeyedTopK, RetractingAggregate, TopKAggregator};
pub use charts::{MusicCharts, PlayEvent, PlayOutcome, Song, SongPlayCount};
pub use codec::{CodecError, RECORD_LEN, TopKCodec, encode};
pub use config::ChartConfig;
pub use entry::{ScoredEntry, rank_order};
pub use ranked_set::{DEFAULT_K, RankedBoundedSet};
pub use store::StateStore;

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_jsonl_vec, write_jsonl_vec};
