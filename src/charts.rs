//! In-process music charts: play events in, per-genre and overall Top-K out.
//!
//! [`MusicCharts`] plays the part of the incremental aggregation engine for
//! the keyed Top-K aggregates:
//!
//! 1. The song table is kept from [`upsert_song`](MusicCharts::upsert_song).
//! 2. A play shorter than the chartable minimum is dropped; a play for a song
//!    not in the table is dropped too (a left join with no match).
//! 3. The song's play count goes from `old` to `new`, and that change is routed
//!    to two aggregates as retract-`old` then add-`new`: the song's lower-cased
//!    genre, and the single global key.
//! 4. Each touched aggregate is re-encoded into its [`StateStore`]; queries
//!    decode from the stores, not from the live aggregates.
//!
//! ```
//! use ironrank::charts::{MusicCharts, PlayEvent, Song};
//! use ironrank::config::ChartConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut charts = MusicCharts::new(ChartConfig::default());
//! charts.upsert_song(Song::new(1, "Wait", "Hot Water Music", "Exister", "Punk"))?;
//! charts.record_play(&PlayEvent::new(1, 60_000));
//! charts.record_play(&PlayEvent::new(1, 5_000)); // too short
//!
//! let punk = charts.genre_chart("punk")?;
//! assert_eq!(punk.score_of(1), Some(1));
//! # Ok(())
//! # }
//! ```

use crate::aggregate::{KeyedTopK, RetractingAggregate};
use crate::codec::TopKCodec;
use crate::config::ChartConfig;
use crate::entry::ScoredEntry;
use crate::metrics::{
    CHART_UPDATES, MetricsCollector, PLAYS_FILTERED, PLAYS_RECEIVED, PLAYS_UNKNOWN_SONG,
    RETRACTIONS,
};
use crate::ranked_set::RankedBoundedSet;
use crate::store::StateStore;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A row of the song feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
}

impl Song {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            genre: genre.into(),
        }
    }

    /// Grouping key of this song's genre chart.
    #[must_use]
    pub fn genre_key(&self) -> String {
        self.genre.to_lowercase()
    }
}

/// One play of a song.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub song_id: i64,
    pub duration_ms: u64,
}

impl PlayEvent {
    #[must_use]
    pub const fn new(song_id: i64, duration_ms: u64) -> Self {
        Self {
            song_id,
            duration_ms,
        }
    }
}

/// A song's play count, as fed to the charts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPlayCount {
    pub song_id: i64,
    pub plays: i64,
}

impl From<SongPlayCount> for ScoredEntry {
    fn from(c: SongPlayCount) -> Self {
        ScoredEntry::new(c.song_id, c.plays)
    }
}

impl From<ScoredEntry> for SongPlayCount {
    fn from(e: ScoredEntry) -> Self {
        Self {
            song_id: e.id,
            plays: e.score,
        }
    }
}

/// What happened to a play offered to [`MusicCharts::record_play`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Shorter than the chartable minimum.
    Filtered,
    /// No such song in the song table.
    UnknownSong,
    /// Counted; the charts were updated.
    Counted(ChartUpdate),
}

/// A play-count change and the grouping keys it was routed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartUpdate {
    pub song_id: i64,
    pub previous: Option<i64>,
    pub plays: i64,
    pub genre_key: String,
    pub global_key: String,
}

/// A chart position joined back to its song.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub rank: usize,
    pub plays: i64,
    pub song: Song,
}

/// Song table, play counts and the two keyed Top-K aggregates.
pub struct MusicCharts {
    config: ChartConfig,
    codec: TopKCodec,
    songs: HashMap<i64, Song>,
    play_counts: HashMap<i64, i64>,
    by_genre: KeyedTopK<String>,
    global: KeyedTopK<String>,
    songs_store: StateStore,
    play_count_store: StateStore,
    genre_store: StateStore,
    global_store: StateStore,
    metrics: MetricsCollector,
}

impl MusicCharts {
    #[must_use]
    pub fn new(config: ChartConfig) -> Self {
        Self {
            codec: TopKCodec::new(config.k),
            songs: HashMap::new(),
            play_counts: HashMap::new(),
            by_genre: KeyedTopK::top_k(config.k),
            global: KeyedTopK::top_k(config.k),
            songs_store: StateStore::new(&config.songs_store),
            play_count_store: StateStore::new(&config.play_count_store),
            genre_store: StateStore::new(&config.genre_store),
            global_store: StateStore::new(&config.global_store),
            metrics: MetricsCollector::new(),
            config,
        }
    }

    /// Rebuild from persisted stores (e.g. a checkpoint).
    ///
    /// Stores are matched by the names in `config`; unknown stores are ignored
    /// and missing ones start empty.
    ///
    /// # Errors
    /// Returns an error if any stored value fails to decode.
    pub fn from_stores(config: ChartConfig, stores: Vec<StateStore>) -> Result<Self> {
        let mut charts = Self::new(config);
        for store in stores {
            let name = store.name().to_string();
            if name == charts.config.songs_store {
                for (_, bytes) in store.iter() {
                    let song: Song =
                        serde_json::from_slice(bytes).context("decode song in song table")?;
                    charts.songs.insert(song.id, song);
                }
                charts.songs_store = store;
            } else if name == charts.config.play_count_store {
                for (key, bytes) in store.iter() {
                    let song_id: i64 = key
                        .parse()
                        .with_context(|| format!("play count key {key:?} is not a song id"))?;
                    charts.play_counts.insert(song_id, decode_count(bytes)?);
                }
                charts.play_count_store = store;
            } else if name == charts.config.genre_store {
                restore_aggregate(&mut charts.by_genre, &store, &charts.codec)?;
                charts.genre_store = store;
            } else if name == charts.config.global_store {
                restore_aggregate(&mut charts.global, &store, &charts.codec)?;
                charts.global_store = store;
            } else {
                warn!(store = %name, "ignoring unknown store on restore");
            }
        }
        debug!(
            songs = charts.songs.len(),
            counted = charts.play_counts.len(),
            genres = charts.by_genre.len(),
            "charts restored from stores"
        );
        Ok(charts)
    }

    /// Insert or replace a song.
    ///
    /// If the song was already counted and its genre key changes, its entry
    /// moves from the old genre chart to the new one.
    ///
    /// # Errors
    /// Returns an error if the song cannot be serialized into the song table.
    pub fn upsert_song(&mut self, song: Song) -> Result<()> {
        let bytes = serde_json::to_vec(&song).context("encode song for song table")?;
        self.songs_store.put(song.id.to_string(), bytes);

        let new_key = song.genre_key();
        let prev = self.songs.insert(song.id, song);
        let Some(prev) = prev else { return Ok(()) };
        let old_key = prev.genre_key();
        if old_key == new_key {
            return Ok(());
        }
        if let Some(&plays) = self.play_counts.get(&prev.id) {
            debug!(song_id = prev.id, from = %old_key, to = %new_key, "song changed genre");
            let entry = ScoredEntry::new(prev.id, plays);
            route(
                &mut self.by_genre,
                &mut self.genre_store,
                &mut self.metrics,
                &old_key,
                Some(entry),
                None,
            );
            route(
                &mut self.by_genre,
                &mut self.genre_store,
                &mut self.metrics,
                &new_key,
                None,
                Some(entry),
            );
        }
        Ok(())
    }

    /// Count one play and update the charts it affects.
    pub fn record_play(&mut self, event: &PlayEvent) -> PlayOutcome {
        self.metrics.increment_counter(PLAYS_RECEIVED, 1);
        if event.duration_ms < self.config.min_chartable_duration_ms {
            trace!(song_id = event.song_id, duration_ms = event.duration_ms, "play too short");
            self.metrics.increment_counter(PLAYS_FILTERED, 1);
            return PlayOutcome::Filtered;
        }
        let Some(song) = self.songs.get(&event.song_id) else {
            warn!(song_id = event.song_id, "play for unknown song dropped");
            self.metrics.increment_counter(PLAYS_UNKNOWN_SONG, 1);
            return PlayOutcome::UnknownSong;
        };
        let genre_key = song.genre_key();

        let count = self.play_counts.entry(event.song_id).or_insert(0);
        let previous = (*count > 0).then_some(*count);
        *count += 1;
        let plays = *count;
        self.play_count_store
            .put(event.song_id.to_string(), plays.to_be_bytes().to_vec());

        let old = previous.map(|p| ScoredEntry::new(event.song_id, p));
        let new = Some(ScoredEntry::new(event.song_id, plays));
        route(
            &mut self.by_genre,
            &mut self.genre_store,
            &mut self.metrics,
            &genre_key,
            old,
            new,
        );
        route(
            &mut self.global,
            &mut self.global_store,
            &mut self.metrics,
            &self.config.global_key,
            old,
            new,
        );

        PlayOutcome::Counted(ChartUpdate {
            song_id: event.song_id,
            previous,
            plays,
            genre_key,
            global_key: self.config.global_key.clone(),
        })
    }

    /// Current chart for `genre` (case-insensitive), read from the genre store.
    ///
    /// # Errors
    /// Returns an error if the stored chart fails to decode.
    pub fn genre_chart(&self, genre: &str) -> Result<RankedBoundedSet> {
        self.genre_store
            .query_top_k(&genre.to_lowercase(), &self.codec)
    }

    /// Current chart across all genres, read from the global store.
    ///
    /// # Errors
    /// Returns an error if the stored chart fails to decode.
    pub fn global_chart(&self) -> Result<RankedBoundedSet> {
        self.global_store
            .query_top_k(&self.config.global_key, &self.codec)
    }

    /// Join a chart back to the song table. Entries whose song is unknown are
    /// skipped.
    #[must_use]
    pub fn describe(&self, chart: &RankedBoundedSet) -> Vec<ChartRow> {
        chart
            .iter()
            .filter_map(|e| self.songs.get(&e.id).map(|s| (e, s)))
            .enumerate()
            .map(|(i, (e, song))| ChartRow {
                rank: i + 1,
                plays: e.score,
                song: song.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn play_count(&self, song_id: i64) -> Option<i64> {
        self.play_counts.get(&song_id).copied()
    }

    #[must_use]
    pub fn song(&self, id: i64) -> Option<&Song> {
        self.songs.get(&id)
    }

    /// Genre keys that currently have a chart.
    #[must_use]
    pub fn genres(&self) -> Vec<&str> {
        self.genre_store.keys().collect()
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// All stores, in a fixed order, for persistence.
    #[must_use]
    pub fn stores(&self) -> [&StateStore; 4] {
        [
            &self.songs_store,
            &self.play_count_store,
            &self.genre_store,
            &self.global_store,
        ]
    }
}

/// Apply one upstream change to the aggregate for `key` and persist the result.
fn route(
    agg: &mut KeyedTopK<String>,
    store: &mut StateStore,
    metrics: &mut MetricsCollector,
    key: &str,
    old: Option<ScoredEntry>,
    new: Option<ScoredEntry>,
) {
    let mut updated = None;
    if let Some(old) = old {
        metrics.increment_counter(RETRACTIONS, 1);
        updated = agg.on_remove(&key.to_string(), old).map(crate::codec::encode);
    }
    if let Some(new) = new {
        updated = Some(crate::codec::encode(agg.on_add(key.to_string(), new)));
    }
    if let Some(bytes) = updated {
        trace!(key, store = store.name(), len = bytes.len(), "chart updated");
        store.put(key, bytes);
        metrics.increment_counter(CHART_UPDATES, 1);
    }
}

fn restore_aggregate(
    agg: &mut KeyedTopK<String>,
    store: &StateStore,
    codec: &TopKCodec,
) -> Result<()> {
    for key in store.keys() {
        agg.insert(key.to_string(), store.query_top_k(key, codec)?);
    }
    Ok(())
}

fn decode_count(bytes: &[u8]) -> Result<i64> {
    let Ok(buf) = <[u8; 8]>::try_from(bytes) else {
        bail!("play count must be 8 bytes, got {}", bytes.len());
    };
    Ok(i64::from_be_bytes(buf))
}
