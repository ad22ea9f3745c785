//! Configuration for the charts driver.

use crate::ranked_set::DEFAULT_K;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for [`MusicCharts`](crate::charts::MusicCharts).
///
/// Every field has a default, so a JSON file only needs the fields it changes:
///
/// ```
/// use ironrank::config::ChartConfig;
///
/// let cfg: ChartConfig = serde_json::from_str(r#"{ "k": 10 }"#).unwrap();
/// assert_eq!(cfg.k, 10);
/// assert_eq!(cfg.global_key, "all");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart length.
    pub k: usize,
    /// Plays shorter than this are not counted.
    pub min_chartable_duration_ms: u64,
    /// Grouping key of the chart across all genres.
    pub global_key: String,
    /// Store holding per-genre charts.
    pub genre_store: String,
    /// Store holding the chart across all genres.
    pub global_store: String,
    /// Store holding per-song play counts.
    pub play_count_store: String,
    /// Store holding the song table.
    pub songs_store: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            min_chartable_duration_ms: 30 * 1000,
            global_key: "all".to_string(),
            genre_store: "top-five-songs-by-genre".to_string(),
            global_store: "top-five-songs".to_string(),
            play_count_store: "song-play-count".to_string(),
            songs_store: "all-songs".to_string(),
        }
    }
}

impl ChartConfig {
    /// Load from a JSON file; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse chart config {}", path.display()))
    }
}
