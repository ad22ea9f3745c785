//! JSON Lines (JSONL) input for song feeds and play logs.
//!
//! This module provides:
//! - **Typed vector I/O** with Serde: [`read_jsonl_vec`] and [`write_jsonl_vec`]
//! - **Streaming replay** of a file through a callback: [`for_each_jsonl`]
//! - **Charts loaders**: [`load_song_feed`] and [`replay_plays`]
//!
//! # Notes
//! - Files are newline-delimited JSON; empty/whitespace-only lines are skipped on read.
//! - Parse errors name the file and the 1-based line number.

use crate::charts::{MusicCharts, PlayEvent, PlayOutcome, Song};
use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Read a JSONL file into a typed `Vec<T>`.
///
/// # Errors
/// Returns an error if the file cannot be opened, read, or if any line fails
/// to parse into `T`.
pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut out = Vec::<T>::new();
    for_each_jsonl(path, |v| {
        out.push(v);
        Ok(())
    })?;
    Ok(out)
}

/// Parse a JSONL file line by line, handing each value to `f`.
///
/// Returns the number of values parsed. Stops at the first error from the
/// file or from `f`.
///
/// # Errors
/// Returns an error if the file cannot be read, a line fails to parse, or `f`
/// fails.
pub fn for_each_jsonl<T, F>(path: impl AsRef<Path>, mut f: F) -> Result<usize>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(file);
    let mut n = 0usize;
    for (i, line) in rdr.lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line).with_context(|| {
            format!("parse JSONL line {} in {}: {}", i + 1, path.display(), line)
        })?;
        f(v)?;
        n += 1;
    }
    Ok(n)
}

/// Write a typed slice as a JSONL file (one JSON value per line).
///
/// Parent directories are created as needed.
///
/// # Returns
/// The number of items written (`data.len()`).
///
/// # Errors
/// Returns an error if the file/dirs cannot be created or any item fails to
/// serialize/flush.
pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut w, item)
            .with_context(|| format!("serialize item #{} to {}", i, path.display()))?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(data.len())
}

/// Upsert every [`Song`] in a JSONL song feed. Returns the number of songs.
///
/// # Errors
/// Returns an error if the file cannot be read or a song fails to parse.
pub fn load_song_feed(charts: &mut MusicCharts, path: impl AsRef<Path>) -> Result<usize> {
    let n = for_each_jsonl(path, |song: Song| charts.upsert_song(song))?;
    debug!(songs = n, "song feed loaded");
    Ok(n)
}

/// Feed every [`PlayEvent`] in a JSONL play log to the charts. Returns the
/// number of plays that were counted.
///
/// # Errors
/// Returns an error if the file cannot be read or an event fails to parse.
pub fn replay_plays(charts: &mut MusicCharts, path: impl AsRef<Path>) -> Result<usize> {
    let mut counted = 0usize;
    let seen = for_each_jsonl(path, |event: PlayEvent| {
        if let PlayOutcome::Counted(_) = charts.record_play(&event) {
            counted += 1;
        }
        Ok(())
    })?;
    debug!(seen, counted, "play log replayed");
    Ok(counted)
}
