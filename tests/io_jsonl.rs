#![cfg(feature = "io-jsonl")]

use anyhow::Result;
use ironrank::charts::{MusicCharts, PlayEvent, Song};
use ironrank::config::ChartConfig;
use ironrank::io::jsonl::{load_song_feed, replay_plays};
use ironrank::testing::{assert_chart_eq, sample_songs};
use ironrank::{read_jsonl_vec, write_jsonl_vec};
use std::fs;
use tempfile::tempdir;

#[test]
fn write_then_read_songs() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("feeds/songs.jsonl");
    let songs = sample_songs();
    assert_eq!(write_jsonl_vec(&path, &songs)?, songs.len());
    let back: Vec<Song> = read_jsonl_vec(&path)?;
    assert_eq!(back, songs);
    Ok(())
}

#[test]
fn replay_counts_only_chartable_plays() -> Result<()> {
    let dir = tempdir()?;
    let songs = dir.path().join("songs.jsonl");
    let plays = dir.path().join("plays.jsonl");
    write_jsonl_vec(&songs, &sample_songs())?;
    write_jsonl_vec(
        &plays,
        &[
            PlayEvent::new(3, 200_000),
            PlayEvent::new(3, 31_000),
            PlayEvent::new(6, 1_000),
            PlayEvent::new(99, 60_000),
            PlayEvent::new(6, 45_000),
        ],
    )?;

    let mut charts = MusicCharts::new(ChartConfig::default());
    assert_eq!(load_song_feed(&mut charts, &songs)?, 7);
    assert_eq!(replay_plays(&mut charts, &plays)?, 3);
    assert_chart_eq(&charts.genre_chart("rock")?, &[(3, 2), (6, 1)]);
    Ok(())
}

#[test]
fn blank_lines_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("plays.jsonl");
    fs::write(
        &path,
        "{\"song_id\":1,\"duration_ms\":60000}\n\n   \n{\"song_id\":2,\"duration_ms\":1}\n",
    )?;
    let events: Vec<PlayEvent> = read_jsonl_vec(&path)?;
    assert_eq!(events, vec![PlayEvent::new(1, 60_000), PlayEvent::new(2, 1)]);
    Ok(())
}

#[test]
fn parse_error_names_the_line() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("plays.jsonl");
    fs::write(&path, "{\"song_id\":1,\"duration_ms\":60000}\nnot json\n")?;
    let err = read_jsonl_vec::<PlayEvent>(&path).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let mut charts = MusicCharts::new(ChartConfig::default());
    assert!(load_song_feed(&mut charts, dir.path().join("absent.jsonl")).is_err());
}
