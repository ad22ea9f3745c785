#![cfg(feature = "checkpointing")]

use anyhow::Result;
use ironrank::charts::{MusicCharts, PlayEvent};
use ironrank::checkpoint::{CheckpointConfig, CheckpointManager, Snapshot};
use ironrank::config::ChartConfig;
use ironrank::store::StateStore;
use ironrank::testing::{assert_chart_eq, sample_songs};
use std::path::Path;
use tempfile::tempdir;

fn manager(dir: &Path, max_checkpoints: Option<usize>) -> Result<CheckpointManager> {
    CheckpointManager::new(CheckpointConfig {
        enabled: true,
        directory: dir.to_path_buf(),
        max_checkpoints,
        ..Default::default()
    })
}

fn charts_with_plays() -> Result<MusicCharts> {
    let mut charts = MusicCharts::new(ChartConfig::default());
    for song in sample_songs() {
        charts.upsert_song(song)?;
    }
    for (song_id, n) in [(1, 3), (6, 2), (4, 1)] {
        for _ in 0..n {
            charts.record_play(&PlayEvent::new(song_id, 60_000));
        }
    }
    Ok(charts)
}

#[test]
fn save_then_restore_charts() -> Result<()> {
    let dir = tempdir()?;
    let mut mgr = manager(dir.path(), None)?;
    let charts = charts_with_plays()?;

    let path = mgr.save_charts(&charts)?.expect("checkpointing enabled");
    assert!(path.exists());

    let restored = mgr
        .restore_charts(ChartConfig::default())?
        .expect("checkpoint present");
    assert_chart_eq(&restored.global_chart()?, &[(1, 3), (6, 2), (4, 1)]);
    assert_chart_eq(&restored.genre_chart("punk")?, &[(1, 3)]);
    assert_eq!(restored.play_count(6), Some(2));
    assert_eq!(restored.song(4), charts.song(4));
    Ok(())
}

#[test]
fn latest_is_highest_sequence() -> Result<()> {
    let dir = tempdir()?;
    let mut mgr = manager(dir.path(), None)?;
    let mut store = StateStore::new("counts");

    store.put("a", vec![1]);
    mgr.save(&[&store])?;
    store.put("a", vec![2]);
    mgr.save(&[&store])?;

    let snapshot = mgr.restore_latest()?.expect("checkpoint present");
    assert_eq!(snapshot.seq, 1);
    assert_eq!(snapshot.stores[0].get("a"), Some(&[2u8][..]));
    Ok(())
}

#[test]
fn retention_keeps_newest() -> Result<()> {
    let dir = tempdir()?;
    let mut mgr = manager(dir.path(), Some(2))?;
    let store = StateStore::new("empty");
    for _ in 0..4 {
        mgr.save(&[&store])?;
    }
    let files = std::fs::read_dir(dir.path())?.count();
    assert_eq!(files, 2);
    assert_eq!(mgr.restore_latest()?.map(|s| s.seq), Some(3));
    Ok(())
}

#[test]
fn disabled_manager_does_nothing() -> Result<()> {
    let dir = tempdir()?;
    let mut mgr = CheckpointManager::new(CheckpointConfig {
        directory: dir.path().join("never"),
        ..Default::default()
    })?;
    assert!(mgr.save_charts(&charts_with_plays()?)?.is_none());
    assert!(mgr.restore_charts(ChartConfig::default())?.is_none());
    assert!(!dir.path().join("never").exists());
    Ok(())
}

#[test]
fn tampered_checkpoint_fails_checksum() -> Result<()> {
    let dir = tempdir()?;
    let mgr = manager(dir.path(), None)?;

    let mut store = StateStore::new("counts");
    store.put("a", vec![1]);
    let mut snapshot = Snapshot::new(0, vec![store]);
    assert!(snapshot.verify());
    snapshot.stores[0].put("a", vec![9]);
    assert!(!snapshot.verify());

    let path = dir.path().join("checkpoint_charts_00000000000000000000.bin");
    std::fs::write(&path, postcard::to_allocvec(&snapshot)?)?;

    let err = mgr.load(&path).unwrap_err();
    assert!(err.to_string().contains("checksum mismatch"));
    assert!(mgr.restore_latest().is_err());
    Ok(())
}

#[test]
fn clear_removes_only_this_series() -> Result<()> {
    let dir = tempdir()?;
    let mut charts_mgr = manager(dir.path(), None)?;
    let mut other = CheckpointManager::new(CheckpointConfig {
        enabled: true,
        directory: dir.path().to_path_buf(),
        name: "other".to_string(),
        max_checkpoints: None,
    })?;
    let store = StateStore::new("s");
    charts_mgr.save(&[&store])?;
    other.save(&[&store])?;

    charts_mgr.clear()?;
    assert!(charts_mgr.latest()?.is_none());
    assert!(other.latest()?.is_some());
    Ok(())
}
