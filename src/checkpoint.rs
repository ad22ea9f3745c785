//! Checkpointing of state stores to disk.
//!
//! A checkpoint is a [`Snapshot`] of every [`StateStore`] the charts own,
//! serialized with `postcard` and guarded by a SHA-256 checksum over the store
//! contents. Files are named `checkpoint_<name>_<seq>.bin`, where `seq` grows
//! by one per save, so the latest checkpoint is the one with the highest
//! sequence number.
//!
//! # Usage
//!
//! ```no_run
//! use ironrank::charts::MusicCharts;
//! use ironrank::checkpoint::{CheckpointConfig, CheckpointManager};
//! use ironrank::config::ChartConfig;
//! use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let mut manager = CheckpointManager::new(CheckpointConfig {
//!     enabled: true,
//!     directory: "./checkpoints".into(),
//!     ..Default::default()
//! })?;
//!
//! let charts = manager
//!     .restore_charts(ChartConfig::default())?
//!     .unwrap_or_else(|| MusicCharts::new(ChartConfig::default()));
//!
//! // ... feed plays ...
//!
//! manager.save_charts(&charts)?;
//! # Ok(())
//! # }
//! ```

use crate::charts::MusicCharts;
use crate::config::ChartConfig;
use crate::store::StateStore;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, create_dir_all, read_dir, remove_file};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Where and how checkpoints are kept.
#[derive(Clone, Debug)]
pub struct CheckpointConfig {
    /// Enable or disable checkpointing.
    pub enabled: bool,
    /// Directory where checkpoint files are stored.
    pub directory: PathBuf,
    /// Prefix distinguishing independent checkpoint series in one directory.
    pub name: String,
    /// Maximum number of checkpoints to retain (oldest are deleted first).
    /// None means keep all checkpoints.
    pub max_checkpoints: Option<usize>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("./ironrank_checkpoints"),
            name: "charts".to_string(),
            max_checkpoints: Some(10),
        }
    }
}

/// Everything persisted by one checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence number, also encoded in the file name.
    pub seq: u64,
    /// Milliseconds since epoch when the snapshot was taken.
    pub timestamp: u64,
    pub stores: Vec<StateStore>,
    /// SHA-256 over the store contents, hex encoded.
    pub checksum: String,
}

impl Snapshot {
    #[must_use]
    pub fn new(seq: u64, stores: Vec<StateStore>) -> Self {
        let checksum = stores_checksum(&stores);
        Self {
            seq,
            timestamp: current_timestamp_ms(),
            stores,
            checksum,
        }
    }

    /// Whether the stored checksum matches the stores.
    #[must_use]
    pub fn verify(&self) -> bool {
        stores_checksum(&self.stores) == self.checksum
    }
}

/// Manages checkpoint creation, persistence, and recovery.
pub struct CheckpointManager {
    config: CheckpointConfig,
}

impl CheckpointManager {
    /// Create a new checkpoint manager with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint directory cannot be created.
    pub fn new(config: CheckpointConfig) -> Result<Self> {
        if config.enabled {
            create_dir_all(&config.directory).context("Failed to create checkpoint directory")?;
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    /// Write a checkpoint of `stores`. Returns `None` when checkpointing is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint file cannot be created or written to.
    pub fn save(&mut self, stores: &[&StateStore]) -> Result<Option<PathBuf>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let seq = self.list()?.last().map_or(0, |(seq, _)| seq + 1);
        let snapshot = Snapshot::new(seq, stores.iter().map(|s| (*s).clone()).collect());
        let path = self.path_for(seq);

        let encoded = postcard::to_allocvec(&snapshot).context("Failed to serialize checkpoint")?;
        let mut file = File::create(&path).context("Failed to create checkpoint file")?;
        file.write_all(&encoded)
            .context("Failed to write checkpoint")?;
        file.sync_all()
            .context("Failed to sync checkpoint to disk")?;
        info!(path = %path.display(), seq, bytes = encoded.len(), "checkpoint saved");

        self.cleanup_old_checkpoints()?;
        Ok(Some(path))
    }

    /// Checkpoint every store of `charts`.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_charts(&mut self, charts: &MusicCharts) -> Result<Option<PathBuf>> {
        self.save(&charts.stores())
    }

    /// Path of the most recent checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint directory cannot be read.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        if !self.config.enabled || !self.config.directory.exists() {
            return Ok(None);
        }
        Ok(self.list()?.pop().map(|(_, path)| path))
    }

    /// Load and verify a checkpoint from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint file cannot be read or if the checksum verification fails.
    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        let mut file = File::open(path).context("Failed to open checkpoint file")?;
        let mut encoded = Vec::new();
        file.read_to_end(&mut encoded)
            .context("Failed to read checkpoint")?;

        let snapshot: Snapshot =
            postcard::from_bytes(&encoded).context("Failed to deserialize checkpoint")?;
        if !snapshot.verify() {
            return Err(anyhow!(
                "Checkpoint integrity check failed: checksum mismatch in {}",
                path.display()
            ));
        }
        Ok(snapshot)
    }

    /// Load the most recent checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the latest checkpoint cannot be read or verified.
    pub fn restore_latest(&self) -> Result<Option<Snapshot>> {
        let Some(path) = self.latest()? else {
            return Ok(None);
        };
        let snapshot = self.load(&path)?;
        info!(path = %path.display(), seq = snapshot.seq, "checkpoint restored");
        Ok(Some(snapshot))
    }

    /// Rebuild charts from the most recent checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be loaded or its stores fail to decode.
    pub fn restore_charts(&self, config: ChartConfig) -> Result<Option<MusicCharts>> {
        self.restore_latest()?
            .map(|snapshot| MusicCharts::from_stores(config, snapshot.stores))
            .transpose()
    }

    /// Delete all checkpoints of this series.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint directory cannot be read.
    pub fn clear(&self) -> Result<()> {
        for (_, path) in self.list()? {
            remove_file(path).ok();
        }
        Ok(())
    }

    fn path_for(&self, seq: u64) -> PathBuf {
        self.config
            .directory
            .join(format!("checkpoint_{}_{seq:020}.bin", self.config.name))
    }

    /// Checkpoints of this series, oldest first.
    fn list(&self) -> Result<Vec<(u64, PathBuf)>> {
        if !self.config.directory.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("checkpoint_{}_", self.config.name);
        let mut checkpoints: Vec<(u64, PathBuf)> = read_dir(&self.config.directory)
            .context("Failed to read checkpoint directory")?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let seq = name
                    .to_str()?
                    .strip_prefix(&prefix)?
                    .strip_suffix(".bin")?
                    .parse::<u64>()
                    .ok()?;
                Some((seq, entry.path()))
            })
            .collect();
        checkpoints.sort_by_key(|(seq, _)| *seq);
        Ok(checkpoints)
    }

    /// Delete old checkpoints beyond the retention limit.
    fn cleanup_old_checkpoints(&self) -> Result<()> {
        let Some(max_checkpoints) = self.config.max_checkpoints else {
            return Ok(());
        };
        let checkpoints = self.list()?;
        if checkpoints.len() <= max_checkpoints {
            return Ok(());
        }
        let to_delete = checkpoints.len() - max_checkpoints;
        for (seq, path) in checkpoints.into_iter().take(to_delete) {
            debug!(seq, "pruning old checkpoint");
            remove_file(path).ok(); // Ignore errors
        }
        Ok(())
    }
}

/// SHA-256 over store names, keys and values, hex encoded.
#[must_use]
pub fn stores_checksum(stores: &[StateStore]) -> String {
    let mut hasher = Sha256::new();
    for store in stores {
        hasher.update((store.name().len() as u64).to_be_bytes());
        hasher.update(store.name().as_bytes());
        for (key, value) in store.iter() {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Get current timestamp in milliseconds since epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
