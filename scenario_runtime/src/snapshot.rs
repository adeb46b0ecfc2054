//! Snapshot layer: periodic canonical state snapshots.
//!
//! Snapshots carry the kernel's canonical JSON + hash, so no wall-clock
//! values end up in them. A snapshot whose hash does not match its JSON
//! is ignored and the session falls back to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use scenario_engine::domain::GameState;
use scenario_engine::hashing::{canonical_hash, canonical_serialize};
use scenario_engine::ENGINE_VERSION;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::snapshot_codec::SnapshotError;

/// Snapshot on-disk format.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Command sequence at which this snapshot was taken.
    pub sequence: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub engine_version: u32,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

pub fn save_snapshot(dir: &Path, sequence: u64, state: &GameState) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let canonical_json = String::from_utf8_lossy(&canonical_serialize(state)).into_owned();
    let snap = Snapshot {
        sequence,
        canonical_json,
        hash: canonical_hash(state),
        engine_version: ENGINE_VERSION,
    };

    let path = snapshot_path(dir, sequence);
    let content = serde_json::to_string(&snap).map_err(SnapshotError::Serialization)?;

    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// `None` if no snapshot exists at that sequence.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, SnapshotError> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let snap = serde_json::from_str(&content).map_err(SnapshotError::Deserialization)?;
    Ok(Some(snap))
}

/// Highest-sequence `snapshot_NNNNNN.json` in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best_seq: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let seq = name
            .to_string_lossy()
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(seq) = seq {
            best_seq = Some(best_seq.map_or(seq, |best| best.max(seq)));
        }
    }

    match best_seq {
        Some(seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// Whether the stored hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    let digest = Sha256::digest(snap.canonical_json.as_bytes());
    let computed: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    computed == snap.hash
}

/// Verify a snapshot against a state rebuilt by replay.
pub fn check_against(snap: &Snapshot, state: &GameState) -> Result<(), SnapshotError> {
    if verify_snapshot_hash(snap) && snap.hash == canonical_hash(state) {
        Ok(())
    } else {
        Err(SnapshotError::HashMismatch {
            sequence: snap.sequence,
        })
    }
}
