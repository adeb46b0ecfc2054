//! Persisted State Codec: `state.json` encoder/decoder.
//!
//! The persisted form pairs the game state with the version of the
//! scenario document it was played against:
//!
//!   { "scenarioStateVersion": "...", "sequence": N, "state": { ... } }
//!
//! - `encode_persisted`:  PersistedState → JSON string
//! - `decode_persisted`:  JSON string → PersistedState (no validation)
//! - `restore_persisted`: decode + version check + invariant validation
//! - `restore_or_fresh`:  restore, or a fresh initial state on any failure
//! - `export_persisted_to_file` / `read_persisted_file`: file I/O
//! - `state_file_hash`:   SHA-256 of the encoded JSON (lowercase hex)

use std::fs;
use std::io;
use std::path::Path;

use scenario_engine::domain::GameState;
use scenario_engine::invariants::{validate_against, InvariantViolation};
use scenario_engine::state::create_initial_state;
use scenario_engine::{Difficulty, EngineConfig, Scenario, StartingCondition};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// All possible persisted-state failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("stored scenario version {stored:?} does not match loaded {current:?}")]
    VersionMismatch { stored: String, current: String },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("snapshot I/O: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot {sequence} hash mismatch")]
    HashMismatch { sequence: u64 },
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub scenario_state_version: String,
    /// Last command sequence folded into `state`.
    #[serde(default)]
    pub sequence: u64,
    pub state: GameState,
}

impl PersistedState {
    pub fn new(scenario: &Scenario, sequence: u64, state: GameState) -> Self {
        Self {
            scenario_state_version: scenario.version.clone(),
            sequence,
            state,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder / decoder
// ---------------------------------------------------------------------------

pub fn encode_persisted(persisted: &PersistedState) -> Result<String, SnapshotError> {
    serde_json::to_string(persisted).map_err(SnapshotError::Serialization)
}

/// Shape check only. Use `restore_persisted` for validated loading.
pub fn decode_persisted(json: &str) -> Result<PersistedState, SnapshotError> {
    serde_json::from_str(json).map_err(SnapshotError::Deserialization)
}

// ---------------------------------------------------------------------------
// Restore (decode + validate)
// ---------------------------------------------------------------------------

/// Decode, then reject a state that was played against another scenario
/// version or that no longer satisfies the kernel invariants.
pub fn restore_persisted(
    json: &str,
    scenario: &Scenario,
    config: &EngineConfig,
) -> Result<PersistedState, SnapshotError> {
    let persisted = decode_persisted(json)?;
    check_compatible(&persisted, scenario, config)?;
    Ok(persisted)
}

pub fn check_compatible(
    persisted: &PersistedState,
    scenario: &Scenario,
    config: &EngineConfig,
) -> Result<(), SnapshotError> {
    if persisted.scenario_state_version != scenario.version {
        return Err(SnapshotError::VersionMismatch {
            stored: persisted.scenario_state_version.clone(),
            current: scenario.version.clone(),
        });
    }
    validate_against(&persisted.state, scenario, config)?;
    Ok(())
}

/// The stored state if it is usable, otherwise a fresh initial state.
pub fn restore_or_fresh(
    json: &str,
    scenario: &Scenario,
    config: &EngineConfig,
    difficulty: Difficulty,
    condition: StartingCondition,
) -> GameState {
    match restore_persisted(json, scenario, config) {
        Ok(persisted) => persisted.state,
        Err(error) => {
            warn!(%error, "discarding persisted state");
            create_initial_state(scenario, difficulty, condition, config)
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Write `persisted` to `path`, creating parent directories. The file is
/// replaced through a sibling temp file so readers never see half a state.
pub fn export_persisted_to_file(persisted: &PersistedState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_persisted(persisted)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes())?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `None` when the file does not exist.
pub fn read_persisted_file(path: &Path) -> Result<Option<PersistedState>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    decode_persisted(&content).map(Some)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of the encoded JSON. Lowercase hex string.
///
/// This is file integrity, not the kernel's canonical hash: it covers the
/// version header and audit timestamps.
pub fn state_file_hash(persisted: &PersistedState) -> Result<String, SnapshotError> {
    let json = encode_persisted(persisted)?;
    let digest = Sha256::digest(json.as_bytes());
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
