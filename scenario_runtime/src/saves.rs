//! Save slots: named copies of a game state kept in one JSON file.
//!
//! At most `MAX_SAVES` slots exist. Saving into a full store evicts the
//! slot with the oldest timestamp first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use scenario_engine::domain::GameState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const MAX_SAVES: usize = 10;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save store I/O: {0}")]
    Io(#[from] io::Error),

    #[error("save store JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no save with id {0:?}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlot {
    pub id: String,
    pub name: String,
    /// Wall-clock milliseconds when the slot was written.
    pub timestamp: i64,
    pub scenario_version: String,
    pub state: GameState,
}

/// File-backed list of save slots. Every mutation rewrites the file.
pub struct SaveStore {
    path: PathBuf,
    slots: Vec<SaveSlot>,
}

impl SaveStore {
    /// Open `path`, or start empty when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, SaveError> {
        let slots = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            slots,
        })
    }

    pub fn list(&self) -> &[SaveSlot] {
        &self.slots
    }

    pub fn save(&mut self, name: &str, state: &GameState, scenario_version: &str) -> Result<&SaveSlot, SaveError> {
        self.save_at(name, state, scenario_version, Utc::now().timestamp_millis())
    }

    /// Store a new slot stamped with `now`. Returns the stored slot.
    pub fn save_at(
        &mut self,
        name: &str,
        state: &GameState,
        scenario_version: &str,
        now: i64,
    ) -> Result<&SaveSlot, SaveError> {
        while self.slots.len() >= MAX_SAVES {
            let Some(oldest) = self
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.timestamp)
                .map(|(i, _)| i)
            else {
                break;
            };
            let evicted = self.slots.remove(oldest);
            info!(id = %evicted.id, name = %evicted.name, "save slot evicted");
        }

        let id = self.next_id(now);
        self.slots.push(SaveSlot {
            id: id.clone(),
            name: name.to_string(),
            timestamp: now,
            scenario_version: scenario_version.to_string(),
            state: state.clone(),
        });
        self.flush()?;
        debug!(%id, turn = state.turn, "game saved");

        let index = self.slots.len() - 1;
        Ok(&self.slots[index])
    }

    pub fn load(&self, id: &str) -> Result<&SaveSlot, SaveError> {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SaveError::NotFound(id.to_string()))
    }

    /// `false` when no slot has that id.
    pub fn delete(&mut self, id: &str) -> Result<bool, SaveError> {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        if self.slots.len() == before {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// `false` when no slot has that id.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<bool, SaveError> {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => slot.name = name.to_string(),
            None => return Ok(false),
        }
        self.flush()?;
        Ok(true)
    }

    fn next_id(&self, now: i64) -> String {
        let mut n = 0u32;
        loop {
            let id = format!("save_{now}_{n}");
            if !self.slots.iter().any(|s| s.id == id) {
                return id;
            }
            n += 1;
        }
    }

    fn flush(&self) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.slots)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
