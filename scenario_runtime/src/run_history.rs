//! Run history: summaries of finished runs for side-by-side comparison.
//!
//! Only the newest `MAX_RUNS` summaries are kept, newest first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use scenario_engine::domain::{GameState, LossType, VictoryType};
use scenario_engine::scoring::indices;
use scenario_engine::selectors::{metric_history, HistoryPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::saves::SaveError;

pub const MAX_RUNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub finished_at: i64,
    pub scenario_version: String,
    pub final_turn: u32,
    pub measured_success_index: f64,
    pub governance_debt_index: f64,
    #[serde(default)]
    pub victory_type: Option<VictoryType>,
    #[serde(default)]
    pub loss_conditions_met: Vec<LossType>,
    /// Labels of the first three decisions.
    pub key_choices: Vec<String>,
    /// Phases in the order they were first played.
    pub completed_phases: Vec<String>,
    pub node_sequence: Vec<String>,
    pub index_history: Vec<HistoryPoint>,
}

impl RunRecord {
    pub fn from_state(state: &GameState, scenario_version: &str, finished_at: i64) -> Self {
        let (msi, gdi) = indices(&state.metrics);

        let mut completed_phases: Vec<String> = Vec::new();
        for record in &state.audit_trail {
            if !record.phase_id.is_empty() && !completed_phases.contains(&record.phase_id) {
                completed_phases.push(record.phase_id.clone());
            }
        }

        Self {
            id: format!("run_{finished_at}"),
            finished_at,
            scenario_version: scenario_version.to_string(),
            final_turn: state.turn,
            measured_success_index: msi,
            governance_debt_index: gdi,
            victory_type: state.victory_type,
            loss_conditions_met: state.loss_conditions_met.clone(),
            key_choices: state
                .audit_trail
                .iter()
                .take(3)
                .map(|r| r.chosen_label.clone())
                .collect(),
            completed_phases,
            node_sequence: state.audit_trail.iter().map(|r| r.node_id.clone()).collect(),
            index_history: metric_history(state),
        }
    }
}

/// File-backed list of run summaries.
pub struct RunHistory {
    path: PathBuf,
    runs: Vec<RunRecord>,
}

impl RunHistory {
    pub fn open(path: &Path) -> Result<Self, SaveError> {
        let runs = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            runs,
        })
    }

    /// Newest first.
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn record(&mut self, state: &GameState, scenario_version: &str) -> Result<&RunRecord, SaveError> {
        self.push(RunRecord::from_state(state, scenario_version, Utc::now().timestamp_millis()))
    }

    pub fn push(&mut self, run: RunRecord) -> Result<&RunRecord, SaveError> {
        debug!(id = %run.id, turn = run.final_turn, "run recorded");
        self.runs.insert(0, run);
        self.runs.truncate(MAX_RUNS);
        self.flush()?;
        Ok(&self.runs[0])
    }

    pub fn clear(&mut self) -> Result<(), SaveError> {
        self.runs.clear();
        self.flush()
    }

    fn flush(&self) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.runs)?)?;
        Ok(())
    }
}
