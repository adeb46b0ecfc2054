//! Scenario Kernel: Engine
//!
//! Top-level orchestrator. Owns the injected scenario, the config and the
//! current state. Resolves lookups, delegates mutation to transitions,
//! folds rule evaluators in, then commits.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actions::{Action, ChooseOption};
use crate::config::{EngineConfig, WonderFolding};
use crate::domain::{GameState, LossType, VictoryType};
use crate::error::EngineError;
use crate::impact::{calculate_impact_preview, unmeasured_impact_sentence, ImpactPreview};
use crate::invariants::{validate_against, InvariantViolation};
use crate::memory::reaffirm_all;
use crate::rules::{
    apply_great_person_effect, apply_wonder_effect, check_achievements, check_great_person_unlock,
    check_victory_conditions, check_wonder_completions, evaluate_loss,
};
use crate::scenario::{get_node_by_id, get_phase_by_node_id, Node, Scenario, ScenarioSource};
use crate::scoring::indices;
use crate::state::create_initial_state;
use crate::transitions::{commit, reduce};
use crate::variations::{Difficulty, StartingCondition};

/// Free-text fields the player fills in alongside a choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionInput {
    pub owner_role: String,
    pub rationale: String,
    pub assumptions: String,
    /// Reaffirm every banked assumption after the choice.
    pub preserve_assumptions: bool,
    /// Wall-clock millis stamped on the audit record.
    pub timestamp: i64,
}

impl DecisionInput {
    pub fn new(owner_role: &str, rationale: &str, assumptions: &str) -> Self {
        Self {
            owner_role: owner_role.to_string(),
            rationale: rationale.to_string(),
            assumptions: assumptions.to_string(),
            preserve_assumptions: false,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn preserving(mut self) -> Self {
        self.preserve_assumptions = true;
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// What one accepted decision did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub from_node_id: String,
    pub to_node_id: String,
    pub phase_id: String,
    pub chosen_label: String,
    pub unmeasured_impact: String,
    pub achievements: Vec<String>,
    pub wonders: Vec<String>,
    pub great_person: Option<String>,
    pub victory_type: Option<VictoryType>,
    pub loss_conditions_met: Vec<LossType>,
    /// Loss conditions that hold now but did not before this decision.
    pub new_losses: Vec<LossType>,
    pub is_complete: bool,
    pub measured_success_index: f64,
    pub governance_debt_index: f64,
}

#[derive(Debug, Default)]
struct Unlocks {
    achievements: Vec<String>,
    wonders: Vec<String>,
    great_person: Option<String>,
    new_losses: Vec<LossType>,
}

/// Single-owner engine around the pure transition layer.
pub struct ScenarioEngine {
    scenario: Scenario,
    config: EngineConfig,
    state: Option<GameState>,
}

impl ScenarioEngine {
    pub fn new(scenario: Scenario, config: EngineConfig) -> Self {
        Self {
            scenario,
            config,
            state: None,
        }
    }

    pub fn from_source(source: &dyn ScenarioSource, config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self::new(source.load_scenario()?, config))
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Result<&GameState, EngineError> {
        self.state.as_ref().ok_or(EngineError::NotStarted)
    }

    /// Begin a new game at the scenario's first node.
    pub fn start(&mut self, difficulty: Difficulty, condition: StartingCondition) -> &GameState {
        let initial = create_initial_state(&self.scenario, difficulty, condition, &self.config);
        info!(
            scenario_version = %self.scenario.version,
            %difficulty,
            %condition,
            node = %initial.current_node_id,
            "game started"
        );
        self.state.insert(reduce(
            &initial,
            &Action::Init {
                initial_state: Box::new(initial.clone()),
            },
            &self.config,
        ))
    }

    /// Adopt a previously persisted state after validating it.
    pub fn restore(&mut self, state: GameState) -> Result<&GameState, InvariantViolation> {
        validate_against(&state, &self.scenario, &self.config)?;
        debug!(turn = state.turn, node = %state.current_node_id, "state restored");
        Ok(self.state.insert(commit(state)))
    }

    /// Throw the current game away and start again.
    pub fn reset(&mut self, difficulty: Difficulty, condition: StartingCondition) -> &GameState {
        let initial = create_initial_state(&self.scenario, difficulty, condition, &self.config);
        let next = match &self.state {
            Some(current) => reduce(
                current,
                &Action::Reset {
                    initial_state: Box::new(initial),
                },
                &self.config,
            ),
            None => initial,
        };
        info!("game reset");
        self.state.insert(next)
    }

    /// Route a raw action through the reducer.
    pub fn dispatch(&mut self, action: &Action) -> Result<&GameState, EngineError> {
        let current = self.state()?;
        debug!(action = action.kind(), turn = current.turn, "dispatch");
        let next = reduce(current, action, &self.config);
        Ok(self.state.insert(next))
    }

    pub fn current_node(&self) -> Result<&Node, EngineError> {
        let state = self.state()?;
        get_node_by_id(&self.scenario, &state.current_node_id)
            .ok_or_else(|| EngineError::NodeNotFound(state.current_node_id.clone()))
    }

    /// Impact preview of a choice's raw delta. No state change.
    pub fn preview(&self, choice_index: usize) -> Result<ImpactPreview, EngineError> {
        let node = self.current_node()?;
        let choice = node
            .choices
            .get(choice_index)
            .ok_or_else(|| EngineError::ChoiceOutOfRange {
                node_id: node.id.clone(),
                index: choice_index,
                available: node.choices.len(),
            })?;
        Ok(calculate_impact_preview(&choice.delta))
    }

    /// Apply one decision end to end. Any lookup failure aborts before
    /// the reducer runs and leaves state untouched.
    pub fn choose(&mut self, choice_index: usize, input: DecisionInput) -> Result<TurnReport, EngineError> {
        let state = self.state()?;
        if state.flags.is_complete {
            return Err(EngineError::GameComplete(state.turn));
        }

        let node = self.current_node()?;
        let choice = node
            .choices
            .get(choice_index)
            .ok_or_else(|| EngineError::ChoiceOutOfRange {
                node_id: node.id.clone(),
                index: choice_index,
                available: node.choices.len(),
            })?;

        let terminal = self.config.terminal_node_id.as_str();
        let destination = choice.next_node_id.as_str();
        if destination != terminal && !self.scenario.contains_node(destination) {
            warn!(from = %node.id, to = destination, "choice points at unknown node");
            return Err(EngineError::NodeNotFound(destination.to_string()));
        }

        let phase_id = get_phase_by_node_id(&self.scenario, &state.current_node_id)
            .map(str::to_string)
            .unwrap_or_else(|| state.phase_id.clone());
        let unmeasured_impact = unmeasured_impact_sentence(&choice.delta);

        let action = Action::ChooseOption(Box::new(ChooseOption {
            choice_id: format!("C{}", choice_index + 1),
            owner_role: input.owner_role,
            rationale: input.rationale,
            assumptions: input.assumptions,
            delta: choice.delta.clone(),
            node_title: node.title.clone(),
            chosen_label: choice.label.clone(),
            phase_id: phase_id.clone(),
            unmeasured_impact: unmeasured_impact.clone(),
            timestamp: input.timestamp,
        }));

        let previously_met = state.loss_conditions_met.clone();
        let mut next = reduce(state, &action, &self.config);
        if input.preserve_assumptions {
            next.memory = reaffirm_all(&next.memory, next.turn);
        }

        // -- Position --
        let from_node_id = std::mem::replace(&mut next.current_node_id, destination.to_string());
        next.phase_id = get_phase_by_node_id(&self.scenario, destination)
            .map(str::to_string)
            .unwrap_or(phase_id);
        next.flags.is_complete = destination == terminal;

        info!(
            turn = next.turn,
            node = %from_node_id,
            choice = %choice.label,
            to = destination,
            "decision applied"
        );

        let chosen_label = choice.label.clone();
        let (next, unlocks) = self.fold_rules(next, &previously_met);
        let (msi, gdi) = indices(&next.metrics);

        let report = TurnReport {
            turn: next.turn,
            from_node_id,
            to_node_id: next.current_node_id.clone(),
            phase_id: next.phase_id.clone(),
            chosen_label,
            unmeasured_impact,
            achievements: unlocks.achievements,
            wonders: unlocks.wonders,
            great_person: unlocks.great_person,
            victory_type: next.victory_type,
            loss_conditions_met: next.loss_conditions_met.clone(),
            new_losses: unlocks.new_losses,
            is_complete: next.flags.is_complete,
            measured_success_index: msi,
            governance_debt_index: gdi,
        };
        if report.is_complete {
            info!(turn = report.turn, victory = ?report.victory_type, "scenario complete");
        }

        self.state = Some(commit(next));
        Ok(report)
    }

    /// Achievements, then wonders, then at most one great person, then
    /// outcomes recomputed from the folded state. `previously_met` is the
    /// loss list from before the decision.
    fn fold_rules(&self, state: GameState, previously_met: &[LossType]) -> (GameState, Unlocks) {
        let mut unlocks = Unlocks::default();
        let mut next = state;

        for id in check_achievements(&next) {
            next = reduce(
                &next,
                &Action::UnlockAchievement {
                    achievement_id: id.to_string(),
                },
                &self.config,
            );
            unlocks.achievements.push(id.to_string());
        }

        let completed = check_wonder_completions(&next);
        let take = match self.config.wonder_folding {
            WonderFolding::All => completed.len(),
            WonderFolding::FirstOnly => completed.len().min(1),
        };
        for wonder in completed.into_iter().take(take) {
            info!(wonder = wonder.id, turn = next.turn, "wonder completed");
            next = apply_wonder_effect(&next, wonder);
            unlocks.wonders.push(wonder.id.to_string());
        }

        if let Some(person) = check_great_person_unlock(&next) {
            info!(great_person = person.id, turn = next.turn, "great person unlocked");
            next = apply_great_person_effect(&next, person);
            unlocks.great_person = Some(person.id.to_string());
        }

        let (met, warnings) = evaluate_loss(&next);
        for loss in met.iter().filter(|l| !previously_met.contains(l)) {
            warn!(loss = loss.as_str(), turn = next.turn, "loss condition met");
            unlocks.new_losses.push(*loss);
        }
        next.loss_conditions_met = met;
        next.loss_warnings = warnings;

        let victory = check_victory_conditions(&next);
        if victory != next.victory_type {
            info!(victory = ?victory, turn = next.turn, "victory type changed");
        }
        next.victory_type = victory;

        (next, unlocks)
    }
}
