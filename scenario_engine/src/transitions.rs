//! Scenario Kernel: Centralized Transition Logic
//!
//! ALL state mutation lives here. The reducer is total: every well-formed
//! action yields a new state, the input is never touched, nothing panics.

use tracing::{debug, info};

use crate::actions::{Action, ChooseOption};
use crate::config::EngineConfig;
use crate::delta::{apply_adjustment_in_place, drift_irreversibility};
use crate::domain::{AuditRecord, GameState};
use crate::memory::{add_assumption, apply_decay};
use crate::rules::evaluate_loss;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `action` to `state` and return the next state.
pub fn reduce(state: &GameState, action: &Action, config: &EngineConfig) -> GameState {
    match action {
        Action::Init { initial_state } | Action::Reset { initial_state } => {
            commit(initial_state.as_ref().clone())
        }
        Action::ChooseOption(payload) => apply_choice(state, payload, config),
        Action::SetPlayerName { player_name } => {
            let mut next = state.clone();
            next.player_name = Some(player_name.clone());
            next
        }
        Action::ToggleDebug => {
            let mut next = state.clone();
            next.flags.show_debug = !next.flags.show_debug;
            next
        }
        Action::SetMapMode { mode } => {
            let mut next = state.clone();
            next.map.mode = *mode;
            next
        }
        Action::UnlockAchievement { achievement_id } => {
            let mut next = state.clone();
            if !next.has_achievement(achievement_id) {
                info!(achievement = %achievement_id, turn = next.turn, "achievement unlocked");
                next.achievements.push(achievement_id.clone());
            }
            next
        }
        Action::UnlockGreatPerson { person } => {
            let mut next = state.clone();
            if !next.has_great_person(&person.id) {
                info!(great_person = %person.id, turn = next.turn, "great person unlocked");
                next.great_people.push(person.clone());
            }
            next
        }
        Action::CompleteWonder { wonder_id } => {
            let mut next = state.clone();
            if !next.has_wonder(wonder_id) {
                info!(wonder = %wonder_id, turn = next.turn, "wonder completed");
                next.completed_wonders.push(wonder_id.clone());
            }
            next
        }
        Action::ResearchTech { tech_id } => {
            let mut next = state.clone();
            if !next.researched_techs.iter().any(|t| t == tech_id) {
                next.researched_techs.push(tech_id.clone());
            }
            next
        }
        Action::TriggerEvent { event } => {
            let mut next = state.clone();
            if !next.active_events.iter().any(|e| e.id == event.id) {
                next.active_events.push(event.clone());
            }
            next
        }
        Action::ResolveEvent { event_id } => {
            let mut next = state.clone();
            next.active_events.retain(|e| &e.id != event_id);
            next
        }
    }
}

/// Adopt an externally computed state as-is.
pub fn commit(state: GameState) -> GameState {
    state
}

// ---------------------------------------------------------------------------
// CHOOSE_OPTION
// ---------------------------------------------------------------------------

/// The core transition: decay, remember, adjust, advance, audit.
///
/// Position (`currentNodeId`, `phaseId`, `isComplete`) is left to the
/// caller, which knows the chosen option's `nextNodeId`.
pub fn apply_choice(state: &GameState, choice: &ChooseOption, config: &EngineConfig) -> GameState {
    let mut next = state.clone();

    // -- Memory: decay at the current turn, then record the new belief --
    next.memory = apply_decay(&next.memory, next.turn, config.decay_rate);
    next.memory = add_assumption(&next.memory, &choice.assumptions, next.turn);

    // -- Metrics and map --
    apply_adjustment_in_place(&mut next, &choice.delta, config.delta_policy);
    if config.delta_policy.irreversibility_drift {
        drift_irreversibility(&mut next.metrics);
    }

    // -- Advance --
    next.turn += 1;

    next.audit_trail.push(AuditRecord {
        turn: next.turn,
        phase_id: choice.phase_id.clone(),
        node_id: state.current_node_id.clone(),
        node_title: choice.node_title.clone(),
        choice_id: choice.choice_id.clone(),
        chosen_label: choice.chosen_label.clone(),
        owner_role: choice.owner_role.clone(),
        rationale: choice.rationale.clone(),
        assumptions: choice.assumptions.clone(),
        unmeasured_impact: choice.unmeasured_impact.clone(),
        timestamp: choice.timestamp,
        metrics_snapshot: next.metrics,
    });

    // -- Outcomes: recomputed, never incremental --
    let (met, warnings) = evaluate_loss(&next);
    if met != state.loss_conditions_met {
        debug!(turn = next.turn, met = ?met, "loss conditions changed");
    }
    next.loss_conditions_met = met;
    next.loss_warnings = warnings;

    next
}
