//! Scenario Kernel: Invariant Checks
//!
//! Non-panicking validation. Returns the first failure.
//! Used by tests after every transition and by persisted-state restore.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::arithmetic::UNIT_MIN;
use crate::config::EngineConfig;
use crate::domain::{GameState, MetricField};
use crate::scenario::{get_phase_by_node_id, Scenario};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("[INVARIANT:metric_range] {field} = {value} outside [0, {upper}]")]
    MetricOutOfRange {
        field: &'static str,
        value: f64,
        upper: f64,
    },

    #[error("[INVARIANT:region_range] region {code} = {value} outside [0, 1]")]
    RegionOutOfRange { code: String, value: f64 },

    #[error("[INVARIANT:assumption_strength] assumption {index} strength {value} outside [0, 1]")]
    AssumptionStrength { index: usize, value: f64 },

    #[error("[INVARIANT:unique_ids] {list} contains {id:?} more than once")]
    DuplicateId { list: &'static str, id: String },

    #[error("[INVARIANT:audit_order] audit record {index} has turn {turn}, expected {expected}")]
    AuditTurnOrder { index: usize, turn: u32, expected: u32 },

    #[error("[INVARIANT:audit_length] {records} audit records but turn is {turn}")]
    AuditExceedsTurn { records: usize, turn: u32 },

    #[error("[INVARIANT:node_exists] current node {0:?} does not exist in scenario")]
    UnknownNode(String),

    #[error("[INVARIANT:phase_contains_node] node {node_id:?} is in phase {expected:?}, state says {phase_id:?}")]
    PhaseMismatch {
        node_id: String,
        phase_id: String,
        expected: String,
    },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Structural checks that need nothing but the state.
pub fn validate_invariants(state: &GameState) -> Result<(), InvariantViolation> {
    check_metric_ranges(state)?;
    check_region_ranges(state)?;
    check_assumption_strengths(state)?;
    check_unique_ids(state)?;
    check_audit_trail(state)?;
    Ok(())
}

/// Full validation, including the position against the loaded scenario.
pub fn validate_against(
    state: &GameState,
    scenario: &Scenario,
    config: &EngineConfig,
) -> Result<(), InvariantViolation> {
    validate_invariants(state)?;
    check_position(state, scenario, config)
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_metric_ranges(state: &GameState) -> Result<(), InvariantViolation> {
    for metrics in [&state.metrics, &state.initial_metrics] {
        for field in MetricField::all() {
            let value = metrics.get(field);
            let upper = field.upper_bound();
            if !(UNIT_MIN..=upper).contains(&value) {
                return Err(InvariantViolation::MetricOutOfRange {
                    field: field.as_str(),
                    value,
                    upper,
                });
            }
        }
    }
    Ok(())
}

fn check_region_ranges(state: &GameState) -> Result<(), InvariantViolation> {
    match state
        .map
        .region_values
        .iter()
        .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
        Some((code, value)) => Err(InvariantViolation::RegionOutOfRange {
            code: code.clone(),
            value: *value,
        }),
        None => Ok(()),
    }
}

fn check_assumption_strengths(state: &GameState) -> Result<(), InvariantViolation> {
    for (index, a) in state.memory.assumptions_bank.iter().enumerate() {
        if !(0.0..=1.0).contains(&a.strength) {
            return Err(InvariantViolation::AssumptionStrength {
                index,
                value: a.strength,
            });
        }
    }
    Ok(())
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter().find(|id| !seen.insert(*id)).map(str::to_string)
}

fn check_unique_ids(state: &GameState) -> Result<(), InvariantViolation> {
    let lists: [(&'static str, Option<String>); 5] = [
        ("achievements", first_duplicate(state.achievements.iter().map(String::as_str))),
        ("completedWonders", first_duplicate(state.completed_wonders.iter().map(String::as_str))),
        ("researchedTechs", first_duplicate(state.researched_techs.iter().map(String::as_str))),
        ("greatPeople", first_duplicate(state.great_people.iter().map(|p| p.id.as_str()))),
        ("activeEvents", first_duplicate(state.active_events.iter().map(|e| e.id.as_str()))),
    ];
    for (list, dup) in lists {
        if let Some(id) = dup {
            return Err(InvariantViolation::DuplicateId { list, id });
        }
    }
    Ok(())
}

/// Audit turns strictly increase and never run ahead of `turn`.
fn check_audit_trail(state: &GameState) -> Result<(), InvariantViolation> {
    if state.audit_trail.len() > state.turn as usize {
        return Err(InvariantViolation::AuditExceedsTurn {
            records: state.audit_trail.len(),
            turn: state.turn,
        });
    }
    let mut previous = 0u32;
    for (index, record) in state.audit_trail.iter().enumerate() {
        if record.turn <= previous || record.turn > state.turn {
            return Err(InvariantViolation::AuditTurnOrder {
                index,
                turn: record.turn,
                expected: previous + 1,
            });
        }
        previous = record.turn;
    }
    Ok(())
}

/// The terminal id may be absent from the document once the game is over.
fn check_position(
    state: &GameState,
    scenario: &Scenario,
    config: &EngineConfig,
) -> Result<(), InvariantViolation> {
    let node_id = &state.current_node_id;
    if state.flags.is_complete && *node_id == config.terminal_node_id {
        return Ok(());
    }
    match get_phase_by_node_id(scenario, node_id) {
        None => Err(InvariantViolation::UnknownNode(node_id.clone())),
        Some(expected) if expected != state.phase_id => Err(InvariantViolation::PhaseMismatch {
            node_id: node_id.clone(),
            phase_id: state.phase_id.clone(),
            expected: expected.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_initial_state;
    use crate::variations::{Difficulty, StartingCondition};

    fn scenario() -> Scenario {
        Scenario::from_json_str(
            r#"{"version":"1","phases":[{"id":"P1","title":"p","nodes":[
                {"id":"N1","title":"n","choices":[{"label":"x","nextNodeId":"N16_COMPLETE"}]}]}]}"#,
        )
        .unwrap()
    }

    fn fresh() -> GameState {
        create_initial_state(&scenario(), Difficulty::Medium, StartingCondition::Default, &EngineConfig::default())
    }

    #[test]
    fn test_fresh_state_passes() {
        assert_eq!(validate_against(&fresh(), &scenario(), &EngineConfig::default()), Ok(()));
    }

    #[test]
    fn test_metric_out_of_range() {
        let mut s = fresh();
        s.metrics.unmeasured.welfare_debt = 1.5;
        assert!(matches!(
            validate_invariants(&s),
            Err(InvariantViolation::MetricOutOfRange { field: "welfareDebt", .. })
        ));
    }

    #[test]
    fn test_duplicate_achievement() {
        let mut s = fresh();
        s.achievements = vec!["a".into(), "a".into()];
        assert_eq!(
            validate_invariants(&s),
            Err(InvariantViolation::DuplicateId { list: "achievements", id: "a".into() })
        );
    }

    #[test]
    fn test_unknown_node_and_terminal_exemption() {
        let cfg = EngineConfig::default();
        let mut s = fresh();
        s.current_node_id = "N99".into();
        assert_eq!(
            validate_against(&s, &scenario(), &cfg),
            Err(InvariantViolation::UnknownNode("N99".into()))
        );
        s.current_node_id = "N16_COMPLETE".into();
        s.flags.is_complete = true;
        assert_eq!(validate_against(&s, &scenario(), &cfg), Ok(()));
    }

    #[test]
    fn test_phase_mismatch() {
        let mut s = fresh();
        s.phase_id = "P7".into();
        assert!(matches!(
            validate_against(&s, &scenario(), &EngineConfig::default()),
            Err(InvariantViolation::PhaseMismatch { .. })
        ));
    }
}
