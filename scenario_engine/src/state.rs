//! Scenario Kernel: Initial State Construction
//!
//! Deterministic: the same (scenario, difficulty, starting condition)
//! triple always yields the same state and the same canonical hash.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::domain::{
    Flags, GameState, MapMode, MapState, MeasuredMetrics, Memory, Metrics, UnmeasuredMetrics,
};
use crate::scenario::Scenario;
use crate::variations::{apply_difficulty, apply_starting_condition, Difficulty, StartingCondition};

/// Baseline before difficulty and starting condition are applied.
pub fn baseline_metrics() -> Metrics {
    Metrics {
        measured: MeasuredMetrics {
            production_efficiency: 0.5,
            cost_per_unit: 0.3,
            welfare_incident_rate: 0.1,
            welfare_standard_adoption: 0.5,
        },
        unmeasured: UnmeasuredMetrics {
            welfare_debt: 0.1,
            enforcement_gap: 0.1,
            regulatory_capture: 0.2,
            sentience_knowledge_gap: 0.2,
            system_irreversibility: 0.1,
        },
    }
}

/// Starting welfare value per tracked region (ISO-3).
const INITIAL_REGIONS: &[(&str, f64)] = &[
    // Americas
    ("USA", 0.3),
    ("CAN", 0.2),
    ("MEX", 0.25),
    ("ARG", 0.32),
    ("CHL", 0.3),
    ("BRA", 0.4),
    // Europe
    ("GBR", 0.4),
    ("FRA", 0.35),
    ("DEU", 0.3),
    ("ITA", 0.35),
    ("ESP", 0.32),
    ("NLD", 0.42),
    ("POL", 0.28),
    ("SWE", 0.48),
    ("DNK", 0.4),
    // Asia
    ("IND", 0.5),
    ("CHN", 0.45),
    ("JPN", 0.32),
    ("KOR", 0.3),
    ("THA", 0.28),
    ("IDN", 0.3),
    ("PHL", 0.28),
    ("MYS", 0.3),
    // Africa & Middle East
    ("ZAF", 0.35),
    ("EGY", 0.28),
    ("KEN", 0.3),
    ("NGA", 0.28),
    ("SAU", 0.3),
    ("TUR", 0.32),
    ("ISR", 0.35),
    // Oceania
    ("AUS", 0.3),
    ("NZL", 0.45),
];

pub fn initial_region_values() -> BTreeMap<String, f64> {
    INITIAL_REGIONS
        .iter()
        .map(|(code, v)| (code.to_string(), *v))
        .collect()
}

/// Fresh game state positioned at the scenario's first node.
pub fn create_initial_state(
    scenario: &Scenario,
    difficulty: Difficulty,
    condition: StartingCondition,
    config: &EngineConfig,
) -> GameState {
    let metrics = apply_starting_condition(&apply_difficulty(&baseline_metrics(), difficulty), condition);

    let (phase_id, node_id) = match scenario.first_position() {
        Some((phase, node)) => (phase.id.clone(), node.id.clone()),
        None => (
            config.fallback_start_phase_id.clone(),
            config.fallback_start_node_id.clone(),
        ),
    };

    GameState {
        turn: 0,
        current_node_id: node_id,
        phase_id,
        metrics,
        initial_metrics: metrics,
        map: MapState {
            mode: MapMode::WelfareStandards,
            region_values: initial_region_values(),
            active_arcs: Vec::new(),
            active_hubs: Vec::new(),
            active_rings: Vec::new(),
        },
        audit_trail: Vec::new(),
        memory: Memory::default(),
        flags: Flags::default(),
        great_people: Vec::new(),
        achievements: Vec::new(),
        completed_wonders: Vec::new(),
        researched_techs: Vec::new(),
        active_events: Vec::new(),
        victory_type: None,
        loss_warnings: Vec::new(),
        loss_conditions_met: Vec::new(),
        player_name: None,
    }
}
