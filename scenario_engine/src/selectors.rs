//! Scenario Kernel: Read-only Selectors
//!
//! Derived views for reporting. Nothing here mutates state.

use serde::{Deserialize, Serialize};

use crate::domain::{ActiveRing, Assumption, GameState, MetricField, Metrics};
use crate::memory::degraded_assumptions;
use crate::scoring::indices;

/// Rings younger than their ttl.
pub fn active_rings(state: &GameState) -> Vec<&ActiveRing> {
    state
        .map
        .active_rings
        .iter()
        .filter(|r| state.turn.saturating_sub(r.created_turn) < r.ttl)
        .collect()
}

pub fn degraded(state: &GameState, threshold: f64) -> Vec<&Assumption> {
    degraded_assumptions(&state.memory, threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub turn: u32,
    pub measured_success_index: f64,
    pub governance_debt_index: f64,
    pub metrics: Metrics,
}

fn point(turn: u32, metrics: &Metrics) -> HistoryPoint {
    let (msi, gdi) = indices(metrics);
    HistoryPoint {
        turn,
        measured_success_index: msi,
        governance_debt_index: gdi,
        metrics: *metrics,
    }
}

/// Turn 0 from `initialMetrics`, then one point per audit snapshot.
pub fn metric_history(state: &GameState) -> Vec<HistoryPoint> {
    std::iter::once(point(0, &state.initial_metrics))
        .chain(
            state
                .audit_trail
                .iter()
                .map(|r| point(r.turn, &r.metrics_snapshot)),
        )
        .collect()
}

/// `(field, initial, current)` for every metric field.
pub fn change_from_initial(state: &GameState) -> Vec<(MetricField, f64, f64)> {
    MetricField::all()
        .map(|f| (f, state.initial_metrics.get(f), state.metrics.get(f)))
        .collect()
}
