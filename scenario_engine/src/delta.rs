//! Scenario Kernel: Additive Adjustment Application
//!
//! One code path for choice deltas, great-person effects and wonder
//! effects. Every scalar is clamped in the same step it is adjusted.

use crate::arithmetic::{clamp_unit, finite_or_zero, UNIT_MIN};
use crate::config::DeltaPolicy;
use crate::domain::{
    ActiveArc, ActiveHub, ActiveRing, GameState, MapAdjustment, MetricAdjustment, MetricField,
    Metrics, UnmeasuredKey,
};

/// Share of a positive region adjustment spilled onto each neighbour.
pub const PROPAGATION_SHARE: f64 = 0.3;

/// Fraction of the gap to the irreversibility target closed per choice.
pub const IRREVERSIBILITY_PULL: f64 = 0.25;

/// Trading-partner / border neighbours used by regional propagation.
const REGION_NEIGHBOURS: &[(&str, &[&str])] = &[
    ("USA", &["CAN", "MEX"]),
    ("CAN", &["USA", "MEX"]),
    ("MEX", &["USA", "CAN"]),
    ("GBR", &["IRL", "FRA", "DEU", "NLD", "BEL"]),
    ("FRA", &["GBR", "DEU", "ESP", "ITA", "BEL", "CHE"]),
    ("DEU", &["FRA", "AUT", "POL", "CZE", "NLD", "BEL", "CHE"]),
    ("ITA", &["FRA", "ESP", "AUT", "CHE"]),
    ("ESP", &["FRA", "ITA", "PRT"]),
    ("NLD", &["BEL", "DEU", "GBR"]),
    ("BEL", &["FRA", "DEU", "NLD"]),
    ("POL", &["DEU", "CZE", "SVK"]),
    ("SWE", &["DNK", "NOR", "FIN"]),
    ("DNK", &["SWE", "NOR", "DEU"]),
    ("CHN", &["JPN", "KOR", "THA", "IDN", "MYS", "PHL", "VNM"]),
    ("JPN", &["CHN", "KOR", "THA"]),
    ("KOR", &["CHN", "JPN"]),
    ("IND", &["PAK", "BGD", "LKA", "NPL"]),
    ("THA", &["VNM", "MYS", "IDN", "PHL"]),
    ("IDN", &["MYS", "THA", "PHL", "SGP"]),
    ("MYS", &["SGP", "IDN", "THA"]),
    ("PHL", &["IDN", "THA", "VNM"]),
    ("BRA", &["ARG", "CHL", "URY", "PRY"]),
    ("ARG", &["BRA", "CHL", "URY"]),
    ("CHL", &["ARG", "PER", "BOL"]),
    ("AUS", &["NZL"]),
    ("NZL", &["AUS"]),
    ("ZAF", &["BWA", "ZWE", "MOZ", "NAM"]),
    ("EGY", &["LBY", "SDN", "JOR", "ISR"]),
    ("SAU", &["ARE", "KWT", "BHR", "OMN", "QAT"]),
    ("TUR", &["GRC", "BGR", "GEO", "ARM"]),
    ("ISR", &["JOR", "LBN", "EGY"]),
];

pub fn region_neighbours(code: &str) -> &'static [&'static str] {
    REGION_NEIGHBOURS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
        .unwrap_or(&[])
}

/// Diminishing returns: a push toward the top of the range and a pull
/// toward the bottom both shrink to half size at the far end.
pub fn scale_by_context(amount: f64, current: f64, upper: f64) -> f64 {
    if amount == 0.0 || upper <= 0.0 {
        return amount;
    }
    let position = clamp_unit(current / upper);
    let factor = if amount > 0.0 {
        1.0 - position * 0.5
    } else {
        0.5 + position * 0.5
    };
    amount * factor
}

fn adjust_field(metrics: &mut Metrics, field: MetricField, amount: f64, policy: DeltaPolicy) {
    let amount = finite_or_zero(amount);
    let current = metrics.get(field);
    let applied = if policy.context_scaling {
        scale_by_context(amount, current, field.upper_bound())
    } else {
        amount
    };
    metrics.set(field, field.clamp_value(current + applied));
}

fn adjust_region(state: &mut GameState, code: &str, amount: f64) {
    let values = &mut state.map.region_values;
    let current = values.get(code).copied().unwrap_or(UNIT_MIN);
    values.insert(code.to_string(), clamp_unit(current + finite_or_zero(amount)));
}

fn apply_map(state: &mut GameState, map: &MapAdjustment, policy: DeltaPolicy) {
    for (code, &amount) in &map.region_values {
        adjust_region(state, code, amount);
        if policy.regional_propagation && amount > 0.0 {
            let spill = amount * PROPAGATION_SHARE;
            for &neighbour in region_neighbours(code) {
                if let Some(v) = state.map.region_values.get_mut(neighbour) {
                    *v = clamp_unit(*v + spill);
                }
            }
        }
    }

    let origin = state.current_node_id.clone();
    for arc_id in &map.activate_arcs {
        match state.map.active_arcs.iter_mut().find(|a| &a.id == arc_id) {
            Some(existing) => {
                if existing.triggered_by_node_id.is_none() {
                    existing.triggered_by_node_id = Some(origin.clone());
                }
            }
            None => state.map.active_arcs.push(ActiveArc {
                id: arc_id.clone(),
                triggered_by_node_id: Some(origin.clone()),
            }),
        }
    }

    for hub_id in &map.activate_hubs {
        if !state.map.active_hubs.iter().any(|h| &h.id == hub_id) {
            state.map.active_hubs.push(ActiveHub { id: hub_id.clone() });
        }
    }

    let turn = state.turn;
    for (idx, ring) in map.spawn_rings.iter().enumerate() {
        state.map.active_rings.push(ActiveRing {
            id: format!("ring_{turn}_{idx}"),
            lat: ring.lat,
            lng: ring.lng,
            event_type: ring.event_type,
            ttl: ring.ttl,
            created_turn: turn,
            triggered_by_node_id: Some(origin.clone()),
        });
    }
}

/// Apply `adjustment` to `state` in place. Absent keys are no-ops.
pub(crate) fn apply_adjustment_in_place(
    state: &mut GameState,
    adjustment: &MetricAdjustment,
    policy: DeltaPolicy,
) {
    for (&key, &amount) in &adjustment.metrics.measured {
        adjust_field(&mut state.metrics, MetricField::Measured(key), amount, policy);
    }
    for (&key, &amount) in &adjustment.metrics.unmeasured {
        adjust_field(&mut state.metrics, MetricField::Unmeasured(key), amount, policy);
    }
    apply_map(state, &adjustment.map, policy);
}

/// Pure form: returns the adjusted copy, input untouched.
pub fn apply_adjustment(
    state: &GameState,
    adjustment: &MetricAdjustment,
    policy: DeltaPolicy,
) -> GameState {
    let mut next = state.clone();
    apply_adjustment_in_place(&mut next, adjustment, policy);
    next
}

/// Target irreversibility implied by current debt and enforcement gap.
pub fn irreversibility_target(metrics: &Metrics) -> f64 {
    let u = &metrics.unmeasured;
    (0.7 * u.welfare_debt + 0.5 * u.enforcement_gap).min(1.0)
}

/// Move irreversibility part of the way toward its target. Can recover.
pub(crate) fn drift_irreversibility(metrics: &mut Metrics) {
    let current = metrics.unmeasured.system_irreversibility;
    let target = irreversibility_target(metrics);
    metrics.unmeasured.system_irreversibility =
        clamp_unit(current + (target - current) * IRREVERSIBILITY_PULL);
}

/// Unmeasured keys the adjustment touches with a non-zero amount.
pub fn touched_unmeasured(adjustment: &MetricAdjustment) -> Vec<(UnmeasuredKey, f64)> {
    UnmeasuredKey::ALL
        .into_iter()
        .filter_map(|k| {
            adjustment
                .metrics
                .unmeasured
                .get(&k)
                .copied()
                .filter(|v| *v != 0.0 && v.is_finite())
                .map(|v| (k, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithmetic::approx_eq;
    use crate::domain::{MeasuredKey, RingEventType, RingSpawn};
    use crate::scenario::Scenario;
    use crate::state::create_initial_state;
    use crate::variations::{Difficulty, StartingCondition};

    fn fresh() -> GameState {
        let s = Scenario { version: "t".into(), phases: vec![] };
        create_initial_state(&s, Difficulty::Medium, StartingCondition::Default, &Default::default())
    }

    #[test]
    fn test_cost_clamps_to_one() {
        let s = fresh();
        let adj = MetricAdjustment::default().measured(MeasuredKey::CostPerUnit, 0.9);
        let out = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        assert_eq!(out.metrics.measured.cost_per_unit, 1.0);
        // input untouched
        assert!(approx_eq(s.metrics.measured.cost_per_unit, 0.3, 1e-12));
    }

    #[test]
    fn test_adoption_can_exceed_one_up_to_cap() {
        let s = fresh();
        let adj = MetricAdjustment::default().measured(MeasuredKey::WelfareStandardAdoption, 1.0);
        let out = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        assert!(approx_eq(out.metrics.measured.welfare_standard_adoption, 1.5, 1e-12));
        let adj = MetricAdjustment::default().measured(MeasuredKey::WelfareStandardAdoption, 9.0);
        let out = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        assert_eq!(out.metrics.measured.welfare_standard_adoption, 3.0);
    }

    #[test]
    fn test_region_missing_starts_from_zero() {
        let s = fresh();
        let adj = MetricAdjustment::default().region("ATA", 0.2).region("USA", -0.5);
        let out = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        assert!(approx_eq(out.map.region_values["ATA"], 0.2, 1e-12));
        assert_eq!(out.map.region_values["USA"], 0.0);
    }

    #[test]
    fn test_propagation_only_to_present_neighbours() {
        let s = fresh();
        let adj = MetricAdjustment::default().region("USA", 0.1);
        let policy = DeltaPolicy {
            regional_propagation: true,
            ..DeltaPolicy::additive()
        };
        let out = apply_adjustment(&s, &adj, policy);
        assert!(approx_eq(out.map.region_values["CAN"], 0.23, 1e-12));
        assert!(approx_eq(out.map.region_values["MEX"], 0.28, 1e-12));

        let plain = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        assert!(approx_eq(plain.map.region_values["CAN"], 0.2, 1e-12));
    }

    #[test]
    fn test_context_scaling_halves_at_far_end() {
        assert!(approx_eq(scale_by_context(0.2, 1.0, 1.0), 0.1, 1e-12));
        assert!(approx_eq(scale_by_context(0.2, 0.0, 1.0), 0.2, 1e-12));
        assert!(approx_eq(scale_by_context(-0.2, 0.0, 1.0), -0.1, 1e-12));
        assert!(approx_eq(scale_by_context(-0.2, 3.0, 3.0), -0.2, 1e-12));
    }

    #[test]
    fn test_arcs_and_hubs_dedup_rings_get_ids() {
        let mut s = fresh();
        s.turn = 4;
        s.current_node_id = "N05".into();
        let mut adj = MetricAdjustment::default();
        adj.map.activate_arcs = vec!["a1".into(), "a1".into()];
        adj.map.activate_hubs = vec!["h1".into()];
        adj.map.spawn_rings = vec![RingSpawn {
            lat: 1.0,
            lng: 2.0,
            event_type: RingEventType::PolicyShift,
            ttl: 3,
        }];
        let once = apply_adjustment(&s, &adj, DeltaPolicy::additive());
        let twice = apply_adjustment(&once, &adj, DeltaPolicy::additive());
        assert_eq!(twice.map.active_arcs.len(), 1);
        assert_eq!(twice.map.active_arcs[0].triggered_by_node_id.as_deref(), Some("N05"));
        assert_eq!(twice.map.active_hubs.len(), 1);
        assert_eq!(twice.map.active_rings.len(), 2);
        assert_eq!(twice.map.active_rings[0].id, "ring_4_0");
        assert_eq!(twice.map.active_rings[0].created_turn, 4);
    }

    #[test]
    fn test_irreversibility_moves_quarter_way() {
        let mut m = fresh().metrics;
        m.unmeasured.welfare_debt = 1.0;
        m.unmeasured.enforcement_gap = 0.6;
        m.unmeasured.system_irreversibility = 0.2;
        drift_irreversibility(&mut m);
        // target = min(1, 0.7 + 0.3) = 1.0
        assert!(approx_eq(m.unmeasured.system_irreversibility, 0.4, 1e-12));
    }

    #[test]
    fn test_touched_unmeasured_in_declared_order() {
        let adj = MetricAdjustment::default()
            .unmeasured(UnmeasuredKey::SystemIrreversibility, 0.1)
            .unmeasured(UnmeasuredKey::WelfareDebt, -0.05)
            .unmeasured(UnmeasuredKey::EnforcementGap, 0.0);
        let keys: Vec<UnmeasuredKey> = touched_unmeasured(&adj).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![UnmeasuredKey::WelfareDebt, UnmeasuredKey::SystemIrreversibility]
        );
    }
}
