//! Scenario Kernel: Difficulty & Starting Conditions
//!
//! Two sequential transforms over the baseline metrics.
//! Difficulty first, then starting condition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arithmetic::{clamp_range, UNIT_MIN};
use crate::domain::{MeasuredKey, MetricField, Metrics, UnmeasuredKey};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct VariationParseError {
    pub kind: &'static str,
    pub value: String,
}

// ── Difficulty ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::VeryEasy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::VeryEasy => 1.4,
            Difficulty::Easy => 1.2,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 0.8,
            Difficulty::VeryHard => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "very_easy",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very_hard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "Very favorable starting conditions, ideal for learning and exploration",
            Difficulty::Easy => "More favorable starting conditions, easier to achieve positive outcomes",
            Difficulty::Medium => "Standard starting conditions, balanced challenge",
            Difficulty::Hard => "Challenging starting conditions, requires careful decision-making",
            Difficulty::VeryHard => "Extremely challenging conditions, maximum difficulty for experienced players",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = VariationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| VariationParseError {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

/// Scale "higher is better" fields by the multiplier and every other
/// field by `2 - multiplier`. Results stay inside each field's range.
pub fn apply_difficulty(metrics: &Metrics, difficulty: Difficulty) -> Metrics {
    let m = difficulty.multiplier();
    let mut out = *metrics;
    for field in MetricField::all() {
        let factor = if field.higher_is_better() { m } else { 2.0 - m };
        out.set(field, field.clamp_value(metrics.get(field) * factor));
    }
    out
}

// ── Starting condition ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingCondition {
    #[default]
    Default,
    Optimistic,
    Pessimistic,
    Balanced,
    Crisis,
    Transition,
    Innovation,
}

use MeasuredKey::{ProductionEfficiency, WelfareIncidentRate, WelfareStandardAdoption};
use UnmeasuredKey::{
    EnforcementGap, RegulatoryCapture, SentienceKnowledgeGap, SystemIrreversibility, WelfareDebt,
};

const fn m(key: MeasuredKey, factor: f64) -> (MetricField, f64) {
    (MetricField::Measured(key), factor)
}

const fn u(key: UnmeasuredKey, factor: f64) -> (MetricField, f64) {
    (MetricField::Unmeasured(key), factor)
}

const OPTIMISTIC: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 1.3),
    m(WelfareStandardAdoption, 1.5),
    m(WelfareIncidentRate, 0.7),
    u(WelfareDebt, 0.5),
    u(EnforcementGap, 0.6),
    u(RegulatoryCapture, 0.7),
];

const PESSIMISTIC: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 0.7),
    m(WelfareStandardAdoption, 0.5),
    m(WelfareIncidentRate, 1.5),
    u(WelfareDebt, 1.5),
    u(EnforcementGap, 1.4),
    u(RegulatoryCapture, 1.3),
];

const BALANCED: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 1.1),
    m(WelfareStandardAdoption, 1.2),
    u(WelfareDebt, 0.9),
    u(EnforcementGap, 0.9),
];

const CRISIS: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 0.6),
    m(WelfareStandardAdoption, 0.4),
    m(WelfareIncidentRate, 1.8),
    u(WelfareDebt, 1.8),
    u(EnforcementGap, 1.7),
    u(RegulatoryCapture, 1.6),
    u(SystemIrreversibility, 1.5),
];

const TRANSITION: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 1.15),
    m(WelfareStandardAdoption, 1.3),
    u(WelfareDebt, 0.85),
    u(EnforcementGap, 0.9),
    u(SystemIrreversibility, 1.2),
];

const INNOVATION: &[(MetricField, f64)] = &[
    m(ProductionEfficiency, 1.25),
    m(WelfareStandardAdoption, 1.4),
    m(WelfareIncidentRate, 0.8),
    u(WelfareDebt, 0.7),
    u(EnforcementGap, 0.75),
    u(SentienceKnowledgeGap, 1.3),
];

impl StartingCondition {
    pub const ALL: [StartingCondition; 7] = [
        StartingCondition::Default,
        StartingCondition::Optimistic,
        StartingCondition::Pessimistic,
        StartingCondition::Balanced,
        StartingCondition::Crisis,
        StartingCondition::Transition,
        StartingCondition::Innovation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StartingCondition::Default => "default",
            StartingCondition::Optimistic => "optimistic",
            StartingCondition::Pessimistic => "pessimistic",
            StartingCondition::Balanced => "balanced",
            StartingCondition::Crisis => "crisis",
            StartingCondition::Transition => "transition",
            StartingCondition::Innovation => "innovation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StartingCondition::Default => "Standard baseline metrics",
            StartingCondition::Optimistic => "Favorable conditions with higher welfare standards already in place",
            StartingCondition::Pessimistic => "Challenging conditions with significant welfare debt and enforcement gaps",
            StartingCondition::Balanced => "Moderate improvements across key metrics",
            StartingCondition::Crisis => "Crisis scenario: high welfare debt, low enforcement, system near collapse",
            StartingCondition::Transition => "Transition period: moderate improvements but high system irreversibility",
            StartingCondition::Innovation => "Innovation-driven: good metrics but knowledge gaps remain",
        }
    }

    /// Per-field multipliers. Fields not listed keep their value.
    pub fn multipliers(&self) -> &'static [(MetricField, f64)] {
        match self {
            StartingCondition::Default => &[],
            StartingCondition::Optimistic => OPTIMISTIC,
            StartingCondition::Pessimistic => PESSIMISTIC,
            StartingCondition::Balanced => BALANCED,
            StartingCondition::Crisis => CRISIS,
            StartingCondition::Transition => TRANSITION,
            StartingCondition::Innovation => INNOVATION,
        }
    }
}

impl fmt::Display for StartingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartingCondition {
    type Err = VariationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StartingCondition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VariationParseError {
                kind: "starting condition",
                value: s.to_string(),
            })
    }
}

pub fn apply_starting_condition(metrics: &Metrics, condition: StartingCondition) -> Metrics {
    let mut out = *metrics;
    for &(field, factor) in condition.multipliers() {
        let scaled = clamp_range(metrics.get(field) * factor, UNIT_MIN, field.upper_bound());
        out.set(field, scaled);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithmetic::approx_eq;
    use crate::state::baseline_metrics;

    #[test]
    fn test_medium_default_is_identity() {
        let base = baseline_metrics();
        let out = apply_starting_condition(
            &apply_difficulty(&base, Difficulty::Medium),
            StartingCondition::Default,
        );
        assert_eq!(out, base);
    }

    #[test]
    fn test_hard_worsens_both_directions() {
        let base = baseline_metrics();
        let out = apply_difficulty(&base, Difficulty::Hard);
        assert!(approx_eq(out.measured.production_efficiency, 0.4, 1e-12));
        assert!(approx_eq(out.measured.cost_per_unit, 0.36, 1e-12));
        assert!(approx_eq(out.unmeasured.regulatory_capture, 0.24, 1e-12));
    }

    #[test]
    fn test_crisis_clamps_into_range() {
        let mut base = baseline_metrics();
        base.unmeasured.welfare_debt = 0.9;
        let out = apply_starting_condition(&base, StartingCondition::Crisis);
        assert_eq!(out.unmeasured.welfare_debt, 1.0);
        // untouched by crisis
        assert_eq!(out.measured.cost_per_unit, base.measured.cost_per_unit);
    }

    #[test]
    fn test_parse_round_trip_names() {
        assert_eq!("very_hard".parse::<Difficulty>(), Ok(Difficulty::VeryHard));
        assert_eq!(
            "innovation".parse::<StartingCondition>(),
            Ok(StartingCondition::Innovation)
        );
        let err = "nightmare".parse::<Difficulty>().unwrap_err();
        assert_eq!(err.to_string(), "unknown difficulty \"nightmare\"");
    }
}
