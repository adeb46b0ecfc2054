//! Scenario Kernel: Decision Impact Text
//!
//! Human-readable summaries of a choice's raw delta, computed before the
//! choice is applied. No context scaling; these describe authored intent.

use serde::Serialize;

use crate::delta::touched_unmeasured;
use crate::domain::{Delta, MeasuredKey, MetricField, UnmeasuredKey};

pub const NO_UNMEASURED_IMPACT: &str = "No significant unmeasured impacts detected.";
pub const NO_CHANGES: &str = "No significant changes";

/// "This decision increased welfare debt, reduced enforcement gap."
pub fn unmeasured_impact_sentence(delta: &Delta) -> String {
    let parts: Vec<String> = touched_unmeasured(delta)
        .into_iter()
        .map(|(key, amount)| {
            let verb = if amount > 0.0 { "increased" } else { "reduced" };
            format!("{verb} {}", key.impact_noun())
        })
        .collect();
    if parts.is_empty() {
        NO_UNMEASURED_IMPACT.to_string()
    } else {
        format!("This decision {}.", parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricChange {
    pub metric: &'static str,
    pub label: &'static str,
    /// Absolute size of the change.
    pub change: f64,
    pub direction: Direction,
    /// Whether this change moves the metric the good way.
    pub favourable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactPreview {
    pub measured: Vec<MetricChange>,
    pub unmeasured: Vec<MetricChange>,
    pub summary: String,
}

fn change_for(field: MetricField, amount: f64) -> Option<MetricChange> {
    if amount == 0.0 || !amount.is_finite() {
        return None;
    }
    let direction = if amount > 0.0 { Direction::Up } else { Direction::Down };
    Some(MetricChange {
        metric: field.as_str(),
        label: field.label(),
        change: amount.abs(),
        direction,
        favourable: (amount > 0.0) == field.higher_is_better(),
    })
}

fn describe(change: &MetricChange) -> String {
    let sign = match change.direction {
        Direction::Up => '+',
        Direction::Down => '-',
    };
    format!("{sign}{:.0}% {}", change.change * 100.0, change.label)
}

/// Preview of the raw delta, measured first, in declared key order.
pub fn calculate_impact_preview(delta: &Delta) -> ImpactPreview {
    let measured: Vec<MetricChange> = MeasuredKey::ALL
        .into_iter()
        .filter_map(|k| {
            let amount = delta.metrics.measured.get(&k).copied()?;
            change_for(MetricField::Measured(k), amount)
        })
        .collect();
    let unmeasured: Vec<MetricChange> = UnmeasuredKey::ALL
        .into_iter()
        .filter_map(|k| {
            let amount = delta.metrics.unmeasured.get(&k).copied()?;
            change_for(MetricField::Unmeasured(k), amount)
        })
        .collect();

    let summary = measured
        .iter()
        .chain(unmeasured.iter())
        .map(describe)
        .collect::<Vec<_>>()
        .join(", ");

    ImpactPreview {
        summary: if summary.is_empty() { NO_CHANGES.to_string() } else { summary },
        measured,
        unmeasured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetricAdjustment;

    #[test]
    fn test_sentence_lists_touched_keys_with_sign() {
        let d = MetricAdjustment::default()
            .unmeasured(UnmeasuredKey::WelfareDebt, 0.1)
            .unmeasured(UnmeasuredKey::SentienceKnowledgeGap, -0.05);
        assert_eq!(
            unmeasured_impact_sentence(&d),
            "This decision increased welfare debt, reduced knowledge gaps about animal sentience."
        );
    }

    #[test]
    fn test_sentence_when_nothing_hidden_moves() {
        let d = MetricAdjustment::default().measured(MeasuredKey::CostPerUnit, 0.1);
        assert_eq!(unmeasured_impact_sentence(&d), NO_UNMEASURED_IMPACT);
    }

    #[test]
    fn test_preview_summary_format() {
        let d = MetricAdjustment::default()
            .measured(MeasuredKey::ProductionEfficiency, 0.12)
            .measured(MeasuredKey::CostPerUnit, -0.05)
            .unmeasured(UnmeasuredKey::EnforcementGap, 0.1);
        let p = calculate_impact_preview(&d);
        assert_eq!(
            p.summary,
            "+12% Production Efficiency, -5% Cost Per Unit, +10% Enforcement Gap"
        );
        assert!(p.measured[0].favourable);
        assert!(p.measured[1].favourable);
        assert!(!p.unmeasured[0].favourable);
    }

    #[test]
    fn test_preview_empty_delta() {
        let p = calculate_impact_preview(&MetricAdjustment::default());
        assert_eq!(p.summary, NO_CHANGES);
        assert!(p.measured.is_empty() && p.unmeasured.is_empty());
    }
}
