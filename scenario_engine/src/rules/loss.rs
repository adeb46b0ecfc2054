//! Loss conditions. Not exclusive: several may be met at once. Each has
//! a hard threshold and a softer warning threshold, both re-evaluated
//! from scratch every turn.

use crate::domain::{GameState, LossSeverity, LossType, LossWarning};
use crate::scoring::governance_debt_index;

use super::RegionStats;

pub struct LossCondition {
    pub loss_type: LossType,
    pub name: &'static str,
    pub description: &'static str,
    pub message: &'static str,
    pub warning_message: &'static str,
    pub check: fn(&GameState) -> bool,
    pub warn: fn(&GameState) -> bool,
}

fn welfare_collapse(s: &GameState) -> bool {
    let r = RegionStats::of(s);
    r.mean_below(0.2) && s.metrics.measured.welfare_incident_rate > 0.6 && r.count_below(0.2) >= 3
}

fn welfare_collapse_near(s: &GameState) -> bool {
    let r = RegionStats::of(s);
    r.mean_below(0.3) && s.metrics.measured.welfare_incident_rate > 0.5 && r.count_below(0.3) >= 2
}

fn debt_crisis(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    governance_debt_index(u) > 0.75 || (u.welfare_debt > 0.8 && u.system_irreversibility > 0.7)
}

fn debt_crisis_near(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    governance_debt_index(u) > 0.6 || (u.welfare_debt > 0.65 && u.system_irreversibility > 0.6)
}

fn enforcement_failure(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    u.enforcement_gap > 0.7
        && u.regulatory_capture > 0.6
        && s.metrics.measured.welfare_incident_rate > 0.5
}

fn enforcement_failure_near(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    u.enforcement_gap > 0.55
        && u.regulatory_capture > 0.5
        && s.metrics.measured.welfare_incident_rate > 0.4
}

// rollback feasibility is 1 - irreversibility
fn irreversibility_lock(s: &GameState) -> bool {
    let irr = s.metrics.unmeasured.system_irreversibility;
    irr > 0.85 && (1.0 - irr) < 0.15 && RegionStats::of(s).mean_below(0.4)
}

fn irreversibility_lock_near(s: &GameState) -> bool {
    let irr = s.metrics.unmeasured.system_irreversibility;
    irr > 0.7 && (1.0 - irr) < 0.25 && RegionStats::of(s).mean_below(0.5)
}

fn regulatory_capture(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    u.regulatory_capture > 0.75 && u.enforcement_gap > 0.6 && u.welfare_debt > 0.7
}

fn regulatory_capture_near(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    u.regulatory_capture > 0.6 && u.enforcement_gap > 0.5 && u.welfare_debt > 0.55
}

pub static LOSS_CONDITIONS: &[LossCondition] = &[
    LossCondition {
        loss_type: LossType::WelfareCollapse,
        name: "Welfare Collapse",
        description: "Critical welfare metrics have dropped to dangerous levels",
        message: "Welfare standards have collapsed across multiple regions.",
        warning_message: "Welfare standards are approaching critical levels.",
        check: welfare_collapse,
        warn: welfare_collapse_near,
    },
    LossCondition {
        loss_type: LossType::DebtCrisis,
        name: "Governance Debt Crisis",
        description: "Accumulated governance debt has reached unsustainable levels",
        message: "Governance debt has reached crisis levels.",
        warning_message: "Governance debt is approaching critical levels.",
        check: debt_crisis,
        warn: debt_crisis_near,
    },
    LossCondition {
        loss_type: LossType::EnforcementFailure,
        name: "Enforcement Failure",
        description: "Enforcement gap has become unmanageable",
        message: "Enforcement systems have failed.",
        warning_message: "Enforcement gap is widening.",
        check: enforcement_failure,
        warn: enforcement_failure_near,
    },
    LossCondition {
        loss_type: LossType::IrreversibilityLock,
        name: "System Irreversibility Lock",
        description: "System has become too locked-in to change",
        message: "The system has become irreversibly locked in.",
        warning_message: "System irreversibility is approaching critical levels.",
        check: irreversibility_lock,
        warn: irreversibility_lock_near,
    },
    LossCondition {
        loss_type: LossType::RegulatoryCapture,
        name: "Regulatory Capture",
        description: "Regulatory capture has reached dangerous levels",
        message: "Regulatory capture has reached dangerous levels.",
        warning_message: "Regulatory capture is increasing.",
        check: regulatory_capture,
        warn: regulatory_capture_near,
    },
];

pub fn get_loss_condition(loss_type: LossType) -> Option<&'static LossCondition> {
    LOSS_CONDITIONS.iter().find(|c| c.loss_type == loss_type)
}

/// Every loss type whose hard threshold is crossed.
pub fn check_loss_conditions(state: &GameState) -> Vec<LossType> {
    LOSS_CONDITIONS
        .iter()
        .filter(|c| (c.check)(state))
        .map(|c| c.loss_type)
        .collect()
}

/// `Critical` when met, `Warning` when only the soft threshold is crossed.
pub fn check_loss_warnings(state: &GameState) -> Vec<(LossType, LossSeverity)> {
    LOSS_CONDITIONS
        .iter()
        .filter_map(|c| {
            if (c.check)(state) {
                Some((c.loss_type, LossSeverity::Critical))
            } else if (c.warn)(state) {
                Some((c.loss_type, LossSeverity::Warning))
            } else {
                None
            }
        })
        .collect()
}

/// Both lists, warnings stamped with the state's turn.
pub fn evaluate_loss(state: &GameState) -> (Vec<LossType>, Vec<LossWarning>) {
    let met = check_loss_conditions(state);
    let warnings = check_loss_warnings(state)
        .into_iter()
        .map(|(loss_type, severity)| LossWarning {
            loss_type,
            severity,
            turn: state.turn,
        })
        .collect();
    (met, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::scenario::Scenario;
    use crate::state::create_initial_state;
    use crate::variations::{Difficulty, StartingCondition};

    fn fresh() -> GameState {
        let s = Scenario { version: "t".into(), phases: vec![] };
        create_initial_state(&s, Difficulty::Medium, StartingCondition::Default, &EngineConfig::default())
    }

    #[test]
    fn test_baseline_is_quiet() {
        let s = fresh();
        assert!(check_loss_conditions(&s).is_empty());
        assert!(check_loss_warnings(&s).is_empty());
    }

    #[test]
    fn test_warning_before_met() {
        let mut s = fresh();
        s.metrics.unmeasured.welfare_debt = 0.7;
        s.metrics.unmeasured.system_irreversibility = 0.65;
        assert!(check_loss_conditions(&s).is_empty());
        assert_eq!(
            check_loss_warnings(&s),
            vec![(LossType::DebtCrisis, LossSeverity::Warning)]
        );

        s.metrics.unmeasured.welfare_debt = 0.85;
        s.metrics.unmeasured.system_irreversibility = 0.72;
        assert_eq!(check_loss_conditions(&s), vec![LossType::DebtCrisis]);
        assert_eq!(
            check_loss_warnings(&s),
            vec![(LossType::DebtCrisis, LossSeverity::Critical)]
        );
    }

    #[test]
    fn test_two_losses_met_together() {
        let mut s = fresh();
        s.turn = 4;
        let u = &mut s.metrics.unmeasured;
        u.regulatory_capture = 0.8;
        u.enforcement_gap = 0.75;
        u.welfare_debt = 0.75;
        s.metrics.measured.welfare_incident_rate = 0.55;

        let (met, warnings) = evaluate_loss(&s);
        assert_eq!(met, vec![LossType::EnforcementFailure, LossType::RegulatoryCapture]);
        assert_eq!(warnings.len(), 2);
        for w in &warnings {
            assert_eq!(w.severity, LossSeverity::Critical);
            assert_eq!(w.turn, 4);
            assert!(met.contains(&w.loss_type));
        }
    }

    #[test]
    fn test_collapse_needs_several_low_regions() {
        let mut s = fresh();
        s.metrics.measured.welfare_incident_rate = 0.7;
        s.map.region_values.values_mut().for_each(|v| *v = 0.1);
        assert_eq!(check_loss_conditions(&s), vec![LossType::WelfareCollapse]);

        // An empty map has no mean, so nothing regional can trigger.
        s.map.region_values.clear();
        assert!(check_loss_conditions(&s).is_empty());
    }

    #[test]
    fn test_every_type_has_a_condition() {
        assert_eq!(LOSS_CONDITIONS.len(), 5);
        let lock = get_loss_condition(LossType::IrreversibilityLock).unwrap();
        assert_eq!(lock.name, "System Irreversibility Lock");
    }
}
