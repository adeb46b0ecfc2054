//! Victory: mutually exclusive. Checked in a fixed priority order and
//! the first type whose predicate holds wins.

use crate::domain::{GameState, VictoryType};
use crate::scoring::{governance_debt_index, measured_success_index};

use super::RegionStats;

pub struct VictoryCondition {
    pub victory_type: VictoryType,
    pub name: &'static str,
    pub description: &'static str,
    pub message: &'static str,
    pub check: fn(&GameState) -> bool,
}

/// Evaluation order. Balance first, welfare last.
pub const VICTORY_PRIORITY: [VictoryType; 4] = [
    VictoryType::Balance,
    VictoryType::Enforcement,
    VictoryType::Debt,
    VictoryType::Welfare,
];

fn welfare_holds(s: &GameState) -> bool {
    let regions = RegionStats::of(s);
    measured_success_index(&s.metrics.measured) > 0.75
        && regions.mean_above(0.6)
        && regions.count_above(0.7) >= 5
}

fn debt_holds(s: &GameState) -> bool {
    governance_debt_index(&s.metrics.unmeasured) < 0.25
        && measured_success_index(&s.metrics.measured) > 0.5
}

fn enforcement_holds(s: &GameState) -> bool {
    s.metrics.unmeasured.enforcement_gap < 0.15
        && s.metrics.unmeasured.regulatory_capture < 0.2
        && RegionStats::of(s).mean_above(0.5)
}

/// Also backs the `balanced_approach` achievement.
pub(crate) fn balance_holds(s: &GameState) -> bool {
    let u = &s.metrics.unmeasured;
    measured_success_index(&s.metrics.measured) > 0.65
        && governance_debt_index(u) < 0.35
        && u.enforcement_gap < 0.25
        && RegionStats::of(s).mean_above(0.55)
        && u.regulatory_capture < 0.3
        && u.sentience_knowledge_gap < 0.3
}

pub static VICTORY_CONDITIONS: &[VictoryCondition] = &[
    VictoryCondition {
        victory_type: VictoryType::Welfare,
        name: "Welfare Victory",
        description: "Achieve high welfare standards globally while maintaining efficiency",
        message: "You have achieved exceptional welfare standards across the globe while \
                  maintaining production efficiency.",
        check: welfare_holds,
    },
    VictoryCondition {
        victory_type: VictoryType::Debt,
        name: "Debt Victory",
        description: "Minimize welfare debt while maintaining reasonable standards",
        message: "You have minimized hidden costs and governance debt while maintaining \
                  reasonable welfare standards.",
        check: debt_holds,
    },
    VictoryCondition {
        victory_type: VictoryType::Enforcement,
        name: "Enforcement Victory",
        description: "Achieve perfect enforcement with minimal gaps",
        message: "You have achieved exceptional enforcement with minimal gaps between \
                  policy and practice.",
        check: enforcement_holds,
    },
    VictoryCondition {
        victory_type: VictoryType::Balance,
        name: "Balance Victory",
        description: "Achieve all metrics in good ranges - the most challenging path",
        message: "You have achieved exceptional balance across all dimensions of governance.",
        check: balance_holds,
    },
];

pub fn get_victory_condition(victory_type: VictoryType) -> Option<&'static VictoryCondition> {
    VICTORY_CONDITIONS
        .iter()
        .find(|c| c.victory_type == victory_type)
}

/// At most one victory type; `None` when no predicate holds.
pub fn check_victory_conditions(state: &GameState) -> Option<VictoryType> {
    VICTORY_PRIORITY.into_iter().find(|t| {
        get_victory_condition(*t).is_some_and(|c| (c.check)(state))
    })
}
