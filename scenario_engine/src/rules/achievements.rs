//! Achievements: recognition only, no metric effect. Several may unlock
//! on the same turn.

use crate::domain::GameState;
use crate::scoring::{governance_debt_index, measured_success_index};

use super::{count_mentions, KeywordScope, RegionStats};

pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub check: fn(&GameState) -> bool,
}

const WELFARE_WORDS: &[&str] = &["welfare", "standard", "protect", "recognize", "broad"];
const RESEARCH_WORDS: &[&str] = &["research", "knowledge", "understanding", "study", "science"];

fn ethical_pioneer(s: &GameState) -> bool {
    s.audit_trail.len() >= 5
        && count_mentions(s, WELFARE_WORDS, KeywordScope::Both) == s.audit_trail.len()
}

fn pragmatic_governor(s: &GameState) -> bool {
    measured_success_index(&s.metrics.measured) > 0.6
        && governance_debt_index(&s.metrics.unmeasured) < 0.4
        && s.audit_trail.len() >= 8
}

fn research_champion(s: &GameState) -> bool {
    count_mentions(s, RESEARCH_WORDS, KeywordScope::Both) >= 4
        && s.metrics.unmeasured.sentience_knowledge_gap < 0.25
}

fn debt_eliminator(s: &GameState) -> bool {
    governance_debt_index(&s.metrics.unmeasured) < 0.2 && s.metrics.unmeasured.welfare_debt < 0.15
}

fn enforcement_master(s: &GameState) -> bool {
    s.metrics.unmeasured.enforcement_gap < 0.15 && s.metrics.unmeasured.regulatory_capture < 0.2
}

fn efficiency_expert(s: &GameState) -> bool {
    s.metrics.measured.production_efficiency > 0.75 && s.metrics.measured.cost_per_unit < 0.3
}

fn global_leader(s: &GameState) -> bool {
    RegionStats::of(s).count_above(0.7) >= 7
}

fn balanced_approach(s: &GameState) -> bool {
    super::victory::balance_holds(s)
}

fn rapid_decision_maker(s: &GameState) -> bool {
    s.flags.is_complete && s.turn <= 15
}

fn thoughtful_planner(s: &GameState) -> bool {
    let bank = &s.memory.assumptions_bank;
    bank.len() >= 5 && bank.iter().filter(|a| a.strength > 0.7).count() >= 3
}

pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "ethical_pioneer",
        name: "Ethical Pioneer",
        description: "Always chose the highest welfare option in every decision",
        check: ethical_pioneer,
    },
    Achievement {
        id: "pragmatic_governor",
        name: "Pragmatic Governor",
        description: "Balanced all concerns across measured and unmeasured metrics",
        check: pragmatic_governor,
    },
    Achievement {
        id: "research_champion",
        name: "Research Champion",
        description: "Prioritized knowledge gaps and research throughout",
        check: research_champion,
    },
    Achievement {
        id: "debt_eliminator",
        name: "Debt Eliminator",
        description: "Minimized welfare debt throughout the scenario",
        check: debt_eliminator,
    },
    Achievement {
        id: "enforcement_master",
        name: "Enforcement Master",
        description: "Achieved minimal enforcement gaps",
        check: enforcement_master,
    },
    Achievement {
        id: "efficiency_expert",
        name: "Efficiency Expert",
        description: "Maintained high production efficiency throughout",
        check: efficiency_expert,
    },
    Achievement {
        id: "global_leader",
        name: "Global Leader",
        description: "Achieved high welfare standards in 7+ countries",
        check: global_leader,
    },
    Achievement {
        id: "balanced_approach",
        name: "Balanced Approach",
        description: "Achieved balance victory - all metrics in good ranges",
        check: balanced_approach,
    },
    Achievement {
        id: "rapid_decision_maker",
        name: "Rapid Decision Maker",
        description: "Completed the scenario in under 15 turns",
        check: rapid_decision_maker,
    },
    Achievement {
        id: "thoughtful_planner",
        name: "Thoughtful Planner",
        description: "Maintained assumptions throughout with minimal degradation",
        check: thoughtful_planner,
    },
];

/// Newly satisfied achievement ids, in declared order. Already-held ids
/// are never returned.
pub fn check_achievements(state: &GameState) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !state.has_achievement(a.id) && (a.check)(state))
        .map(|a| a.id)
        .collect()
}

pub fn get_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
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
    fn test_baseline_unlocks_debt_eliminator_only() {
        assert_eq!(check_achievements(&fresh()), vec!["debt_eliminator"]);
    }

    #[test]
    fn test_several_unlock_in_declared_order() {
        let mut s = fresh();
        s.metrics.unmeasured.regulatory_capture = 0.1;
        s.metrics.measured.production_efficiency = 0.8;
        s.metrics.measured.cost_per_unit = 0.2;
        assert_eq!(
            check_achievements(&s),
            vec!["debt_eliminator", "enforcement_master", "efficiency_expert"]
        );
    }

    #[test]
    fn test_held_ids_are_never_returned() {
        let mut s = fresh();
        s.metrics.unmeasured.regulatory_capture = 0.1;
        s.achievements.push("enforcement_master".into());
        let ids = check_achievements(&s);
        assert_eq!(ids, vec!["debt_eliminator"]);

        s.achievements.extend(ids.iter().map(|id| id.to_string()));
        assert!(check_achievements(&s).is_empty());
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(ACHIEVEMENTS.len(), 10);
        assert_eq!(get_achievement("global_leader").map(|a| a.name), Some("Global Leader"));
        assert!(get_achievement("nope").is_none());
    }
}
