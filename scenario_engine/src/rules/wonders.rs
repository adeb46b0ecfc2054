//! Wonders: several may complete at once. Completing one applies its
//! effect and records the id in the same step.

use crate::config::DeltaPolicy;
use crate::delta::apply_adjustment_in_place;
use crate::domain::{GameState, MeasuredKey, UnmeasuredKey};

use super::{count_mentions, effect_adjustment, EffectTerm, KeywordScope, RegionStats};

pub struct Wonder {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Where the presentation layer pins it: (lat, lng, country).
    pub location: (f64, f64, &'static str),
    pub check: fn(&GameState) -> bool,
    pub effect: &'static [EffectTerm],
}

fn global_welfare_accord(s: &GameState) -> bool {
    let r = RegionStats::of(s);
    r.count_above(0.7) >= 5 && r.mean_above(0.65)
}

fn sentience_recognition_treaty(s: &GameState) -> bool {
    s.metrics.unmeasured.sentience_knowledge_gap < 0.2
        && s.metrics.measured.welfare_standard_adoption > 1.5
}

fn alternative_protein_revolution(s: &GameState) -> bool {
    s.metrics.unmeasured.welfare_debt < 0.25
        && s.metrics.measured.production_efficiency > 0.7
        && s.metrics.measured.cost_per_unit < 0.35
}

fn enforcement_network(s: &GameState) -> bool {
    s.metrics.unmeasured.enforcement_gap < 0.2
        && s.metrics.unmeasured.regulatory_capture < 0.25
        && s.map.active_arcs.len() >= 10
}

fn welfare_research_institute(s: &GameState) -> bool {
    s.metrics.unmeasured.sentience_knowledge_gap < 0.2
        && s.metrics.measured.welfare_standard_adoption > 1.2
        && count_mentions(s, &["research", "science"], KeywordScope::Rationale) >= 4
}

fn transition_fund(s: &GameState) -> bool {
    s.metrics.measured.cost_per_unit < 0.4
        && s.metrics.unmeasured.welfare_debt < 0.3
        && s.metrics.measured.production_efficiency > 0.6
}

pub static WONDERS: &[Wonder] = &[
    Wonder {
        id: "global_welfare_accord",
        name: "Global Welfare Accord",
        description: "A landmark international agreement establishing universal welfare standards.",
        location: (46.2, 2.2, "France"),
        check: global_welfare_accord,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::EnforcementGap, -0.1),
            EffectTerm::Region("USA", 0.05),
            EffectTerm::Region("CAN", 0.05),
            EffectTerm::Region("MEX", 0.05),
            EffectTerm::Region("GBR", 0.05),
            EffectTerm::Region("FRA", 0.05),
            EffectTerm::Region("DEU", 0.05),
            EffectTerm::Region("IND", 0.05),
            EffectTerm::Region("CHN", 0.05),
            EffectTerm::Region("BRA", 0.05),
            EffectTerm::Region("ZAF", 0.05),
            EffectTerm::Region("AUS", 0.05),
        ],
    },
    Wonder {
        id: "sentience_recognition_treaty",
        name: "Sentience Recognition Treaty",
        description: "A global treaty formally recognizing animal sentience as a foundation \
                      for all welfare policy.",
        location: (52.5, 13.4, "Germany"),
        check: sentience_recognition_treaty,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::SentienceKnowledgeGap, -0.15),
            EffectTerm::Measured(MeasuredKey::WelfareStandardAdoption, 0.3),
        ],
    },
    Wonder {
        id: "alternative_protein_revolution",
        name: "Alternative Protein Revolution",
        description: "A breakthrough in alternative protein technologies that reduces reliance \
                      on traditional animal agriculture.",
        location: (37.8, -122.4, "USA"),
        check: alternative_protein_revolution,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::WelfareDebt, -0.12),
            EffectTerm::Unmeasured(UnmeasuredKey::SystemIrreversibility, -0.1),
            EffectTerm::Measured(MeasuredKey::ProductionEfficiency, 0.1),
            EffectTerm::Measured(MeasuredKey::CostPerUnit, -0.05),
        ],
    },
    Wonder {
        id: "enforcement_network",
        name: "Global Enforcement Network",
        description: "An international network of enforcement agencies working across borders.",
        location: (50.8, 4.4, "Belgium"),
        check: enforcement_network,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::EnforcementGap, -0.12),
            EffectTerm::Unmeasured(UnmeasuredKey::RegulatoryCapture, -0.08),
        ],
    },
    Wonder {
        id: "welfare_research_institute",
        name: "International Welfare Research Institute",
        description: "A premier research institution dedicated to animal welfare science.",
        location: (52.2, 0.1, "UK"),
        check: welfare_research_institute,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::SentienceKnowledgeGap, -0.1),
            EffectTerm::Measured(MeasuredKey::WelfareStandardAdoption, 0.2),
        ],
    },
    Wonder {
        id: "transition_fund",
        name: "Global Transition Fund",
        description: "An international fund reducing financial barriers to higher welfare systems.",
        location: (40.7, -74.0, "USA"),
        check: transition_fund,
        effect: &[
            EffectTerm::Measured(MeasuredKey::CostPerUnit, -0.08),
            EffectTerm::Measured(MeasuredKey::ProductionEfficiency, 0.05),
            EffectTerm::Unmeasured(UnmeasuredKey::WelfareDebt, -0.08),
        ],
    },
];

pub fn get_wonder(id: &str) -> Option<&'static Wonder> {
    WONDERS.iter().find(|w| w.id == id)
}

/// Newly satisfied wonders, in declared order.
pub fn check_wonder_completions(state: &GameState) -> Vec<&'static Wonder> {
    WONDERS
        .iter()
        .filter(|w| !state.has_wonder(w.id) && (w.check)(state))
        .collect()
}

/// Apply the effect additively and record the id. Idempotent by id.
pub fn apply_wonder_effect(state: &GameState, wonder: &Wonder) -> GameState {
    let mut next = state.clone();
    if next.has_wonder(wonder.id) {
        return next;
    }
    apply_adjustment_in_place(&mut next, &effect_adjustment(wonder.effect), DeltaPolicy::additive());
    next.completed_wonders.push(wonder.id.to_string());
    next
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

    /// Efficient and cheap: satisfies both the protein and the fund wonders.
    fn efficient() -> GameState {
        let mut s = fresh();
        s.metrics.measured.production_efficiency = 0.8;
        s.metrics.measured.cost_per_unit = 0.2;
        s
    }

    fn ids(wonders: &[&Wonder]) -> Vec<&'static str> {
        wonders.iter().map(|w| w.id).collect()
    }

    #[test]
    fn test_baseline_completes_nothing() {
        assert!(check_wonder_completions(&fresh()).is_empty());
    }

    #[test]
    fn test_two_complete_at_once_in_declared_order() {
        assert_eq!(
            ids(&check_wonder_completions(&efficient())),
            vec!["alternative_protein_revolution", "transition_fund"]
        );
    }

    #[test]
    fn test_effect_applies_once() {
        let s = efficient();
        let wonder = get_wonder("alternative_protein_revolution").unwrap();
        let once = apply_wonder_effect(&s, wonder);
        assert_eq!(once.completed_wonders, vec!["alternative_protein_revolution"]);
        assert!((once.metrics.measured.production_efficiency - 0.9).abs() < 1e-9);
        assert!((once.metrics.measured.cost_per_unit - 0.15).abs() < 1e-9);
        // 0.1 - 0.12 clamps at zero.
        assert_eq!(once.metrics.unmeasured.welfare_debt, 0.0);
        assert_eq!(once.metrics.unmeasured.system_irreversibility, 0.0);

        let twice = apply_wonder_effect(&once, wonder);
        assert_eq!(twice, once);
        assert_eq!(ids(&check_wonder_completions(&once)), vec!["transition_fund"]);
    }

    #[test]
    fn test_held_ids_are_never_returned() {
        let mut s = efficient();
        for w in check_wonder_completions(&s) {
            s = apply_wonder_effect(&s, w);
        }
        assert_eq!(s.completed_wonders.len(), 2);
        assert!(check_wonder_completions(&s).is_empty());
    }

    #[test]
    fn test_region_terms_land_on_the_map() {
        let s = fresh();
        let accord = get_wonder("global_welfare_accord").unwrap();
        let next = apply_wonder_effect(&s, accord);
        assert!((next.map.region_values["USA"] - 0.35).abs() < 1e-9);
        assert_eq!(next.map.region_values["NZL"], s.map.region_values["NZL"]);
        assert!((next.metrics.unmeasured.enforcement_gap - 0.0).abs() < 1e-9);
    }
}
