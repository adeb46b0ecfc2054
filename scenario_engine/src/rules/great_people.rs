//! Great people: at most one unlock per turn, first match in declared
//! order. The effect and the record land in the same step.

use crate::config::DeltaPolicy;
use crate::delta::apply_adjustment_in_place;
use crate::domain::{GameState, GreatPersonRecord, MeasuredKey, UnmeasuredKey};

use super::{count_mentions, effect_adjustment, EffectTerm, KeywordScope};

pub struct GreatPerson {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub quote: &'static str,
    pub trigger: fn(&GameState) -> bool,
    pub effect: &'static [EffectTerm],
}

impl GreatPerson {
    pub fn record(&self, unlocked_turn: u32) -> GreatPersonRecord {
        GreatPersonRecord {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            quote: Some(self.quote.to_string()),
            unlocked_turn,
        }
    }
}

fn primatologist(s: &GameState) -> bool {
    const WORDS: &[&str] = &["research", "knowledge", "understanding", "study", "science", "sentience"];
    count_mentions(s, WORDS, KeywordScope::Both) >= 3
        && s.metrics.unmeasured.sentience_knowledge_gap < 0.3
}

fn welfare_engineer(s: &GameState) -> bool {
    count_mentions(s, &["welfare", "standard"], KeywordScope::Label) >= 3
        && s.metrics.measured.production_efficiency > 0.5
}

fn ethicist(s: &GameState) -> bool {
    const WORDS: &[&str] = &["ethic", "moral", "right", "wrong", "value", "principle"];
    count_mentions(s, WORDS, KeywordScope::Both) >= 3 && s.metrics.unmeasured.welfare_debt < 0.4
}

fn conservationist(s: &GameState) -> bool {
    const WORDS: &[&str] = &["ecosystem", "wildlife", "conservation", "biodiversity", "environment"];
    count_mentions(s, WORDS, KeywordScope::Both) >= 2
}

fn policy_architect(s: &GameState) -> bool {
    const WORDS: &[&str] = &["enforcement", "regulation", "policy", "governance", "compliance", "oversight"];
    count_mentions(s, WORDS, KeywordScope::Both) >= 3 && s.metrics.unmeasured.enforcement_gap < 0.3
}

fn transition_specialist(s: &GameState) -> bool {
    const WORDS: &[&str] = &["transition", "alternative", "change", "transform", "adapt"];
    count_mentions(s, WORDS, KeywordScope::Both) >= 2
        && s.metrics.unmeasured.welfare_debt < 0.3
        && s.metrics.unmeasured.system_irreversibility < 0.4
}

pub static GREAT_PEOPLE: &[GreatPerson] = &[
    GreatPerson {
        id: "the_primatologist",
        title: "The Primatologist",
        description: "A renowned researcher whose work on animal cognition bridges the gap \
                      between scientific knowledge and policy implementation.",
        quote: "Understanding animal minds is the foundation of ethical governance.",
        trigger: primatologist,
        effect: &[EffectTerm::Unmeasured(UnmeasuredKey::SentienceKnowledgeGap, -0.15)],
    },
    GreatPerson {
        id: "the_welfare_engineer",
        title: "The Welfare Engineer",
        description: "An innovator who designs humane systems that balance welfare with \
                      practical production needs.",
        quote: "Good design serves both animals and producers.",
        trigger: welfare_engineer,
        effect: &[
            EffectTerm::Measured(MeasuredKey::WelfareStandardAdoption, 0.2),
            EffectTerm::Measured(MeasuredKey::ProductionEfficiency, 0.05),
        ],
    },
    GreatPerson {
        id: "the_ethicist",
        title: "The Ethicist",
        description: "A philosopher whose work on animal ethics helps reduce accumulated \
                      welfare debt.",
        quote: "Ethics without action is mere contemplation.",
        trigger: ethicist,
        effect: &[EffectTerm::Unmeasured(UnmeasuredKey::WelfareDebt, -0.12)],
    },
    GreatPerson {
        id: "the_conservationist",
        title: "The Conservationist",
        description: "An advocate connecting individual welfare with broader environmental \
                      and biodiversity concerns.",
        quote: "Every animal is part of a larger system.",
        trigger: conservationist,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::WelfareDebt, -0.08),
            EffectTerm::Measured(MeasuredKey::WelfareStandardAdoption, 0.1),
        ],
    },
    GreatPerson {
        id: "the_policy_architect",
        title: "The Policy Architect",
        description: "A governance expert who bridges the gap between policy intent and \
                      practical enforcement.",
        quote: "Good policy is policy that works.",
        trigger: policy_architect,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::EnforcementGap, -0.12),
            EffectTerm::Unmeasured(UnmeasuredKey::RegulatoryCapture, -0.05),
        ],
    },
    GreatPerson {
        id: "the_transition_specialist",
        title: "The Transition Specialist",
        description: "An expert in systemic change who guides transitions to higher welfare \
                      standards without disrupting operations.",
        quote: "Change is inevitable; transition is a choice.",
        trigger: transition_specialist,
        effect: &[
            EffectTerm::Unmeasured(UnmeasuredKey::WelfareDebt, -0.1),
            EffectTerm::Unmeasured(UnmeasuredKey::SystemIrreversibility, -0.08),
        ],
    },
];

pub fn get_great_person(id: &str) -> Option<&'static GreatPerson> {
    GREAT_PEOPLE.iter().find(|p| p.id == id)
}

/// First not-yet-unlocked person whose trigger holds.
pub fn check_great_person_unlock(state: &GameState) -> Option<&'static GreatPerson> {
    GREAT_PEOPLE
        .iter()
        .find(|p| !state.has_great_person(p.id) && (p.trigger)(state))
}

/// Apply the effect additively and append the record. Idempotent by id.
pub fn apply_great_person_effect(state: &GameState, person: &GreatPerson) -> GameState {
    let mut next = state.clone();
    if next.has_great_person(person.id) {
        return next;
    }
    apply_adjustment_in_place(&mut next, &effect_adjustment(person.effect), DeltaPolicy::additive());
    next.great_people.push(person.record(next.turn));
    next
}
