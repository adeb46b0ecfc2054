//! Scenario Kernel: Rule Evaluators
//!
//! Five families of static checklists evaluated against a `GameState`:
//! achievements, wonders, great people, victory and loss. Predicates are
//! plain `fn(&GameState) -> bool`; effects are const term lists turned
//! into a `MetricAdjustment` on demand.

pub mod achievements;
pub mod great_people;
pub mod loss;
pub mod victory;
pub mod wonders;

use crate::arithmetic::mean;
use crate::domain::{AuditRecord, GameState, MeasuredKey, MetricAdjustment, UnmeasuredKey};

pub use achievements::{check_achievements, get_achievement, Achievement, ACHIEVEMENTS};
pub use great_people::{
    apply_great_person_effect, check_great_person_unlock, get_great_person, GreatPerson,
    GREAT_PEOPLE,
};
pub use loss::{
    check_loss_conditions, check_loss_warnings, evaluate_loss, get_loss_condition, LossCondition,
    LOSS_CONDITIONS,
};
pub use victory::{
    check_victory_conditions, get_victory_condition, VictoryCondition, VICTORY_CONDITIONS,
    VICTORY_PRIORITY,
};
pub use wonders::{
    apply_wonder_effect, check_wonder_completions, get_wonder, Wonder, WONDERS,
};

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// One additive term of an unlock effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectTerm {
    Measured(MeasuredKey, f64),
    Unmeasured(UnmeasuredKey, f64),
    Region(&'static str, f64),
}

pub fn effect_adjustment(terms: &[EffectTerm]) -> MetricAdjustment {
    terms
        .iter()
        .fold(MetricAdjustment::default(), |adj, term| match *term {
            EffectTerm::Measured(k, v) => adj.measured(k, v),
            EffectTerm::Unmeasured(k, v) => adj.unmeasured(k, v),
            EffectTerm::Region(code, v) => adj.region(code, v),
        })
}

// ---------------------------------------------------------------------------
// Shared predicate helpers
// ---------------------------------------------------------------------------

/// Which free-text fields of an audit record a keyword scan reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordScope {
    Label,
    Rationale,
    Both,
}

/// Case-insensitive substring match of any keyword in the scoped fields.
pub fn record_mentions(record: &AuditRecord, keywords: &[&str], scope: KeywordScope) -> bool {
    let label = record.chosen_label.to_lowercase();
    let rationale = record.rationale.to_lowercase();
    keywords.iter().any(|kw| match scope {
        KeywordScope::Label => label.contains(kw),
        KeywordScope::Rationale => rationale.contains(kw),
        KeywordScope::Both => label.contains(kw) || rationale.contains(kw),
    })
}

/// Number of decisions whose text mentions any keyword.
pub fn count_mentions(state: &GameState, keywords: &[&str], scope: KeywordScope) -> usize {
    state
        .audit_trail
        .iter()
        .filter(|r| record_mentions(r, keywords, scope))
        .count()
}

/// Aggregate view over `map.regionValues`.
#[derive(Debug, Clone, Copy)]
pub struct RegionStats<'a> {
    values: &'a std::collections::BTreeMap<String, f64>,
}

impl<'a> RegionStats<'a> {
    pub fn of(state: &'a GameState) -> Self {
        Self { values: &state.map.region_values }
    }

    /// `None` for an empty map; every predicate over it is then false.
    pub fn mean(&self) -> Option<f64> {
        mean(self.values.values().copied())
    }

    pub fn mean_above(&self, threshold: f64) -> bool {
        self.mean().is_some_and(|m| m > threshold)
    }

    pub fn mean_below(&self, threshold: f64) -> bool {
        self.mean().is_some_and(|m| m < threshold)
    }

    pub fn count_above(&self, threshold: f64) -> usize {
        self.values.values().filter(|v| **v > threshold).count()
    }

    pub fn count_below(&self, threshold: f64) -> usize {
        self.values.values().filter(|v| **v < threshold).count()
    }
}
