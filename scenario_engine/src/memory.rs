//! Scenario Kernel: Assumption Memory
//!
//! Free-text assumptions lose strength linearly with the turns elapsed
//! since they were last reaffirmed. All functions return a new bank.

use crate::arithmetic::clamp_unit;
use crate::domain::{Assumption, Memory};

/// Strength implied by elapsed turns alone.
pub fn decayed_strength(assumption: &Assumption, turn: u32, decay_rate: f64) -> f64 {
    let elapsed = turn.saturating_sub(assumption.last_reaffirmed_turn);
    clamp_unit(1.0 - decay_rate * f64::from(elapsed))
}

/// Re-evaluate every assumption at `turn`. Never raises a strength.
pub fn apply_decay(memory: &Memory, turn: u32, decay_rate: f64) -> Memory {
    let assumptions_bank = memory
        .assumptions_bank
        .iter()
        .map(|a| Assumption {
            strength: decayed_strength(a, turn, decay_rate).min(clamp_unit(a.strength)),
            ..a.clone()
        })
        .collect();
    Memory { assumptions_bank }
}

/// Append a full-strength assumption. Blank text is ignored.
pub fn add_assumption(memory: &Memory, text: &str, turn: u32) -> Memory {
    let mut out = memory.clone();
    if text.trim().is_empty() {
        return out;
    }
    out.assumptions_bank.push(Assumption {
        text: text.to_string(),
        strength: 1.0,
        created_turn: turn,
        last_reaffirmed_turn: turn,
    });
    out
}

/// Reset every assumption whose text matches exactly. No match, no change.
pub fn reaffirm(memory: &Memory, text: &str, turn: u32) -> Memory {
    let assumptions_bank = memory
        .assumptions_bank
        .iter()
        .map(|a| {
            if a.text == text {
                Assumption {
                    strength: 1.0,
                    last_reaffirmed_turn: turn,
                    ..a.clone()
                }
            } else {
                a.clone()
            }
        })
        .collect();
    Memory { assumptions_bank }
}

/// Reaffirm the whole bank at `turn`.
pub fn reaffirm_all(memory: &Memory, turn: u32) -> Memory {
    let assumptions_bank = memory
        .assumptions_bank
        .iter()
        .map(|a| Assumption {
            strength: 1.0,
            last_reaffirmed_turn: turn,
            ..a.clone()
        })
        .collect();
    Memory { assumptions_bank }
}

pub fn degraded_assumptions(memory: &Memory, threshold: f64) -> Vec<&Assumption> {
    memory
        .assumptions_bank
        .iter()
        .filter(|a| a.strength < threshold)
        .collect()
}
