//! Scenario Kernel: Engine Configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TERMINAL_NODE_ID: &str = "N16_COMPLETE";
pub const DEFAULT_START_NODE_ID: &str = "N01_INITIAL";
pub const DEFAULT_START_PHASE_ID: &str = "P1_DEPLOY";
pub const DEFAULT_DECAY_RATE: f64 = 0.05;
pub const DEFAULT_DEGRADED_THRESHOLD: f64 = 0.3;

/// Opt-in refinements layered over plain additive-then-clamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaPolicy {
    /// Shrink deltas toward 0.5x as a value nears the end of its range.
    pub context_scaling: bool,
    /// Spill 30% of a positive region adjustment onto neighbours.
    pub regional_propagation: bool,
    /// Pull irreversibility toward a debt/gap-derived target after a choice.
    pub irreversibility_drift: bool,
}

impl DeltaPolicy {
    /// Plain additive-then-clamp.
    pub fn additive() -> Self {
        Self::default()
    }

    /// All refinements on.
    pub fn full() -> Self {
        Self {
            context_scaling: true,
            regional_propagation: true,
            irreversibility_drift: true,
        }
    }
}

/// How newly completed wonders are folded in after a choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WonderFolding {
    /// Apply every newly completed wonder's effect in the same turn.
    #[default]
    All,
    /// Apply only the first one; the rest are picked up on later turns.
    FirstOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub terminal_node_id: String,
    pub fallback_start_node_id: String,
    pub fallback_start_phase_id: String,
    pub decay_rate: f64,
    pub degraded_threshold: f64,
    pub delta_policy: DeltaPolicy,
    pub wonder_folding: WonderFolding,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            terminal_node_id: DEFAULT_TERMINAL_NODE_ID.to_string(),
            fallback_start_node_id: DEFAULT_START_NODE_ID.to_string(),
            fallback_start_phase_id: DEFAULT_START_PHASE_ID.to_string(),
            decay_rate: DEFAULT_DECAY_RATE,
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
            delta_policy: DeltaPolicy::additive(),
            wonder_folding: WonderFolding::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.terminal_node_id, "N16_COMPLETE");
        assert!(!cfg.delta_policy.context_scaling);
    }

    #[test]
    fn partial_policy_overrides_one_flag() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"delta_policy": {"regional_propagation": true}}"#).unwrap();
        assert!(cfg.delta_policy.regional_propagation);
        assert!(!cfg.delta_policy.irreversibility_drift);
    }
}
