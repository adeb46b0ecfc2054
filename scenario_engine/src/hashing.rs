//! Scenario Kernel: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing.
//!
//! Rules:
//!   - `engine_version` is the first field, binding the hash to the kernel
//!   - struct fields in declaration order, map keys sorted
//!   - audit record `timestamp` removed (wall clock, not game state)
//!   - compact UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::GameState;
use crate::ENGINE_VERSION;

/// Canonical serialization of `GameState` to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn canonical_hash(state: &GameState) -> String {
    let digest = Sha256::digest(canonical_serialize(state));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn build_canonical_value(state: &GameState) -> Value {
    // GameState holds only strings, numbers, bools, vecs and string-keyed
    // maps, so conversion to Value cannot fail; Null is unreachable.
    let mut body = serde_json::to_value(state).unwrap_or(Value::Null);

    if let Some(trail) = body.get_mut("auditTrail").and_then(Value::as_array_mut) {
        for record in trail.iter_mut().filter_map(Value::as_object_mut) {
            record.remove("timestamp");
        }
    }

    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number(ENGINE_VERSION.into()),
    );
    root.insert("state".to_string(), body);
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ChooseOption};
    use crate::config::EngineConfig;
    use crate::domain::MetricAdjustment;
    use crate::scenario::Scenario;
    use crate::state::create_initial_state;
    use crate::transitions::reduce;
    use crate::variations::{Difficulty, StartingCondition};

    fn fresh() -> GameState {
        let s = Scenario { version: "t".into(), phases: vec![] };
        create_initial_state(&s, Difficulty::Medium, StartingCondition::Default, &EngineConfig::default())
    }

    fn choose_at(timestamp: i64) -> Action {
        Action::ChooseOption(Box::new(ChooseOption {
            choice_id: "C1".into(),
            owner_role: "r".into(),
            rationale: "x".into(),
            assumptions: String::new(),
            delta: MetricAdjustment::default(),
            node_title: "t".into(),
            chosen_label: "l".into(),
            phase_id: "p".into(),
            unmeasured_impact: String::new(),
            timestamp,
        }))
    }

    #[test]
    fn test_hash_is_lowercase_hex_sha256() {
        let h = canonical_hash(&fresh());
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_timestamp_does_not_affect_hash() {
        let cfg = EngineConfig::default();
        let a = reduce(&fresh(), &choose_at(1), &cfg);
        let b = reduce(&fresh(), &choose_at(2), &cfg);
        assert_ne!(a, b);
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn test_version_leads_serialization() {
        let bytes = canonical_serialize(&fresh());
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\"engine_version\":"));
    }

    #[test]
    fn test_state_change_changes_hash() {
        let mut s = fresh();
        let before = canonical_hash(&s);
        s.flags.show_debug = true;
        assert_ne!(before, canonical_hash(&s));
    }
}
