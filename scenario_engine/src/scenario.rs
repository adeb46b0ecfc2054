//! Scenario Kernel: Scenario Document & Graph Lookup
//!
//! Read-only view over the externally authored decision tree.
//! The engine receives a `Scenario` by injection and never mutates it.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Delta;
use crate::error::EngineError;

/// Authoring hint attached to a choice. Never read by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceQuality {
    Best,
    Good,
    Neutral,
    Poor,
    Terrible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub label: String,
    #[serde(default)]
    pub delta: Delta,
    pub next_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<ChoiceQuality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Versioned scenario document: `{ version, phases }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub version: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// First node of the first phase, if any.
    pub fn first_position(&self) -> Option<(&Phase, &Node)> {
        let phase = self.phases.first()?;
        let node = phase.nodes.first()?;
        Some((phase, node))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.phases.iter().flat_map(|p| p.nodes.iter())
    }

    pub fn node_count(&self) -> usize {
        self.phases.iter().map(|p| p.nodes.len()).sum()
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes().any(|n| n.id == node_id)
    }

    pub fn phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }
}

/// Linear scan over every phase. `None` means "abort the interaction".
pub fn get_node_by_id<'a>(scenario: &'a Scenario, node_id: &str) -> Option<&'a Node> {
    for phase in &scenario.phases {
        if let Some(node) = phase.nodes.iter().find(|n| n.id == node_id) {
            debug!(node_id, phase_id = %phase.id, "node found");
            return Some(node);
        }
    }
    warn!(
        node_id,
        known_nodes = scenario.node_count(),
        "node not found in scenario"
    );
    None
}

/// Id of the phase containing `node_id`.
pub fn get_phase_by_node_id<'a>(scenario: &'a Scenario, node_id: &str) -> Option<&'a str> {
    scenario
        .phases
        .iter()
        .find(|p| p.nodes.iter().any(|n| n.id == node_id))
        .map(|p| p.id.as_str())
}

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Where a scenario document comes from. The engine only sees the result.
pub trait ScenarioSource {
    fn load_scenario(&self) -> Result<Scenario, EngineError>;
}

/// Scenario stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScenarioSource for JsonFileSource {
    fn load_scenario(&self) -> Result<Scenario, EngineError> {
        let raw = fs::read_to_string(&self.path)?;
        let scenario = Scenario::from_json_str(&raw)?;
        debug!(
            path = %self.path.display(),
            version = %scenario.version,
            phases = scenario.phases.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }
}

/// Already-parsed scenario, handed out by clone.
#[derive(Debug, Clone)]
pub struct StaticSource(pub Scenario);

impl ScenarioSource for StaticSource {
    fn load_scenario(&self) -> Result<Scenario, EngineError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "version": "2.1",
        "phases": [
            {"id": "P1", "title": "Deploy", "description": "", "nodes": [
                {"id": "N1", "title": "Start", "choices": [
                    {"label": "Go", "delta": {}, "nextNodeId": "N2"}
                ]}
            ]},
            {"id": "P2", "title": "Scale", "nodes": [
                {"id": "N2", "title": "Second", "choices": []}
            ]}
        ]
    }"#;

    #[test]
    fn test_lookup_hits_and_misses() {
        let s = Scenario::from_json_str(DOC).unwrap();
        assert_eq!(get_node_by_id(&s, "N2").map(|n| n.title.as_str()), Some("Second"));
        assert!(get_node_by_id(&s, "N9").is_none());
        assert_eq!(get_phase_by_node_id(&s, "N1"), Some("P1"));
        assert_eq!(get_phase_by_node_id(&s, "N9"), None);
    }

    #[test]
    fn test_first_position_and_counts() {
        let s = Scenario::from_json_str(DOC).unwrap();
        let (phase, node) = s.first_position().unwrap();
        assert_eq!((phase.id.as_str(), node.id.as_str()), ("P1", "N1"));
        assert_eq!(s.node_count(), 2);

        let empty = Scenario { version: "0".into(), phases: vec![] };
        assert!(empty.first_position().is_none());
    }

    #[test]
    fn test_missing_delta_defaults_to_empty() {
        let s = Scenario::from_json_str(
            r#"{"version":"1","phases":[{"id":"P","title":"t","nodes":[
                {"id":"N","title":"n","choices":[{"label":"x","nextNodeId":"N"}]}]}]}"#,
        )
        .unwrap();
        assert!(s.phases[0].nodes[0].choices[0].delta.is_empty());
    }

    #[test]
    fn test_bad_document_is_json_error() {
        let err = Scenario::from_json_str("{\"phases\": 3}").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }
}
