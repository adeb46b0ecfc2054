//! Scenario Kernel: Action Vocabulary
//!
//! The sole input surface of the reducer. Serialized as
//! `{ "type": "CHOOSE_OPTION", "payload": { ... } }`.

use serde::{Deserialize, Serialize};

use crate::domain::{ActiveEvent, Delta, GameState, GreatPersonRecord, MapMode};

/// Everything the reducer needs to apply one decision.
/// Built by the caller after node and choice lookups succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooseOption {
    pub choice_id: String,
    pub owner_role: String,
    pub rationale: String,
    pub assumptions: String,
    pub delta: Delta,
    pub node_title: String,
    pub chosen_label: String,
    pub phase_id: String,
    pub unmeasured_impact: String,
    /// Wall-clock millis recorded on the audit entry.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Action {
    /// Replace state wholesale.
    Init {
        #[serde(rename = "initialState")]
        initial_state: Box<GameState>,
    },
    /// Same as `Init`; the caller clears its own storage.
    Reset {
        #[serde(rename = "initialState")]
        initial_state: Box<GameState>,
    },
    ChooseOption(Box<ChooseOption>),
    SetPlayerName {
        #[serde(rename = "playerName")]
        player_name: String,
    },
    ToggleDebug,
    SetMapMode {
        mode: MapMode,
    },
    UnlockAchievement {
        #[serde(rename = "achievementId")]
        achievement_id: String,
    },
    UnlockGreatPerson {
        person: GreatPersonRecord,
    },
    CompleteWonder {
        #[serde(rename = "wonderId")]
        wonder_id: String,
    },
    ResearchTech {
        #[serde(rename = "techId")]
        tech_id: String,
    },
    TriggerEvent {
        event: ActiveEvent,
    },
    ResolveEvent {
        #[serde(rename = "eventId")]
        event_id: String,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Init { .. } => "INIT",
            Action::Reset { .. } => "RESET",
            Action::ChooseOption(_) => "CHOOSE_OPTION",
            Action::SetPlayerName { .. } => "SET_PLAYER_NAME",
            Action::ToggleDebug => "TOGGLE_DEBUG",
            Action::SetMapMode { .. } => "SET_MAP_MODE",
            Action::UnlockAchievement { .. } => "UNLOCK_ACHIEVEMENT",
            Action::UnlockGreatPerson { .. } => "UNLOCK_GREAT_PERSON",
            Action::CompleteWonder { .. } => "COMPLETE_WONDER",
            Action::ResearchTech { .. } => "RESEARCH_TECH",
            Action::TriggerEvent { .. } => "TRIGGER_EVENT",
            Action::ResolveEvent { .. } => "RESOLVE_EVENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_type_and_payload() {
        let a = Action::UnlockAchievement {
            achievement_id: "debt_eliminator".into(),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["type"], "UNLOCK_ACHIEVEMENT");
        assert_eq!(v["payload"]["achievementId"], "debt_eliminator");
        assert_eq!(a.kind(), "UNLOCK_ACHIEVEMENT");
    }

    #[test]
    fn unit_variant_parses_without_payload() {
        let a: Action = serde_json::from_str(r#"{"type": "TOGGLE_DEBUG"}"#).unwrap();
        assert_eq!(a, Action::ToggleDebug);
    }

    #[test]
    fn map_mode_payload() {
        let a: Action = serde_json::from_str(
            r#"{"type": "SET_MAP_MODE", "payload": {"mode": "welfareDebt"}}"#,
        )
        .unwrap();
        assert_eq!(a, Action::SetMapMode { mode: MapMode::WelfareDebt });
    }
}
