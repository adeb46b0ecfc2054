//! Session commands: the replayable input stream.
//!
//! A command is what the player asked for, not what the kernel did:
//! replaying the same commands against the same scenario rebuilds the
//! same state. Wall-clock values travel inside the command so replay
//! never consults the clock.

use scenario_engine::actions::Action;
use scenario_engine::domain::{ActiveEvent, MapMode};
use scenario_engine::{DecisionInput, Difficulty, EngineError, ScenarioEngine, StartingCondition, TurnReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Start {
        difficulty: Difficulty,
        condition: StartingCondition,
    },
    Reset {
        difficulty: Difficulty,
        condition: StartingCondition,
    },
    Choose {
        choice_index: u32,
        owner_role: String,
        rationale: String,
        assumptions: String,
        preserve_assumptions: bool,
        timestamp: i64,
    },
    SetPlayerName {
        player_name: String,
    },
    ToggleDebug,
    SetMapMode {
        mode: MapMode,
    },
    ResearchTech {
        tech_id: String,
    },
    TriggerEvent {
        event_id: String,
        description: String,
    },
    ResolveEvent {
        event_id: String,
    },
}

/// A command with its position in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub sequence: u64,
    pub command: Command,
}

impl Command {
    pub fn choose(choice_index: u32, input: DecisionInput) -> Self {
        Command::Choose {
            choice_index,
            owner_role: input.owner_role,
            rationale: input.rationale,
            assumptions: input.assumptions,
            preserve_assumptions: input.preserve_assumptions,
            timestamp: input.timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Reset { .. } => "reset",
            Command::Choose { .. } => "choose",
            Command::SetPlayerName { .. } => "set_player_name",
            Command::ToggleDebug => "toggle_debug",
            Command::SetMapMode { .. } => "set_map_mode",
            Command::ResearchTech { .. } => "research_tech",
            Command::TriggerEvent { .. } => "trigger_event",
            Command::ResolveEvent { .. } => "resolve_event",
        }
    }

    /// Run this command against `engine`. Only `Choose` yields a report.
    pub fn apply(&self, engine: &mut ScenarioEngine) -> Result<Option<TurnReport>, EngineError> {
        match self {
            Command::Start { difficulty, condition } => {
                engine.start(*difficulty, *condition);
                Ok(None)
            }
            Command::Reset { difficulty, condition } => {
                engine.reset(*difficulty, *condition);
                Ok(None)
            }
            Command::Choose {
                choice_index,
                owner_role,
                rationale,
                assumptions,
                preserve_assumptions,
                timestamp,
            } => {
                let input = DecisionInput {
                    owner_role: owner_role.clone(),
                    rationale: rationale.clone(),
                    assumptions: assumptions.clone(),
                    preserve_assumptions: *preserve_assumptions,
                    timestamp: *timestamp,
                };
                engine.choose(*choice_index as usize, input).map(Some)
            }
            Command::SetPlayerName { player_name } => {
                engine.dispatch(&Action::SetPlayerName {
                    player_name: player_name.clone(),
                })?;
                Ok(None)
            }
            Command::ToggleDebug => {
                engine.dispatch(&Action::ToggleDebug)?;
                Ok(None)
            }
            Command::SetMapMode { mode } => {
                engine.dispatch(&Action::SetMapMode { mode: *mode })?;
                Ok(None)
            }
            Command::ResearchTech { tech_id } => {
                engine.dispatch(&Action::ResearchTech {
                    tech_id: tech_id.clone(),
                })?;
                Ok(None)
            }
            Command::TriggerEvent { event_id, description } => {
                let triggered_turn = engine.state()?.turn;
                engine.dispatch(&Action::TriggerEvent {
                    event: ActiveEvent {
                        id: event_id.clone(),
                        description: description.clone(),
                        triggered_turn,
                    },
                })?;
                Ok(None)
            }
            Command::ResolveEvent { event_id } => {
                engine.dispatch(&Action::ResolveEvent {
                    event_id: event_id.clone(),
                })?;
                Ok(None)
            }
        }
    }
}
