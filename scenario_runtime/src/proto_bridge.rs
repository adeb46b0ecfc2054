//! Proto ↔ Command conversion bridge.
//!
//! Converts between protobuf wire types (proto_types.rs) and the
//! runtime's `CommandEnvelope`. Decoding is strict: a frame with no
//! command, or an enum name this build does not know, is an error.

use scenario_engine::domain::MapMode;
use scenario_engine::variations::VariationParseError;
use scenario_engine::{Difficulty, StartingCondition};
use thiserror::Error;

use crate::command::{Command, CommandEnvelope};
use crate::proto_types::*;

#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("command envelope {sequence} carries no command")]
    MissingCommand { sequence: u64 },

    #[error(transparent)]
    Variation(#[from] VariationParseError),

    #[error("unknown map mode {0:?}")]
    UnknownMapMode(String),
}

/// Convert a protobuf envelope to the runtime's `CommandEnvelope`.
pub fn proto_to_command(proto: &ProtoCommandEnvelope) -> Result<CommandEnvelope, BridgeError> {
    let kind = proto
        .command
        .as_ref()
        .and_then(|c| c.kind.as_ref())
        .ok_or(BridgeError::MissingCommand {
            sequence: proto.sequence,
        })?;

    let command = match kind {
        CommandKind::Start(s) => Command::Start {
            difficulty: s.difficulty.parse::<Difficulty>()?,
            condition: s.condition.parse::<StartingCondition>()?,
        },
        CommandKind::Reset(s) => Command::Reset {
            difficulty: s.difficulty.parse::<Difficulty>()?,
            condition: s.condition.parse::<StartingCondition>()?,
        },
        CommandKind::Choose(c) => Command::Choose {
            choice_index: c.choice_index,
            owner_role: c.owner_role.clone(),
            rationale: c.rationale.clone(),
            assumptions: c.assumptions.clone(),
            preserve_assumptions: c.preserve_assumptions,
            timestamp: c.timestamp,
        },
        CommandKind::SetPlayerName(p) => Command::SetPlayerName {
            player_name: p.player_name.clone(),
        },
        CommandKind::ToggleDebug(_) => Command::ToggleDebug,
        CommandKind::SetMapMode(m) => Command::SetMapMode {
            mode: MapMode::parse(&m.mode).ok_or_else(|| BridgeError::UnknownMapMode(m.mode.clone()))?,
        },
        CommandKind::ResearchTech(t) => Command::ResearchTech {
            tech_id: t.tech_id.clone(),
        },
        CommandKind::TriggerEvent(t) => Command::TriggerEvent {
            event_id: t.event_id.clone(),
            description: t.description.clone(),
        },
        CommandKind::ResolveEvent(r) => Command::ResolveEvent {
            event_id: r.event_id.clone(),
        },
    };

    Ok(CommandEnvelope {
        sequence: proto.sequence,
        command,
    })
}

/// Convert a `CommandEnvelope` to its protobuf form for the binary log.
pub fn command_to_proto(envelope: &CommandEnvelope) -> ProtoCommandEnvelope {
    let start = |d: &Difficulty, c: &StartingCondition| StartGame {
        difficulty: d.as_str().to_string(),
        condition: c.as_str().to_string(),
    };

    let kind = match &envelope.command {
        Command::Start { difficulty, condition } => CommandKind::Start(start(difficulty, condition)),
        Command::Reset { difficulty, condition } => CommandKind::Reset(start(difficulty, condition)),
        Command::Choose {
            choice_index,
            owner_role,
            rationale,
            assumptions,
            preserve_assumptions,
            timestamp,
        } => CommandKind::Choose(Choose {
            choice_index: *choice_index,
            owner_role: owner_role.clone(),
            rationale: rationale.clone(),
            assumptions: assumptions.clone(),
            preserve_assumptions: *preserve_assumptions,
            timestamp: *timestamp,
        }),
        Command::SetPlayerName { player_name } => CommandKind::SetPlayerName(SetPlayerName {
            player_name: player_name.clone(),
        }),
        Command::ToggleDebug => CommandKind::ToggleDebug(ToggleDebug {}),
        Command::SetMapMode { mode } => CommandKind::SetMapMode(SetMapMode {
            mode: mode.as_str().to_string(),
        }),
        Command::ResearchTech { tech_id } => CommandKind::ResearchTech(ResearchTech {
            tech_id: tech_id.clone(),
        }),
        Command::TriggerEvent { event_id, description } => CommandKind::TriggerEvent(TriggerEvent {
            event_id: event_id.clone(),
            description: description.clone(),
        }),
        Command::ResolveEvent { event_id } => CommandKind::ResolveEvent(ResolveEvent {
            event_id: event_id.clone(),
        }),
    };

    ProtoCommandEnvelope {
        sequence: envelope.sequence,
        command: Some(ProtoCommand { kind: Some(kind) }),
    }
}
