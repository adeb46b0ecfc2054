//! Hand-written protobuf types for the session command log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format; never renumber.

use prost::Message;

// ── Envelope ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommandEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(message, optional, tag = "2")]
    pub command: Option<ProtoCommand>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommand {
    #[prost(oneof = "CommandKind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub kind: Option<CommandKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum CommandKind {
    #[prost(message, tag = "1")]
    Start(StartGame),
    #[prost(message, tag = "2")]
    Reset(StartGame),
    #[prost(message, tag = "3")]
    Choose(Choose),
    #[prost(message, tag = "4")]
    SetPlayerName(SetPlayerName),
    #[prost(message, tag = "5")]
    ToggleDebug(ToggleDebug),
    #[prost(message, tag = "6")]
    SetMapMode(SetMapMode),
    #[prost(message, tag = "7")]
    ResearchTech(ResearchTech),
    #[prost(message, tag = "8")]
    TriggerEvent(TriggerEvent),
    #[prost(message, tag = "9")]
    ResolveEvent(ResolveEvent),
}

// ── Command bodies ─────────────────────────────────────────────

/// Shared by start and reset. Enum values travel as their snake_case names.
#[derive(Clone, PartialEq, Message)]
pub struct StartGame {
    #[prost(string, tag = "1")]
    pub difficulty: String,
    #[prost(string, tag = "2")]
    pub condition: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Choose {
    #[prost(uint32, tag = "1")]
    pub choice_index: u32,
    #[prost(string, tag = "2")]
    pub owner_role: String,
    #[prost(string, tag = "3")]
    pub rationale: String,
    #[prost(string, tag = "4")]
    pub assumptions: String,
    #[prost(bool, tag = "5")]
    pub preserve_assumptions: bool,
    #[prost(int64, tag = "6")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetPlayerName {
    #[prost(string, tag = "1")]
    pub player_name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ToggleDebug {}

#[derive(Clone, PartialEq, Message)]
pub struct SetMapMode {
    #[prost(string, tag = "1")]
    pub mode: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ResearchTech {
    #[prost(string, tag = "1")]
    pub tech_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct TriggerEvent {
    #[prost(string, tag = "1")]
    pub event_id: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ResolveEvent {
    #[prost(string, tag = "1")]
    pub event_id: String,
}
