#![forbid(unsafe_code)]

//! Scenario Runtime
//!
//! Wraps the scenario kernel with persistence, replay, snapshots,
//! session management, save slots, run history and drift reporting.
//!
//! No domain logic lives here: every transition and invariant is
//! delegated to the kernel.

pub mod command;
pub mod proto_types;
pub mod proto_bridge;
pub mod command_log;
pub mod replay;
pub mod snapshot;
pub mod snapshot_codec;
pub mod session;
pub mod drift;
pub mod saves;
pub mod run_history;
pub mod telemetry;
pub mod config;
