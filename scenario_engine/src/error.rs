//! Scenario Kernel: Errors
//!
//! The reducer is total. These errors exist only at the orchestration
//! seam, where a lookup miss aborts the interaction before any action
//! is built.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not started: call start() or restore() first")]
    NotStarted,

    #[error("node {0:?} not found in scenario")]
    NodeNotFound(String),

    #[error("choice index {index} out of range for node {node_id:?} ({available} choices)")]
    ChoiceOutOfRange {
        node_id: String,
        index: usize,
        available: usize,
    },

    #[error("game already complete at turn {0}")]
    GameComplete(u32),

    #[error("scenario source I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario document: {0}")]
    Json(#[from] serde_json::Error),
}
