#![forbid(unsafe_code)]

/// Scenario kernel v1. Bumping this changes every canonical hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod arithmetic;
pub mod domain;
pub mod scoring;
pub mod variations;
pub mod error;
pub mod config;
pub mod scenario;
pub mod graph;
pub mod memory;
pub mod actions;
pub mod delta;
pub mod state;
pub mod rules;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod impact;
pub mod selectors;
pub mod engine;

pub use actions::{Action, ChooseOption};
pub use config::{DeltaPolicy, EngineConfig, WonderFolding};
pub use domain::{Delta, GameState, MetricAdjustment};
pub use engine::{DecisionInput, ScenarioEngine, TurnReport};
pub use error::EngineError;
pub use scenario::{JsonFileSource, Scenario, ScenarioSource, StaticSource};
pub use transitions::{commit, reduce};
pub use variations::{Difficulty, StartingCondition};
