//! Replay orchestrator: rebuild state from a command log.
//!
//! Delegates all domain logic to the kernel. No shortcuts, no cached
//! state logic.

use scenario_engine::domain::GameState;
use scenario_engine::hashing::canonical_hash;
use scenario_engine::{EngineConfig, EngineError, Scenario, ScenarioEngine};
use tracing::debug;

use crate::command::CommandEnvelope;

/// Run every command against `engine`, in order. Stops at the first
/// command the engine rejects.
pub fn apply_all(engine: &mut ScenarioEngine, commands: &[CommandEnvelope]) -> Result<(), EngineError> {
    for envelope in commands {
        envelope.command.apply(engine).map_err(|e| {
            debug!(sequence = envelope.sequence, error = %e, "replay stopped");
            e
        })?;
    }
    Ok(())
}

/// Rebuild the game state from a command stream.
///
/// 1. Fresh engine over the scenario
/// 2. Apply each command sequentially
/// 3. Return (final_state, canonical_hash)
pub fn rebuild_state(
    scenario: &Scenario,
    config: &EngineConfig,
    commands: &[CommandEnvelope],
) -> Result<(GameState, String), EngineError> {
    let mut engine = ScenarioEngine::new(scenario.clone(), config.clone());
    apply_all(&mut engine, commands)?;
    let state = engine.state()?.clone();
    let hash = canonical_hash(&state);
    Ok((state, hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(
    scenario: &Scenario,
    config: &EngineConfig,
    commands: &[CommandEnvelope],
) -> Result<String, EngineError> {
    rebuild_state(scenario, config, commands).map(|(_, hash)| hash)
}
