//! Session manager: isolated sessions with apply-then-persist semantics.
//!
//! Each session gets its own directory:
//!   <base_dir>/<session_id>/commands.log
//!   <base_dir>/<session_id>/state.json
//!   <base_dir>/<session_id>/snapshots/
//!
//! Apply-then-persist order:
//!   1. command.apply(engine)   (a rejected command is never logged)
//!   2. command_log.append()    (only if step 1 succeeded)
//!   3. state.json rewritten; snapshot if the interval is reached
//!
//! Concurrency: Mutex for write serialization, no global mutable state.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use scenario_engine::domain::GameState;
use scenario_engine::hashing::canonical_hash;
use scenario_engine::{Difficulty, EngineConfig, EngineError, Scenario, ScenarioEngine, StartingCondition, TurnReport};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope};
use crate::command_log::{CommandLog, CommandLogError};
use crate::replay;
use crate::snapshot;
use crate::snapshot_codec::{
    check_compatible, export_persisted_to_file, read_persisted_file, PersistedState, SnapshotError,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Log(#[from] CommandLogError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("session lock poisoned")]
    Poisoned,
}

/// Where an opened session's state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// No commands yet.
    Empty,
    /// Every logged command replayed cleanly.
    Replayed,
    /// The log no longer fits the scenario; it was archived and a fresh
    /// game started.
    Discarded,
}

/// An isolated game session with its own command log and state.
pub struct Session {
    session_id: String,
    dir: PathBuf,
    engine: ScenarioEngine,
    log: CommandLog,
    snapshot_interval: u64,
    recovery: Recovery,
}

impl Session {
    /// Open (or create) `<base_dir>/<session_id>` and rebuild its state.
    ///
    /// A log recorded against another scenario version, or one that no
    /// longer replays, is archived and replaced by a fresh game that
    /// keeps the original difficulty and starting condition.
    pub fn open(
        base_dir: &Path,
        session_id: &str,
        scenario: Scenario,
        config: EngineConfig,
        snapshot_interval: u64,
    ) -> Result<Self, SessionError> {
        let dir = base_dir.join(session_id);
        let log = CommandLog::open(&dir.join("commands.log"))?;
        let commands = log.load_all()?;
        let persisted = match read_persisted_file(&dir.join("state.json")) {
            Ok(p) => p,
            Err(error) => {
                warn!(session = session_id, %error, "unreadable state.json ignored");
                None
            }
        };

        let mut session = Self {
            session_id: session_id.to_string(),
            dir,
            engine: ScenarioEngine::new(scenario, config),
            log,
            snapshot_interval,
            recovery: Recovery::Empty,
        };
        if commands.is_empty() {
            return Ok(session);
        }

        match session.recover(&commands, persisted.as_ref()) {
            Ok(()) => {
                session.recovery = Recovery::Replayed;
                info!(
                    session = session_id,
                    commands = commands.len(),
                    turn = session.engine.state()?.turn,
                    "session replayed"
                );
            }
            Err(error) => {
                warn!(session = session_id, %error, "discarding session state");
                session.discard(&commands)?;
            }
        }
        Ok(session)
    }

    fn recover(&mut self, commands: &[CommandEnvelope], persisted: Option<&PersistedState>) -> Result<(), SessionError> {
        if let Some(p) = persisted {
            check_compatible(p, self.engine.scenario(), self.engine.config())?;
        }
        replay::apply_all(&mut self.engine, commands)?;

        if let Some(snap) = snapshot::load_latest_snapshot(&self.snapshots_dir())? {
            if snap.sequence == self.log.last_sequence() {
                if let Err(error) = snapshot::check_against(&snap, self.engine.state()?) {
                    warn!(session = %self.session_id, %error, "snapshot disagrees with replay");
                }
            }
        }
        Ok(())
    }

    fn discard(&mut self, stale: &[CommandEnvelope]) -> Result<(), SessionError> {
        let (difficulty, condition) = stale
            .iter()
            .rev()
            .find_map(|c| match c.command {
                Command::Start { difficulty, condition } | Command::Reset { difficulty, condition } => {
                    Some((difficulty, condition))
                }
                _ => None,
            })
            .unwrap_or((Difficulty::Medium, StartingCondition::Default));

        self.log.archive()?;
        self.engine = ScenarioEngine::new(self.engine.scenario().clone(), self.engine.config().clone());
        self.recovery = Recovery::Discarded;
        self.execute(Command::Start { difficulty, condition })?;
        Ok(())
    }

    /// Apply a command, then persist it. Returns the turn report for
    /// decisions.
    pub fn execute(&mut self, command: Command) -> Result<Option<TurnReport>, SessionError> {
        // Step 1: Apply to the engine. A rejection leaves everything as is.
        let report = command.apply(&mut self.engine)?;

        // Step 2: Persist to the command log.
        let envelope = CommandEnvelope {
            sequence: self.log.last_sequence() + 1,
            command,
        };
        self.log.append(&envelope)?;

        // Step 3: Write-through state file and periodic snapshot.
        let state = self.engine.state()?;
        let persisted = PersistedState::new(self.engine.scenario(), envelope.sequence, state.clone());
        export_persisted_to_file(&persisted, &self.state_path())?;

        if self.snapshot_interval > 0 && envelope.sequence % self.snapshot_interval == 0 {
            let path = snapshot::save_snapshot(&self.snapshots_dir(), envelope.sequence, state)?;
            debug!(path = %path.display(), "snapshot written");
        }

        Ok(report)
    }

    /// Rebuild from the log with a fresh engine and adopt the result.
    pub fn replay_full(&mut self) -> Result<(GameState, String), SessionError> {
        let commands = self.log.load_all()?;
        let mut engine = ScenarioEngine::new(self.engine.scenario().clone(), self.engine.config().clone());
        replay::apply_all(&mut engine, &commands)?;
        let state = engine.state()?.clone();
        let hash = canonical_hash(&state);
        self.engine = engine;

        Ok((state, hash))
    }

    pub fn commands(&self) -> Result<Vec<CommandEnvelope>, SessionError> {
        Ok(self.log.load_all()?)
    }

    pub fn engine(&self) -> &ScenarioEngine {
        &self.engine
    }

    pub fn state(&self) -> Result<&GameState, SessionError> {
        Ok(self.engine.state()?)
    }

    pub fn current_hash(&self) -> Result<String, SessionError> {
        Ok(canonical_hash(self.engine.state()?))
    }

    pub fn current_sequence(&self) -> u64 {
        self.log.last_sequence()
    }

    pub fn recovery(&self) -> Recovery {
        self.recovery
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.dir.join("snapshots")
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, SessionError> {
        self.inner.lock().map_err(|_| SessionError::Poisoned)
    }

    /// Execute under lock.
    pub fn execute(&self, command: Command) -> Result<Option<TurnReport>, SessionError> {
        self.lock()?.execute(command)
    }

    pub fn current_hash(&self) -> Result<String, SessionError> {
        self.lock()?.current_hash()
    }

    pub fn current_sequence(&self) -> Result<u64, SessionError> {
        Ok(self.lock()?.current_sequence())
    }
}
