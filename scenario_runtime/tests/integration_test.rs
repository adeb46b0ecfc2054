//! Integration tests for scenario_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use scenario_engine::state::create_initial_state;
use scenario_engine::{DecisionInput, Difficulty, EngineConfig, EngineError, Scenario, StartingCondition};

use scenario_runtime::command::Command;
use scenario_runtime::command_log::CommandLog;
use scenario_runtime::drift::{compare_states, verify_determinism};
use scenario_runtime::replay;
use scenario_runtime::run_history::RunHistory;
use scenario_runtime::saves::{SaveStore, MAX_SAVES};
use scenario_runtime::session::{Recovery, Session, SessionError, SharedSession};
use scenario_runtime::snapshot;
use scenario_runtime::snapshot_codec::read_persisted_file;

fn scenario(version: &str) -> Scenario {
    Scenario::from_json_str(&format!(
        r#"{{
  "version": "{version}",
  "phases": [
    {{
      "id": "P1_DEPLOY",
      "title": "Deployment",
      "nodes": [
        {{
          "id": "N01_INITIAL",
          "title": "Opening",
          "choices": [
            {{
              "label": "Adopt welfare standard",
              "nextNodeId": "N02_REVIEW",
              "delta": {{ "metrics": {{ "measured": {{ "welfareStandardAdoption": 0.3 }} }} }}
            }},
            {{
              "label": "Cut costs",
              "nextNodeId": "N02_REVIEW",
              "delta": {{ "metrics": {{ "unmeasured": {{ "welfareDebt": 0.2 }} }} }}
            }}
          ]
        }}
      ]
    }},
    {{
      "id": "P2_REVIEW",
      "title": "Review",
      "nodes": [
        {{
          "id": "N02_REVIEW",
          "title": "Review",
          "choices": [ {{ "label": "Finish", "nextNodeId": "N16_COMPLETE" }} ]
        }}
      ]
    }}
  ]
}}"#
    ))
    .expect("fixture scenario parses")
}

/// Create a temp directory for a test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("scenario_runtime_tests")
        .join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn open(dir: &Path, id: &str, version: &str, interval: u64) -> Session {
    Session::open(dir, id, scenario(version), EngineConfig::default(), interval).expect("open session")
}

fn choose(index: u32) -> Command {
    Command::choose(index, DecisionInput::new("Regulator", "because", "").at(1_700_000_000_000))
}

fn start(difficulty: Difficulty) -> Command {
    Command::Start {
        difficulty,
        condition: StartingCondition::Default,
    }
}

// ─────────────────────────────────────────────────────────────
// Test 1: reopen_replays_to_same_state
// ─────────────────────────────────────────────────────────────

#[test]
fn reopen_replays_to_same_state() {
    let dir = temp_dir("reopen");
    let hash = {
        let mut session = open(&dir, "s", "1", 0);
        assert_eq!(session.recovery(), Recovery::Empty);
        session.execute(start(Difficulty::Medium)).unwrap();
        session.execute(choose(0)).unwrap();
        session.current_hash().unwrap()
    };

    let session = open(&dir, "s", "1", 0);
    assert_eq!(session.recovery(), Recovery::Replayed);
    assert_eq!(session.current_sequence(), 2);
    assert_eq!(session.current_hash().unwrap(), hash);
    assert_eq!(session.state().unwrap().current_node_id, "N02_REVIEW");

    let persisted = read_persisted_file(&dir.join("s").join("state.json"))
        .unwrap()
        .expect("state.json written");
    assert_eq!(persisted.scenario_state_version, "1");
    assert_eq!(persisted.sequence, 2);
    assert_eq!(&persisted.state, session.state().unwrap());
}

// ─────────────────────────────────────────────────────────────
// Test 2: append_and_replay_is_deterministic
// ─────────────────────────────────────────────────────────────

#[test]
fn append_and_replay_is_deterministic() {
    let dir = temp_dir("append_deterministic");
    let mut session = open(&dir, "s", "1", 0);
    session.execute(start(Difficulty::Hard)).unwrap();
    session.execute(choose(1)).unwrap();
    session.execute(Command::ToggleDebug).unwrap();
    session.execute(choose(0)).unwrap();

    // Load back through the binary log and replay twice.
    let log = CommandLog::open(&dir.join("s").join("commands.log")).expect("reopen log");
    let loaded = log.load_all().expect("load commands");
    assert_eq!(loaded, session.commands().unwrap());

    let hash = verify_determinism(&scenario("1"), &EngineConfig::default(), &loaded).unwrap();
    assert_eq!(hash, session.current_hash().unwrap());

    let (state, replayed) = session.replay_full().unwrap();
    assert_eq!(replayed, hash);
    assert!(state.flags.is_complete);
}

// ─────────────────────────────────────────────────────────────
// Test 3: concurrent_sessions_isolated
// ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_sessions_isolated() {
    let dir = temp_dir("concurrent_sessions");
    let mut session_a = open(&dir, "session_a", "1", 0);
    let mut session_b = open(&dir, "session_b", "1", 0);

    session_a.execute(start(Difficulty::Medium)).unwrap();
    session_a.execute(choose(0)).unwrap();
    session_b.execute(start(Difficulty::Medium)).unwrap();

    assert_ne!(
        session_a.current_hash().unwrap(),
        session_b.current_hash().unwrap(),
        "Sessions should be isolated"
    );
    assert_eq!(session_a.current_sequence(), 2);
    assert_eq!(session_b.current_sequence(), 1);
}

// ─────────────────────────────────────────────────────────────
// Test 4: rejected_command_is_not_logged
// ─────────────────────────────────────────────────────────────

#[test]
fn rejected_command_is_not_logged() {
    let dir = temp_dir("rejected");
    let mut session = open(&dir, "s", "1", 0);

    // No game yet.
    assert!(matches!(
        session.execute(choose(0)),
        Err(SessionError::Engine(EngineError::NotStarted))
    ));
    assert_eq!(session.current_sequence(), 0);

    session.execute(start(Difficulty::Medium)).unwrap();
    let before = session.current_hash().unwrap();
    assert!(matches!(
        session.execute(choose(7)),
        Err(SessionError::Engine(EngineError::ChoiceOutOfRange { index: 7, .. }))
    ));
    assert_eq!(session.current_sequence(), 1);
    assert_eq!(session.current_hash().unwrap(), before);
}

// ─────────────────────────────────────────────────────────────
// Test 5: scenario_version_change_discards_progress
// ─────────────────────────────────────────────────────────────

#[test]
fn scenario_version_change_discards_progress() {
    let dir = temp_dir("version_change");
    {
        let mut session = open(&dir, "s", "1", 0);
        session.execute(start(Difficulty::Hard)).unwrap();
        session.execute(choose(0)).unwrap();
    }

    let session = open(&dir, "s", "2", 0);
    assert_eq!(session.recovery(), Recovery::Discarded);
    assert_eq!(session.current_sequence(), 1);

    let state = session.state().unwrap();
    assert_eq!(state.turn, 0);
    assert_eq!(state.current_node_id, "N01_INITIAL");
    let expected = create_initial_state(
        &scenario("2"),
        Difficulty::Hard,
        StartingCondition::Default,
        &EngineConfig::default(),
    );
    assert_eq!(state.initial_metrics, expected.initial_metrics);
    assert!(dir.join("s").join("commands.log.stale-2").exists());

    // The restarted session is itself replayable.
    let again = open(&dir, "s", "2", 0);
    assert_eq!(again.recovery(), Recovery::Replayed);
}

// ─────────────────────────────────────────────────────────────
// Test 6: corrupted_log_detection
// ─────────────────────────────────────────────────────────────

#[test]
fn corrupted_log_detection() {
    let dir = temp_dir("corrupted_log");
    {
        let mut session = open(&dir, "s", "1", 0);
        session.execute(start(Difficulty::Medium)).unwrap();
        session.execute(choose(0)).unwrap();
    }

    let log_path = dir.join("s").join("commands.log");
    let data = fs::read(&log_path).expect("read log");
    fs::write(&log_path, &data[..data.len() - 3]).expect("truncate");

    assert!(
        Session::open(&dir, "s", scenario("1"), EngineConfig::default(), 0).is_err(),
        "Corrupted log should fail to open"
    );
}

// ─────────────────────────────────────────────────────────────
// Test 7: snapshot_replay_parity
// ─────────────────────────────────────────────────────────────

#[test]
fn snapshot_replay_parity() {
    let dir = temp_dir("snapshot_parity");
    let mut session = open(&dir, "s", "1", 2);
    session.execute(start(Difficulty::Medium)).unwrap();
    session.execute(choose(1)).unwrap();
    session.execute(Command::ToggleDebug).unwrap();

    let snap_dir = dir.join("s").join("snapshots");
    let latest = snapshot::load_latest_snapshot(&snap_dir)
        .expect("load latest")
        .expect("should find latest");
    assert_eq!(latest.sequence, 2);
    assert!(snapshot::verify_snapshot_hash(&latest));

    let commands = session.commands().unwrap();
    let (state, hash) = replay::rebuild_state(&scenario("1"), &EngineConfig::default(), &commands[..2]).unwrap();
    assert_eq!(latest.hash, hash);
    assert!(snapshot::check_against(&latest, &state).is_ok());
}

// ─────────────────────────────────────────────────────────────
// Test 8: shared_session_serializes_writers
// ─────────────────────────────────────────────────────────────

#[test]
fn shared_session_serializes_writers() {
    let dir = temp_dir("shared");
    let mut session = open(&dir, "s", "1", 0);
    session.execute(start(Difficulty::Medium)).unwrap();
    let shared = Arc::new(SharedSession::new(session));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..5 {
                    shared.execute(Command::ToggleDebug).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(shared.current_sequence().unwrap(), 21);
    // 20 toggles cancel out.
    let reopened = open(&dir, "s", "1", 0);
    assert!(!reopened.state().unwrap().flags.show_debug);
    assert_eq!(reopened.current_hash().unwrap(), shared.current_hash().unwrap());
}

// ─────────────────────────────────────────────────────────────
// Test 9: finished_run_feeds_saves_and_history
// ─────────────────────────────────────────────────────────────

#[test]
fn finished_run_feeds_saves_and_history() {
    let dir = temp_dir("saves_history");
    let mut session = open(&dir, "s", "1", 0);
    session.execute(start(Difficulty::Medium)).unwrap();
    let opening = session.state().unwrap().clone();
    session.execute(choose(1)).unwrap();
    let report = session.execute(choose(0)).unwrap().expect("choose reports");
    assert!(report.is_complete);

    let mut store = SaveStore::open(&dir.join("saves.json")).unwrap();
    for ts in 0..=MAX_SAVES as i64 {
        store.save_at(&format!("slot {ts}"), session.state().unwrap(), "1", ts).unwrap();
    }
    assert_eq!(store.list().len(), MAX_SAVES);
    assert!(store.list().iter().all(|s| s.name != "slot 0"));

    let mut history = RunHistory::open(&dir.join("runs.json")).unwrap();
    let run = history.record(session.state().unwrap(), "1").unwrap().clone();
    assert_eq!(run.final_turn, 2);
    assert_eq!(run.key_choices, vec!["Cut costs", "Finish"]);
    assert_eq!(run.completed_phases, vec!["P1_DEPLOY", "P2_REVIEW"]);
    assert_eq!(run.node_sequence, vec!["N01_INITIAL", "N02_REVIEW"]);

    let drift = compare_states(&opening, session.state().unwrap());
    assert_eq!(drift.turn_delta, 2);
    assert!(drift.governance_debt_delta > 0.0);
}
