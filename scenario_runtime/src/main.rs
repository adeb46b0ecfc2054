//! `scenario-sim`: play, replay and inspect scenario sessions from the
//! command line.
//!
//! ```bash
//! scenario-sim --scenario scenario.json play --session demo --choice 0 --choice 2
//! scenario-sim --scenario scenario.json replay --session demo
//! scenario-sim --scenario scenario.json inspect --session demo
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use scenario_engine::graph::validate_scenario;
use scenario_engine::rules::loss::check_loss_warnings;
use scenario_engine::scoring::indices;
use scenario_engine::selectors::{active_rings, degraded};
use scenario_engine::{
    DecisionInput, Difficulty, JsonFileSource, Scenario, ScenarioSource, StartingCondition,
};
use scenario_runtime::command::Command;
use scenario_runtime::config::RuntimeConfig;
use scenario_runtime::drift::{debt_report, verify_determinism};
use scenario_runtime::run_history::RunHistory;
use scenario_runtime::saves::SaveStore;
use scenario_runtime::session::{Recovery, Session};
use scenario_runtime::telemetry;

#[derive(Parser, Debug)]
#[command(name = "scenario-sim")]
#[command(about = "Play and audit decision scenarios with replayable sessions")]
struct Cli {
    /// Runtime config file (JSON). Missing file means defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario document. Overrides `scenario_path` from the config.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start or continue a session and apply decisions.
    Play {
        #[arg(long, default_value = "default")]
        session: String,

        /// Only used when the session has no game yet.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,

        #[arg(long, default_value = "default")]
        condition: StartingCondition,

        /// Zero-based choice index. Repeat for several turns.
        #[arg(long = "choice")]
        choices: Vec<u32>,

        #[arg(long, default_value = "")]
        role: String,

        #[arg(long, default_value = "")]
        rationale: String,

        #[arg(long, default_value = "")]
        assumptions: String,

        /// Reaffirm every banked assumption after each choice.
        #[arg(long)]
        preserve: bool,

        #[arg(long)]
        player_name: Option<String>,
    },

    /// Rebuild a session from its command log and verify determinism.
    Replay {
        #[arg(long, default_value = "default")]
        session: String,
    },

    /// Print the current state summary and governance debt report.
    Inspect {
        #[arg(long, default_value = "default")]
        session: String,
    },

    /// Check the scenario graph.
    Validate,

    /// Manage save slots.
    Saves {
        #[command(subcommand)]
        action: SavesCmd,
    },

    /// List finished runs, newest first.
    History {
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SavesCmd {
    List,
    Save {
        #[arg(long, default_value = "default")]
        session: String,
        #[arg(long)]
        name: String,
    },
    /// Print the saved state as JSON.
    Load { id: String },
    Delete { id: String },
    Rename { id: String, name: String },
}

#[derive(Serialize)]
struct Summary<'a> {
    session: &'a str,
    turn: u32,
    current_node_id: &'a str,
    phase_id: &'a str,
    is_complete: bool,
    measured_success_index: f64,
    governance_debt_index: f64,
    achievements: &'a [String],
    completed_wonders: &'a [String],
    great_people: Vec<&'a str>,
    victory_type: Option<&'static str>,
    loss_conditions_met: Vec<&'static str>,
    loss_warnings: Vec<String>,
    degraded_assumptions: Vec<&'a str>,
    active_rings: usize,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_scenario(cli: &Cli, config: &RuntimeConfig) -> Result<Scenario, Box<dyn Error>> {
    let path = cli
        .scenario
        .clone()
        .or_else(|| config.scenario_path.clone())
        .ok_or("no scenario given: pass --scenario or set scenario_path in the config")?;
    Ok(JsonFileSource::new(path).load_scenario()?)
}

fn open_session(config: &RuntimeConfig, scenario: Scenario, id: &str) -> Result<Session, Box<dyn Error>> {
    let session = Session::open(
        &config.sessions_dir(),
        id,
        scenario,
        config.engine.clone(),
        config.snapshot_interval,
    )?;
    if session.recovery() == Recovery::Discarded {
        eprintln!("session {id}: stored progress no longer fits the scenario and was restarted");
    }
    Ok(session)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = RuntimeConfig::load(cli.config.as_deref())?;
    telemetry::init(&config.log_filter)?;

    match &cli.command {
        Cmd::Play {
            session,
            difficulty,
            condition,
            choices,
            role,
            rationale,
            assumptions,
            preserve,
            player_name,
        } => {
            let scenario = load_scenario(&cli, &config)?;
            let version = scenario.version.clone();
            let mut session = open_session(&config, scenario, session)?;

            if !session.engine().is_started() {
                session.execute(Command::Start {
                    difficulty: *difficulty,
                    condition: *condition,
                })?;
            }
            if let Some(name) = player_name {
                session.execute(Command::SetPlayerName {
                    player_name: name.clone(),
                })?;
            }

            for &index in choices {
                let mut input = DecisionInput::new(role, rationale, assumptions);
                if *preserve {
                    input = input.preserving();
                }
                let Some(report) = session.execute(Command::choose(index, input))? else {
                    continue;
                };
                print_json(&report)?;

                if report.is_complete {
                    let mut history = RunHistory::open(&config.runs_path())?;
                    let run = history.record(session.state()?, &version)?;
                    info!(run = %run.id, "run finished");
                }
            }
        }

        Cmd::Replay { session } => {
            let scenario = load_scenario(&cli, &config)?;
            let mut session = open_session(&config, scenario.clone(), session)?;
            let commands = session.commands()?;
            let hash = verify_determinism(&scenario, &config.engine, &commands)?;
            let (_, replayed) = session.replay_full()?;
            if replayed != hash {
                return Err(format!("session replay {replayed} differs from fresh replay {hash}").into());
            }
            println!("commands: {}", commands.len());
            println!("hash: {hash}");
        }

        Cmd::Inspect { session: id } => {
            let scenario = load_scenario(&cli, &config)?;
            let session = open_session(&config, scenario, id)?;
            let state = session.state()?;
            let (msi, gdi) = indices(&state.metrics);
            let summary = Summary {
                session: id,
                turn: state.turn,
                current_node_id: &state.current_node_id,
                phase_id: &state.phase_id,
                is_complete: state.flags.is_complete,
                measured_success_index: msi,
                governance_debt_index: gdi,
                achievements: &state.achievements,
                completed_wonders: &state.completed_wonders,
                great_people: state.great_people.iter().map(|gp| gp.title.as_str()).collect(),
                victory_type: state.victory_type.map(|v| v.as_str()),
                loss_conditions_met: state.loss_conditions_met.iter().map(|l| l.as_str()).collect(),
                loss_warnings: check_loss_warnings(state)
                    .into_iter()
                    .map(|(t, s)| format!("{} ({:?})", t.as_str(), s))
                    .collect(),
                degraded_assumptions: degraded(state, config.engine.degraded_threshold)
                    .into_iter()
                    .map(|a| a.text.as_str())
                    .collect(),
                active_rings: active_rings(state).len(),
            };
            print_json(&summary)?;
            print_json(&debt_report(state))?;
        }

        Cmd::Validate => {
            let scenario = load_scenario(&cli, &config)?;
            let report = validate_scenario(&scenario, &config.engine.terminal_node_id);
            print_json(&report)?;
            if !report.is_playable() {
                return Err("scenario is not playable".into());
            }
        }

        Cmd::Saves { action } => {
            let mut store = SaveStore::open(&config.saves_path())?;
            match action {
                SavesCmd::List => {
                    for slot in store.list() {
                        println!(
                            "{}\t{}\tturn {}\t{}",
                            slot.id, slot.name, slot.state.turn, slot.scenario_version
                        );
                    }
                }
                SavesCmd::Save { session, name } => {
                    let scenario = load_scenario(&cli, &config)?;
                    let version = scenario.version.clone();
                    let session = open_session(&config, scenario, session)?;
                    let slot = store.save(name, session.state()?, &version)?;
                    println!("{}", slot.id);
                }
                SavesCmd::Load { id } => print_json(&store.load(id)?.state)?,
                SavesCmd::Delete { id } => {
                    if !store.delete(id)? {
                        return Err(format!("no save with id {id:?}").into());
                    }
                }
                SavesCmd::Rename { id, name } => {
                    if !store.rename(id, name)? {
                        return Err(format!("no save with id {id:?}").into());
                    }
                }
            }
        }

        Cmd::History { clear } => {
            let mut history = RunHistory::open(&config.runs_path())?;
            if *clear {
                history.clear()?;
                return Ok(());
            }
            for run in history.runs() {
                println!(
                    "{}\tturn {}\tmsi {:.3}\tgdi {:.3}\t{}",
                    run.id,
                    run.final_turn,
                    run.measured_success_index,
                    run.governance_debt_index,
                    run.victory_type.map(|v| v.as_str()).unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}
