//! Astral Turf CLI
//!
//! 전술 보드 엔진 드라이버: 액션 재생, 플레이북 애니메이션, 케미스트리 링크, 세이브 슬롯

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use turf_core::data::seed;
use turf_core::playbook::TimerQueue;
use turf_core::save::{snapshot_schema, FileStore, MemoryStore, SaveManager};
use turf_core::tactics::chemistry::{team_chemistry, ChemistryInputs};
use turf_core::tactics::chemistry_links;
use turf_core::{Action, Session, Team, TurfConfig};

#[derive(Parser)]
#[command(name = "turf")]
#[command(about = "Drive the tactics board engine from the command line", long_about = None)]
struct Cli {
    /// Config YAML (overrides TURF_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of the embedded seed data
    Seed,

    /// Apply a JSON array of actions to the saved session
    Dispatch {
        /// JSON file holding `[{"type": "...", "payload": {...}}, ...]`
        #[arg(long)]
        actions: PathBuf,

        /// Snapshot directory (defaults to storage.dir from config)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print the resulting state as JSON
        #[arg(long, default_value = "false")]
        print_state: bool,
    },

    /// Play a library play step by step and print each frame
    Play {
        /// Library play id (e.g. lib_att_overload_433)
        #[arg(long)]
        item: String,
    },

    /// Print chemistry links for one side's active formation
    Links {
        /// home | away
        #[arg(long, value_parser = parse_team, default_value = "home")]
        team: Team,

        /// Saved session to read (defaults to the configured storage dir)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List named save slots
    Slots {
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Print the snapshot JSON schema
    Schema,
}

fn parse_team(s: &str) -> Result<Team, String> {
    match s {
        "home" => Ok(Team::Home),
        "away" => Ok(Team::Away),
        other => Err(format!("unknown team '{}', expected home or away", other)),
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<TurfConfig> {
    let config = match path {
        Some(path) => TurfConfig::load(path)?,
        None => TurfConfig::from_env()?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Seed => print_seed(),
        Commands::Dispatch { actions, store, print_state } => {
            let dir = store.unwrap_or_else(|| config.storage.dir.clone());
            run_actions(config, &actions, &dir, print_state)?;
        }
        Commands::Play { item } => play(config, &item)?,
        Commands::Links { team, store } => {
            let dir = store.unwrap_or_else(|| config.storage.dir.clone());
            println!("{}", serde_json::to_string_pretty(&links_report(config, team, &dir)?)?);
        }
        Commands::Slots { store } => {
            let dir = store.unwrap_or_else(|| config.storage.dir.clone());
            print_slots(&dir)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&snapshot_schema())?);
        }
    }

    Ok(())
}

fn print_seed() {
    let seed = seed();
    println!("Roles:      {}", seed.roles.len());
    println!("Players:    {}", seed.players.len());
    for formation in &seed.formations {
        let bound = formation.bound_players().count();
        println!("Formation:  {:<6} {} slots, {} bound", formation.id, formation.slots.len(), bound);
    }
    for play in &seed.library {
        println!("Library:    {:<22} {} step(s)", play.id, play.steps.len());
    }
}

fn run_actions(config: TurfConfig, actions_path: &Path, dir: &Path, print_state: bool) -> Result<()> {
    let content = fs::read_to_string(actions_path)
        .with_context(|| format!("Failed to read actions file {}", actions_path.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&content).context("Invalid actions JSON")?;

    let store = FileStore::new(dir)?;
    let mut session = Session::init_from_storage(config, store, TimerQueue::new());
    for action in actions {
        session.dispatch(action)?;
    }
    // Let any playback started by the script run to completion.
    let ticks = session.run_until_idle(1_000)?;
    session.save_now()?;

    log::info!("Session saved to {} ({} playback ticks)", dir.display(), ticks);
    if print_state {
        println!("{}", serde_json::to_string_pretty(session.state())?);
    }
    Ok(())
}

fn play(config: TurfConfig, item: &str) -> Result<()> {
    let interval = config.step_interval();
    let mut session = Session::new(config, MemoryStore::new(), TimerQueue::new());

    session.dispatch(Action::AddLibraryPlayToPlaybook { library_id: item.to_string(), new_id: item.to_string() })?;
    if !session.state().tactics.playbook.contains_key(item) {
        bail!("unknown library play '{}'", item);
    }
    session.dispatch(Action::LoadPlaybookItem { item_id: item.to_string() })?;
    session.dispatch(Action::StartAnimation)?;

    while session.state().ui.is_animating {
        let state = session.state();
        let frame = json!({
            "step": state.ui.active_step_index,
            "trails": state.ui.animation_trails.iter().map(|t| json!({
                "player": t.player_id,
                "points": t.points.len(),
                "color": t.color,
            })).collect::<Vec<_>>(),
        });
        println!("{}", frame);
        if session.advance_clock(interval)? == 0 {
            bail!("playback stalled at step {:?}", session.state().ui.active_step_index);
        }
    }
    println!("{}", json!({ "finished": true }));
    Ok(())
}

/// Chemistry links of the saved session in `dir`, or of the seed state when
/// nothing usable is stored there.
fn links_report(config: TurfConfig, team: Team, dir: &Path) -> Result<serde_json::Value> {
    let adjacency = config.chemistry.adjacency_distance;
    let session = Session::init_from_storage(config, FileStore::new(dir)?, TimerQueue::new());
    let state = session.state();
    let t = &state.tactics;
    let Some(formation) = t.active_formation(team) else {
        bail!("no active formation for {:?}", team);
    };
    let inputs = ChemistryInputs::for_team(&t.chemistry, &state.franchise, team);

    let links = chemistry_links(formation, team, &t.players, &inputs, adjacency);
    let average = team_chemistry(formation, &t.players, &inputs, adjacency);
    Ok(json!({ "average": average, "links": links }))
}

fn print_slots(dir: &Path) -> Result<()> {
    let manager = SaveManager::new(FileStore::new(dir)?);
    let slots = manager.list_slots()?;
    if slots.is_empty() {
        println!("No save slots in {}", dir.display());
    }
    for slot in slots {
        println!("{:<40} {:<24} {} (v{})", slot.id, slot.name, slot.last_saved, slot.app_version);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_team() {
        assert_eq!(parse_team("away"), Ok(Team::Away));
        assert!(parse_team("both").is_err());
    }

    #[test]
    fn test_dispatch_file_persists() {
        let temp_dir = TempDir::new().unwrap();
        let actions = temp_dir.path().join("actions.json");
        fs::write(
            &actions,
            r#"[{"type":"TOGGLE_THEME"},{"type":"BENCH_PLAYER","payload":{"player_id":"p5"}}]"#,
        )
        .unwrap();
        let store_dir = temp_dir.path().join("saves");

        run_actions(TurfConfig::default(), &actions, &store_dir, false).unwrap();

        let mut manager = SaveManager::new(FileStore::new(&store_dir).unwrap());
        let snapshot = manager.load_active().unwrap().unwrap();
        assert!(snapshot.tactics.binding_of("p5").is_none());
    }

    #[test]
    fn test_links_read_saved_session() {
        let temp_dir = TempDir::new().unwrap();
        let store_dir = temp_dir.path().join("saves");
        let pairs = |report: &serde_json::Value| {
            report["links"]
                .as_array()
                .unwrap()
                .iter()
                .filter(|l| l["playerIds"][0] == "p3" || l["playerIds"][1] == "p3")
                .count()
        };

        let seeded = links_report(TurfConfig::default(), Team::Home, &store_dir).unwrap();
        assert!(pairs(&seeded) > 0);

        let actions = temp_dir.path().join("actions.json");
        fs::write(&actions, r#"[{"type":"BENCH_PLAYER","payload":{"player_id":"p3"}}]"#).unwrap();
        run_actions(TurfConfig::default(), &actions, &store_dir, false).unwrap();

        let saved = links_report(TurfConfig::default(), Team::Home, &store_dir).unwrap();
        assert_eq!(pairs(&saved), 0);
    }

    #[test]
    fn test_play_unknown_item() {
        assert!(play(TurfConfig::default(), "lib_missing").is_err());
        assert!(play(TurfConfig::default(), "lib_high_press_442").is_ok());
    }
}
