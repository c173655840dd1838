//! Table Tennis headless driver
//!
//! Runs a match without a window: serves whenever a serve is due, forwards
//! audio cues to the log and prints the final frame as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use table_tennis::audio::{self, LogAudio};
use table_tennis::consts::SIM_DT;
use table_tennis::sim::{FrameSnapshot, MatchState, ServePhase, TickInput, tick};
use table_tennis::{Result, RuleConfig, SimError};

const DEFAULT_FRAMES: u64 = 60 * 60 * 10;

#[derive(Parser, Debug)]
#[command(name = "table-tennis")]
#[command(about = "Play a table tennis match headless and print the final frame", long_about = None)]
struct Cli {
    /// JSON rule set (defaults for missing fields)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Seed for serve toss and aim
    #[arg(long, short, default_value_t = 0)]
    seed: u64,

    /// Ball speed level, 1-10
    #[arg(long, short, default_value_t = 5)]
    difficulty: u8,

    /// Frame limit at 60 Hz
    #[arg(long, short, default_value_t = DEFAULT_FRAMES)]
    frames: u64,

    /// Drop audio cues instead of logging them
    #[arg(long)]
    mute: bool,
}

fn run(cli: &Cli) -> Result<FrameSnapshot> {
    let rules = match &cli.config {
        Some(path) => RuleConfig::load(path)?,
        None => RuleConfig::new()?,
    };
    let mut state = MatchState::new(rules, cli.difficulty, cli.seed)?;
    let mut sink = LogAudio::new();
    sink.set_muted(cli.mute);

    while state.frames < cli.frames && !state.is_over() {
        let input = TickInput {
            serve: matches!(
                state.serve.phase,
                ServePhase::ReadyToServe | ServePhase::ServiceStarted
            ),
            ..Default::default()
        };
        let frame = state.frames;
        tick(&mut state, &input, SIM_DT);
        if state.frames == frame {
            return Err(SimError::invalid_transition(format!(
                "simulation stalled at frame {frame}"
            )));
        }
        audio::dispatch(&state.drain_events(), &mut sink);
    }

    let stats = state.score.stats();
    log::info!(
        "Stopped after {} frames: games {} - {}, winner {:?}",
        state.frames,
        stats.games_won.0,
        stats.games_won.1,
        stats.winner
    );
    Ok(FrameSnapshot::capture(&state))
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Table Tennis (headless) starting...");

    let cli = Cli::parse();
    match run(&cli) {
        Ok(snapshot) => match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("Failed to serialize final frame: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            log::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["table-tennis"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.seed, 0);
        assert_eq!(cli.difficulty, 5);
        assert_eq!(cli.frames, DEFAULT_FRAMES);
        assert!(!cli.mute);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "table-tennis",
            "--config",
            "rules.json",
            "-s",
            "42",
            "--difficulty",
            "9",
            "-f",
            "120",
            "--mute",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rules.json")));
        assert_eq!(cli.seed, 42);
        assert_eq!(cli.difficulty, 9);
        assert_eq!(cli.frames, 120);
        assert!(cli.mute);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["table-tennis", "--seed", "abc"]).is_err());
        assert!(Cli::try_parse_from(["table-tennis", "--frames"]).is_err());
        assert!(Cli::try_parse_from(["table-tennis", "--speed", "3"]).is_err());
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let cli = Cli::try_parse_from(["table-tennis", "--frames", "30", "--mute"]).unwrap();
        let snapshot = run(&cli).unwrap();
        assert_eq!(snapshot.winner, None);
    }
}
