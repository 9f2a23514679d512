use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Sender;
use tracing::{info, warn};

use grazers::config::SimulationConfig;
use grazers::control::{command_channel, ControlCommand};
use grazers::Simulation;

#[derive(Parser, Debug)]
#[command(
    name = "grazers",
    version,
    about = "Turn-based grid world of grass, herbivores and predators"
)]
struct Cli {
    /// JSON file overriding any subset of the default configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the run's random number generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of turns to play.
    #[arg(long)]
    turns: Option<u64>,

    #[arg(long)]
    width: Option<i32>,

    #[arg(long)]
    height: Option<i32>,

    /// Pause between turns, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(turns) = cli.turns {
        config.max_turns = turns;
    }
    if let Some(width) = cli.width {
        config.board_width = width;
    }
    if let Some(height) = cli.height {
        config.board_height = height;
    }
    if let Some(delay) = cli.delay_ms {
        config.turn_delay_ms = delay;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Forward keyboard lines from stdin as control commands. Ends when stdin
/// closes or the simulation drops its receiver.
fn spawn_key_listener(commands: Sender<ControlCommand>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match ControlCommand::from_key(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line, "unknown key, use p to pause and q to quit"),
            }
        }
    });
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let delay = Duration::from_millis(config.turn_delay_ms);
    let max_turns = config.max_turns;

    let mut sim = Simulation::new(config).context("building simulation")?;
    sim.start().context("populating board")?;

    let (tx, rx) = command_channel(16);
    sim.attach_controls(rx);
    spawn_key_listener(tx);

    info!(seed = sim.config().seed, max_turns, "starting run");
    sim.run_with(Some(max_turns), |s| {
        for event in s.last_events() {
            info!("{event}");
        }
        let census = s.census();
        info!(
            turn = s.turn(),
            herbivores = census.herbivores,
            predators = census.predators,
            grass = census.grass,
            "turn complete"
        );
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    })?;

    println!("{}", serde_json::to_string_pretty(&sim.summary())?);
    Ok(())
}
