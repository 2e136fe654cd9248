use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brandopoly_engine::engine::bot_strategy::{strategy_by_name, BidStrategy};
use brandopoly_engine::engine::config::{load_config, load_default_config, GameConfig};
use brandopoly_engine::engine::models::MatchMode;
use brandopoly_engine::engine::simulation::{run_simulation, SimulationParams};

#[derive(Parser)]
#[command(name = "brandopoly-engine", about = "Brandopoly match engine tools")]
struct Cli {
    /// Path to brandopoly.toml (default: auto-discover)
    #[arg(long, global = true, env = "BRANDOPOLY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play bot-vs-bot matches and report balance statistics
    Simulate {
        /// Number of games to play
        #[arg(long, default_value = "200")]
        games: usize,

        /// Comma-separated bidding policies, one per seat
        #[arg(long, default_value = "aggressive,cautious,random")]
        players: String,

        /// Rounds per game
        #[arg(long, default_value = "30")]
        rounds: u32,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Play on the fast (blitz) board
        #[arg(long)]
        fast: bool,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

fn load(path: Option<&PathBuf>) -> Result<GameConfig, String> {
    match path {
        Some(p) => load_config(p),
        None => Ok(load_default_config()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load(cli.config.as_ref()).map_err(|e| format!("Failed to load config: {}", e))?;

    match cli.command {
        Command::Simulate {
            games,
            players,
            rounds,
            seed,
            fast,
        } => {
            let strategies: Vec<Box<dyn BidStrategy>> = players
                .split(',')
                .map(str::trim)
                .map(|name| strategy_by_name(name).ok_or_else(|| format!("unknown policy: {}", name)))
                .collect::<Result<_, _>>()?;
            if strategies.len() < 2 {
                return Err("simulation needs at least two seats".into());
            }

            let params = SimulationParams {
                games,
                max_rounds: rounds,
                seed,
                mode: if fast { MatchMode::Blitz } else { MatchMode::Classic },
                alternate_seats: true,
            };
            tracing::info!(games, seats = strategies.len(), rounds, seed, "starting simulation");
            let report = run_simulation(&config, &strategies, &params)?;
            println!("{}", report.summary());
        }
        Command::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
