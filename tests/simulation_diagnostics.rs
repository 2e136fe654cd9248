//! Bot-vs-bot balance diagnostics.
//!
//! These are NOT run in CI. Use them locally to eyeball economy balance
//! after tuning rent, auction or event constants.
//!
//! Run with:
//!     cargo test --release --test simulation_diagnostics -- --ignored --nocapture

use brandopoly_engine::engine::bot_strategy::{AggressiveBidder, BidStrategy, CautiousBidder, RandomBidder};
use brandopoly_engine::engine::config::GameConfig;
use brandopoly_engine::engine::models::MatchMode;
use brandopoly_engine::engine::simulation::{run_simulation, SimulationParams};

/// Three-seat classic match, 300 games. Baseline: no policy should sit
/// above ~70% wins; a runaway policy usually means rent is overtuned.
#[test]
#[ignore]
fn classic_three_policies() {
    let strategies: Vec<Box<dyn BidStrategy>> =
        vec![Box::new(AggressiveBidder), Box::new(CautiousBidder), Box::new(RandomBidder)];
    let params = SimulationParams {
        games: 300,
        max_rounds: 40,
        seed: 2024,
        ..Default::default()
    };
    let report = run_simulation(&GameConfig::default(), &strategies, &params).unwrap();
    println!("{}", report.summary());
    for name in ["aggressive", "cautious", "random"] {
        assert!(report.win_rate(name) < 0.9, "{} dominates", name);
    }
}

/// Blitz board with half the capital: auctions should still clear.
#[test]
#[ignore]
fn blitz_heads_up() {
    let strategies: Vec<Box<dyn BidStrategy>> = vec![Box::new(AggressiveBidder), Box::new(CautiousBidder)];
    let params = SimulationParams {
        games: 200,
        max_rounds: 20,
        seed: 7,
        mode: MatchMode::Blitz,
        alternate_seats: true,
    };
    let report = run_simulation(&GameConfig::default(), &strategies, &params).unwrap();
    println!("{}", report.summary());
    assert!(report.auctions > 0);
}
