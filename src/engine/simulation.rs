//! Bot-vs-bot balance simulation.
//!
//! Plays many seeded matches through the real `MatchEngine`, one engine per
//! game, fanned out across cores with rayon. Every auction a turn opens is
//! bid on by all seats and finalized immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::engine::bot_strategy::{BidContext, BidStrategy};
use crate::engine::config::GameConfig;
use crate::engine::error::EngineResult;
use crate::engine::match_engine::MatchEngine;
use crate::engine::models::{MatchMode, MatchSnapshot, RosterEntry};
use crate::engine::random::SeededRandom;

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub games: usize,
    pub max_rounds: u32,
    pub seed: u64,
    pub mode: MatchMode,
    /// Rotate strategies through the seats from game to game.
    pub alternate_seats: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            games: 100,
            max_rounds: 30,
            seed: 42,
            mode: MatchMode::Classic,
            alternate_seats: true,
        }
    }
}

/// Aggregated results from a simulation run.
pub struct SimulationReport {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    pub net_worth: HashMap<String, Vec<f64>>,
    pub rounds: Vec<u32>,
    pub auctions: usize,
    pub game_durations_ms: Vec<f64>,
}

impl SimulationReport {
    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_net_worth(&self, name: &str) -> f64 {
        match self.net_worth.get(name) {
            Some(w) if !w.is_empty() => w.iter().sum::<f64>() / w.len() as f64,
            _ => 0.0,
        }
    }

    pub fn net_worth_stddev(&self, name: &str) -> f64 {
        let worths = match self.net_worth.get(name) {
            Some(w) if w.len() >= 2 => w,
            _ => return 0.0,
        };
        let avg = self.avg_net_worth(name);
        let variance = worths.iter().map(|w| (w - avg).powi(2)).sum::<f64>() / (worths.len() - 1) as f64;
        variance.sqrt()
    }

    pub fn avg_rounds(&self) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        self.rounds.iter().map(|r| *r as f64).sum::<f64>() / self.rounds.len() as f64
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Simulation Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        let mut names: Vec<&String> = self.wins.keys().collect();
        names.sort();
        for name in names {
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  worth={:.0} +/- {:.0}",
                name,
                self.wins[name],
                self.win_rate(name) * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
                self.avg_net_worth(name),
                self.net_worth_stddev(name),
            ));
        }
        lines.push(format!(
            "  Avg rounds: {:.1}  |  Auctions: {}",
            self.avg_rounds(),
            self.auctions
        ));
        if !self.game_durations_ms.is_empty() {
            let total_ms = self.game_durations_ms.iter().sum::<f64>();
            lines.push(format!(
                "  Avg game: {:.1}ms  |  Total: {:.2}s",
                total_ms / self.game_durations_ms.len() as f64,
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }
}

struct GameRecord {
    winner: String,
    net_worth: Vec<(String, f64)>,
    rounds: u32,
    auctions: usize,
    duration_ms: f64,
}

/// Cash plus list price of held brands.
pub fn net_worth(config: &GameConfig, snapshot: &MatchSnapshot, player_id: &str) -> i64 {
    let Some(player) = snapshot.player(player_id) else {
        return 0;
    };
    let holdings: i64 = player
        .owned_brands
        .iter()
        .filter_map(|slug| config.brand(slug))
        .map(|b| b.base_cost)
        .sum();
    player.cash + holdings
}

/// Run `params.games` matches between `strategies` (one seat each).
pub fn run_simulation(
    config: &GameConfig,
    strategies: &[Box<dyn BidStrategy>],
    params: &SimulationParams,
) -> EngineResult<SimulationReport> {
    let records: Vec<GameRecord> = (0..params.games)
        .into_par_iter()
        .map(|game_idx| play_one_game(config, strategies, params, game_idx))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut report = SimulationReport {
        num_games: params.games,
        wins: strategies.iter().map(|s| (s.name().to_string(), 0)).collect(),
        net_worth: strategies.iter().map(|s| (s.name().to_string(), Vec::new())).collect(),
        rounds: Vec::with_capacity(records.len()),
        auctions: 0,
        game_durations_ms: Vec::with_capacity(records.len()),
    };
    for record in records {
        *report.wins.entry(record.winner).or_default() += 1;
        for (name, worth) in record.net_worth {
            report.net_worth.entry(name).or_default().push(worth);
        }
        report.rounds.push(record.rounds);
        report.auctions += record.auctions;
        report.game_durations_ms.push(record.duration_ms);
    }

    tracing::info!(
        games = report.num_games,
        avg_rounds = report.avg_rounds(),
        auctions = report.auctions,
        "simulation finished"
    );
    Ok(report)
}

fn play_one_game(
    config: &GameConfig,
    strategies: &[Box<dyn BidStrategy>],
    params: &SimulationParams,
    game_idx: usize,
) -> EngineResult<GameRecord> {
    let seed = params.seed.wrapping_add(game_idx as u64);
    let seats = strategies.len();
    let seat_strategy: Vec<&dyn BidStrategy> = (0..seats)
        .map(|i| {
            let offset = if params.alternate_seats { game_idx } else { 0 };
            strategies[(i + offset) % seats].as_ref()
        })
        .collect();

    let engine = MatchEngine::with_random(config.clone(), Arc::new(SeededRandom::new(seed)));
    let mut bid_rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    let roster: Vec<RosterEntry> = seat_strategy
        .iter()
        .enumerate()
        .map(|(i, s)| RosterEntry {
            player_id: format!("bot-{}", i),
            display_name: s.name().to_string(),
            trust: 0.0,
            is_bot: true,
        })
        .collect();

    let t0 = Instant::now();
    let mut snapshot = engine.create_match(&roster, params.mode)?;
    let match_id = snapshot.id.clone();
    let seat_ids: Vec<String> = snapshot.players.iter().map(|p| p.id.clone()).collect();
    let mut auctions = 0;

    while snapshot.round <= params.max_rounds {
        let active = snapshot.active_turn.clone();
        let (outcome, after) = engine.take_turn(&match_id, &active)?;
        snapshot = after;

        let Some(auction_id) = outcome.auction_id else {
            continue;
        };
        let lot = snapshot
            .auctions
            .iter()
            .find(|a| a.id == auction_id)
            .map(|a| a.brand_slug.clone());
        let Some(lot) = lot else {
            continue;
        };
        for (seat, player_id) in seat_ids.iter().enumerate() {
            let Some(player) = snapshot.player(player_id) else {
                continue;
            };
            let ctx = BidContext {
                brand: config.brand(&lot),
                cash: player.cash,
                owned_in_synergy: engine.economy().owned_in_synergy(&player.owned_brands, &lot),
            };
            if let Some(amount) = seat_strategy[seat].bid(&ctx, &mut bid_rng) {
                engine.place_bid(&match_id, &auction_id, player_id, amount.max(0))?;
            }
        }
        engine.finalize_auction(&match_id, &auction_id)?;
        auctions += 1;
        snapshot = engine.snapshot(&match_id)?;
    }

    let final_snapshot = engine.end_match(&match_id)?;
    let net_worth: Vec<(String, f64)> = seat_ids
        .iter()
        .enumerate()
        .map(|(seat, id)| {
            (
                seat_strategy[seat].name().to_string(),
                net_worth(config, &final_snapshot, id) as f64,
            )
        })
        .collect();
    // Ties go to the earlier seat.
    let winner = net_worth
        .iter()
        .fold(None::<&(String, f64)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|(name, _)| name.clone())
        .unwrap_or_default();

    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!(game_idx, seed, winner = %winner, rounds = final_snapshot.round, auctions, "simulated game");
    Ok(GameRecord {
        winner,
        net_worth,
        rounds: final_snapshot.round.saturating_sub(1).min(params.max_rounds),
        auctions,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bot_strategy::{AggressiveBidder, CautiousBidder, RandomBidder};

    fn strategies() -> Vec<Box<dyn BidStrategy>> {
        vec![
            Box::new(AggressiveBidder),
            Box::new(CautiousBidder),
            Box::new(RandomBidder),
        ]
    }

    #[test]
    fn test_simulation_accounts_every_game() {
        let params = SimulationParams {
            games: 6,
            max_rounds: 5,
            ..Default::default()
        };
        let report = run_simulation(&GameConfig::default(), &strategies(), &params).unwrap();
        assert_eq!(report.num_games, 6);
        assert_eq!(report.wins.values().sum::<usize>(), 6);
        assert_eq!(report.rounds.len(), 6);
        assert!(report.rounds.iter().all(|r| *r == 5));
        for name in ["aggressive", "cautious", "random"] {
            assert_eq!(report.net_worth[name].len(), 6);
            let (lo, hi) = report.confidence_interval_95(name);
            assert!(lo <= report.win_rate(name) && report.win_rate(name) <= hi);
        }
        assert!(report.summary().contains("Simulation Results (6 games)"));
    }

    #[test]
    fn test_simulation_is_repeatable() {
        let params = SimulationParams {
            games: 4,
            max_rounds: 8,
            seed: 7,
            ..Default::default()
        };
        let a = run_simulation(&GameConfig::default(), &strategies(), &params).unwrap();
        let b = run_simulation(&GameConfig::default(), &strategies(), &params).unwrap();
        assert_eq!(a.wins, b.wins);
        assert_eq!(a.auctions, b.auctions);
        assert_eq!(a.net_worth, b.net_worth);
    }

    #[test]
    fn test_empty_report() {
        let report = SimulationReport {
            num_games: 0,
            wins: HashMap::new(),
            net_worth: HashMap::new(),
            rounds: Vec::new(),
            auctions: 0,
            game_durations_ms: Vec::new(),
        };
        assert_eq!(report.confidence_interval_95("x"), (0.0, 0.0));
        assert_eq!(report.avg_rounds(), 0.0);
        assert_eq!(report.win_rate("x"), 0.0);
    }
}
