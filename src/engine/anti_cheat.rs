//! Heuristic anti-cheat scorer over a sliding window of recent actions.
//!
//! Verdicts are advisory telemetry: nothing in the engine blocks on a flag.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::engine::config::AntiCheatConfig;
use crate::engine::models::{MatchId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    AuctionBid,
    AuctionWin,
    AuctionPry,
    RentPaid,
    TurnTaken,
    ContractProposed,
    ContractResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerActionRecord {
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub action: ActionKind,
    pub latency_ms: u64,
    #[serde(default)]
    pub value: Option<i64>,
    /// Unix millis.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiCheatVerdict {
    pub flagged: bool,
    pub risk_score: f64,
    pub reasons: Vec<String>,
}

/// Windows are keyed by `PlayerActionRecord::player_id`. The engine fills
/// that with the player's external (login) id, so callers of `evaluate` and
/// `should_throttle` should pass the same id.
pub struct AntiCheatScorer {
    config: AntiCheatConfig,
    recent_actions: DashMap<PlayerId, VecDeque<PlayerActionRecord>>,
}

impl AntiCheatScorer {
    pub fn new(config: AntiCheatConfig) -> Self {
        Self {
            config,
            recent_actions: DashMap::new(),
        }
    }

    pub fn evaluate(&self, action: PlayerActionRecord) -> AntiCheatVerdict {
        self.evaluate_at(action, super::now_ms())
    }

    /// Record `action`, prune the window relative to `now_ms`, and score.
    pub fn evaluate_at(&self, action: PlayerActionRecord, now_ms: u64) -> AntiCheatVerdict {
        let cfg = &self.config;
        let cutoff = now_ms.saturating_sub(cfg.window_secs * 1000);

        let mut history = self.recent_actions.entry(action.player_id.clone()).or_default();
        history.push_back(action.clone());
        history.retain(|item| item.timestamp >= cutoff);

        let mut risk_score = 0.0;
        let mut reasons = Vec::new();

        if action.latency_ms < cfg.min_latency_ms {
            risk_score += cfg.latency_risk;
            reasons.push("latency-too-low".to_string());
        }

        let auction_wins = history
            .iter()
            .filter(|item| item.action == ActionKind::AuctionWin)
            .count();
        if auction_wins >= cfg.auction_win_threshold {
            risk_score += cfg.auction_win_risk;
            reasons.push("excessive-auction-snipes".to_string());
        }

        let repeated_bids = history
            .iter()
            .filter(|item| item.action == ActionKind::AuctionBid && item.value == action.value)
            .count();
        if repeated_bids >= cfg.repeated_bid_threshold {
            risk_score += cfg.repeated_bid_risk;
            reasons.push("repeated-identical-bids".to_string());
        }
        drop(history);

        let flagged = risk_score >= cfg.flag_threshold;
        let risk_score = (risk_score * 100.0).round() / 100.0;
        if risk_score > 0.0 {
            tracing::warn!(
                player_id = %action.player_id,
                match_id = %action.match_id,
                risk_score,
                flagged,
                reasons = ?reasons,
                "anti_cheat_flag"
            );
        }

        AntiCheatVerdict {
            flagged,
            risk_score,
            reasons,
        }
    }

    pub fn should_throttle(&self, player_id: &str) -> bool {
        self.should_throttle_at(player_id, super::now_ms())
    }

    /// True when more than the allowed number of actions fall in the trailing throttle window.
    pub fn should_throttle_at(&self, player_id: &str, now_ms: u64) -> bool {
        let window_ms = self.config.throttle_window_secs * 1000;
        let Some(history) = self.recent_actions.get(player_id) else {
            return false;
        };
        let recent = history
            .iter()
            .filter(|item| now_ms.saturating_sub(item.timestamp) < window_ms)
            .count();
        recent > self.config.throttle_max_actions
    }

    /// Drop every window whose newest action has aged out. Returns how many went.
    pub fn prune_idle_at(&self, now_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(self.config.window_secs * 1000);
        let before = self.recent_actions.len();
        self.recent_actions
            .retain(|_, history| history.back().map_or(false, |item| item.timestamp >= cutoff));
        let pruned = before.saturating_sub(self.recent_actions.len());
        if pruned > 0 {
            tracing::debug!(pruned, "anti_cheat_windows_pruned");
        }
        pruned
    }

    /// Number of players with a live window.
    pub fn tracked_players(&self) -> usize {
        self.recent_actions.len()
    }

    /// Number of actions currently held for `player_id`.
    pub fn window_len(&self, player_id: &str) -> usize {
        self.recent_actions.get(player_id).map(|h| h.len()).unwrap_or(0)
    }
}
