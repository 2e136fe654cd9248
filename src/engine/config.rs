//! Engine configuration: auction timing, economy constants, event amounts,
//! anti-cheat thresholds and the board/brand tables.
//!
//! Supplied once when the engine is built and never mutated afterwards.
//! Loaded from TOML at runtime; every field falls back to the built-in
//! default, so a config file only needs to name what it overrides.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::board::{BoardCell, BOARD_TRACK};
use crate::data::brands::{BrandDefinition, SynergyDefinition, BRAND_DEFINITIONS, INDUSTRY_SYNERGY};
use crate::engine::models::MatchMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    pub base_duration_secs: u64,
    pub blitz_duration_secs: u64,
    pub pry_open_premium: f64,
    pub bluff_penalty: f64,
    /// How long a resolved auction is kept (past its expiry) before the sweep drops it.
    pub retention_secs: u64,
    /// Asset sold by auction cells that do not name a brand.
    pub fallback_asset: String,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            base_duration_secs: 15,
            blitz_duration_secs: 8,
            pry_open_premium: 0.1,
            bluff_penalty: 0.05,
            retention_secs: 60,
            fallback_asset: "special-bundle".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationBounds {
    pub min: f64,
    pub max: f64,
}

impl ReputationBounds {
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub base_capital: i64,
    pub blitz_capital: i64,
    pub reputation_bounds: ReputationBounds,
    pub fair_play_boost: f64,
    pub fair_play_cap: f64,
    pub drive_bonus_per_action: f64,
    /// Fraction of base capital credited when a player passes the start cell.
    pub pass_start_fraction: f64,
    pub startup_grant_fraction: f64,
    /// Total width of the stock-market swing, as a fraction of the player's cash.
    pub stock_swing: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_capital: 1_000_000,
            blitz_capital: 500_000,
            reputation_bounds: ReputationBounds { min: 0.4, max: 1.6 },
            fair_play_boost: 0.18,
            fair_play_cap: 0.4,
            drive_bonus_per_action: 0.05,
            pass_start_fraction: 0.1,
            startup_grant_fraction: 0.12,
            stock_swing: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DealConfig {
    pub default_buyback_rounds: u32,
    pub default_revenue_share: f64,
}

impl Default for DealConfig {
    fn default() -> Self {
        Self {
            default_buyback_rounds: 5,
            default_revenue_share: 0.2,
        }
    }
}

/// Amounts applied by event and special cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub pr_boost: f64,
    pub regulation_penalty: f64,
    pub reputation_audit_penalty: f64,
    pub showcase_boost: f64,
    pub compliance_penalty: f64,
    pub innovation_drive: u32,
    pub drive_surge: u32,
    pub insider_crackdown_fine: i64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            pr_boost: 0.1,
            regulation_penalty: 0.05,
            reputation_audit_penalty: 0.1,
            showcase_boost: 0.05,
            compliance_penalty: 0.1,
            innovation_drive: 2,
            drive_surge: 3,
            insider_crackdown_fine: 15_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiCheatConfig {
    pub window_secs: u64,
    pub min_latency_ms: u64,
    pub latency_risk: f64,
    pub auction_win_threshold: usize,
    pub auction_win_risk: f64,
    pub repeated_bid_threshold: usize,
    pub repeated_bid_risk: f64,
    pub flag_threshold: f64,
    pub throttle_window_secs: u64,
    pub throttle_max_actions: usize,
    /// Latency recorded for engine-generated telemetry, which has no client timing.
    pub assumed_latency_ms: u64,
}

impl Default for AntiCheatConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            min_latency_ms: 80,
            latency_risk: 0.4,
            auction_win_threshold: 3,
            auction_win_risk: 0.3,
            repeated_bid_threshold: 5,
            repeated_bid_risk: 0.2,
            flag_threshold: 0.5,
            throttle_window_secs: 10,
            throttle_max_actions: 20,
            assumed_latency_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub track: Vec<BoardCell>,
    /// Share of the track used in fast (blitz) matches.
    pub fast_mode_ratio: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            track: BOARD_TRACK.clone(),
            fast_mode_ratio: 0.75,
        }
    }
}

/// Top-level config file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub auction: AuctionConfig,
    pub economy: EconomyConfig,
    pub deals: DealConfig,
    pub events: EventConfig,
    pub anti_cheat: AntiCheatConfig,
    pub board: BoardConfig,
    pub brands: Vec<BrandDefinition>,
    pub synergies: HashMap<String, SynergyDefinition>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            auction: AuctionConfig::default(),
            economy: EconomyConfig::default(),
            deals: DealConfig::default(),
            events: EventConfig::default(),
            anti_cheat: AntiCheatConfig::default(),
            board: BoardConfig::default(),
            brands: BRAND_DEFINITIONS.clone(),
            synergies: INDUSTRY_SYNERGY.clone(),
        }
    }
}

impl GameConfig {
    pub fn brand(&self, slug: &str) -> Option<&BrandDefinition> {
        self.brands.iter().find(|b| b.slug == slug)
    }

    pub fn starting_capital(&self, mode: MatchMode) -> i64 {
        match mode {
            MatchMode::Blitz => self.economy.blitz_capital,
            MatchMode::Classic | MatchMode::Advanced => self.economy.base_capital,
        }
    }

    /// Number of cells in play for the given mode. Never zero.
    pub fn board_length(&self, mode: MatchMode) -> usize {
        let full = self.board.track.len().max(1);
        match mode {
            MatchMode::Blitz => ((full as f64 * self.board.fast_mode_ratio).floor() as usize).clamp(1, full),
            MatchMode::Classic | MatchMode::Advanced => full,
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.board.track.is_empty() {
            return Err("board track is empty".into());
        }
        let bounds = self.economy.reputation_bounds;
        if !(bounds.min <= bounds.max) {
            return Err(format!("reputation bounds inverted: {} > {}", bounds.min, bounds.max));
        }
        if self.auction.pry_open_premium < 0.0 || self.auction.bluff_penalty < 0.0 {
            return Err("auction premiums must be non-negative".into());
        }
        for cell in &self.board.track {
            if let Some(slug) = &cell.brand_slug {
                if cell.kind == crate::data::board::CellKind::Brand && self.brand(slug).is_none() {
                    return Err(format!("cell {} references unknown brand {}", cell.id, slug));
                }
            }
        }
        Ok(())
    }
}

/// Load a config from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<GameConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let config: GameConfig =
        toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    config
        .validate()
        .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

/// Try to load a config from well-known paths, returning the defaults if none found.
pub fn load_default_config() -> GameConfig {
    let candidates = [
        "brandopoly.toml",
        "../brandopoly.toml",
        "/etc/brandopoly/brandopoly.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), brands = config.brands.len(), "loaded game config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load game config");
                }
            }
        }
    }
    tracing::info!("no brandopoly.toml found, using built-in defaults");
    GameConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.board_length(MatchMode::Advanced), 48);
        assert_eq!(config.board_length(MatchMode::Blitz), 36);
        assert_eq!(config.starting_capital(MatchMode::Blitz), 500_000);
        assert_eq!(config.starting_capital(MatchMode::Classic), 1_000_000);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[auction]\nbluff_penalty = 0.2\n\n[economy]\nreputation_bounds = {{ min = 0.5, max = 1.2 }}\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.auction.bluff_penalty, 0.2);
        assert_eq!(config.auction.base_duration_secs, 15);
        assert_eq!(config.economy.reputation_bounds.max, 1.2);
        assert_eq!(config.economy.base_capital, 1_000_000);
        assert_eq!(config.brands.len(), 24);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[economy]\nreputation_bounds = {{ min = 2.0, max = 1.0 }}").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.contains("reputation bounds"), "{}", err);
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("brandopoly.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.economy.base_capital, 1_000_000);
        assert_eq!(config.board.track.len(), 48);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/brandopoly.toml")).unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }
}
