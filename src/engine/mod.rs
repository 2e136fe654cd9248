pub mod anti_cheat;
pub mod auction;
pub mod bot_strategy;
pub mod config;
pub mod contracts;
pub mod economy;
pub mod error;
pub mod match_engine;
pub mod models;
pub mod random;
pub mod repository;
pub mod simulation;
pub mod sweeper;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock Unix millis.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
