//! Periodic auction expiry sweep, the only time-driven mutation in the engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::engine::match_engine::MatchEngine;

/// Spawn a task that calls `sweep_expired` every `period`.
/// Abort the returned handle to stop it.
pub fn spawn_auction_sweeper(engine: Arc<MatchEngine>, period: Duration) -> JoinHandle<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(interval);

    tokio::spawn(async move {
        tracing::info!(period_ms = period.as_millis() as u64, "auction sweeper started");
        while ticks.next().await.is_some() {
            let resolved = engine.sweep_expired(super::now_ms());
            if !resolved.is_empty() {
                tracing::info!(resolved = resolved.len(), "auction sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::GameConfig;
    use crate::engine::models::{MatchMode, RosterEntry};

    #[tokio::test]
    async fn test_sweeper_resolves_expired_auction() {
        let mut config = GameConfig::default();
        config.auction.base_duration_secs = 0;
        let engine = Arc::new(MatchEngine::new(config));
        let snapshot = engine
            .create_match(
                &[RosterEntry {
                    player_id: "user-1".into(),
                    display_name: "One".into(),
                    trust: 0.0,
                    is_bot: false,
                }],
                MatchMode::Classic,
            )
            .unwrap();
        let player_id = snapshot.players[0].id.clone();
        let auction = engine.start_auction(&snapshot.id, "energy-bp", false).unwrap();
        engine
            .place_bid(&snapshot.id, &auction.id, &player_id, 1_000)
            .unwrap();

        let handle = spawn_auction_sweeper(Arc::clone(&engine), Duration::from_millis(10));
        let mut owned = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let snap = engine.snapshot(&snapshot.id).unwrap();
            if snap.brand_ownership.get("energy-bp") == Some(&player_id) {
                owned = true;
                break;
            }
        }
        handle.abort();
        assert!(owned, "sweeper never settled the auction");
    }
}
