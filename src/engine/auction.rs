//! Sealed-bid auctions.
//!
//! Each auction moves Open -> Resolved, then disappears once its retention
//! window (counted from expiry) has passed. A resolved auction never changes
//! again. The house lives inside its match, so every mutation here is
//! serialized by the match lock; ownership transfer and cash debits belong to
//! the match engine, not to this module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::config::AuctionConfig;
use crate::engine::error::{EngineError, EngineResult, EntityKind};
use crate::engine::models::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionParticipantBid {
    pub player_id: PlayerId,
    pub sealed_amount: i64,
    /// Only meaningful while `revealed` is true.
    #[serde(default)]
    pub revealed_amount: Option<i64>,
    pub revealed: bool,
}

impl AuctionParticipantBid {
    /// Amount that counts at settlement.
    pub fn effective_amount(&self) -> i64 {
        match (self.revealed, self.revealed_amount) {
            (true, Some(amount)) => amount,
            _ => self.sealed_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionState {
    pub id: String,
    pub brand_slug: String,
    pub is_blitz: bool,
    pub started_at: u64,
    pub expires_at: u64,
    /// In first-bid order; rebidding keeps a player's slot.
    pub bids: Vec<AuctionParticipantBid>,
    pub resolved: bool,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    #[serde(default)]
    pub price: Option<i64>,
}

impl AuctionState {
    pub fn bid_of(&self, player_id: &str) -> Option<&AuctionParticipantBid> {
        self.bids.iter().find(|b| b.player_id == player_id)
    }

    pub fn view(&self) -> AuctionView {
        AuctionView {
            id: self.id.clone(),
            brand_slug: self.brand_slug.clone(),
            is_blitz: self.is_blitz,
            started_at: self.started_at,
            expires_at: self.expires_at,
            bidders: self
                .bids
                .iter()
                .map(|b| BidView {
                    player_id: b.player_id.clone(),
                    revealed_amount: if b.revealed { b.revealed_amount } else { None },
                })
                .collect(),
            resolved: self.resolved,
            winner_id: self.winner_id.clone(),
            price: self.price,
        }
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.resolved {
            return Err(EngineError::Validation(format!(
                "auction {} is already resolved",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidView {
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_amount: Option<i64>,
}

/// Broadcast-safe auction summary: who bid, but never a sealed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
    pub id: String,
    pub brand_slug: String,
    pub is_blitz: bool,
    pub started_at: u64,
    pub expires_at: u64,
    pub bidders: Vec<BidView>,
    pub resolved: bool,
    pub winner_id: Option<PlayerId>,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionHouse {
    auctions: BTreeMap<String, AuctionState>,
}

impl AuctionHouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }

    pub fn get(&self, auction_id: &str) -> EngineResult<&AuctionState> {
        self.auctions
            .get(auction_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Auction, auction_id))
    }

    fn get_mut(&mut self, auction_id: &str) -> EngineResult<&mut AuctionState> {
        self.auctions
            .get_mut(auction_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Auction, auction_id))
    }

    /// An unresolved auction already selling `brand_slug`, if any.
    pub fn open_for(&self, brand_slug: &str) -> Option<&AuctionState> {
        self.auctions
            .values()
            .find(|a| !a.resolved && a.brand_slug == brand_slug)
    }

    pub fn views(&self) -> Vec<AuctionView> {
        let mut views: Vec<AuctionView> = self.auctions.values().map(AuctionState::view).collect();
        views.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        views
    }

    pub fn start(
        &mut self,
        config: &AuctionConfig,
        brand_slug: &str,
        is_blitz: bool,
        now_ms: u64,
    ) -> AuctionState {
        let duration_secs = if is_blitz {
            config.blitz_duration_secs
        } else {
            config.base_duration_secs
        };
        let auction = AuctionState {
            id: Uuid::new_v4().to_string(),
            brand_slug: brand_slug.to_string(),
            is_blitz,
            started_at: now_ms,
            expires_at: now_ms + duration_secs * 1000,
            bids: Vec::new(),
            resolved: false,
            winner_id: None,
            price: None,
        };
        tracing::info!(auction_id = %auction.id, brand = brand_slug, is_blitz, "auction_started");
        self.auctions.insert(auction.id.clone(), auction.clone());
        auction
    }

    /// Upsert the caller's sealed bid. Cash is not checked here.
    pub fn place_bid(
        &mut self,
        auction_id: &str,
        player_id: &str,
        sealed_amount: i64,
    ) -> EngineResult<&AuctionState> {
        if sealed_amount < 0 {
            return Err(EngineError::Validation(format!(
                "bid amount must be non-negative, got {}",
                sealed_amount
            )));
        }
        let auction = self.get_mut(auction_id)?;
        auction.ensure_open()?;

        match auction.bids.iter_mut().find(|b| b.player_id == player_id) {
            Some(existing) => {
                existing.sealed_amount = sealed_amount;
                existing.revealed = false;
                existing.revealed_amount = None;
            }
            None => auction.bids.push(AuctionParticipantBid {
                player_id: player_id.to_string(),
                sealed_amount,
                revealed_amount: None,
                revealed: false,
            }),
        }
        tracing::debug!(auction_id, player_id, "auction_bid");
        Ok(&*auction)
    }

    /// Reveal `target_player`'s bid, marked up by the pry-open premium.
    /// The sealed amount is untouched; the marked-up figure is what settles.
    pub fn pry_open(
        &mut self,
        config: &AuctionConfig,
        auction_id: &str,
        by_player: &str,
        target_player: &str,
    ) -> EngineResult<AuctionParticipantBid> {
        let auction = self.get_mut(auction_id)?;
        auction.ensure_open()?;
        let bid = auction
            .bids
            .iter_mut()
            .find(|b| b.player_id == target_player)
            .ok_or_else(|| EngineError::not_found(EntityKind::Bid, target_player))?;

        let premium = 1.0 + config.pry_open_premium;
        bid.revealed_amount = Some((bid.sealed_amount as f64 * premium).round() as i64);
        bid.revealed = true;
        tracing::info!(auction_id, by_player, target_player, premium, "auction_pry_open");
        Ok(bid.clone())
    }

    /// Settle the auction. Calling it again on a resolved auction is a no-op.
    pub fn finalize(&mut self, config: &AuctionConfig, auction_id: &str) -> EngineResult<&AuctionState> {
        let auction = self.get_mut(auction_id)?;
        if !auction.resolved {
            resolve(auction, config.bluff_penalty);
        }
        Ok(&*auction)
    }

    /// Finalize every open auction past expiry and drop resolved ones whose
    /// retention window has elapsed. Returns the auctions resolved by this sweep.
    pub fn cleanup_expired(&mut self, config: &AuctionConfig, now_ms: u64) -> Vec<AuctionState> {
        let mut newly_resolved = Vec::new();
        for auction in self.auctions.values_mut() {
            if !auction.resolved && auction.expires_at <= now_ms {
                resolve(auction, config.bluff_penalty);
                newly_resolved.push(auction.clone());
            }
        }

        let retention_ms = config.retention_secs * 1000;
        let before = self.auctions.len();
        self.auctions
            .retain(|_, a| !(a.resolved && a.expires_at + retention_ms < now_ms));
        let removed = before - self.auctions.len();
        if removed > 0 {
            tracing::debug!(removed, "expired auctions removed");
        }

        newly_resolved
    }
}

fn resolve(auction: &mut AuctionState, bluff_penalty: f64) {
    let mut ranked: Vec<(&str, i64)> = auction
        .bids
        .iter()
        .map(|b| (b.player_id.as_str(), b.effective_amount()))
        .collect();
    // Stable: equal amounts keep bid order, so the earlier bidder wins ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let (winner_id, price) = match ranked.as_slice() {
        [] => (None, None),
        [(winner, amount)] => (Some(winner.to_string()), Some(*amount)),
        [(winner, _), (_, runner_up), ..] => {
            let price = (*runner_up as f64 * (1.0 + bluff_penalty)).ceil() as i64;
            (Some(winner.to_string()), Some(price))
        }
    };

    auction.resolved = true;
    auction.winner_id = winner_id;
    auction.price = price;
    tracing::info!(
        auction_id = %auction.id,
        brand = %auction.brand_slug,
        winner = ?auction.winner_id,
        price = ?auction.price,
        "auction_resolved"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuctionConfig {
        AuctionConfig::default()
    }

    fn house_with(bids: &[(&str, i64)]) -> (AuctionHouse, String) {
        let mut house = AuctionHouse::new();
        let id = house.start(&config(), "tech-giant-apple", false, 1_000).id;
        for (player, amount) in bids {
            house.place_bid(&id, player, *amount).unwrap();
        }
        (house, id)
    }

    #[test]
    fn test_durations() {
        let mut house = AuctionHouse::new();
        let base = house.start(&config(), "auto-tesla", false, 10_000);
        assert_eq!(base.expires_at, 25_000);
        let blitz = house.start(&config(), "auto-tesla", true, 10_000);
        assert_eq!(blitz.expires_at, 18_000);
        assert_eq!(house.len(), 2);
    }

    #[test]
    fn test_bluff_penalty_settlement() {
        let (mut house, id) = house_with(&[("playerA", 100_000), ("playerB", 95_000)]);
        let resolved = house.finalize(&config(), &id).unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.winner_id.as_deref(), Some("playerA"));
        let price = resolved.price.unwrap();
        assert!(price > 95_000);
        assert_eq!(price, (95_000f64 * 1.05).ceil() as i64);
    }

    #[test]
    fn test_single_bid_pays_own_amount() {
        let (mut house, id) = house_with(&[("playerA", 50_000)]);
        let resolved = house.finalize(&config(), &id).unwrap();
        assert_eq!(resolved.winner_id.as_deref(), Some("playerA"));
        assert_eq!(resolved.price, Some(50_000));
    }

    #[test]
    fn test_no_bids_no_winner() {
        let (mut house, id) = house_with(&[]);
        let resolved = house.finalize(&config(), &id).unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.winner_id, None);
        assert_eq!(resolved.price, None);
    }

    #[test]
    fn test_tie_goes_to_first_bidder() {
        let (mut house, id) = house_with(&[("early", 40_000), ("late", 40_000)]);
        let resolved = house.finalize(&config(), &id).unwrap();
        assert_eq!(resolved.winner_id.as_deref(), Some("early"));
        assert_eq!(resolved.price, Some(42_000));
    }

    #[test]
    fn test_pry_open_premium() {
        let (mut house, id) = house_with(&[("playerA", 50_000), ("playerB", 48_000)]);
        let bid = house.pry_open(&config(), &id, "playerC", "playerA").unwrap();
        assert!(bid.revealed);
        assert_eq!(bid.sealed_amount, 50_000);
        assert_eq!(bid.revealed_amount, Some(55_000));
        assert!(bid.revealed_amount.unwrap() > 50_000);
    }

    #[test]
    fn test_pry_open_changes_settlement() {
        // B is pried: 48_000 -> 52_800, now beating A's 50_000.
        let (mut house, id) = house_with(&[("playerA", 50_000), ("playerB", 48_000)]);
        house.pry_open(&config(), &id, "playerA", "playerB").unwrap();
        let resolved = house.finalize(&config(), &id).unwrap();
        assert_eq!(resolved.winner_id.as_deref(), Some("playerB"));
        assert_eq!(resolved.price, Some(52_500));
    }

    #[test]
    fn test_pry_open_missing_bid() {
        let (mut house, id) = house_with(&[("playerA", 50_000)]);
        let err = house.pry_open(&config(), &id, "playerA", "ghost").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: EntityKind::Bid, .. }));
    }

    #[test]
    fn test_rebid_overwrites_and_resets_reveal() {
        let (mut house, id) = house_with(&[("playerA", 50_000), ("playerB", 10_000)]);
        house.pry_open(&config(), &id, "playerB", "playerA").unwrap();
        let auction = house.place_bid(&id, "playerA", 30_000).unwrap();
        let bid = auction.bid_of("playerA").unwrap();
        assert_eq!(bid.sealed_amount, 30_000);
        assert!(!bid.revealed);
        assert_eq!(bid.revealed_amount, None);
        assert_eq!(auction.bids.len(), 2);
        assert_eq!(auction.bids[0].player_id, "playerA");
    }

    #[test]
    fn test_finalize_idempotent_and_immutable() {
        let (mut house, id) = house_with(&[("playerA", 10_000)]);
        let first = house.finalize(&config(), &id).unwrap().clone();
        let second = house.finalize(&config(), &id).unwrap().clone();
        assert_eq!(first, second);

        let err = house.place_bid(&id, "playerB", 99_000).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(house.pry_open(&config(), &id, "playerB", "playerA").is_err());
        assert_eq!(house.get(&id).unwrap(), &first);
    }

    #[test]
    fn test_negative_bid_rejected() {
        let (mut house, id) = house_with(&[]);
        assert!(matches!(
            house.place_bid(&id, "playerA", -1),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_auction() {
        let mut house = AuctionHouse::new();
        assert!(matches!(
            house.finalize(&config(), "missing"),
            Err(EngineError::NotFound { kind: EntityKind::Auction, .. })
        ));
    }

    #[test]
    fn test_cleanup_expired_lifecycle() {
        let (mut house, id) = house_with(&[("playerA", 10_000)]);
        let expires_at = house.get(&id).unwrap().expires_at;

        assert!(house.cleanup_expired(&config(), expires_at - 1).is_empty());
        assert!(!house.get(&id).unwrap().resolved);

        let resolved = house.cleanup_expired(&config(), expires_at);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].winner_id.as_deref(), Some("playerA"));

        // Still retained inside the window, gone after it.
        assert!(house.cleanup_expired(&config(), expires_at + 60_000).is_empty());
        assert!(house.get(&id).is_ok());
        house.cleanup_expired(&config(), expires_at + 60_001);
        assert!(house.get(&id).is_err());
        assert!(house.is_empty());
    }

    #[test]
    fn test_view_hides_sealed_amounts() {
        let (mut house, id) = house_with(&[("playerA", 50_000), ("playerB", 48_000)]);
        house.pry_open(&config(), &id, "playerA", "playerB").unwrap();
        let view = house.get(&id).unwrap().view();
        assert_eq!(view.bidders[0].revealed_amount, None);
        assert_eq!(view.bidders[1].revealed_amount, Some(52_800));
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("50000"));
        assert!(!json.contains("sealedAmount"));
    }
}
