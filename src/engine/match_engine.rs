//! Match orchestration: turns, landed-cell effects, auction settlement and
//! the entry points collaborators call for bids, pry-opens and contracts.
//!
//! Every operation validates first and only then mutates, all under the
//! match's own lock.

use std::sync::Arc;

use uuid::Uuid;

use crate::data::board::{BoardCell, CellAction, CellKind};
use crate::engine::anti_cheat::{ActionKind, AntiCheatScorer, AntiCheatVerdict, PlayerActionRecord};
use crate::engine::auction::{AuctionParticipantBid, AuctionState};
use crate::engine::config::GameConfig;
use crate::engine::contracts::{self, Contract, ContractBook, ContractProposal};
use crate::engine::economy::{Economy, RentCalculationInput, RentCalculationResult};
use crate::engine::error::{EngineError, EngineResult, EntityKind};
use crate::engine::models::{
    MatchId, MatchMode, MatchPlayerState, MatchSnapshot, MatchState, PlayerId, RosterEntry, TurnOutcome,
};
use crate::engine::random::{RandomSource, SeededRandom};
use crate::engine::repository::{InMemoryMatchRepository, MatchHandle, MatchRepository};

const STARTING_REPUTATION: f64 = 1.0;

/// What landing on a cell does, before any state is touched.
#[derive(Debug, Clone, PartialEq)]
enum CellEffect {
    /// Brand cell: auction, rent or owner bonus depending on ownership.
    Brand(String),
    Auction { asset: String, is_blitz: bool },
    Reputation { delta: f64, summary: &'static str },
    Drive { amount: u32, summary: &'static str },
    Cash { amount: i64, summary: &'static str },
    FairPlay,
    StockSwing,
    Signal(&'static str),
}

fn cell_effect(cell: &BoardCell, config: &GameConfig, mode: MatchMode) -> CellEffect {
    let blitz_mode = mode == MatchMode::Blitz;
    let auction_for = |action: Option<CellAction>| CellEffect::Auction {
        asset: cell
            .brand_slug
            .clone()
            .unwrap_or_else(|| config.auction.fallback_asset.clone()),
        is_blitz: blitz_mode || action == Some(CellAction::StartBlitzAuction),
    };

    match (cell.kind, cell.action) {
        (CellKind::Brand, _) => match &cell.brand_slug {
            Some(slug) => CellEffect::Brand(slug.clone()),
            None => CellEffect::Signal("idle"),
        },
        (CellKind::Auction, action) => auction_for(action),
        (CellKind::Infrastructure, _) => CellEffect::Drive {
            amount: 1,
            summary: "infrastructure-boost",
        },
        (CellKind::Contract, _) => CellEffect::Signal("contract-window"),
        (CellKind::Event | CellKind::Special, None) => CellEffect::Signal("idle"),
        (CellKind::Event | CellKind::Special, Some(action)) => {
            let events = &config.events;
            match action {
                CellAction::PrBoost => CellEffect::Reputation {
                    delta: events.pr_boost,
                    summary: "pr-boost",
                },
                CellAction::RegulationCheck => CellEffect::Reputation {
                    delta: -events.regulation_penalty,
                    summary: "regulation-check",
                },
                CellAction::ReputationAudit => CellEffect::Reputation {
                    delta: -events.reputation_audit_penalty,
                    summary: "reputation-audit",
                },
                CellAction::GlobalShowcase => CellEffect::Reputation {
                    delta: events.showcase_boost,
                    summary: "reputation-boost",
                },
                CellAction::ComplianceCheck => CellEffect::Reputation {
                    delta: -events.compliance_penalty,
                    summary: "compliance-penalty",
                },
                CellAction::DrawInnovation => CellEffect::Drive {
                    amount: events.innovation_drive,
                    summary: "innovation-card",
                },
                CellAction::DriveSurge => CellEffect::Drive {
                    amount: events.drive_surge,
                    summary: "drive-surge",
                },
                CellAction::InfrastructureBonus | CellAction::EdgeBonus | CellAction::LogisticsBoost => {
                    CellEffect::Drive {
                        amount: 1,
                        summary: "infrastructure-boost",
                    }
                }
                CellAction::InsiderCrackdown => CellEffect::Cash {
                    amount: -events.insider_crackdown_fine,
                    summary: "insider-crackdown",
                },
                CellAction::StartupGrant => CellEffect::Cash {
                    amount: (config.economy.base_capital as f64 * config.economy.startup_grant_fraction)
                        .round() as i64,
                    summary: "startup-grant",
                },
                CellAction::FairPlayBoost => CellEffect::FairPlay,
                CellAction::StockRoll => CellEffect::StockSwing,
                CellAction::SeasonalBonus => CellEffect::Signal("seasonal-bonus"),
                CellAction::OpenDealEditor | CellAction::AllianceProposal | CellAction::FastDeals => {
                    CellEffect::Signal("contract-window")
                }
                CellAction::StartAuction | CellAction::StartBlitzAuction => auction_for(Some(action)),
            }
        }
    }
}

/// Places in the cash ranking behind the leader (0 for the leader).
/// Equal cash shares a rank.
fn cash_rank_delta(state: &MatchState, player_id: &str) -> i64 {
    let Some(player) = state.players.get(player_id) else {
        return 0;
    };
    state
        .players
        .values()
        .filter(|other| other.cash > player.cash)
        .count() as i64
}

pub struct MatchEngine {
    config: Arc<GameConfig>,
    economy: Economy,
    contracts: ContractBook,
    anti_cheat: AntiCheatScorer,
    repository: Arc<dyn MatchRepository>,
    random: Arc<dyn RandomSource>,
}

impl MatchEngine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(InMemoryMatchRepository::new()),
            Arc::new(SeededRandom::from_entropy()),
        )
    }

    pub fn with_random(config: GameConfig, random: Arc<dyn RandomSource>) -> Self {
        Self::with_parts(config, Arc::new(InMemoryMatchRepository::new()), random)
    }

    pub fn with_parts(
        config: GameConfig,
        repository: Arc<dyn MatchRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            economy: Economy::new(Arc::clone(&config)),
            contracts: ContractBook::new(),
            anti_cheat: AntiCheatScorer::new(config.anti_cheat.clone()),
            config,
            repository,
            random,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.repository.ids()
    }

    fn handle(&self, match_id: &str) -> EngineResult<MatchHandle> {
        self.repository
            .get(match_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Match, match_id))
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Seat the roster in order and open a new match.
    pub fn create_match(&self, roster: &[RosterEntry], mode: MatchMode) -> EngineResult<MatchSnapshot> {
        if roster.is_empty() {
            return Err(EngineError::Validation("roster is empty".into()));
        }
        for (i, entry) in roster.iter().enumerate() {
            if roster[..i].iter().any(|e| e.player_id == entry.player_id) {
                return Err(EngineError::Validation(format!(
                    "player {} seated twice",
                    entry.player_id
                )));
            }
        }

        let capital = self.config.starting_capital(mode);
        let players: Vec<MatchPlayerState> = roster
            .iter()
            .enumerate()
            .map(|(seat, entry)| MatchPlayerState {
                id: Uuid::new_v4().to_string(),
                external_player_id: entry.player_id.clone(),
                display_name: entry.display_name.clone(),
                seat,
                cash: capital,
                position: 0,
                drive_counter: 0,
                reputation: STARTING_REPUTATION,
                trust: entry.trust,
                owned_brands: Vec::new(),
                is_bot: entry.is_bot,
            })
            .collect();

        let state = MatchState {
            id: Uuid::new_v4().to_string(),
            mode,
            round: 1,
            active_turn: 0,
            turn_order: players.iter().map(|p| p.id.clone()).collect(),
            players: players.into_iter().map(|p| (p.id.clone(), p)).collect(),
            brand_ownership: Default::default(),
            auctions: Default::default(),
            board_length: self.config.board_length(mode),
            last_dice: None,
        };
        let snapshot = state.snapshot();
        self.repository.put(state);

        tracing::info!(
            match_id = %snapshot.id,
            mode = ?mode,
            players = snapshot.players.len(),
            board_length = snapshot.board_length,
            "match_created"
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self, match_id: &str) -> EngineResult<MatchSnapshot> {
        Ok(self.handle(match_id)?.lock().snapshot())
    }

    /// Match player ids in turn order.
    pub fn player_ids(&self, match_id: &str) -> EngineResult<Vec<PlayerId>> {
        Ok(self.handle(match_id)?.lock().turn_order.clone())
    }

    /// Discard a finished match, returning its last snapshot.
    pub fn end_match(&self, match_id: &str) -> EngineResult<MatchSnapshot> {
        let snapshot = self.snapshot(match_id)?;
        self.repository.delete(match_id);
        let contracts = self.contracts.remove_match(match_id);
        tracing::info!(match_id, rounds = snapshot.round, contracts, "match_ended");
        Ok(snapshot)
    }

    // ── Turns ────────────────────────────────────────────────────

    pub fn take_turn(&self, match_id: &str, player_id: &str) -> EngineResult<(TurnOutcome, MatchSnapshot)> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();

        let position = match state.players.get(player_id) {
            Some(player) => player.position,
            None => return Err(EngineError::not_found(EntityKind::Player, player_id)),
        };
        if state.active_player_id() != player_id {
            return Err(EngineError::PermissionViolation("Not your turn".into()));
        }

        let dice = (self.random.roll_die(), self.random.roll_die());
        let steps = (dice.0 + dice.1) as usize;
        let board_length = state.board_length;
        let new_position = (position + steps) % board_length;
        let passed_start = position + steps >= board_length;

        let cell = self
            .config
            .board
            .track
            .get(new_position)
            .cloned()
            .ok_or_else(|| EngineError::Validation(format!("no board cell at {}", new_position)))?;
        let effect = cell_effect(&cell, &self.config, state.mode);

        // Rent is the only fallible computation; settle it before mutating.
        let rent_due = match &effect {
            CellEffect::Brand(slug) => match state.brand_ownership.get(slug) {
                Some(owner_id) if owner_id != player_id => {
                    let rent = self.rent_for(&state, owner_id, slug)?;
                    Some((owner_id.clone(), rent))
                }
                _ => None,
            },
            _ => None,
        };

        let now = super::now_ms();
        let mut cash_delta = 0i64;
        let mut rent = None;
        let mut auction_id = None;
        let mut verdict = None;
        let summary: String;

        if passed_start {
            let economy = &self.config.economy;
            let bonus = (economy.base_capital as f64 * economy.pass_start_fraction).round() as i64;
            if let Some(player) = state.players.get_mut(player_id) {
                player.cash += bonus;
            }
            tracing::debug!(match_id, player_id, bonus, "start_bonus");
        }
        if let Some(player) = state.players.get_mut(player_id) {
            player.position = new_position;
        }

        match effect {
            CellEffect::Brand(slug) => {
                if let Some((owner_id, due)) = rent_due {
                    cash_delta = -due.total_rent;
                    if let Some(owner) = state.players.get_mut(&owner_id) {
                        owner.cash += due.total_rent;
                    }
                    verdict = Some(self.anti_cheat.evaluate_at(
                        self.engine_record(&state, player_id, ActionKind::RentPaid, Some(due.total_rent), now),
                        now,
                    ));
                    tracing::info!(
                        match_id,
                        payer = player_id,
                        owner = %owner_id,
                        brand = %slug,
                        rent = due.total_rent,
                        "rent_paid"
                    );
                    rent = Some(due);
                    summary = "rent-paid".into();
                } else if state.brand_ownership.get(&slug).map(String::as_str) == Some(player_id) {
                    if let Some(player) = state.players.get_mut(player_id) {
                        player.drive_counter += 1;
                    }
                    summary = "owner-bonus".into();
                } else {
                    let is_blitz = state.mode == MatchMode::Blitz;
                    auction_id = Some(self.open_auction(&mut state, &slug, is_blitz, now));
                    summary = "auction-started".into();
                }
            }
            CellEffect::Auction { asset, is_blitz } => {
                let auction = state.auctions.start(&self.config.auction, &asset, is_blitz, now);
                auction_id = Some(auction.id);
                summary = "auction-trigger".into();
            }
            CellEffect::Reputation { delta, summary: tag } => {
                let bounds = self.config.economy.reputation_bounds;
                if let Some(player) = state.players.get_mut(player_id) {
                    player.reputation = bounds.clamp(player.reputation + delta);
                }
                summary = tag.into();
            }
            CellEffect::Drive { amount, summary: tag } => {
                if let Some(player) = state.players.get_mut(player_id) {
                    player.drive_counter += amount;
                }
                summary = tag.into();
            }
            CellEffect::Cash { amount, summary: tag } => {
                cash_delta = amount;
                summary = tag.into();
            }
            CellEffect::FairPlay => {
                let boost = self.economy.fair_play_boost(cash_rank_delta(&state, player_id));
                cash_delta = (self.config.economy.base_capital as f64 * (boost - 1.0)).round() as i64;
                summary = "fairplay".into();
            }
            CellEffect::StockSwing => {
                let cash = state.players.get(player_id).map(|p| p.cash).unwrap_or(0);
                let swing = (self.random.unit() - 0.5) * self.config.economy.stock_swing;
                cash_delta = (cash as f64 * swing).round() as i64;
                summary = "stock-variance".into();
            }
            CellEffect::Signal(tag) => {
                summary = tag.into();
            }
        }

        if let Some(player) = state.players.get_mut(player_id) {
            player.cash += cash_delta;
            if player.cash < 0 {
                tracing::warn!(match_id, player_id, cash = player.cash, "negative_balance");
            }
        }

        state.last_dice = Some(dice);
        state.advance_turn();

        let outcome = TurnOutcome {
            player_id: player_id.to_string(),
            dice,
            new_position,
            passed_start,
            cell,
            cash_delta,
            rent,
            auction_id,
            event_summary: Some(summary),
            verdict,
        };
        tracing::info!(
            match_id,
            player_id,
            dice = ?dice,
            position = new_position,
            cell = %outcome.cell.id,
            cash_delta,
            round = state.round,
            "turn_completed"
        );
        Ok((outcome, state.snapshot()))
    }

    fn rent_for(&self, state: &MatchState, owner_id: &str, slug: &str) -> EngineResult<RentCalculationResult> {
        let owner = state
            .players
            .get(owner_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Player, owner_id))?;
        self.economy.calculate_rent(&RentCalculationInput {
            brand_slug: slug.to_string(),
            owned_in_synergy: self.economy.owned_in_synergy(&owner.owned_brands, slug),
            reputation: owner.reputation,
            drive_counter: owner.drive_counter,
            innovation_level: 1,
            event_modifiers: Vec::new(),
            alliance_share: None,
        })
    }

    /// Join an auction already selling `slug`, or start one.
    fn open_auction(&self, state: &mut MatchState, slug: &str, is_blitz: bool, now: u64) -> String {
        if let Some(existing) = state.auctions.open_for(slug) {
            return existing.id.clone();
        }
        state.auctions.start(&self.config.auction, slug, is_blitz, now).id
    }

    /// Telemetry for an action the engine observed itself. Windows are keyed
    /// by the external (login) id so they span matches and merge with
    /// records collaborators send through `evaluate`.
    fn engine_record(
        &self,
        state: &MatchState,
        player_id: &str,
        action: ActionKind,
        value: Option<i64>,
        now: u64,
    ) -> PlayerActionRecord {
        let external_id = state
            .players
            .get(player_id)
            .map(|p| p.external_player_id.clone())
            .unwrap_or_else(|| player_id.to_string());
        PlayerActionRecord {
            player_id: external_id,
            match_id: state.id.clone(),
            action,
            latency_ms: self.config.anti_cheat.assumed_latency_ms,
            value,
            timestamp: now,
        }
    }

    // ── Auctions ─────────────────────────────────────────────────

    pub fn start_auction(&self, match_id: &str, brand_slug: &str, is_blitz: bool) -> EngineResult<AuctionState> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        let is_blitz = is_blitz || state.mode == MatchMode::Blitz;
        Ok(state
            .auctions
            .start(&self.config.auction, brand_slug, is_blitz, super::now_ms()))
    }

    pub fn place_bid(
        &self,
        match_id: &str,
        auction_id: &str,
        player_id: &str,
        sealed_amount: i64,
    ) -> EngineResult<AuctionState> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        if !state.players.contains_key(player_id) {
            return Err(EngineError::not_found(EntityKind::Player, player_id));
        }
        let auction = state.auctions.place_bid(auction_id, player_id, sealed_amount)?.clone();

        let now = super::now_ms();
        self.anti_cheat.evaluate_at(
            self.engine_record(&state, player_id, ActionKind::AuctionBid, Some(sealed_amount), now),
            now,
        );
        Ok(auction)
    }

    pub fn pry_open_bid(
        &self,
        match_id: &str,
        auction_id: &str,
        by_player: &str,
        target_player: &str,
    ) -> EngineResult<AuctionParticipantBid> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        if !state.players.contains_key(by_player) {
            return Err(EngineError::not_found(EntityKind::Player, by_player));
        }
        let bid = state
            .auctions
            .pry_open(&self.config.auction, auction_id, by_player, target_player)?;

        let now = super::now_ms();
        self.anti_cheat.evaluate_at(
            self.engine_record(&state, by_player, ActionKind::AuctionPry, bid.revealed_amount, now),
            now,
        );
        Ok(bid)
    }

    /// Resolve the auction and settle it against the match. Repeat calls
    /// return the resolved auction without settling twice.
    pub fn finalize_auction(&self, match_id: &str, auction_id: &str) -> EngineResult<AuctionState> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        let already_resolved = state.auctions.get(auction_id)?.resolved;
        let auction = state.auctions.finalize(&self.config.auction, auction_id)?.clone();
        if !already_resolved {
            self.settle(&mut state, &auction);
        }
        Ok(auction)
    }

    /// Resolve and settle every expired auction in every match, dropping
    /// resolved ones past retention. Returns what this sweep resolved.
    pub fn sweep_expired(&self, now_ms: u64) -> Vec<AuctionState> {
        let mut resolved = Vec::new();
        for match_id in self.repository.ids() {
            let Some(handle) = self.repository.get(&match_id) else {
                continue;
            };
            let mut state = handle.lock();
            let newly = state.auctions.cleanup_expired(&self.config.auction, now_ms);
            for auction in &newly {
                self.settle(&mut state, auction);
            }
            resolved.extend(newly);
        }
        self.anti_cheat.prune_idle_at(now_ms);
        resolved
    }

    /// Debit the winner and hand over the brand if it is a known brand nobody owns yet.
    fn settle(&self, state: &mut MatchState, auction: &AuctionState) {
        let (Some(winner_id), Some(price)) = (auction.winner_id.as_deref(), auction.price) else {
            return;
        };
        let match_id = state.id.clone();
        let transfer = self.config.brand(&auction.brand_slug).is_some()
            && !state.brand_ownership.contains_key(&auction.brand_slug);

        let Some(winner) = state.players.get_mut(winner_id) else {
            tracing::warn!(match_id = %match_id, winner_id, "auction winner left the match");
            return;
        };
        winner.cash -= price;
        if winner.cash < 0 {
            tracing::warn!(match_id = %match_id, player_id = winner_id, cash = winner.cash, "negative_balance");
        }
        if transfer {
            winner.owned_brands.push(auction.brand_slug.clone());
            state
                .brand_ownership
                .insert(auction.brand_slug.clone(), winner_id.to_string());
            tracing::info!(match_id = %match_id, player_id = winner_id, brand = %auction.brand_slug, price, "brand_acquired");
        }

        let now = super::now_ms();
        self.anti_cheat.evaluate_at(
            self.engine_record(state, winner_id, ActionKind::AuctionWin, Some(price), now),
            now,
        );
    }

    // ── Contracts ────────────────────────────────────────────────

    pub fn propose_contract(
        &self,
        match_id: &str,
        proposer_id: &str,
        counterparty_id: Option<&str>,
        proposal: ContractProposal,
    ) -> EngineResult<Contract> {
        {
            let handle = self.handle(match_id)?;
            let state = handle.lock();
            for id in std::iter::once(proposer_id).chain(counterparty_id) {
                if !state.players.contains_key(id) {
                    return Err(EngineError::not_found(EntityKind::Player, id));
                }
            }
        }
        if counterparty_id == Some(proposer_id) {
            return Err(EngineError::Validation("cannot contract with yourself".into()));
        }
        self.contracts.propose(
            &self.config.deals,
            match_id,
            proposer_id,
            counterparty_id,
            proposal,
            super::now_ms(),
        )
    }

    pub fn respond_to_contract(&self, contract_id: &str, actor_id: &str, accept: bool) -> EngineResult<Contract> {
        self.contracts.respond(contract_id, actor_id, accept, super::now_ms())
    }

    pub fn contract(&self, contract_id: &str) -> EngineResult<Contract> {
        self.contracts.get(contract_id)
    }

    pub fn contracts_for_match(&self, match_id: &str) -> Vec<Contract> {
        self.contracts.for_match(match_id)
    }

    pub fn assess_proposal_value(&self, proposal: &ContractProposal) -> EngineResult<i64> {
        contracts::assess_proposal_value(&self.economy, proposal)
    }

    // ── Anti-cheat ───────────────────────────────────────────────

    pub fn evaluate(&self, action: PlayerActionRecord) -> AntiCheatVerdict {
        self.anti_cheat.evaluate(action)
    }

    /// `player_id` is the external (login) id, the same key engine telemetry uses.
    pub fn should_throttle(&self, player_id: &str) -> bool {
        self.anti_cheat.should_throttle(player_id)
    }
}
