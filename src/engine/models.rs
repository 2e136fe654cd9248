//! Core engine data types: match and player state, snapshots and turn outcomes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::board::BoardCell;
use crate::engine::anti_cheat::AntiCheatVerdict;
use crate::engine::auction::{AuctionHouse, AuctionView};
use crate::engine::economy::RentCalculationResult;

pub type PlayerId = String;
pub type MatchId = String;
pub type Dice = (u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    Classic,
    Advanced,
    Blitz,
}

/// A seated player handed over by the lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Authentication-layer id.
    pub player_id: PlayerId,
    pub display_name: String,
    #[serde(default)]
    pub trust: f64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayerState {
    pub id: PlayerId,
    pub external_player_id: PlayerId,
    pub display_name: String,
    pub seat: usize,
    /// May go negative: nothing in the core checks solvency.
    pub cash: i64,
    pub position: usize,
    pub drive_counter: u32,
    pub reputation: f64,
    pub trust: f64,
    pub owned_brands: Vec<String>,
    pub is_bot: bool,
}

/// Authoritative state of one match. Only mutated through `MatchEngine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub id: MatchId,
    pub mode: MatchMode,
    pub round: u32,
    pub active_turn: usize,
    pub turn_order: Vec<PlayerId>,
    pub players: HashMap<PlayerId, MatchPlayerState>,
    pub brand_ownership: BTreeMap<String, PlayerId>,
    pub auctions: AuctionHouse,
    pub board_length: usize,
    pub last_dice: Option<Dice>,
}

impl MatchState {
    pub fn active_player_id(&self) -> &str {
        &self.turn_order[self.active_turn]
    }

    /// Move the turn to the next seat, bumping the round on wrap-around.
    pub fn advance_turn(&mut self) {
        self.active_turn = (self.active_turn + 1) % self.turn_order.len();
        if self.active_turn == 0 {
            self.round += 1;
        }
    }

    /// Players in seat order.
    pub fn seated_players(&self) -> Vec<&MatchPlayerState> {
        self.turn_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .collect()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            id: self.id.clone(),
            mode: self.mode,
            round: self.round,
            active_turn: self.active_player_id().to_string(),
            players: self.seated_players().into_iter().cloned().collect(),
            brand_ownership: self.brand_ownership.clone(),
            auctions: self.auctions.views(),
            board_length: self.board_length,
            last_dice: self.last_dice,
        }
    }
}

/// Full-state broadcast payload. Sealed bid amounts are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub id: MatchId,
    pub mode: MatchMode,
    pub round: u32,
    pub active_turn: PlayerId,
    pub players: Vec<MatchPlayerState>,
    pub brand_ownership: BTreeMap<String, PlayerId>,
    pub auctions: Vec<AuctionView>,
    pub board_length: usize,
    pub last_dice: Option<Dice>,
}

impl MatchSnapshot {
    pub fn player(&self, id: &str) -> Option<&MatchPlayerState> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// Result of a single `take_turn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub player_id: PlayerId,
    pub dice: Dice,
    pub new_position: usize,
    pub passed_start: bool,
    pub cell: BoardCell,
    /// Net cash change for the mover from the landed cell (start bonus excluded).
    pub cash_delta: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<RentCalculationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<AntiCheatVerdict>,
}
