//! Board track: the fixed ring of cells every match is played on.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::brands::find_brand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Brand,
    Infrastructure,
    Event,
    Special,
    Auction,
    Contract,
}

/// Action tag attached to a cell. Selects the effect applied when a player
/// lands there; unknown tags are rejected when the track is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellAction {
    // special
    StartupGrant,
    StockRoll,
    GlobalShowcase,
    ComplianceCheck,
    // event
    PrBoost,
    RegulationCheck,
    DrawInnovation,
    InsiderCrackdown,
    ReputationAudit,
    FairPlayBoost,
    DriveSurge,
    SeasonalBonus,
    // auction
    StartAuction,
    StartBlitzAuction,
    // contract
    OpenDealEditor,
    AllianceProposal,
    FastDeals,
    // infrastructure
    InfrastructureBonus,
    EdgeBonus,
    LogisticsBoost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCell {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<CellAction>,
}

impl BoardCell {
    fn tagged(id: &str, label: &str, kind: CellKind, action: CellAction) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            brand_slug: None,
            action: Some(action),
        }
    }

    fn brand(id: &str, slug: &str) -> Self {
        let label = find_brand(slug)
            .map(|b| b.generic_name.clone())
            .unwrap_or_else(|| slug.to_string());
        Self {
            id: id.into(),
            label,
            kind: CellKind::Brand,
            brand_slug: Some(slug.into()),
            action: None,
        }
    }
}

pub static BOARD_TRACK: Lazy<Vec<BoardCell>> = Lazy::new(|| {
    use CellAction::*;
    use CellKind::{Auction, Contract, Event, Infrastructure, Special};

    vec![
        BoardCell::tagged("corner-startup-hub", "Startup Hub", Special, StartupGrant),
        BoardCell::brand("brand-tech-apple", "tech-giant-apple"),
        BoardCell::tagged("event-pr-burst", "PR Burst", Event, PrBoost),
        BoardCell::brand("brand-commerce-amazon", "commerce-amazon"),
        BoardCell::tagged("auction-1", "Silent Auction", Auction, StartAuction),
        BoardCell::brand("brand-tech-google", "tech-giant-google"),
        BoardCell::tagged("infrastructure-cloud", "Quantum Cloud", Infrastructure, InfrastructureBonus),
        BoardCell::brand("brand-commerce-alibaba", "commerce-alibaba"),
        BoardCell::tagged("event-regulation", "Regulatory Review", Event, RegulationCheck),
        BoardCell::brand("brand-auto-tesla", "auto-tesla"),
        BoardCell::tagged("special-stock-market", "Stock Exchange", Special, StockRoll),
        BoardCell::brand("brand-auto-toyota", "auto-toyota"),
        BoardCell::tagged("contract-trade", "Deal Floor", Contract, OpenDealEditor),
        BoardCell::brand("brand-auto-volkswagen", "auto-volkswagen"),
        BoardCell::tagged("event-innovation", "Innovation Card", Event, DrawInnovation),
        BoardCell::brand("brand-finance-jpmorgan", "finance-jpmorgan"),
        BoardCell::tagged("auction-2", "Insider Whisper", Auction, StartAuction),
        BoardCell::brand("brand-finance-visa", "finance-visa"),
        BoardCell::tagged("infrastructure-data-center", "Edge Data Mesh", Infrastructure, EdgeBonus),
        BoardCell::brand("brand-finance-mastercard", "finance-mastercard"),
        BoardCell::tagged("corner-global-stage", "Global Stage", Special, GlobalShowcase),
        BoardCell::brand("brand-media-disney", "media-disney"),
        BoardCell::tagged("event-crackdown", "Insider Crackdown", Event, InsiderCrackdown),
        BoardCell::brand("brand-media-netflix", "media-netflix"),
        BoardCell::tagged("contract-alliance", "Alliance Bay", Contract, AllianceProposal),
        BoardCell::brand("brand-food-coca-cola", "food-coca-cola"),
        BoardCell::tagged("event-reputation", "Reputation Audit", Event, ReputationAudit),
        BoardCell::brand("brand-food-pepsico", "food-pepsico"),
        BoardCell::tagged("auction-3", "Strategic Auction", Auction, StartAuction),
        BoardCell::brand("brand-pharma-pfizer", "pharma-pfizer"),
        BoardCell::tagged("special-regulator", "Regulator Office", Special, ComplianceCheck),
        BoardCell::brand("brand-pharma-novartis", "pharma-novartis"),
        BoardCell::tagged("infrastructure-logistics", "Smart Logistics", Infrastructure, LogisticsBoost),
        BoardCell::brand("brand-logistics-ups", "logistics-ups"),
        BoardCell::tagged("event-fairplay", "Fair Play Boost", Event, FairPlayBoost),
        BoardCell::brand("brand-logistics-fedex", "logistics-fedex"),
        BoardCell::tagged("auction-4", "Alliance Auction", Auction, StartAuction),
        BoardCell::brand("brand-energy-shell", "energy-shell"),
        BoardCell::tagged("corner-stock-market", "Stock Market", Special, StockRoll),
        BoardCell::brand("brand-energy-bp", "energy-bp"),
        BoardCell::tagged("event-drive-counter", "Drive Counter Surge", Event, DriveSurge),
        BoardCell::brand("brand-hospitality-marriott", "hospitality-marriott"),
        BoardCell::tagged("contract-fast", "Rapid Deal Desk", Contract, FastDeals),
        BoardCell::brand("brand-hospitality-airbnb", "hospitality-airbnb"),
        BoardCell::tagged("event-seasons", "Seasonal Spotlight", Event, SeasonalBonus),
        BoardCell::brand("brand-gaming-nintendo", "gaming-nintendo"),
        BoardCell::tagged("auction-blitz", "Blitz Auction", Auction, StartBlitzAuction),
        BoardCell::brand("brand-gaming-sony", "gaming-sony"),
    ]
});
