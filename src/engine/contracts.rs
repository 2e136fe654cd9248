//! Contract negotiation: revenue-sharing proposals between players.
//!
//! Only the propose/respond handshake lives here. Expiry and revenue-share
//! settlement over time are left to collaborators.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::config::DealConfig;
use crate::engine::economy::Economy;
use crate::engine::error::{EngineError, EngineResult, EntityKind};
use crate::engine::models::{MatchId, PlayerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractProposal {
    pub assets: Vec<String>,
    /// Fraction of rent shared, in `[0, 1]`.
    pub rent_share: f64,
    #[serde(default)]
    pub buyback_price: Option<i64>,
    #[serde(default)]
    pub buyback_rounds: Option<u32>,
    #[serde(default)]
    pub trust_required: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    Proposed,
    Active,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub match_id: MatchId,
    pub proposer_id: PlayerId,
    /// `None` is an open offer any other player may take.
    pub counterparty_id: Option<PlayerId>,
    pub terms: ContractProposal,
    pub status: ContractStatus,
    pub proposed_at: u64,
    pub accepted_at: Option<u64>,
}

#[derive(Default)]
pub struct ContractBook {
    contracts: DashMap<String, Contract>,
}

impl ContractBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, contract_id: &str) -> EngineResult<Contract> {
        self.contracts
            .get(contract_id)
            .map(|c| c.clone())
            .ok_or_else(|| EngineError::not_found(EntityKind::Contract, contract_id))
    }

    pub fn for_match(&self, match_id: &str) -> Vec<Contract> {
        let mut found: Vec<Contract> = self
            .contracts
            .iter()
            .filter(|c| c.match_id == match_id)
            .map(|c| c.clone())
            .collect();
        found.sort_by_key(|c| c.proposed_at);
        found
    }

    /// Drop every contract belonging to `match_id`, returning how many went.
    pub fn remove_match(&self, match_id: &str) -> usize {
        let before = self.contracts.len();
        self.contracts.retain(|_, c| c.match_id != match_id);
        before.saturating_sub(self.contracts.len())
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn propose(
        &self,
        deals: &DealConfig,
        match_id: &str,
        proposer_id: &str,
        counterparty_id: Option<&str>,
        mut proposal: ContractProposal,
        now_ms: u64,
    ) -> EngineResult<Contract> {
        if !(0.0..=1.0).contains(&proposal.rent_share) {
            return Err(EngineError::Validation(format!(
                "rent share out of bounds: {}",
                proposal.rent_share
            )));
        }
        if proposal.buyback_price.is_some() && proposal.buyback_rounds.is_none() {
            proposal.buyback_rounds = Some(deals.default_buyback_rounds);
        }

        let contract = Contract {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            proposer_id: proposer_id.to_string(),
            counterparty_id: counterparty_id.map(str::to_string),
            terms: proposal,
            status: ContractStatus::Proposed,
            proposed_at: now_ms,
            accepted_at: None,
        };
        tracing::info!(
            match_id,
            contract_id = %contract.id,
            proposer_id,
            counterparty_id = ?contract.counterparty_id,
            assets = ?contract.terms.assets,
            "contract_proposed"
        );
        self.contracts.insert(contract.id.clone(), contract.clone());
        Ok(contract)
    }

    pub fn respond(
        &self,
        contract_id: &str,
        actor_id: &str,
        accept: bool,
        now_ms: u64,
    ) -> EngineResult<Contract> {
        let mut contract = self
            .contracts
            .get_mut(contract_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Contract, contract_id))?;

        match contract.counterparty_id.as_deref() {
            Some(invited) if invited != actor_id => {
                return Err(EngineError::PermissionViolation(
                    "Only invited counterparty can respond".into(),
                ));
            }
            None if contract.proposer_id == actor_id => {
                return Err(EngineError::PermissionViolation(
                    "Proposer cannot answer their own offer".into(),
                ));
            }
            _ => {}
        }
        if contract.status != ContractStatus::Proposed {
            return Err(EngineError::Validation(format!(
                "contract {} already {:?}",
                contract_id, contract.status
            )));
        }

        if accept {
            contract.status = ContractStatus::Active;
            contract.accepted_at = Some(now_ms);
        } else {
            contract.status = ContractStatus::Rejected;
        }
        // Open offers record who took them.
        if contract.counterparty_id.is_none() {
            contract.counterparty_id = Some(actor_id.to_string());
        }

        tracing::info!(contract_id, status = ?contract.status, actor_id, "contract_resolved");
        Ok(contract.clone())
    }
}

/// UI hint only: `sum(base_cost * market_power) * rent_share + buyback - trust * 1000`.
pub fn assess_proposal_value(economy: &Economy, proposal: &ContractProposal) -> EngineResult<i64> {
    let mut base = 0.0;
    for slug in &proposal.assets {
        let brand = economy.brand(slug)?;
        base += brand.base_cost as f64 * brand.market_power;
    }
    let share_value = base * proposal.rent_share;
    let buyback = proposal.buyback_price.unwrap_or(0) as f64;
    let trust_gate = proposal.trust_required.unwrap_or(0.0) * 1000.0;
    Ok((share_value + buyback - trust_gate).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::GameConfig;
    use std::sync::Arc;

    fn proposal(rent_share: f64) -> ContractProposal {
        ContractProposal {
            assets: vec!["tech-giant-apple".into()],
            rent_share,
            buyback_price: None,
            buyback_rounds: None,
            trust_required: None,
        }
    }

    #[test]
    fn test_rent_share_out_of_bounds() {
        let book = ContractBook::new();
        let deals = DealConfig::default();
        for share in [1.5, -0.1, f64::NAN] {
            let err = book
                .propose(&deals, "m1", "p1", Some("p2"), proposal(share), 0)
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
        assert!(book.is_empty());
    }

    #[test]
    fn test_accept_invited() {
        let book = ContractBook::new();
        let c = book
            .propose(&DealConfig::default(), "m1", "p1", Some("p2"), proposal(0.3), 10)
            .unwrap();
        assert_eq!(c.status, ContractStatus::Proposed);

        let err = book.respond(&c.id, "p3", true, 20).unwrap_err();
        assert!(matches!(err, EngineError::PermissionViolation(_)));
        assert_eq!(book.get(&c.id).unwrap().status, ContractStatus::Proposed);

        let accepted = book.respond(&c.id, "p2", true, 30).unwrap();
        assert_eq!(accepted.status, ContractStatus::Active);
        assert_eq!(accepted.accepted_at, Some(30));

        let again = book.respond(&c.id, "p2", false, 40).unwrap_err();
        assert!(matches!(again, EngineError::Validation(_)));
    }

    #[test]
    fn test_open_offer() {
        let book = ContractBook::new();
        let c = book
            .propose(&DealConfig::default(), "m1", "p1", None, proposal(0.0), 10)
            .unwrap();
        assert!(matches!(
            book.respond(&c.id, "p1", true, 11),
            Err(EngineError::PermissionViolation(_))
        ));
        let rejected = book.respond(&c.id, "p4", false, 12).unwrap();
        assert_eq!(rejected.status, ContractStatus::Rejected);
        assert_eq!(rejected.accepted_at, None);
        assert_eq!(rejected.counterparty_id.as_deref(), Some("p4"));
    }

    #[test]
    fn test_unknown_contract() {
        let book = ContractBook::new();
        assert!(matches!(
            book.respond("nope", "p1", true, 0),
            Err(EngineError::NotFound { kind: EntityKind::Contract, .. })
        ));
    }

    #[test]
    fn test_default_buyback_rounds() {
        let book = ContractBook::new();
        let mut terms = proposal(0.2);
        terms.buyback_price = Some(100_000);
        let c = book
            .propose(&DealConfig::default(), "m1", "p1", None, terms, 0)
            .unwrap();
        assert_eq!(c.terms.buyback_rounds, Some(5));
        assert_eq!(book.for_match("m1").len(), 1);
        assert!(book.for_match("m2").is_empty());
    }

    #[test]
    fn test_remove_match() {
        let book = ContractBook::new();
        let deals = DealConfig::default();
        book.propose(&deals, "m1", "p1", None, proposal(0.1), 0).unwrap();
        book.propose(&deals, "m1", "p2", None, proposal(0.2), 1).unwrap();
        book.propose(&deals, "m2", "p3", None, proposal(0.3), 2).unwrap();

        assert_eq!(book.remove_match("m1"), 2);
        assert!(book.for_match("m1").is_empty());
        assert_eq!(book.for_match("m2").len(), 1);
        assert_eq!(book.remove_match("m1"), 0);
    }

    #[test]
    fn test_assess_proposal_value() {
        let economy = Economy::new(Arc::new(GameConfig::default()));
        let terms = ContractProposal {
            assets: vec!["tech-giant-apple".into(), "auto-tesla".into()],
            rent_share: 0.5,
            buyback_price: Some(20_000),
            buyback_rounds: None,
            trust_required: Some(10.0),
        };
        // (260000 * 1.5 + 210000 * 1.35) * 0.5 + 20000 - 10000
        let expected = ((260_000.0 * 1.5 + 210_000.0 * 1.35) * 0.5 + 20_000.0 - 10_000.0_f64).round() as i64;
        assert_eq!(assess_proposal_value(&economy, &terms).unwrap(), expected);

        let unknown = ContractProposal {
            assets: vec!["ghost-brand".into()],
            ..terms
        };
        assert!(assess_proposal_value(&economy, &unknown).is_err());
    }
}
