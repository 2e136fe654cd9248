//! Rent and fair-play computations. Pure: the only state is the config.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::brands::BrandDefinition;
use crate::engine::config::GameConfig;
use crate::engine::error::{EngineError, EngineResult, EntityKind};

/// Same-synergy holdings beyond this count add nothing.
const SYNERGY_CAP: i64 = 4;
const INNOVATION_STEP: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentCalculationInput {
    pub brand_slug: String,
    /// Brands the owner holds in this brand's synergy group (the brand itself included).
    pub owned_in_synergy: i64,
    pub reputation: f64,
    pub drive_counter: u32,
    pub innovation_level: u32,
    #[serde(default)]
    pub event_modifiers: Vec<f64>,
    #[serde(default)]
    pub alliance_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentCalculationResult {
    pub total_rent: i64,
    /// The brand's listed rent, before market power.
    pub base_rent: i64,
    pub market_power: f64,
    pub synergy_multiplier: f64,
    pub reputation_multiplier: f64,
    pub drive_bonus: f64,
    pub innovation_bonus: f64,
    pub event_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alliance_share: Option<f64>,
}

#[derive(Clone)]
pub struct Economy {
    config: Arc<GameConfig>,
}

impl Economy {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self { config }
    }

    pub fn brand(&self, slug: &str) -> EngineResult<&BrandDefinition> {
        self.config
            .brand(slug)
            .ok_or_else(|| EngineError::not_found(EntityKind::Brand, slug))
    }

    pub fn calculate_rent(&self, input: &RentCalculationInput) -> EngineResult<RentCalculationResult> {
        let brand = self.brand(&input.brand_slug)?;
        let economy = &self.config.economy;

        let powered_rent = brand.base_rent as f64 * brand.market_power;
        let synergy_multiplier = self.synergy_multiplier(&brand.synergy_key, input.owned_in_synergy);
        let reputation_multiplier = economy.reputation_bounds.clamp(input.reputation);
        let drive_bonus = 1.0 + input.drive_counter as f64 * economy.drive_bonus_per_action;
        let innovation_bonus = 1.0 + input.innovation_level as f64 * INNOVATION_STEP;
        let event_multiplier: f64 = input.event_modifiers.iter().product();

        let mut rent = powered_rent
            * synergy_multiplier
            * reputation_multiplier
            * drive_bonus
            * innovation_bonus
            * event_multiplier;

        let alliance_share = input.alliance_share.filter(|s| *s > 0.0 && *s < 1.0);
        if let Some(share) = alliance_share {
            rent *= share;
        }

        let total_rent = rent.round() as i64;
        tracing::debug!(
            brand = %brand.slug,
            rent = total_rent,
            synergy_multiplier,
            reputation_multiplier,
            drive_bonus,
            event_multiplier,
            "rent_calculated"
        );

        Ok(RentCalculationResult {
            total_rent,
            base_rent: brand.base_rent,
            market_power: brand.market_power,
            synergy_multiplier,
            reputation_multiplier,
            drive_bonus,
            innovation_bonus,
            event_multiplier,
            alliance_share,
        })
    }

    /// Multiplier rewarding players who are behind. 1 for `position_delta <= 0`.
    pub fn fair_play_boost(&self, position_delta: i64) -> f64 {
        if position_delta <= 0 {
            return 1.0;
        }
        let economy = &self.config.economy;
        1.0 + (position_delta as f64 * economy.fair_play_boost).min(economy.fair_play_cap)
    }

    /// How many of `owned` share `slug`'s synergy group.
    pub fn owned_in_synergy(&self, owned: &[String], slug: &str) -> i64 {
        let Some(target) = self.config.brand(slug) else {
            return 0;
        };
        owned
            .iter()
            .filter_map(|s| self.config.brand(s))
            .filter(|b| b.synergy_key == target.synergy_key)
            .count() as i64
    }

    fn synergy_multiplier(&self, key: &str, owned: i64) -> f64 {
        match self.config.synergies.get(key) {
            Some(synergy) => {
                let capped = owned.clamp(0, SYNERGY_CAP) as f64;
                1.0 + synergy.synergy_bonus * (capped / 2.0)
            }
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> Economy {
        Economy::new(Arc::new(GameConfig::default()))
    }

    fn input(owned: i64, reputation: f64) -> RentCalculationInput {
        RentCalculationInput {
            brand_slug: "tech-giant-apple".into(),
            owned_in_synergy: owned,
            reputation,
            drive_counter: 2,
            innovation_level: 1,
            event_modifiers: vec![1.1],
            alliance_share: None,
        }
    }

    #[test]
    fn test_rent_with_synergy_and_reputation() {
        let result = economy().calculate_rent(&input(2, 1.4)).unwrap();
        assert!(result.total_rent > 30_000, "rent {}", result.total_rent);
        assert!(result.synergy_multiplier > 1.0);
        assert!((result.reputation_multiplier - 1.4).abs() < 1e-9);
        assert!((result.drive_bonus - 1.1).abs() < 1e-9);
        assert!((result.innovation_bonus - 1.1).abs() < 1e-9);
        assert_eq!(result.alliance_share, None);
    }

    #[test]
    fn test_rent_formula_exact() {
        // 12000 * 1.5 * (1 + 0.25 * 1/2) * 1.0 * 1.0 * 1.0 * 1
        let result = economy()
            .calculate_rent(&RentCalculationInput {
                brand_slug: "tech-giant-apple".into(),
                owned_in_synergy: 1,
                reputation: 1.0,
                drive_counter: 0,
                innovation_level: 0,
                event_modifiers: vec![],
                alliance_share: None,
            })
            .unwrap();
        assert_eq!(result.total_rent, 20_250);
        assert_eq!(result.event_multiplier, 1.0);
        assert_eq!(result.base_rent, 12_000);
        assert_eq!(result.market_power, 1.5);
    }

    #[test]
    fn test_rent_monotonic_in_synergy_and_reputation() {
        let eco = economy();
        let mut last = 0;
        for owned in -1..=6 {
            let rent = eco.calculate_rent(&input(owned, 1.0)).unwrap().total_rent;
            assert!(rent >= last, "owned={} rent={} last={}", owned, rent, last);
            last = rent;
        }
        let capped = eco.calculate_rent(&input(4, 1.0)).unwrap().total_rent;
        assert_eq!(capped, eco.calculate_rent(&input(9, 1.0)).unwrap().total_rent);

        let mut last = 0;
        for step in 0..=20 {
            let reputation = 0.2 + step as f64 * 0.1;
            let rent = eco.calculate_rent(&input(1, reputation)).unwrap().total_rent;
            assert!(rent >= last);
            last = rent;
        }
    }

    #[test]
    fn test_reputation_clamped() {
        let eco = economy();
        let high = eco.calculate_rent(&input(1, 5.0)).unwrap();
        assert_eq!(high.reputation_multiplier, 1.6);
        let low = eco.calculate_rent(&input(1, 0.0)).unwrap();
        assert_eq!(low.reputation_multiplier, 0.4);
    }

    #[test]
    fn test_alliance_share() {
        let eco = economy();
        let full = eco.calculate_rent(&input(1, 1.0)).unwrap();

        let mut shared_input = input(1, 1.0);
        shared_input.alliance_share = Some(0.5);
        let shared = eco.calculate_rent(&shared_input).unwrap();
        assert_eq!(shared.alliance_share, Some(0.5));
        assert!((shared.total_rent - full.total_rent / 2).abs() <= 1);

        for share in [0.0, 1.0, 1.5, -0.2] {
            let mut i = input(1, 1.0);
            i.alliance_share = Some(share);
            let r = eco.calculate_rent(&i).unwrap();
            assert_eq!(r.alliance_share, None);
            assert_eq!(r.total_rent, full.total_rent);
        }
    }

    #[test]
    fn test_unknown_brand() {
        let mut i = input(1, 1.0);
        i.brand_slug = "no-such-brand".into();
        let err = economy().calculate_rent(&i).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: EntityKind::Brand, .. }));
    }

    #[test]
    fn test_fair_play_boost() {
        let eco = economy();
        assert_eq!(eco.fair_play_boost(0), 1.0);
        assert_eq!(eco.fair_play_boost(-3), 1.0);
        assert!((eco.fair_play_boost(1) - 1.18).abs() < 1e-9);
        assert!(eco.fair_play_boost(10) <= 1.4 + 1e-12);
        assert_eq!(eco.fair_play_boost(10), eco.fair_play_boost(50));
    }

    #[test]
    fn test_owned_in_synergy() {
        let eco = economy();
        let owned = vec![
            "tech-giant-apple".to_string(),
            "tech-giant-google".to_string(),
            "auto-tesla".to_string(),
        ];
        assert_eq!(eco.owned_in_synergy(&owned, "tech-giant-google"), 2);
        assert_eq!(eco.owned_in_synergy(&owned, "auto-toyota"), 1);
        assert_eq!(eco.owned_in_synergy(&owned, "media-disney"), 0);
    }
}
