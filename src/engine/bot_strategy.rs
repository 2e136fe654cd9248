//! Bidding policies for bot seats.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::brands::BrandDefinition;

/// What a bot sees when an auction opens.
pub struct BidContext<'a> {
    /// `None` for bundle lots that are not a catalogued brand.
    pub brand: Option<&'a BrandDefinition>,
    pub cash: i64,
    /// Brands the bidder already holds in the lot's synergy group.
    pub owned_in_synergy: i64,
}

/// A bot strategy picks a sealed amount, or sits the auction out.
pub trait BidStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn bid(&self, ctx: &BidContext<'_>, rng: &mut StdRng) -> Option<i64>;
}

/// Overpays for anything it can afford, more so when completing a set.
pub struct AggressiveBidder;

impl BidStrategy for AggressiveBidder {
    fn name(&self) -> &str {
        "aggressive"
    }

    fn bid(&self, ctx: &BidContext<'_>, _rng: &mut StdRng) -> Option<i64> {
        let brand = ctx.brand?;
        let markup = 1.2 + 0.1 * ctx.owned_in_synergy as f64;
        let amount = (brand.base_cost as f64 * markup).round() as i64;
        (ctx.cash > 0).then(|| amount.min(ctx.cash))
    }
}

/// Bids under list price and only with a comfortable cash cushion.
pub struct CautiousBidder;

impl BidStrategy for CautiousBidder {
    fn name(&self) -> &str {
        "cautious"
    }

    fn bid(&self, ctx: &BidContext<'_>, _rng: &mut StdRng) -> Option<i64> {
        let brand = ctx.brand?;
        if ctx.cash < brand.base_cost * 2 {
            return None;
        }
        Some((brand.base_cost as f64 * 0.8).round() as i64)
    }
}

/// Coin flip to join, then a uniform fraction of list price.
pub struct RandomBidder;

impl BidStrategy for RandomBidder {
    fn name(&self) -> &str {
        "random"
    }

    fn bid(&self, ctx: &BidContext<'_>, rng: &mut StdRng) -> Option<i64> {
        let brand = ctx.brand?;
        if !rng.gen_bool(0.5) {
            return None;
        }
        let amount = (brand.base_cost as f64 * rng.gen_range(0.5..1.1)).round() as i64;
        Some(amount.min(ctx.cash.max(0)))
    }
}

/// Look a policy up by its CLI name.
pub fn strategy_by_name(name: &str) -> Option<Box<dyn BidStrategy>> {
    match name {
        "aggressive" => Some(Box::new(AggressiveBidder)),
        "cautious" => Some(Box::new(CautiousBidder)),
        "random" => Some(Box::new(RandomBidder)),
        _ => None,
    }
}
