//! Brand and industry-synergy tables.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Economic parameters of one ownable brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDefinition {
    pub slug: String,
    pub generic_name: String,
    pub synergy_key: String,
    pub base_cost: i64,
    pub base_rent: i64,
    pub market_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyDefinition {
    pub label: String,
    pub synergy_bonus: f64,
}

// (slug, generic name, synergy, base cost, base rent, market power)
const BRAND_ROWS: [(&str, &str, &str, i64, i64, f64); 24] = [
    ("tech-giant-apple", "Orchard Devices", "tech", 260_000, 12_000, 1.5),
    ("tech-giant-google", "Search Sphere", "tech", 250_000, 11_500, 1.45),
    ("commerce-amazon", "River Marketplace", "commerce", 230_000, 10_500, 1.4),
    ("commerce-alibaba", "Silk Bazaar", "commerce", 200_000, 9_500, 1.3),
    ("auto-tesla", "Volt Motors", "auto", 210_000, 9_800, 1.35),
    ("auto-toyota", "Rising Auto", "auto", 180_000, 8_400, 1.2),
    ("auto-volkswagen", "People's Wagon", "auto", 170_000, 8_000, 1.15),
    ("finance-jpmorgan", "Harbor Bank", "finance", 220_000, 10_000, 1.3),
    ("finance-visa", "Swipe Network", "finance", 200_000, 9_200, 1.25),
    ("finance-mastercard", "Chip Circle", "finance", 190_000, 9_000, 1.2),
    ("media-disney", "Castle Studios", "media", 190_000, 8_800, 1.25),
    ("media-netflix", "Binge Stream", "media", 170_000, 8_200, 1.2),
    ("food-coca-cola", "Red Fizz", "food", 150_000, 7_200, 1.15),
    ("food-pepsico", "Blue Fizz", "food", 140_000, 6_900, 1.1),
    ("pharma-pfizer", "Helix Pharma", "pharma", 180_000, 8_600, 1.2),
    ("pharma-novartis", "Alpine Remedies", "pharma", 170_000, 8_100, 1.15),
    ("logistics-ups", "Brown Parcel", "logistics", 130_000, 6_200, 1.05),
    ("logistics-fedex", "Overnight Wing", "logistics", 130_000, 6_300, 1.05),
    ("energy-shell", "Seashell Petroleum", "energy", 200_000, 9_400, 1.25),
    ("energy-bp", "Green Horizon Oil", "energy", 190_000, 9_000, 1.2),
    ("hospitality-marriott", "Grand Stay", "hospitality", 160_000, 7_600, 1.1),
    ("hospitality-airbnb", "Open Door Homes", "hospitality", 150_000, 7_300, 1.1),
    ("gaming-nintendo", "Plumber Play", "gaming", 160_000, 7_700, 1.15),
    ("gaming-sony", "Wave Console", "gaming", 170_000, 8_000, 1.15),
];

const SYNERGY_ROWS: [(&str, &str, f64); 11] = [
    ("tech", "Technology", 0.25),
    ("commerce", "E-Commerce", 0.2),
    ("auto", "Automotive", 0.18),
    ("finance", "Finance", 0.2),
    ("media", "Media", 0.22),
    ("food", "Food & Beverage", 0.15),
    ("pharma", "Pharmaceuticals", 0.17),
    ("logistics", "Logistics", 0.3),
    ("energy", "Energy", 0.2),
    ("hospitality", "Hospitality", 0.24),
    ("gaming", "Gaming", 0.26),
];

pub static BRAND_DEFINITIONS: Lazy<Vec<BrandDefinition>> = Lazy::new(|| {
    BRAND_ROWS
        .iter()
        .map(|&(slug, name, synergy, cost, rent, power)| BrandDefinition {
            slug: slug.into(),
            generic_name: name.into(),
            synergy_key: synergy.into(),
            base_cost: cost,
            base_rent: rent,
            market_power: power,
        })
        .collect()
});

pub static INDUSTRY_SYNERGY: Lazy<HashMap<String, SynergyDefinition>> = Lazy::new(|| {
    SYNERGY_ROWS
        .iter()
        .map(|&(key, label, bonus)| {
            (
                key.to_string(),
                SynergyDefinition {
                    label: label.into(),
                    synergy_bonus: bonus,
                },
            )
        })
        .collect()
});

/// Look up a brand in the built-in table.
pub fn find_brand(slug: &str) -> Option<&'static BrandDefinition> {
    BRAND_DEFINITIONS.iter().find(|b| b.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_brand_has_a_synergy() {
        for brand in BRAND_DEFINITIONS.iter() {
            assert!(
                INDUSTRY_SYNERGY.contains_key(&brand.synergy_key),
                "{} has unknown synergy {}",
                brand.slug,
                brand.synergy_key
            );
        }
    }

    #[test]
    fn test_slugs_are_unique() {
        let mut slugs: Vec<&str> = BRAND_DEFINITIONS.iter().map(|b| b.slug.as_str()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), BRAND_DEFINITIONS.len());
    }
}
