//! Pricing Catalog
//!
//! Single source of truth for tier pricing and upsell composition. Built
//! once at startup, immutable in request scope.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Purchase tier identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierId {
    Basic,
    Pro,
    Business,
}

impl TierId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierId::Basic => "basic",
            TierId::Pro => "pro",
            TierId::Business => "business",
        }
    }

    /// Parse a tier id from its wire form
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(TierId::Basic),
            "pro" | "professional" => Ok(TierId::Pro),
            "business" => Ok(TierId::Business),
            other => Err(PaymentError::InvalidTier(other.to_string())),
        }
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A priced purchase option
#[derive(Clone, Debug, Serialize)]
pub struct PricingTier {
    /// Tier identifier
    pub id: TierId,

    /// Display name
    pub name: String,

    /// Base price in minor currency units (cents)
    pub price_cents: i64,

    /// Feature list shown on the pricing page
    pub features: Vec<String>,
}

/// An optional add-on priced on top of a base tier
#[derive(Clone, Debug, Serialize)]
pub struct Upsell {
    /// Upsell identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Incremental price in minor currency units
    pub price_cents: i64,

    /// Tiers this upsell can be attached to
    pub eligible: Vec<TierId>,
}

/// The static tier and upsell catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    tiers: Vec<PricingTier>,
    upsells: Vec<Upsell>,
}

impl Catalog {
    /// The production catalog
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                PricingTier {
                    id: TierId::Basic,
                    name: "Basic Package".into(),
                    price_cents: 4700,
                    features: vec![
                        "100 pages".into(),
                        "Basic formatting".into(),
                        "PDF export".into(),
                    ],
                },
                PricingTier {
                    id: TierId::Pro,
                    name: "Professional Package".into(),
                    price_cents: 9700,
                    features: vec![
                        "300 pages".into(),
                        "Advanced formatting".into(),
                        "PDF+EPUB export".into(),
                    ],
                },
                PricingTier {
                    id: TierId::Business,
                    name: "Business Package".into(),
                    price_cents: 49700,
                    features: vec![
                        "Unlimited pages".into(),
                        "White labeling".into(),
                        "Priority support".into(),
                    ],
                },
            ],
            upsells: vec![
                Upsell {
                    id: "audiobook".into(),
                    name: "Audiobook Edition".into(),
                    price_cents: 2900,
                    eligible: vec![TierId::Basic, TierId::Pro, TierId::Business],
                },
                Upsell {
                    id: "priority-delivery".into(),
                    name: "Priority Delivery".into(),
                    price_cents: 1900,
                    eligible: vec![TierId::Basic, TierId::Pro, TierId::Business],
                },
                Upsell {
                    id: "commercial-license".into(),
                    name: "Commercial License".into(),
                    // Business already includes white-label rights
                    price_cents: 4900,
                    eligible: vec![TierId::Basic, TierId::Pro],
                },
            ],
        }
    }

    /// Look up a tier
    pub fn tier(&self, id: TierId) -> &PricingTier {
        self.tiers
            .iter()
            .find(|t| t.id == id)
            .expect("catalog contains every TierId variant")
    }

    /// Look up an upsell by id
    pub fn upsell(&self, id: &str) -> Option<&Upsell> {
        self.upsells.iter().find(|u| u.id == id)
    }

    /// All tiers, for the pricing endpoint
    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// All upsells, for the pricing endpoint
    pub fn upsells(&self) -> &[Upsell] {
        &self.upsells
    }

    /// Total price for a tier plus upsells
    ///
    /// Upsells never reduce the price and never apply twice; a duplicate,
    /// unknown, or tier-incompatible upsell id fails the whole computation.
    pub fn price(&self, tier: TierId, upsell_ids: &[String]) -> Result<i64> {
        let mut total = self.tier(tier).price_cents;
        let mut seen = HashSet::new();

        for id in upsell_ids {
            if !seen.insert(id.as_str()) {
                return Err(PaymentError::InvalidUpsell(format!("duplicate: {id}")));
            }
            let upsell = self
                .upsell(id)
                .ok_or_else(|| PaymentError::InvalidUpsell(format!("unknown: {id}")))?;
            if !upsell.eligible.contains(&tier) {
                return Err(PaymentError::InvalidUpsell(format!(
                    "{id} is not available for the {tier} tier"
                )));
            }
            total += upsell.price_cents;
        }

        Ok(total)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!(TierId::parse("pro").unwrap(), TierId::Pro);
        assert_eq!(TierId::parse("Professional").unwrap(), TierId::Pro);
        assert_eq!(TierId::parse(" basic ").unwrap(), TierId::Basic);
        assert!(matches!(
            TierId::parse("platinum"),
            Err(PaymentError::InvalidTier(_))
        ));
    }

    #[test]
    fn test_base_prices() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.tier(TierId::Basic).price_cents, 4700);
        assert_eq!(catalog.tier(TierId::Pro).price_cents, 9700);
        assert_eq!(catalog.tier(TierId::Business).price_cents, 49700);
    }

    #[test]
    fn test_price_without_upsells_is_base() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.price(TierId::Pro, &[]).unwrap(), 9700);
    }

    #[test]
    fn test_upsells_increase_price_exactly() {
        let catalog = Catalog::standard();
        let base = catalog.price(TierId::Pro, &[]).unwrap();
        let with_one = catalog
            .price(TierId::Pro, &["audiobook".into()])
            .unwrap();
        assert_eq!(with_one, base + 2900);

        let with_two = catalog
            .price(TierId::Pro, &["audiobook".into(), "priority-delivery".into()])
            .unwrap();
        assert_eq!(with_two, with_one + 1900);
    }

    #[test]
    fn test_duplicate_upsell_rejected() {
        let catalog = Catalog::standard();
        let result = catalog.price(TierId::Pro, &["audiobook".into(), "audiobook".into()]);
        assert!(matches!(result, Err(PaymentError::InvalidUpsell(_))));
    }

    #[test]
    fn test_incompatible_upsell_rejected() {
        let catalog = Catalog::standard();
        let result = catalog.price(TierId::Business, &["commercial-license".into()]);
        assert!(matches!(result, Err(PaymentError::InvalidUpsell(_))));
    }

    #[test]
    fn test_unknown_upsell_rejected() {
        let catalog = Catalog::standard();
        let result = catalog.price(TierId::Basic, &["hologram".into()]);
        assert!(matches!(result, Err(PaymentError::InvalidUpsell(_))));
    }
}
