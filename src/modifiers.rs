//! Seed modifiers and their aggregation into a single seed value.

use serde::{Deserialize, Serialize};
use crate::ranking_context::RatingBand;
use crate::util::remap_value_clamped;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedFactor {
    BountyCollected,
    BountyOffered,
    OpponentNetwork,
    OwnNetwork,
    LanFactor,
}

impl SeedFactor {
    pub const ALL: [SeedFactor; 5] = [
        SeedFactor::BountyCollected,
        SeedFactor::BountyOffered,
        SeedFactor::OpponentNetwork,
        SeedFactor::OwnNetwork,
        SeedFactor::LanFactor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SeedFactor::BountyCollected => "bountyCollected",
            SeedFactor::BountyOffered => "bountyOffered",
            SeedFactor::OpponentNetwork => "opponentNetwork",
            SeedFactor::OwnNetwork => "ownNetwork",
            SeedFactor::LanFactor => "lanFactor",
        }
    }
}

/// One number per seed factor. Used for raw modifiers, weights and contributions alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactorValues {
    pub bounty_collected: f64,
    pub bounty_offered: f64,
    pub opponent_network: f64,
    pub own_network: f64,
    pub lan_factor: f64,
}

impl FactorValues {
    pub fn get(&self, factor: SeedFactor) -> f64 {
        match factor {
            SeedFactor::BountyCollected => self.bounty_collected,
            SeedFactor::BountyOffered => self.bounty_offered,
            SeedFactor::OpponentNetwork => self.opponent_network,
            SeedFactor::OwnNetwork => self.own_network,
            SeedFactor::LanFactor => self.lan_factor,
        }
    }

    pub fn set(&mut self, factor: SeedFactor, value: f64) {
        let slot = match factor {
            SeedFactor::BountyCollected => &mut self.bounty_collected,
            SeedFactor::BountyOffered => &mut self.bounty_offered,
            SeedFactor::OpponentNetwork => &mut self.opponent_network,
            SeedFactor::OwnNetwork => &mut self.own_network,
            SeedFactor::LanFactor => &mut self.lan_factor,
        };
        *slot = value;
    }

    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(SeedFactor) -> f64,
    {
        let mut values = Self::default();
        for factor in SeedFactor::ALL {
            values.set(factor, f(factor));
        }
        values
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeedFactor, f64)> + '_ {
        SeedFactor::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }
}

pub type Modifiers = FactorValues;

/// Fixed factor weights. The default set leaves own network out entirely and counts LAN half.
/// A partial weight table only overrides the factors it names; the rest keep their default weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WeightOverrides", into = "FactorValues")]
pub struct SeedWeights(pub FactorValues);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeightOverrides {
    bounty_collected: Option<f64>,
    bounty_offered: Option<f64>,
    opponent_network: Option<f64>,
    own_network: Option<f64>,
    lan_factor: Option<f64>,
}

impl From<WeightOverrides> for SeedWeights {
    fn from(overrides: WeightOverrides) -> Self {
        let defaults = SeedWeights::default().0;

        Self(FactorValues {
            bounty_collected: overrides.bounty_collected.unwrap_or(defaults.bounty_collected),
            bounty_offered: overrides.bounty_offered.unwrap_or(defaults.bounty_offered),
            opponent_network: overrides.opponent_network.unwrap_or(defaults.opponent_network),
            own_network: overrides.own_network.unwrap_or(defaults.own_network),
            lan_factor: overrides.lan_factor.unwrap_or(defaults.lan_factor),
        })
    }
}

impl From<SeedWeights> for FactorValues {
    fn from(weights: SeedWeights) -> Self {
        weights.0
    }
}

impl Default for SeedWeights {
    fn default() -> Self {
        Self(FactorValues {
            bounty_collected: 1.0,
            bounty_offered: 1.0,
            opponent_network: 1.0,
            own_network: 0.0,
            lan_factor: 0.5,
        })
    }
}

impl SeedWeights {
    pub fn weight(&self, factor: SeedFactor) -> f64 {
        self.0.get(factor)
    }

    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    // Weights summing to zero would make the weighted mean undefined; divide by one instead.
    pub fn divisor(&self) -> f64 {
        let sum = self.sum();
        if sum == 0.0 { 1.0 } else { sum }
    }
}

/// Weighted mean of a team's modifiers.
pub fn compute_seed_value(modifiers: &Modifiers, weights: &SeedWeights) -> f64 {
    let scaled_mods: f64 = SeedFactor::ALL
        .iter()
        .map(|&f| weights.weight(f) * modifiers.get(f))
        .sum();

    scaled_mods / weights.divisor()
}

/// Diagnostic only: each weighted modifier remapped from [0, weight] onto the rating band on its own.
pub fn modifier_ratings(modifiers: &Modifiers, weights: &SeedWeights, band: &RatingBand) -> FactorValues {
    FactorValues::from_fn(|f| {
        let weight = weights.weight(f);
        remap_value_clamped(
            weight * modifiers.get(f),
            0.0,
            weight,
            band.min_seeded_rank,
            band.max_seeded_rank,
        )
    })
}
