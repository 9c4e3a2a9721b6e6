//! Seed normalization: maps every team's seed value into the rating band, explains the result
//! per factor and hands each team its rating state.

use serde::Serialize;
use tracing::{debug, trace};
use crate::data_loader::Team;
use crate::error::{RankingError, Result};
use crate::modifiers::{compute_seed_value, modifier_ratings, FactorValues, Modifiers, SeedFactor, SeedWeights};
use crate::ranking_context::RankingContext;
use crate::rating::{RatingEngine, RatingEngineAdapter};
use crate::util::remap_value_clamped;

/// Everything fixed at seeding time. Never touched once match replay starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seed {
    pub seed_value: f64,
    pub rank_value_seed: f64,
    pub rank_value_contributions: FactorValues,
    pub modifier_ratings: FactorValues,
}

/// A team after seeding. Only the match replayer writes `rating_state` and `rank_value`.
#[derive(Debug, Clone)]
pub struct RatedTeam<S> {
    pub team: Team,
    pub seed: Seed,
    pub rating_state: S,
    pub rank_value: f64,
}

impl<S> RatedTeam<S> {
    /// Rating earned (or lost) through matches, relative to the seed.
    pub fn rating_delta(&self) -> f64 {
        self.rank_value - self.seed.rank_value_seed
    }
}

pub fn seed_teams<E: RatingEngine>(
    teams: Vec<Team>,
    ranking_context: &RankingContext,
    engine: &RatingEngineAdapter<E>,
) -> Result<Vec<RatedTeam<E::State>>> {
    let weights = &ranking_context.seed_weights;
    let band = ranking_context.band();

    for team in &teams {
        if let Some((factor, value)) = team.modifiers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RankingError::InvalidModifier {
                team: team.name.clone(),
                factor: factor.name(),
                value,
            });
        }
    }

    let seed_values: Vec<f64> = teams.iter().map(|t| compute_seed_value(&t.modifiers, weights)).collect();

    // Remap teams from current range to min_seeded_rank..max_seeded_rank
    let min_seed_value = seed_values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_seed_value = seed_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    debug!(min_seed_value, max_seed_value, teams = teams.len(), "Seeding teams");

    let mut rated = Vec::with_capacity(teams.len());
    for (team, seed_value) in teams.into_iter().zip(seed_values) {
        let rank_value = remap_value_clamped(
            seed_value,
            min_seed_value,
            max_seed_value,
            band.min_seeded_rank,
            band.max_seeded_rank,
        );

        let seed = Seed {
            seed_value,
            rank_value_seed: rank_value,
            rank_value_contributions: contributions(&team.modifiers, weights, seed_value, rank_value),
            modifier_ratings: modifier_ratings(&team.modifiers, weights, &band),
        };
        trace!(team = %team.name, ?seed, "Seeded");

        let rating_state = engine.new_rating_state(seed.rank_value_seed)?;
        rated.push(RatedTeam {
            team,
            seed,
            rating_state,
            rank_value,
        });
    }

    Ok(rated)
}

/*
    How much of rank_value each factor produced: the factor's share of the weighted sum, scaled to rank_value.
    A zero seed value has no shares to speak of, so rank_value is split across factors in proportion to their weights instead.
    Either way the contributions add back up to rank_value (all-zero weights being the one exception).
*/
pub fn contributions(modifiers: &Modifiers, weights: &SeedWeights, seed_value: f64, rank_value: f64) -> FactorValues {
    if seed_value == 0.0 {
        let weight_sum = weights.sum();
        if weight_sum == 0.0 {
            return FactorValues::default();
        }
        return FactorValues::from_fn(|f| weights.weight(f) * rank_value / weight_sum);
    }

    let sum_coeff = weights.divisor();
    FactorValues::from_fn(|f: SeedFactor| {
        let mod_value = weights.weight(f) * modifiers.get(f);
        mod_value / (seed_value * sum_coeff) * rank_value
    })
}
