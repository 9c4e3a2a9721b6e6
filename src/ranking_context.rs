use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{RankingError, Result};
use crate::modifiers::SeedWeights;

const DAY: i64 = 24 * 60 * 60;

/*
    Everything tunable about a ranking run lives here. The pipeline keeps its own copy, so
    alternate weight sets can be tried side by side without touching any global state.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingContext {
    pub top_outlier_count: usize,
    pub factor_bucket_size: usize,

    pub roster_size: usize,
    pub core_overlap: usize,

    pub time_window: i64,
    pub time_grace_period: i64,
    pub time_decay_factor: f64,     // The power of decay. 1 is linear

    pub seed_weights: SeedWeights,

    pub min_seeded_rank: f64,
    pub max_seeded_rank: f64,

    pub fixed_rating_deviation: f64,

    pub elo_k: f64,
    pub elo_delta: f64,

    pub min_matches_for_display: u32,
    pub max_teams_displayed: usize,
}

impl Default for RankingContext {
    fn default() -> Self {
        Self {
            top_outlier_count: 5,
            factor_bucket_size: 10,

            roster_size: 5,
            core_overlap: 3,

            time_window: 6 * 30 * DAY,
            time_grace_period: 30 * DAY, // One month
            time_decay_factor: 1.0,

            seed_weights: SeedWeights::default(),

            min_seeded_rank: 400.0,
            max_seeded_rank: 1000.0,

            fixed_rating_deviation: 75.0,

            elo_k: 32.0,
            elo_delta: 400.0,

            min_matches_for_display: 5,
            max_teams_displayed: 20,
        }
    }
}

impl RankingContext {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| RankingError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let context: Self = toml::from_str(&raw).map_err(|source| RankingError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        context.validate()?;
        Ok(context)
    }

    // Only rejects settings with no sensible fallback. A zero weight sum or a flat seed range are handled downstream.
    pub fn validate(&self) -> Result<()> {
        if !self.min_seeded_rank.is_finite() || !self.max_seeded_rank.is_finite() {
            return Err(RankingError::configuration("Seeded rank bounds must be finite"));
        }
        if self.min_seeded_rank > self.max_seeded_rank {
            return Err(RankingError::configuration(format!(
                "min_seeded_rank ({}) is above max_seeded_rank ({})",
                self.min_seeded_rank, self.max_seeded_rank
            )));
        }
        if let Some((factor, _)) = self.seed_weights.0.iter().find(|(_, w)| !w.is_finite()) {
            return Err(RankingError::configuration(format!(
                "Seed weight for {} must be finite",
                factor.name()
            )));
        }
        if !(self.fixed_rating_deviation.is_finite() && self.fixed_rating_deviation > 0.0) {
            return Err(RankingError::configuration("fixed_rating_deviation must be positive"));
        }
        if !(self.elo_delta.is_finite() && self.elo_delta > 0.0) || !self.elo_k.is_finite() {
            return Err(RankingError::configuration("elo_k must be finite and elo_delta positive"));
        }
        if self.top_outlier_count == 0 || self.factor_bucket_size == 0 {
            return Err(RankingError::configuration(
                "top_outlier_count and factor_bucket_size must be at least 1",
            ));
        }
        if self.roster_size == 0 || self.core_overlap == 0 || self.core_overlap > self.roster_size {
            return Err(RankingError::configuration(
                "core_overlap must be between 1 and roster_size",
            ));
        }
        if !(self.time_decay_factor.is_finite() && self.time_decay_factor >= 0.0) {
            return Err(RankingError::configuration(format!(
                "time_decay_factor must be finite and non-negative, got {}",
                self.time_decay_factor
            )));
        }
        if self.time_grace_period < 0 || self.time_grace_period >= self.time_window {
            return Err(RankingError::configuration(
                "time_grace_period must be non-negative and shorter than time_window",
            ));
        }

        Ok(())
    }

    pub fn band(&self) -> RatingBand {
        RatingBand {
            min_seeded_rank: self.min_seeded_rank,
            max_seeded_rank: self.max_seeded_rank,
        }
    }

    pub fn time_window_ending_at(&self, end: i64) -> TimeWindow {
        TimeWindow {
            start: end - self.time_window,
            end,
            grace_period: self.time_grace_period,
            decay_factor: self.time_decay_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingBand {
    pub min_seeded_rank: f64,
    pub max_seeded_rank: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
    pub grace_period: i64,
    pub decay_factor: f64,
}

impl TimeWindow {
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }

    // 0 at the start of the window, 1 once inside the grace period before the end.
    pub fn time_mod(&self, time: i64) -> f64 {
        let full_weight_from = self.end - self.grace_period;
        let above = time.clamp(self.start, full_weight_from) - self.start;
        let below = full_weight_from - self.start;

        if below <= 0 {
            return 1.0;
        }

        ((above as f64) / (below as f64)).powf(self.decay_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::FactorValues;

    #[test]
    fn default_context_is_valid() {
        let ctx = RankingContext::default();
        assert!(ctx.validate().is_ok());
        assert_eq!(ctx.min_seeded_rank, 400.0);
        assert_eq!(ctx.max_seeded_rank, 1000.0);
        assert_eq!(ctx.fixed_rating_deviation, 75.0);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let ctx = RankingContext {
            min_seeded_rank: 1000.0,
            max_seeded_rank: 400.0,
            ..Default::default()
        };
        assert!(matches!(ctx.validate(), Err(RankingError::Configuration { .. })));
    }

    #[test]
    fn zero_deviation_is_rejected() {
        let ctx = RankingContext {
            fixed_rating_deviation: 0.0,
            ..Default::default()
        };
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn grace_period_must_fit_inside_window() {
        let ctx = RankingContext {
            time_window: 10,
            time_grace_period: 10,
            ..Default::default()
        };
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn time_mod_ramps_linearly_then_saturates() {
        let ctx = RankingContext {
            time_window: 200,
            time_grace_period: 100,
            ..Default::default()
        };
        let window = ctx.time_window_ending_at(1_000);

        assert_eq!(window.start, 800);
        assert_eq!(window.time_mod(800), 0.0);
        assert_eq!(window.time_mod(850), 0.5);
        assert_eq!(window.time_mod(900), 1.0);
        assert_eq!(window.time_mod(990), 1.0);
        assert_eq!(window.time_mod(10), 0.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let ctx: RankingContext = toml::from_str(
            "max_seeded_rank = 2000.0\n\n[seed_weights]\nownNetwork = 1.0\n",
        )
        .expect("valid toml");

        assert_eq!(ctx.max_seeded_rank, 2000.0);
        assert_eq!(ctx.min_seeded_rank, 400.0);
        assert_eq!(ctx.seed_weights.0.own_network, 1.0);
        // Factors missing from the table keep their default weight
        assert_eq!(ctx.seed_weights.0.bounty_collected, 1.0);
        assert_eq!(ctx.seed_weights.0.lan_factor, 0.5);
    }

    #[test]
    fn single_weight_override_leaves_other_factors_alone() {
        let ctx: RankingContext = toml::from_str("[seed_weights]\nlanFactor = 2.0\n").expect("valid toml");

        let expected = SeedWeights(FactorValues { lan_factor: 2.0, ..SeedWeights::default().0 });
        assert_eq!(ctx.seed_weights, expected);
        assert_eq!(ctx.seed_weights.sum(), 5.0);
    }

    #[test]
    fn missing_weight_table_uses_default_weights() {
        let ctx: RankingContext = toml::from_str("elo_k = 16.0\n").expect("valid toml");
        assert_eq!(ctx.seed_weights, SeedWeights::default());
    }

    #[test]
    fn decay_factor_must_be_finite_and_non_negative() {
        for decay in [-1.0, f64::NAN, f64::INFINITY] {
            let ctx = RankingContext { time_decay_factor: decay, ..Default::default() };
            assert!(matches!(ctx.validate(), Err(RankingError::Configuration { .. })), "decay {decay} accepted");
        }

        let flat = RankingContext { time_decay_factor: 0.0, ..Default::default() };
        assert!(flat.validate().is_ok());
    }
}
