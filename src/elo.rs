use tracing::debug;
use crate::ranking_context::RankingContext;
use crate::rating::RatingEngine;

// Plain logistic Elo. It has no notion of deviation, so set_fixed_rd is accepted and ignored.
#[derive(Debug, Clone)]
pub struct Elo {
    pub k: f64,
    pub delta: f64,
}

impl Elo {
    pub fn new(k: f64, delta: f64) -> Self {
        Self { k, delta }
    }

    pub fn from_context(ranking_context: &RankingContext) -> Self {
        Self::new(ranking_context.elo_k, ranking_context.elo_delta)
    }

    // Points moved from loser to winner for a full-weight result
    pub fn elo_result(&self, winner_elo: f64, loser_elo: f64) -> f64 {
        self.k * (1.0 - 1.0 / (1.0 + f64::powf(10.0, (loser_elo - winner_elo) / self.delta)))
    }
}

impl RatingEngine for Elo {
    type State = f64;

    fn set_fixed_rd(&mut self, rd: f64) {
        debug!(rd, "Elo engine has no rating deviation, ignoring");
    }

    fn new_team(&self, rating: f64) -> f64 {
        rating
    }

    fn single_match(&self, winner: &mut f64, loser: &mut f64, information_content: f64) {
        let elo_diff = self.elo_result(*winner, *loser) * information_content;

        *winner += elo_diff;
        *loser -= elo_diff;
    }

    fn rank(&self, state: &f64) -> f64 {
        *state
    }
}
