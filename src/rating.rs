//! Rating engine interface and the validating adapter the pipeline talks to.
//!
//! The engine itself is a swappable primitive: the pipeline never looks inside a rating state,
//! it only creates one per team, feeds it match outcomes and reads the rating back.

use tracing::trace;
use crate::error::{RankingError, Result};

/// A pairwise rating primitive.
pub trait RatingEngine {
    /// Per-team state owned by the caller and only ever touched through the engine.
    type State;

    /// Sets the single deviation parameter shared by every state.
    fn set_fixed_rd(&mut self, rd: f64);

    fn new_team(&self, rating: f64) -> Self::State;

    /// Updates both states for one ordered outcome. The update scales with `information_content`.
    fn single_match(&self, winner: &mut Self::State, loser: &mut Self::State, information_content: f64);

    fn rank(&self, state: &Self::State) -> f64;
}

/// Guards the engine against inputs that would silently corrupt every later rating.
#[derive(Debug, Clone)]
pub struct RatingEngineAdapter<E> {
    engine: E,
}

impl<E: RatingEngine> RatingEngineAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn configure(&mut self, fixed_rating_deviation: f64) -> Result<()> {
        if !(fixed_rating_deviation.is_finite() && fixed_rating_deviation > 0.0) {
            return Err(RankingError::configuration(format!(
                "Fixed rating deviation must be positive, got {fixed_rating_deviation}"
            )));
        }

        self.engine.set_fixed_rd(fixed_rating_deviation);
        Ok(())
    }

    pub fn new_rating_state(&self, initial_rating: f64) -> Result<E::State> {
        if !initial_rating.is_finite() {
            return Err(RankingError::InvalidRating { value: initial_rating });
        }

        Ok(self.engine.new_team(initial_rating))
    }

    pub fn apply_result(&self, winner: &mut E::State, loser: &mut E::State, information_content: f64) -> Result<()> {
        if !information_content.is_finite() || information_content < 0.0 {
            return Err(RankingError::InvalidInformationContent { value: information_content });
        }

        if information_content == 0.0 {
            trace!("Skipping match with zero information content");
            return Ok(());
        }

        self.engine.single_match(winner, loser, information_content);
        Ok(())
    }

    pub fn current_rating(&self, state: &E::State) -> f64 {
        self.engine.rank(state)
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }
}
