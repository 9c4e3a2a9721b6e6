//! Glicko-1 with an optional fixed rating deviation.
//!
//! With the deviation pinned, every state moves at the same speed and the system behaves like an
//! Elo variant whose step size is derived from the deviation instead of a K-factor.

use std::f64::consts::{LN_10, PI};
use crate::rating::RatingEngine;

const Q: f64 = LN_10 / 400.0;
const DEFAULT_RD: f64 = 350.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlickoTeam {
    pub rating: f64,
    pub rd: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FixedRdGlicko {
    fixed_rd: Option<f64>,
}

impl FixedRdGlicko {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn fixed_rd(&self) -> Option<f64> {
        self.fixed_rd
    }

    // Rating change and post-match deviation for one side of a result.
    fn update(&self, team: &GlickoTeam, opponent: &GlickoTeam, score: f64, information_content: f64) -> (f64, f64) {
        let g_opp = g(opponent.rd);
        let e = expected(team.rating, opponent.rating, g_opp);
        let d_squared = 1.0 / (Q * Q * g_opp * g_opp * e * (1.0 - e));

        let precision = 1.0 / (team.rd * team.rd) + 1.0 / d_squared;
        let delta = Q / precision * g_opp * (score - e) * information_content;

        let rd = match self.fixed_rd {
            Some(rd) => rd,
            None => (1.0 / (1.0 / (team.rd * team.rd) + information_content / d_squared)).sqrt(),
        };

        (delta, rd)
    }
}

impl RatingEngine for FixedRdGlicko {
    type State = GlickoTeam;

    fn set_fixed_rd(&mut self, rd: f64) {
        self.fixed_rd = Some(rd);
    }

    fn new_team(&self, rating: f64) -> GlickoTeam {
        GlickoTeam {
            rating,
            rd: self.fixed_rd.unwrap_or(DEFAULT_RD),
        }
    }

    fn single_match(&self, winner: &mut GlickoTeam, loser: &mut GlickoTeam, information_content: f64) {
        // Both sides are computed from pre-match values
        let (win_delta, win_rd) = self.update(winner, loser, 1.0, information_content);
        let (lose_delta, lose_rd) = self.update(loser, winner, 0.0, information_content);

        winner.rating += win_delta;
        winner.rd = win_rd;
        loser.rating += lose_delta;
        loser.rd = lose_rd;
    }

    fn rank(&self, state: &GlickoTeam) -> f64 {
        state.rating
    }
}

fn g(rd: f64) -> f64 {
    1.0 / (1.0 + 3.0 * Q * Q * rd * rd / (PI * PI)).sqrt()
}

fn expected(rating: f64, opponent_rating: f64, g_opp: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-g_opp * (rating - opponent_rating) / 400.0))
}
