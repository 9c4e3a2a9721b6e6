use std::collections::HashMap;
use tracing::debug;
use crate::data_loader::Match;
use crate::error::{RankingError, Result};
use crate::rating::{RatingEngine, RatingEngineAdapter};
use crate::seeding::RatedTeam;
use crate::util::pair_mut;

// Feeds every match to the engine in the order given, then reads each team's rating back.
// Sequence matters to any incremental rating system, so callers are responsible for ordering the slice.
pub fn run_matches<E: RatingEngine>(
    matches: &[Match],
    teams: &mut [RatedTeam<E::State>],
    engine: &RatingEngineAdapter<E>,
) -> Result<()> {
    let positions: HashMap<usize, usize> = teams.iter().enumerate().map(|(pos, t)| (t.team.id, pos)).collect();
    let resolve = |match_index: usize, team_id: usize| {
        positions
            .get(&team_id)
            .copied()
            .ok_or(RankingError::UnknownTeam { match_index, team_id })
    };

    for (match_index, m) in matches.iter().enumerate() {
        let winner = resolve(match_index, m.winner())?;
        let loser = resolve(match_index, m.loser())?;
        if winner == loser {
            return Err(RankingError::SelfMatch { match_index, team_id: m.winner() });
        }

        let (win_team, lose_team) = pair_mut(teams, winner, loser);
        engine.apply_result(&mut win_team.rating_state, &mut lose_team.rating_state, m.information_content)?;
    }

    for t in teams.iter_mut() {
        t.rank_value = engine.current_rating(&t.rating_state);
    }
    debug!(matches = matches.len(), teams = teams.len(), "Replayed matches");

    Ok(())
}
