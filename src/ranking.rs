use tracing::{info, warn};
use crate::data_loader::{DataLoader, Match, Team};
use crate::error::Result;
use crate::ranking_context::RankingContext;
use crate::rating::{RatingEngine, RatingEngineAdapter};
use crate::replay::run_matches;
use crate::seeding::{seed_teams, RatedTeam};

/// Result of a ranking run: every match that was replayed, and the teams that qualify for the standings.
#[derive(Debug, Clone)]
pub struct Standings<S> {
    pub matches: Vec<Match>,
    pub teams: Vec<RatedTeam<S>>,
}

impl<S> Standings<S> {
    pub fn most_recent_match_time(&self) -> Option<i64> {
        self.matches.iter().map(|m| m.match_start_time).max()
    }
}

pub struct RankingPipeline<E: RatingEngine> {
    ranking_context: RankingContext,
    engine: RatingEngineAdapter<E>,
}

impl<E: RatingEngine> RankingPipeline<E> {
    pub fn new(ranking_context: RankingContext, engine: E) -> Result<Self> {
        ranking_context.validate()?;

        Ok(Self {
            ranking_context,
            engine: RatingEngineAdapter::new(engine),
        })
    }

    pub fn ranking_context(&self) -> &RankingContext {
        &self.ranking_context
    }

    #[cfg(test)]
    pub fn engine(&self) -> &RatingEngineAdapter<E> {
        &self.engine
    }

    // Loader failures are passed through untouched; a ranking is a pure function of one snapshot, so there is nothing to retry here.
    pub fn generate_ranking<L: DataLoader>(&mut self, loader: &L, version_timestamp: i64) -> Result<Standings<E::State>> {
        let (matches, teams) = loader.load_data(version_timestamp)?;
        self.rank(matches, teams)
    }

    pub fn rank(&mut self, mut matches: Vec<Match>, teams: Vec<Team>) -> Result<Standings<E::State>> {
        self.engine.configure(self.ranking_context.fixed_rating_deviation)?;

        // Apply seeding
        let mut teams = seed_teams(teams, &self.ranking_context, &self.engine)?;

        // Adjust rankings based on games played, oldest first. Stable, so same-time matches keep their loaded order
        matches.sort_by_key(|m| m.match_start_time);
        run_matches(&matches, &mut teams, &self.engine)?;

        // Remove rosters with no wins from the standings
        let seeded_count = teams.len();
        teams.retain(|t| t.team.distinct_teams_defeated > 0);
        if teams.is_empty() && seeded_count > 0 {
            warn!("No team has defeated an opponent, standings are empty");
        }

        info!(
            matches = matches.len(),
            ranked = teams.len(),
            excluded = seeded_count - teams.len(),
            "Ranking generated"
        );

        Ok(Standings { matches, teams })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::fixtures::{small_snapshot, team};
    use crate::data_loader::{build_dataset, MatchData, WinningTeam};
    use crate::error::RankingError;
    use crate::glicko::FixedRdGlicko;
    use crate::modifiers::Modifiers;
    use crate::rating::fake::FakeEngine;

    struct StaticLoader(serde_json::Value);

    impl DataLoader for StaticLoader {
        fn load_data(&self, _version_timestamp: i64) -> Result<(Vec<Match>, Vec<Team>)> {
            let data: MatchData = serde_json::from_value(self.0.clone()).unwrap();
            let dataset = build_dataset(data, &RankingContext::default())?;
            Ok((dataset.matches, dataset.teams))
        }
    }

    struct FailingLoader;

    impl DataLoader for FailingLoader {
        fn load_data(&self, version_timestamp: i64) -> Result<(Vec<Match>, Vec<Team>)> {
            Err(RankingError::SnapshotNotFound {
                dir: "missing".into(),
                version: version_timestamp,
            })
        }
    }

    fn game(team_1: usize, team_2: usize, winning_team: WinningTeam, time: i64) -> Match {
        Match {
            team_1,
            team_2,
            winning_team,
            match_start_time: time,
            information_content: 1.0,
            event_id: 0,
            is_lan: false,
        }
    }

    fn with_counters(mut t: Team, played: u32, defeated: u32) -> Team {
        t.matches_played = played;
        t.distinct_teams_defeated = defeated;
        t
    }

    #[test]
    fn two_team_scenario_moves_winner_up_and_loser_down() {
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FixedRdGlicko::new()).unwrap();

        let a = with_counters(team(0, Modifiers { bounty_collected: 100.0, ..Default::default() }), 1, 1);
        let b = with_counters(team(1, Modifiers::default()), 1, 0);
        let matches = vec![game(0, 1, WinningTeam::Team1, 10)];

        let standings = pipeline.rank(matches, vec![a, b]).unwrap();

        assert_eq!(pipeline.engine().engine().fixed_rd(), Some(75.0));
        assert_eq!(standings.matches.len(), 1);
        assert_eq!(standings.teams.len(), 1);

        let a = &standings.teams[0];
        assert_eq!(a.team.name, "team0");
        assert_eq!(a.seed.rank_value_seed, 1000.0);
        assert!(a.rank_value > a.seed.rank_value_seed);
    }

    #[test]
    fn loser_rating_drops_before_filtering() {
        // Same scenario, but the loser has a win elsewhere so it survives the filter
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FixedRdGlicko::new()).unwrap();

        let a = with_counters(team(0, Modifiers { bounty_collected: 100.0, ..Default::default() }), 1, 1);
        let b = with_counters(team(1, Modifiers::default()), 1, 1);
        let standings = pipeline.rank(vec![game(0, 1, WinningTeam::Team1, 10)], vec![a, b]).unwrap();

        let b = &standings.teams[1];
        assert_eq!(b.seed.rank_value_seed, 400.0);
        assert!(b.rank_value < b.seed.rank_value_seed);
        assert!(b.rating_delta() < 0.0);
    }

    #[test]
    fn winless_teams_never_reach_the_standings() {
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FakeEngine::new(500.0)).unwrap();

        // team2 has the best seed and gains the most rating, but never beat anyone on record
        let teams = vec![
            with_counters(team(0, Modifiers { bounty_collected: 0.2, ..Default::default() }), 3, 1),
            with_counters(team(1, Modifiers { bounty_collected: 0.1, ..Default::default() }), 3, 2),
            with_counters(team(2, Modifiers { bounty_collected: 1.0, ..Default::default() }), 3, 0),
        ];
        let matches = vec![
            game(2, 0, WinningTeam::Team1, 1),
            game(2, 1, WinningTeam::Team1, 2),
        ];

        let standings = pipeline.rank(matches, teams).unwrap();
        assert_eq!(standings.matches.len(), 2);
        assert!(standings.teams.iter().all(|t| t.team.distinct_teams_defeated > 0));
        assert!(standings.teams.iter().all(|t| t.team.id != 2));
    }

    #[test]
    fn matches_are_replayed_oldest_first() {
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FakeEngine::new(10.0)).unwrap();
        let teams = vec![
            with_counters(team(0, Modifiers::default()), 2, 1),
            with_counters(team(1, Modifiers::default()), 2, 1),
            with_counters(team(2, Modifiers::default()), 2, 1),
        ];
        // Loaded newest first, like the JSON loader produces them
        let matches = vec![
            game(2, 0, WinningTeam::Team1, 300),
            game(1, 2, WinningTeam::Team1, 200),
            game(0, 1, WinningTeam::Team1, 100),
        ];

        let standings = pipeline.rank(matches, teams).unwrap();

        let calls: Vec<(usize, usize)> = pipeline.engine().engine().calls.borrow().iter().map(|c| (c.0, c.1)).collect();
        assert_eq!(calls, vec![(0, 1), (1, 2), (2, 0)]);
        let times: Vec<i64> = standings.matches.iter().map(|m| m.match_start_time).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert_eq!(standings.most_recent_match_time(), Some(300));
    }

    #[test]
    fn sort_keeps_loaded_order_for_simultaneous_matches() {
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FakeEngine::new(10.0)).unwrap();
        let teams = vec![
            with_counters(team(0, Modifiers::default()), 2, 1),
            with_counters(team(1, Modifiers::default()), 2, 1),
        ];
        let matches = vec![game(1, 0, WinningTeam::Team1, 50), game(0, 1, WinningTeam::Team1, 50)];

        pipeline.rank(matches, teams).unwrap();

        let calls: Vec<(usize, usize)> = pipeline.engine().engine().calls.borrow().iter().map(|c| (c.0, c.1)).collect();
        assert_eq!(calls, vec![(1, 0), (0, 1)]);
    }

    #[test]
    fn repeated_runs_agree() {
        let loader = StaticLoader(small_snapshot());
        let run = || {
            let mut pipeline = RankingPipeline::new(RankingContext::default(), FixedRdGlicko::new()).unwrap();
            let standings = pipeline.generate_ranking(&loader, -1).unwrap();
            standings.teams.iter().map(|t| (t.team.name.clone(), t.rank_value)).collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first, run());
        // Charlie never won, so only Alpha and Bravo are ranked
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|(name, _)| name != "Charlie"));
    }

    #[test]
    fn loader_errors_pass_through() {
        let mut pipeline = RankingPipeline::new(RankingContext::default(), FixedRdGlicko::new()).unwrap();
        let err = pipeline.generate_ranking(&FailingLoader, 42).unwrap_err();
        assert!(matches!(err, RankingError::SnapshotNotFound { version: 42, .. }));
    }

    #[test]
    fn invalid_context_is_rejected_up_front() {
        let ctx = RankingContext { fixed_rating_deviation: -5.0, ..Default::default() };
        assert!(RankingPipeline::new(ctx, FixedRdGlicko::new()).is_err());
    }

    #[test]
    fn alternate_weights_change_the_seed_order() {
        let teams = || vec![
            with_counters(team(0, Modifiers { bounty_collected: 1.0, ..Default::default() }), 1, 1),
            with_counters(team(1, Modifiers { own_network: 1.0, ..Default::default() }), 1, 1),
        ];

        let mut standard = RankingPipeline::new(RankingContext::default(), FakeEngine::new(0.0)).unwrap();
        let standings = standard.rank(Vec::new(), teams()).unwrap();
        assert!(standings.teams[0].seed.rank_value_seed > standings.teams[1].seed.rank_value_seed);

        let mut ctx = RankingContext::default();
        ctx.seed_weights.0.bounty_collected = 0.0;
        ctx.seed_weights.0.own_network = 1.0;
        let mut network_only = RankingPipeline::new(ctx, FakeEngine::new(0.0)).unwrap();
        let standings = network_only.rank(Vec::new(), teams()).unwrap();
        assert!(standings.teams[0].seed.rank_value_seed < standings.teams[1].seed.rank_value_seed);
    }
}
