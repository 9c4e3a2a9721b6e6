use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use serde::*;
use serde_aux::field_attributes::deserialize_number_from_string;
use tracing::{debug, info, warn};
use crate::error::{RankingError, Result};
use crate::factors::compute_modifiers;
use crate::modifiers::Modifiers;
use crate::ranking_context::RankingContext;
use crate::region::Region;

/// Version value asking for the most recent snapshot available.
pub const LATEST_VERSION: i64 = -1;

const SNAPSHOT_PREFIX: &str = "matchdata_";

pub trait DataLoader {
    fn load_data(&self, version_timestamp: i64) -> Result<(Vec<Match>, Vec<Team>)>;
}

// Reads HLTV-style match dumps. The source is either one JSON file or a directory of
// matchdata_<version>.json snapshots.
#[derive(Debug, Clone)]
pub struct JsonDataLoader {
    source: PathBuf,
    ranking_context: RankingContext,
}

impl JsonDataLoader {
    pub fn new(source: impl Into<PathBuf>, ranking_context: RankingContext) -> Self {
        Self {
            source: source.into(),
            ranking_context,
        }
    }

    pub fn resolve_snapshot(&self, version_timestamp: i64) -> Result<PathBuf> {
        if self.source.is_file() {
            if version_timestamp == LATEST_VERSION || snapshot_version(&self.source) == Some(version_timestamp) {
                return Ok(self.source.clone());
            }
            return Err(RankingError::SnapshotNotFound {
                dir: self.source.clone(),
                version: version_timestamp,
            });
        }

        let entries = fs::read_dir(&self.source).map_err(|source| RankingError::Io {
            path: self.source.clone(),
            source,
        })?;

        let mut snapshots: Vec<(i64, PathBuf)> = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| RankingError::Io {
                    path: self.source.clone(),
                    source,
                })?
                .path();
            if let Some(version) = snapshot_version(&path) {
                snapshots.push((version, path));
            }
        }

        let chosen = if version_timestamp == LATEST_VERSION {
            snapshots.into_iter().max_by_key(|(version, _)| *version)
        } else {
            snapshots.into_iter().find(|(version, _)| *version == version_timestamp)
        };

        chosen
            .map(|(_, path)| path)
            .ok_or_else(|| RankingError::SnapshotNotFound {
                dir: self.source.clone(),
                version: version_timestamp,
            })
    }
}

impl DataLoader for JsonDataLoader {
    fn load_data(&self, version_timestamp: i64) -> Result<(Vec<Match>, Vec<Team>)> {
        let path = self.resolve_snapshot(version_timestamp)?;
        info!(path = %path.display(), "Loading match data");

        let data = fs::read_to_string(&path).map_err(|source| RankingError::Io {
            path: path.clone(),
            source,
        })?;
        let match_data: MatchData = serde_json::from_str(&data).map_err(|source| RankingError::Parse {
            path: path.clone(),
            source,
        })?;

        let dataset = build_dataset(match_data, &self.ranking_context)?;
        info!(
            matches = dataset.matches.len(),
            teams = dataset.teams.len(),
            events = dataset.events.len(),
            "Match data loaded"
        );

        Ok((dataset.matches, dataset.teams))
    }
}

fn snapshot_version(path: &Path) -> Option<i64> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(SNAPSHOT_PREFIX)?
        .parse()
        .ok()
}

#[derive(Debug)]
pub struct Dataset {
    pub matches: Vec<Match>,
    pub events: Vec<Event>,
    pub teams: Vec<Team>,
}

/*
    Turns a raw dump into teams and matches.
    Team and event references on the output matches are indices into the returned lists, so neither list should be reordered.
    Matches come out newest first: roster cores are discovered from the most recent lineup backwards.
*/
pub fn build_dataset(match_data: MatchData, ranking_context: &RankingContext) -> Result<Dataset> {
    let mut events: Vec<Event> = Vec::new();
    for json_event in match_data.events {
        if events.iter().any(|ev| ev.id == json_event.id) { continue; }
        events.push(Event::new(json_event));
    }
    let event_index: HashMap<usize, usize> = events.iter().enumerate().map(|(idx, ev)| (ev.id, idx)).collect();

    let Some(window_end) = match_data.matches.iter().map(|m| m.match_start_time).max() else {
        warn!("Snapshot contains no matches");
        return Ok(Dataset { matches: Vec::new(), events, teams: Vec::new() });
    };
    let window = ranking_context.time_window_ending_at(window_end);

    let mut kept: Vec<(JsonMatch, usize, WinningTeam)> = Vec::new();
    for m in match_data.matches {
        // Removes if not played in our time frame, or if either side didn't field a full roster.
        if     m.team_1_players.len() != ranking_context.roster_size
            || m.team_2_players.len() != ranking_context.roster_size
            || !window.contains(m.match_start_time) { continue; }

        let Some(&ev_index) = event_index.get(&m.event_id) else {
            warn!(event_id = m.event_id, "Match references unknown event, skipping");
            continue;
        };

        // Remove Showmatches (obviously imperfect)
        if events[ev_index].name.to_lowercase().contains("showmatch") { continue; }

        let winning_team = WinningTeam::try_from(m.winning_team)?;

        events[ev_index].last_match_time = i64::max(events[ev_index].last_match_time, m.match_start_time);
        kept.push((m, ev_index, winning_team));
    }

    kept.sort_by(|a, b| b.0.match_start_time.cmp(&a.0.match_start_time));

    let mut teams: Vec<Team> = Vec::new();
    let mut matches: Vec<Match> = Vec::with_capacity(kept.len());
    let mut event_rosters: HashMap<(usize, usize), usize> = HashMap::new();

    for (m, ev_index, winning_team) in kept {
        let team_one_idx = insert_team(&mut teams, &m.team_1_name, &m.team_1_players, ranking_context.core_overlap);
        let team_two_idx = insert_team(&mut teams, &m.team_2_name, &m.team_2_players, ranking_context.core_overlap);

        if team_one_idx == team_two_idx {
            warn!(team = %teams[team_one_idx].name, "Both lineups map to the same core, skipping match");
            continue;
        }

        // Prize distributions are keyed by the source's team ids; remember which core played under that id at this event
        event_rosters.entry((ev_index, m.team_1_id)).or_insert(team_one_idx);
        event_rosters.entry((ev_index, m.team_2_id)).or_insert(team_two_idx);

        matches.push(Match {
            team_1: team_one_idx,
            team_2: team_two_idx,
            winning_team,
            match_start_time: m.match_start_time,
            information_content: window.time_mod(m.match_start_time),
            event_id: ev_index,
            is_lan: events[ev_index].is_lan,
        });
    }

    for (ev_index, ev) in events.iter_mut().enumerate() {
        for pd in &mut ev.prize_distribution {
            pd.core_team = event_rosters.get(&(ev_index, pd.team_id)).copied();
        }
    }

    // Set matches played and distinct teams defeated. These are used to filter out teams at the very end
    let mut defeated: Vec<HashSet<usize>> = vec![HashSet::new(); teams.len()];
    for m in &matches {
        teams[m.team_1].matches_played += 1;
        teams[m.team_2].matches_played += 1;
        defeated[m.winner()].insert(m.loser());
    }
    for (team, beaten) in teams.iter_mut().zip(&defeated) {
        team.distinct_teams_defeated = beaten.len() as u32;
    }

    compute_modifiers(&mut teams, &matches, &events, &window, ranking_context);
    debug!(teams = teams.len(), "Seed modifiers computed");

    Ok(Dataset { matches, events, teams })
}

// Checks if the lineup shares a core with a known team. If not, adds it to the team list. Returns the index in the team list
pub fn insert_team(teams: &mut Vec<Team>, team_name: &str, team_players: &[Player], core_overlap: usize) -> usize {
    for (idx, t) in teams.iter().enumerate() {
        let similarity = t.roster
            .iter()
            .filter(|p1| team_players.iter().any(|p2| p1.player_id == p2.player_id))
            .count();

        // Same team for our purposes
        if similarity >= core_overlap {
            return idx;
        }
    }

    let id = teams.len();
    teams.push(Team::new(id, team_name.to_owned(), team_players.to_vec()));
    id
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MatchData {
    pub matches: Vec<JsonMatch>,
    pub events: Vec<JsonEvent>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonEvent {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "eventId"))]
    pub id: usize,
    #[serde(rename(deserialize = "eventName"))]
    pub name: String,
    #[serde(rename(deserialize = "lan"))]
    pub is_lan: bool,
    #[serde(rename(deserialize = "prizeDistribution"), default)]
    pub prize_distribution: Vec<PrizeDist>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonMatch {
    #[serde(rename(deserialize = "matchStartTime"))]
    pub match_start_time: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "team1Id"))]
    pub team_1_id: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "team2Id"))]
    pub team_2_id: usize,
    #[serde(rename(deserialize = "team1Name"))]
    pub team_1_name: String,
    #[serde(rename(deserialize = "team2Name"))]
    pub team_2_name: String,
    #[serde(rename(deserialize = "team1Players"))]
    pub team_1_players: Vec<Player>,
    #[serde(rename(deserialize = "team2Players"))]
    pub team_2_players: Vec<Player>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "eventId"))]
    pub event_id: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "winningTeam"))]
    pub winning_team: u8,
}

// Prize pool is a float because we only ever use it when multiplying with floats
#[derive(Debug, Clone)]
pub struct Event {
    pub id: usize,
    pub name: String,
    pub prize_pool: f64,
    pub prize_distribution: Vec<PrizeDist>,
    pub is_lan: bool,
    pub last_match_time: i64,
}

impl Event {
    pub fn new(json_event: JsonEvent) -> Self {
        let prize_pool = json_event.prize_distribution.iter().map(|pd| pd.prize).sum();

        Self {
            id: json_event.id,
            name: json_event.name,
            prize_pool,
            prize_distribution: json_event.prize_distribution,
            is_lan: json_event.is_lan,
            last_match_time: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrizeDist {
    pub placement: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "teamId"))]
    pub team_id: usize,
    #[serde(default)]
    pub prize: f64,
    #[serde(default)]
    pub shared: bool,
    // Index on the team list, once the placing roster has been matched to a core
    #[serde(skip)]
    pub core_team: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    #[serde(rename(deserialize = "playerId"))]
    pub player_id: u32,
    pub nick: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename(deserialize = "countryIso"), default)]
    pub country_iso: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WinningTeam {
    Team1,
    Team2,
}

impl TryFrom<u8> for WinningTeam {
    type Error = RankingError;

    fn try_from(indicator: u8) -> Result<Self> {
        match indicator {
            1 => Ok(WinningTeam::Team1),
            2 => Ok(WinningTeam::Team2),
            other => Err(RankingError::InvalidMatch {
                reason: format!("winningTeam must be 1 or 2, got {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub team_1: usize,
    pub team_2: usize,
    pub winning_team: WinningTeam,
    pub match_start_time: i64,
    pub information_content: f64,
    pub event_id: usize,
    pub is_lan: bool,
}

impl Match {
    pub fn winner(&self) -> usize {
        match self.winning_team {
            WinningTeam::Team1 => self.team_1,
            WinningTeam::Team2 => self.team_2,
        }
    }

    pub fn loser(&self) -> usize {
        match self.winning_team {
            WinningTeam::Team1 => self.team_2,
            WinningTeam::Team2 => self.team_1,
        }
    }
}

// Per won match, how much bounty it collected. Only used for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WonMatchContribution {
    pub match_start_time: i64,
    pub event_name: String,
    pub opponent: String,
    pub bounty: f64,
    pub opponent_winnings: f64,
    pub prize_pool: f64,
    pub stakes_modifier: f64,       // Prize pool against the reference pool of the window
    pub time_modifier: f64,
    pub information_content: f64,
}

// Per placing event, the prize money behind a team's bounty offered. Only used for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventContribution {
    pub event_id: usize,
    pub event_name: String,
    pub winnings: f64,
    pub discount: f64,
    pub discounted_winnings: f64,
    pub normalized_winnings: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub id: usize,
    pub name: String,
    pub region: Region,
    pub roster: Vec<Player>,
    pub modifiers: Modifiers,

    pub matches_played: u32,
    pub distinct_teams_defeated: u32,

    pub event_contributions: Vec<EventContribution>,
    pub won_match_contributions: Vec<WonMatchContribution>,
}

impl Team {
    pub fn new(id: usize, name: String, roster: Vec<Player>) -> Self {
        let region = Region::from_countries(roster.iter().map(|p| p.country_iso.as_str()));

        Self {
            id,
            name,
            region,
            roster,
            modifiers: Modifiers::default(),

            matches_played: 0,
            distinct_teams_defeated: 0,

            event_contributions: Vec::new(),
            won_match_contributions: Vec::new(),
        }
    }
}
