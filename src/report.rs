use std::io::Write;
use chrono::DateTime;
use chrono_tz::America::Los_Angeles;
use serde::Serialize;
use crate::data_loader::Team;
use crate::error::Result;
use crate::ranking_context::RankingContext;
use crate::region::Region;
use crate::seeding::RatedTeam;

pub const DATA_CREDIT: &str = "_Event data for Regional Standings provided by HLTV.org_";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub regions: Vec<Region>,
    pub max_teams: Option<usize>,
    pub min_matches_played: u32,
}

impl ReportOptions {
    pub fn new(regions: Vec<Region>, ranking_context: &RankingContext) -> Self {
        Self {
            regions,
            max_teams: Some(ranking_context.max_teams_displayed),
            min_matches_played: ranking_context.min_matches_for_display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub standing: usize,
    pub team_name: String,
    pub region: u8,
    pub matches_played: u32,
    pub bounty_collected: f64,
    pub bounty_offered: f64,
    pub opponent_network: f64,
    pub lan_factor: f64,
    pub seed: f64,
    pub delta: f64,
    pub points: f64,
}

/*
    Sorted by rank value, highest first. Ties keep their incoming order.
    The cap applies to the position in the full sorted list, before any filtering: a regional
    table only shows teams that are also inside the overall top `max_teams`.
*/
pub fn standings_rows<S>(teams: &[RatedTeam<S>], options: &ReportOptions) -> Vec<StandingRow> {
    let mut sorted: Vec<&RatedTeam<S>> = teams.iter().collect();
    sorted.sort_by(|a, b| b.rank_value.total_cmp(&a.rank_value));

    let max_teams = options.max_teams.unwrap_or(usize::MAX);
    sorted
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| *idx < max_teams)
        .map(|(_, t)| t)
        .filter(|t| t.team.matches_played >= options.min_matches_played)
        .filter(|t| options.regions.contains(&t.team.region))
        .enumerate()
        .map(|(i, t)| {
            let contributions = &t.seed.rank_value_contributions;
            StandingRow {
                standing: i + 1,
                team_name: t.team.name.clone(),
                region: t.team.region.0,
                matches_played: t.team.matches_played,
                bounty_collected: contributions.bounty_collected,
                bounty_offered: contributions.bounty_offered,
                opponent_network: contributions.opponent_network,
                lan_factor: contributions.lan_factor,
                seed: t.seed.rank_value_seed,
                delta: t.rating_delta(),
                points: t.rank_value,
            }
        })
        .collect()
}

pub fn standings_title(regions: &[Region]) -> String {
    match regions {
        [region] => format!("Regional Standings for {region}"),
        _ => "Standings".to_string(),
    }
}

// Calendar day of the timestamp in Los Angeles, where the standings are published
pub fn report_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.with_timezone(&Los_Angeles).format("%Y-%m-%d").to_string())
}

pub fn write_standings<W: Write>(out: &mut W, title: &str, date: Option<&str>, rows: &[StandingRow]) -> std::io::Result<()> {
    match date {
        Some(date) => writeln!(out, "### {title} as of {date}")?,
        None => writeln!(out, "### {title}")?,
    }
    writeln!(out)?;

    let mut table = MarkdownTable::new(&[
        ("Standing", true),
        ("Team Name", false),
        ("Col", true),
        ("Off", true),
        ("Opp", true),
        ("LAN", true),
        ("Init", true),
        ("+-", true),
        ("Points", true),
    ]);
    for r in rows {
        table.push(vec![
            r.standing.to_string(),
            r.team_name.clone(),
            format!("{:.0}", r.bounty_collected),
            format!("{:.0}", r.bounty_offered),
            format!("{:.0}", r.opponent_network),
            format!("{:.0}", r.lan_factor),
            format!("{:.0}", r.seed),
            format!("{:.0}", r.delta),
            format!("{:.0}", r.points),
        ]);
    }
    table.write(out)?;

    writeln!(out)?;
    writeln!(out, "{DATA_CREDIT}")
}

// Won matches for one team, biggest bounty first
pub fn write_won_match_contributions<W: Write>(out: &mut W, team: &Team, max_matches: Option<usize>) -> std::io::Result<()> {
    writeln!(out, "### Match contribution for {}", team.name)?;
    writeln!(out)?;

    let mut won: Vec<_> = team.won_match_contributions.iter().collect();
    won.sort_by(|a, b| b.bounty.total_cmp(&a.bounty));

    let mut table = MarkdownTable::new(&[
        ("Standing", true),
        ("Event", false),
        ("Opponent", false),
        ("BtyCol", true),
        ("OppBty", true),
        ("PP ($k)", true),
        ("Stake", true),
        ("Time", true),
        ("Modi", true),
    ]);
    for (i, c) in won.into_iter().take(max_matches.unwrap_or(usize::MAX)).enumerate() {
        table.push(vec![
            (i + 1).to_string(),
            c.event_name.clone(),
            c.opponent.clone(),
            format!("{:.3}", c.bounty),
            format!("{:.3}", c.opponent_winnings),
            format!("{:.0}", c.prize_pool / 1000.0),
            format!("{:.3}", c.stakes_modifier),
            format!("{:.3}", c.time_modifier),
            format!("{:.3}", c.information_content),
        ]);
    }
    table.write(out)
}

// Prize money behind the bounty offered, one row per placing event, least discounted first
pub fn write_event_contributions<W: Write>(out: &mut W, team: &Team) -> std::io::Result<()> {
    writeln!(out, "### Event contribution for {}", team.name)?;
    writeln!(out)?;

    let mut events: Vec<_> = team.event_contributions.iter().collect();
    events.sort_by(|a, b| b.discount.total_cmp(&a.discount));

    let mut table = MarkdownTable::new(&[
        ("Standing", true),
        ("Event Name", false),
        ("Raw ($k)", true),
        ("Disc.", true),
        ("D.w. ($k)", true),
        ("Norm. win", true),
    ]);
    for (i, c) in events.into_iter().enumerate() {
        table.push(vec![
            (i + 1).to_string(),
            c.event_name.clone(),
            format!("{:.1}", c.winnings / 1000.0),
            format!("{:.3}", c.discount),
            format!("{:.2}", c.discounted_winnings / 1000.0),
            format!("{:.2}", c.normalized_winnings),
        ]);
    }
    table.write(out)
}

pub fn write_csv<W: Write>(out: W, rows: &[StandingRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

struct MarkdownTable {
    headers: Vec<(&'static str, bool)>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    fn new(headers: &[(&'static str, bool)]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let widths: Vec<usize> = self.headers
            .iter()
            .enumerate()
            .map(|(col, (title, _))| {
                self.rows
                    .iter()
                    .map(|r| r[col].chars().count())
                    .chain([title.chars().count(), 3])
                    .max()
                    .unwrap_or(3)
            })
            .collect();

        let header: Vec<String> = self.headers
            .iter()
            .zip(&widths)
            .map(|((title, numeric), w)| pad(title, *w, *numeric))
            .collect();
        writeln!(out, "| {} |", header.join(" | "))?;

        let separator: Vec<String> = self.headers
            .iter()
            .zip(&widths)
            .map(|((_, numeric), w)| if *numeric { format!("{}:", "-".repeat(w - 1)) } else { "-".repeat(*w) })
            .collect();
        writeln!(out, "| {} |", separator.join(" | "))?;

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&self.headers)
                .zip(&widths)
                .map(|((cell, (_, numeric)), w)| pad(cell, *w, *numeric))
                .collect();
            writeln!(out, "| {} |", cells.join(" | "))?;
        }

        Ok(())
    }
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::fixtures::team;
    use crate::data_loader::{EventContribution, WonMatchContribution};
    use crate::modifiers::{FactorValues, Modifiers};
    use crate::region::{AMERICAS, ASIA, EUROPE};
    use crate::seeding::Seed;

    fn rated(id: usize, region: Region, played: u32, rank_value: f64) -> RatedTeam<()> {
        let mut t = team(id, Modifiers::default());
        t.region = region;
        t.matches_played = played;
        t.distinct_teams_defeated = 1;

        RatedTeam {
            team: t,
            seed: Seed {
                seed_value: 0.0,
                rank_value_seed: 700.0,
                rank_value_contributions: FactorValues { bounty_collected: 200.0, lan_factor: 100.0, ..Default::default() },
                modifier_ratings: FactorValues::default(),
            },
            rating_state: (),
            rank_value,
        }
    }

    fn options(regions: Vec<Region>, max_teams: Option<usize>) -> ReportOptions {
        ReportOptions { regions, max_teams, min_matches_played: 5 }
    }

    #[test]
    fn rows_are_sorted_descending_with_stable_ties() {
        let teams = vec![rated(0, EUROPE, 10, 650.0), rated(1, EUROPE, 10, 900.0), rated(2, EUROPE, 10, 650.0)];
        let rows = standings_rows(&teams, &options(vec![EUROPE], None));

        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["team1", "team0", "team2"]);
        assert_eq!(rows[0].standing, 1);
        assert_eq!(rows[2].standing, 3);
        assert_eq!(rows[0].delta, 200.0);
    }

    #[test]
    fn rows_filter_region_and_matches_played() {
        let teams = vec![
            rated(0, EUROPE, 10, 800.0),
            rated(1, AMERICAS, 10, 900.0),
            rated(2, EUROPE, 4, 950.0),
            rated(3, ASIA, 5, 700.0),
        ];
        let rows = standings_rows(&teams, &options(vec![EUROPE, ASIA], None));

        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["team0", "team3"]);
    }

    #[test]
    fn max_teams_caps_displayed_rows() {
        let teams: Vec<_> = (0..30)
            .map(|i| rated(i, if i % 2 == 0 { EUROPE } else { AMERICAS }, 10, 1000.0 - i as f64))
            .collect();
        assert_eq!(standings_rows(&teams, &options(vec![EUROPE, AMERICAS], Some(20))).len(), 20);
        assert_eq!(standings_rows(&teams, &options(vec![EUROPE, AMERICAS], None)).len(), 30);
        // Half of the overall top 20 is European
        assert_eq!(standings_rows(&teams, &options(vec![EUROPE], Some(20))).len(), 10);
        assert_eq!(standings_rows(&teams, &options(vec![EUROPE], None)).len(), 15);
    }

    #[test]
    fn max_teams_counts_the_overall_position() {
        let teams = vec![
            rated(0, AMERICAS, 10, 1000.0),
            rated(1, AMERICAS, 10, 990.0),
            rated(2, EUROPE, 10, 980.0),
            rated(3, EUROPE, 10, 970.0),
        ];

        // Both European teams sit below the overall top two
        assert!(standings_rows(&teams, &options(vec![EUROPE], Some(2))).is_empty());

        let rows = standings_rows(&teams, &options(vec![EUROPE], Some(3)));
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["team2"]);
        assert_eq!(rows[0].standing, 1);

        let rows = standings_rows(&teams, &options(vec![EUROPE, AMERICAS], Some(3)));
        let standings: Vec<usize> = rows.iter().map(|r| r.standing).collect();
        assert_eq!(standings, vec![1, 2, 3]);
    }

    #[test]
    fn capped_rows_skip_filtered_teams_without_refilling() {
        let teams = vec![
            rated(0, EUROPE, 10, 1000.0),
            rated(1, EUROPE, 2, 990.0),
            rated(2, EUROPE, 10, 980.0),
        ];

        // team1 takes an overall slot even though it has too few matches to be shown
        let rows = standings_rows(&teams, &options(vec![EUROPE], Some(2)));
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["team0"]);
    }

    #[test]
    fn title_names_single_region() {
        assert_eq!(standings_title(&[EUROPE]), "Regional Standings for Europe");
        assert_eq!(standings_title(&[EUROPE, AMERICAS, ASIA]), "Standings");
    }

    #[test]
    fn report_date_uses_los_angeles_day() {
        assert_eq!(report_date(1693330518).as_deref(), Some("2023-08-29"));
        // 2023-08-29T01:00Z is still the evening of the 28th on the west coast
        assert_eq!(report_date(1693270800).as_deref(), Some("2023-08-28"));
        // Winter time: 2024-01-15T07:30Z is 23:30 on the 14th
        assert_eq!(report_date(1705303800).as_deref(), Some("2024-01-14"));
    }

    #[test]
    fn markdown_contains_header_rows_and_credit() {
        let teams = vec![rated(0, EUROPE, 10, 812.4)];
        let rows = standings_rows(&teams, &options(vec![EUROPE], None));

        let mut out = Vec::new();
        write_standings(&mut out, "Standings", Some("2023-08-29"), &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("### Standings as of 2023-08-29\n"));
        assert!(text.contains("| Standing | Team Name | Col |"));
        assert!(text.contains("| team0 "));
        assert!(text.contains(" 812 |"));
        assert!(text.trim_end().ends_with(DATA_CREDIT));
    }

    #[test]
    fn won_matches_listed_by_bounty() {
        let mut t = team(0, Modifiers::default());
        for (opponent, bounty) in [("Low", 0.1), ("High", 0.9), ("Mid", 0.5)] {
            t.won_match_contributions.push(WonMatchContribution {
                match_start_time: 0,
                event_name: "Major".to_string(),
                opponent: opponent.to_string(),
                bounty,
                opponent_winnings: bounty,
                prize_pool: 250_000.0,
                stakes_modifier: 0.625,
                time_modifier: 0.8,
                information_content: 0.8,
            });
        }

        let mut out = Vec::new();
        write_won_match_contributions(&mut out, &t, Some(2)).unwrap();
        let text = String::from_utf8(out).unwrap();

        let high = text.find("High").unwrap();
        let mid = text.find("Mid").unwrap();
        assert!(high < mid);
        assert!(!text.contains("Low"));
        assert!(text.contains("| Stake |  Time |  Modi |"));
        assert!(text.contains("| 0.625 | 0.800 | 0.800 |"));
    }

    #[test]
    fn event_contributions_listed_by_discount() {
        let mut t = team(0, Modifiers::default());
        for (event_id, (name, discount)) in [("Old Cup", 0.25), ("Fresh Major", 1.0), ("Spring Open", 0.5)].into_iter().enumerate() {
            t.event_contributions.push(EventContribution {
                event_id,
                event_name: name.to_string(),
                winnings: 20_000.0,
                discount,
                discounted_winnings: 20_000.0 * discount,
                normalized_winnings: discount,
            });
        }

        let mut out = Vec::new();
        write_event_contributions(&mut out, &t).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("### Event contribution for team0\n"));
        assert!(text.contains("| Raw ($k) | Disc. | D.w. ($k) | Norm. win |"));
        let fresh = text.find("Fresh Major").unwrap();
        let spring = text.find("Spring Open").unwrap();
        let old = text.find("Old Cup").unwrap();
        assert!(fresh < spring && spring < old);
        assert!(text.contains("|     20.0 | 0.250 |      5.00 |      0.25 |"));
    }

    #[test]
    fn csv_export_has_header_and_one_line_per_row() {
        let teams = vec![rated(0, EUROPE, 10, 800.0), rated(1, EUROPE, 10, 750.0)];
        let rows = standings_rows(&teams, &options(vec![EUROPE], None));

        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("standing,team_name,region,matches_played"));
        assert!(lines[1].starts_with("1,team0,0,10,"));
    }
}
