mod data_loader;
mod elo;
mod error;
mod factors;
mod glicko;
mod modifiers;
mod ranking;
mod ranking_context;
mod rating;
mod region;
mod replay;
mod report;
mod seeding;
mod util;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use data_loader::*;
use elo::Elo;
use glicko::FixedRdGlicko;
use ranking::RankingPipeline;
use ranking_context::RankingContext;
use rating::RatingEngine;
use region::{parse_regions, Region, ALL_REGIONS};
use report::*;

/*
    Seeds every team from its prize money and opponent network, then lets the match record move it from there.
    Prints the standings as a markdown table on stdout; logs go to stderr.
*/
#[derive(Parser)]
#[command(name = "regional_standings", version, about = "Seeded rating standings for competitive teams")]
struct Args {
    /// Regions to include, as a JSON list of region ids, e.g. [0,1,2]
    #[arg(value_name = "REGIONS")]
    regions: Option<String>,

    /// Snapshot file, or a directory of matchdata_<version>.json snapshots
    #[arg(short, long, value_name = "PATH", default_value = "data")]
    data: PathBuf,

    /// Snapshot version to rank; -1 picks the most recent one
    #[arg(long, value_name = "VERSION", default_value_t = LATEST_VERSION, allow_hyphen_values = true)]
    data_version: i64,

    /// Ranking configuration (TOML). Missing keys keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EngineKind::Glicko)]
    engine: EngineKind,

    /// Maximum number of teams shown; 0 shows all of them
    #[arg(long, value_name = "N")]
    max_teams: Option<usize>,

    /// Also write the displayed standings as CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Print the event and won-match breakdowns for this team
    #[arg(long, value_name = "NAME")]
    team: Option<String>,

    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    Glicko,
    Elo,
}

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let ranking_context = match &args.config {
        Some(path) => RankingContext::from_toml_file(path)?,
        None => RankingContext::default(),
    };

    let regions = match &args.regions {
        Some(raw) => parse_regions(raw)?,
        None => ALL_REGIONS.to_vec(),
    };

    match args.engine {
        EngineKind::Glicko => run(&args, ranking_context, regions, FixedRdGlicko::new()),
        EngineKind::Elo => {
            let elo = Elo::from_context(&ranking_context);
            run(&args, ranking_context, regions, elo)
        }
    }
}

fn run<E: RatingEngine>(args: &Args, ranking_context: RankingContext, regions: Vec<Region>, engine: E) -> Result<()> {
    let loader = JsonDataLoader::new(&args.data, ranking_context.clone());
    let mut pipeline = RankingPipeline::new(ranking_context, engine)?;

    // Parse matches and generate standings
    let standings = pipeline.generate_ranking(&loader, args.data_version)?;

    let mut options = ReportOptions::new(regions, pipeline.ranking_context());
    if let Some(max_teams) = args.max_teams {
        options.max_teams = (max_teams > 0).then_some(max_teams);
    }

    let rows = standings_rows(&standings.teams, &options);
    let date = standings.most_recent_match_time().and_then(report_date);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_standings(&mut out, &standings_title(&options.regions), date.as_deref(), &rows)?;

    if let Some(name) = &args.team {
        let rated = standings
            .teams
            .iter()
            .find(|t| t.team.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("Team '{name}' is not in the standings"))?;

        writeln!(out)?;
        write_event_contributions(&mut out, &rated.team)?;
        writeln!(out)?;
        write_won_match_contributions(&mut out, &rated.team, Some(10))?;
    }

    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_csv(file, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "Standings written as CSV");
    }

    Ok(())
}
