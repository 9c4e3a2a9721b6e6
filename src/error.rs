//! Error types for the ranking run.
//!
//! Every failure is fatal to the current run; nothing here is retried.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RankingError>;

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid information content {value}: must be finite and non-negative")]
    InvalidInformationContent { value: f64 },

    #[error("Invalid initial rating {value}")]
    InvalidRating { value: f64 },

    #[error("Team '{team}' has a non-finite {factor} modifier ({value})")]
    InvalidModifier {
        team: String,
        factor: &'static str,
        value: f64,
    },

    #[error("Match {match_index} references unknown team {team_id}")]
    UnknownTeam { match_index: usize, team_id: usize },

    #[error("Match {match_index} pits team {team_id} against itself")]
    SelfMatch { match_index: usize, team_id: usize },

    #[error("Invalid match record: {reason}")]
    InvalidMatch { reason: String },

    #[error("Invalid region list '{input}': {reason}")]
    InvalidRegions { input: String, reason: String },

    #[error("No data snapshot with version {version} in {}", dir.display())]
    SnapshotNotFound { dir: PathBuf, version: i64 },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl RankingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
