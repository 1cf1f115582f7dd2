//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags or environment variables.

use crate::models::DatasetKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which datasets to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetChoice {
    Outfield,
    Goalkeeper,
    All,
}

impl DatasetChoice {
    pub fn kinds(self) -> &'static [DatasetKind] {
        match self {
            DatasetChoice::Outfield => &[DatasetKind::Outfield],
            DatasetChoice::Goalkeeper => &[DatasetKind::Goalkeeper],
            DatasetChoice::All => &[DatasetKind::Outfield, DatasetKind::Goalkeeper],
        }
    }
}

/// Harvest player statistics tables and write one merged dataset per role.
///
/// # Examples
///
/// ```sh
/// # Outfield players of one league
/// fbref_harvest --league "La Liga" --season 2024-2025 -j ./json
///
/// # Both datasets from the combined page, scoped to one competition
/// fbref_harvest --league "Big 5 European Leagues" --season 2023-2024 \
///     --dataset all --competition "Serie A" -j ./json
///
/// # What can be harvested
/// fbref_harvest --list-leagues
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// League or combined population, as listed by --list-leagues
    #[arg(short, long, env = "FBREF_LEAGUE", required_unless_present = "list_leagues")]
    pub league: Option<String>,

    /// Season, e.g. 2024-2025
    #[arg(short, long, env = "FBREF_SEASON", required_unless_present = "list_leagues")]
    pub season: Option<String>,

    /// Datasets to build
    #[arg(short, long, value_enum, default_value_t = DatasetChoice::Outfield)]
    pub dataset: DatasetChoice,

    /// Keep only players of this competition (e.g. "La Liga")
    #[arg(long)]
    pub competition: Option<String>,

    /// Output directory for the JSON files
    #[arg(short, long, env = "FBREF_JSON_DIR", default_value = "./json")]
    pub json_output_dir: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "FBREF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replacement field-map YAML (defaults to the built-in table)
    #[arg(long, env = "FBREF_FIELD_MAP")]
    pub field_map: Option<PathBuf>,

    /// Check that every category lists the same players in the same order
    #[arg(long)]
    pub verify_alignment: bool,

    /// Print the supported leagues and seasons, then exit
    #[arg(long)]
    pub list_leagues: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "fbref_harvest",
            "--league",
            "La Liga",
            "--season",
            "2024-2025",
            "--json-output-dir",
            "./out",
        ]);

        assert_eq!(cli.league.as_deref(), Some("La Liga"));
        assert_eq!(cli.season.as_deref(), Some("2024-2025"));
        assert_eq!(cli.dataset, DatasetChoice::Outfield);
        assert_eq!(cli.json_output_dir, PathBuf::from("./out"));
        assert!(!cli.verify_alignment);
    }

    #[test]
    fn test_cli_short_flags_and_dataset_choice() {
        let cli = Cli::parse_from([
            "fbref_harvest",
            "-l",
            "Big 5 European Leagues",
            "-s",
            "2023-2024",
            "-d",
            "all",
            "--competition",
            "Serie A",
            "--verify-alignment",
        ]);

        assert_eq!(cli.dataset.kinds(), [DatasetKind::Outfield, DatasetKind::Goalkeeper]);
        assert_eq!(cli.competition.as_deref(), Some("Serie A"));
        assert!(cli.verify_alignment);
    }

    #[test]
    fn test_list_leagues_needs_no_league() {
        let cli = Cli::try_parse_from(["fbref_harvest", "--list-leagues"]).unwrap();
        assert!(cli.list_leagues);
        assert!(cli.league.is_none());
    }

    #[test]
    fn test_rejects_unknown_dataset() {
        let result = Cli::try_parse_from([
            "fbref_harvest",
            "-l",
            "La Liga",
            "-s",
            "2024-2025",
            "-d",
            "referees",
        ]);
        assert!(result.is_err());
    }
}
