//! JSON export of built datasets.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── big-5-european-leagues/
//!     └── 2024-2025/
//!         ├── outfield.json
//!         ├── goalkeeper.json
//!         └── outfield_la-liga.json   # scoped to one competition
//! ```

use crate::errors::HarvestError;
use crate::models::{Dataset, DatasetKind, Diagnostics, PlayerRecord};
use crate::utils::slugify;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// The document written for one dataset.
#[derive(Debug, Serialize)]
pub struct DatasetExport<'a> {
    pub league: &'a str,
    pub season: &'a str,
    pub competition: Option<&'a str>,
    pub kind: DatasetKind,
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub diagnostics: &'a Diagnostics,
    pub columns: &'a [String],
    pub records: &'a [PlayerRecord],
}

impl<'a> DatasetExport<'a> {
    pub fn new(
        league: &'a str,
        season: &'a str,
        competition: Option<&'a str>,
        dataset: &'a Dataset,
    ) -> Self {
        Self {
            league,
            season,
            competition,
            kind: dataset.kind,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            diagnostics: &dataset.diagnostics,
            columns: &dataset.columns,
            records: &dataset.records,
        }
    }

    /// `{dir}/{league}/{season}/{kind}[_{competition}].json`
    pub fn path(&self, json_output_dir: &Path) -> PathBuf {
        let file = match self.competition {
            Some(c) => format!("{}_{}.json", self.kind.name(), slugify(c)),
            None => format!("{}.json", self.kind.name()),
        };
        json_output_dir
            .join(slugify(self.league))
            .join(self.season)
            .join(file)
    }
}

/// Serialize `export` below `json_output_dir` and return the written path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display(), kind = export.kind.name()))]
pub async fn write_dataset(
    export: &DatasetExport<'_>,
    json_output_dir: &Path,
) -> Result<PathBuf, HarvestError> {
    let json = serde_json::to_string(export)?;
    let path = export.path(json_output_dir);

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(&path, json).await?;
    info!(path = %path.display(), records = export.records.len(), "Wrote dataset JSON");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerIdentity, Position, PositionDescriptor, Role, SecondaryRole};

    fn dataset() -> Dataset {
        Dataset {
            kind: DatasetKind::Outfield,
            columns: vec!["Goals".into(), "Assists".into()],
            records: vec![PlayerRecord {
                identity: PlayerIdentity {
                    name: "Pedri".into(),
                    nation: Some("ESP".into()),
                    position: Position::Known(PositionDescriptor {
                        primary: Role::Midfielder,
                        secondary: SecondaryRole::None,
                    }),
                    squad: "Barcelona".into(),
                    competition: "La Liga".into(),
                    age: Some(22),
                    born: Some(2002),
                },
                stats: vec![Some(4.0), None],
            }],
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_export_paths() {
        let data = dataset();
        let dir = Path::new("/out");
        let full = DatasetExport::new("Big 5 European Leagues", "2024-2025", None, &data);
        assert_eq!(
            full.path(dir),
            Path::new("/out/big-5-european-leagues/2024-2025/outfield.json")
        );
        let scoped = DatasetExport::new("Big 5 European Leagues", "2024-2025", Some("La Liga"), &data);
        assert_eq!(
            scoped.path(dir),
            Path::new("/out/big-5-european-leagues/2024-2025/outfield_la-liga.json")
        );
    }

    #[tokio::test]
    async fn test_write_dataset_round_trips_through_json() {
        let data = dataset();
        let dir = std::env::temp_dir().join(format!("fbref_harvest_json_{}", std::process::id()));
        let export = DatasetExport::new("La Liga", "2024-2025", None, &data);

        let path = write_dataset(&export, &dir).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["league"], "La Liga");
        assert_eq!(value["kind"], "outfield");
        assert_eq!(value["columns"][0], "Goals");
        assert_eq!(value["records"][0]["identity"]["nation"], "ESP");
        assert_eq!(value["records"][0]["stats"][1], serde_json::Value::Null);
        assert!(value["generated_at"].as_str().unwrap().ends_with('Z'));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
