//! Canonical field-name table.
//!
//! The table is a versioned YAML artifact (`assets/field_map.yaml`) rather
//! than code, so schema drift on the source side is fixed by editing data. The
//! shipped file is embedded at build time; a replacement can be loaded from
//! disk at startup.

use crate::errors::HarvestError;
use crate::models::Category;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, instrument};

const EMBEDDED: &str = include_str!("../../assets/field_map.yaml");

#[derive(Debug, Deserialize)]
struct FieldMapDocument {
    version: u32,
    categories: BTreeMap<Category, BTreeMap<String, String>>,
}

/// Lookup from flattened key to canonical field name.
#[derive(Debug, Clone)]
pub struct FieldMap {
    version: u32,
    entries: HashMap<String, String>,
}

impl FieldMap {
    /// The table shipped with the binary.
    pub fn embedded() -> Result<Self, HarvestError> {
        Self::from_yaml(EMBEDDED)
    }

    /// Parse a field-map document.
    ///
    /// # Arguments
    ///
    /// * `text` - YAML with a `version` and, per category, a mapping from the
    ///   published label (`"Gls (Performance)"`) to its canonical name.
    ///
    /// # Returns
    ///
    /// The map keyed by flattened key, or `HarvestError::FieldMap` when a label
    /// maps to an empty name.
    pub fn from_yaml(text: &str) -> Result<Self, HarvestError> {
        let doc: FieldMapDocument = serde_yaml::from_str(text)?;
        let mut entries = HashMap::new();

        for (category, fields) in doc.categories {
            for (published, canonical) in fields {
                let canonical = canonical.trim();
                if canonical.is_empty() {
                    return Err(HarvestError::FieldMap(format!(
                        "'{published}' in {category} maps to an empty name"
                    )));
                }
                entries.insert(flattened_key(&published, category), canonical.to_string());
            }
        }

        Ok(Self {
            version: doc.version,
            entries,
        })
    }

    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let map = Self::from_yaml(&text)?;
        info!(version = map.version, entries = map.len(), "Loaded field map");
        Ok(map)
    }

    /// Canonical name for a flattened key, `None` when the key is unmapped.
    pub fn canonical(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// `"Gls (Performance)"` in Standard Stats becomes
/// `"Gls (Performance - Standard Stats)"`; a bare label gets `"(<category>)"`.
fn flattened_key(published: &str, category: Category) -> String {
    match published.strip_suffix(')') {
        Some(head) if head.contains(" (") => format!("{head} - {category})"),
        _ => format!("{published} ({category})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_map_loads() {
        let map = FieldMap::embedded().unwrap();
        assert_eq!(map.version(), 1);
        assert_eq!(
            map.canonical("Gls (Performance - Standard Stats)"),
            Some("Goals")
        );
        assert_eq!(
            map.canonical("Player (Unnamed: 1_level_0 - Advanced Goalkeeping)"),
            Some("Player")
        );
        assert_eq!(
            map.canonical("On-Off (Team Success (xG) - Playing Time)"),
            Some("OnOffExpectedGoalsPer90")
        );
        assert_eq!(
            map.canonical("Att (GK) (Passes - Advanced Goalkeeping)"),
            Some("GoalkeeperPassesAttempted")
        );
        assert_eq!(map.canonical("Gls (Performance - Shooting)"), None);
    }

    #[test]
    fn test_every_category_maps_identity_columns() {
        let map = FieldMap::embedded().unwrap();
        for category in Category::ALL {
            for (field, position, canonical) in [
                ("Player", 1, "Player"),
                ("Nation", 2, "Nation"),
                ("Pos", 3, "Position"),
                ("Squad", 4, "Squad"),
                ("Comp", 5, "Competition"),
                ("Age", 6, "Age"),
                ("Born", 7, "Born"),
            ] {
                let key = format!("{field} (Unnamed: {position}_level_0 - {category})");
                assert_eq!(map.canonical(&key), Some(canonical), "{key}");
            }
        }
    }

    #[test]
    fn test_single_level_entries() {
        let yaml = "version: 3\ncategories:\n  Shooting:\n    Gls: Goals\n";
        let map = FieldMap::from_yaml(yaml).unwrap();
        assert_eq!(map.canonical("Gls (Shooting)"), Some("Goals"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_rejects_empty_names_and_unknown_categories() {
        let yaml = "version: 1\ncategories:\n  Shooting:\n    \"Gls (Standard)\": \"  \"\n";
        assert!(matches!(
            FieldMap::from_yaml(yaml),
            Err(HarvestError::FieldMap(_))
        ));

        let yaml = "version: 1\ncategories:\n  Set Pieces:\n    \"Gls (Standard)\": Goals\n";
        assert!(matches!(FieldMap::from_yaml(yaml), Err(HarvestError::Yaml(_))));
    }
}
