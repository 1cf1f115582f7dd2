//! Error taxonomy for the harvesting pipeline.
//!
//! Fatal conditions are variants of [`HarvestError`]. Per-column schema drift
//! and per-cell coercion failures are not errors; they degrade gracefully and
//! are reported through [`crate::models::Diagnostics`].

use crate::models::Category;
use std::io;
use thiserror::Error;

/// Every way a fetch, merge or dataset build can fail.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("source for '{category}' is unavailable at {url}: {reason}")]
    SourceUnavailable {
        category: Category,
        url: String,
        reason: String,
    },
    #[error("no usable '{category}' table at {url}: {reason}")]
    TableNotFound {
        category: Category,
        url: String,
        reason: String,
    },
    #[error("cannot merge '{category}': {details}")]
    MergeAlignment { category: Category, details: String },
    #[error("unrecognized position token '{token}' in '{code}'")]
    Vocabulary { code: String, token: String },
    #[error("catalog has no entry for {league} / {season} / {category}")]
    UnknownCatalogEntry {
        league: String,
        season: String,
        category: String,
    },
    #[error("merged table has no '{column}' identity column")]
    MissingIdentity { column: String },
    #[error("field map error: {0}")]
    FieldMap(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_category() {
        let err = HarvestError::TableNotFound {
            category: Category::Shooting,
            url: "https://example.com/shooting".to_string(),
            reason: "no comment marker".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Shooting"));
        assert!(msg.contains("no comment marker"));

        let err = HarvestError::MergeAlignment {
            category: Category::PlayingTime,
            details: "expected 10 rows, found 9".to_string(),
        };
        assert!(err.to_string().contains("Playing Time"));
    }
}
