//! Header flattening.
//!
//! Key formats:
//! - single-level: `"<label> (<category>)"`
//! - two-level: `"<field> (<group> - <category>)"`
//!
//! A blank group renders as `Unnamed: <position>_level_0`, where `position` is
//! the column's index in the table as published. Identity columns (player,
//! nation, squad, ...) have no group and stay addressable through it.

use crate::models::{Category, FlattenedTable, Header, RawTable};
use std::collections::HashSet;
use tracing::debug;

/// Group label for a column whose group header is blank.
pub fn placeholder_group(position: usize) -> String {
    format!("Unnamed: {position}_level_0")
}

/// Key for a column of a single-level header, e.g. `"Player (Standard Stats)"`.
pub fn single_key(label: &str, category: Category) -> String {
    format!("{label} ({category})")
}

/// Key for a column of a two-level header.
///
/// # Arguments
///
/// * `field` - The lower header label, e.g. `Gls`.
/// * `group` - The over-header label, or a [`placeholder_group`] when blank.
/// * `category` - The category the table was fetched for.
///
/// # Returns
///
/// `"<field> (<group> - <category>)"`, the inverse of [`split_key`].
pub fn grouped_key(field: &str, group: &str, category: Category) -> String {
    format!("{field} ({group} - {category})")
}

/// Recover `(field, group, category)` from a two-level key.
///
/// Lossless as long as neither label contains `" ("` or `" - "`.
pub fn split_key(key: &str) -> Option<(&str, &str, &str)> {
    let inner = key.strip_suffix(')')?;
    let (field, rest) = inner.split_once(" (")?;
    let (group, category) = rest.rsplit_once(" - ")?;
    Some((field, group, category))
}

/// Turn a raw header into unique category-tagged keys.
///
/// When two columns produce the same key the later one is dropped.
pub fn flatten(table: RawTable, category: Category) -> FlattenedTable {
    let keys: Vec<String> = match &table.header {
        Header::Single(labels) => labels
            .iter()
            .map(|l| single_key(&l.label, category))
            .collect(),
        Header::TwoLevel(labels) => labels
            .iter()
            .map(|l| {
                let group = l
                    .group
                    .clone()
                    .unwrap_or_else(|| placeholder_group(l.position));
                grouped_key(&l.field, &group, category)
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    let keep: Vec<bool> = keys.iter().map(|k| seen.insert(k.clone())).collect();
    let columns: Vec<String> = keys
        .into_iter()
        .zip(&keep)
        .filter_map(|(k, &kept)| {
            if !kept {
                debug!(key = %k, %category, "Dropping duplicate flattened column");
            }
            kept.then_some(k)
        })
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(cell, &kept)| kept.then_some(cell))
                .collect()
        })
        .collect();

    FlattenedTable {
        category,
        columns,
        rows,
    }
}
