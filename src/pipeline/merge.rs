//! Positional merge of category sets.
//!
//! Category tables for the same population list the same players in the same
//! order, so row `i` of every set describes one player and the merge is a
//! column-wise concatenation. Nothing here matches rows by key. The row-count
//! check is the only structural guard; [`verify_alignment`] is an opt-in
//! identity check on top of it.

use crate::errors::HarvestError;
use crate::models::{CategorySet, Diagnostics, FieldValue, MergedColumn, UnifiedTable};
use crate::pipeline::coerce::coerce_numeric;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Concatenate `sets` column-wise.
///
/// Columns are taken in input order and the first occurrence of a name wins.
/// Every column at index `identity_columns` or later is coerced to a number.
#[instrument(level = "debug", skip_all, fields(sets = sets.len(), identity_columns = identity_columns))]
pub fn merge(sets: &[CategorySet], identity_columns: usize) -> Result<UnifiedTable, HarvestError> {
    let Some(first) = sets.first() else {
        return Ok(UnifiedTable {
            columns: Vec::new(),
            rows: Vec::new(),
            diagnostics: Diagnostics::default(),
        });
    };

    let rows = first.len();
    for set in &sets[1..] {
        if set.len() != rows {
            return Err(HarvestError::MergeAlignment {
                category: set.category,
                details: format!(
                    "expected {rows} rows like '{}', found {}",
                    first.category,
                    set.len()
                ),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    // (set, column) pairs feeding each merged column
    let mut sources = Vec::new();
    let mut diagnostics = Diagnostics::default();

    for (s, set) in sets.iter().enumerate() {
        diagnostics.absorb(&set.diagnostics);
        for (c, name) in set.columns.iter().enumerate() {
            if seen.insert(name.as_str()) {
                columns.push(MergedColumn {
                    name: name.clone(),
                    source: set.category,
                });
                sources.push((s, c));
            }
        }
    }

    let mut merged = Vec::with_capacity(rows);
    for row in 0..rows {
        let values: Vec<FieldValue> = sources
            .iter()
            .enumerate()
            .map(|(i, &(s, c))| {
                let value = sets[s].records[row]
                    .0
                    .get(c)
                    .cloned()
                    .unwrap_or(FieldValue::Missing);
                if i < identity_columns {
                    return value;
                }
                match value {
                    FieldValue::Text(text) => {
                        coerce_numeric(&text, &mut diagnostics.coercion_failures)
                    }
                    other => other,
                }
            })
            .collect();
        merged.push(values);
    }

    debug!(rows, columns = columns.len(), "Merged category sets");
    Ok(UnifiedTable {
        columns,
        rows: merged,
        diagnostics,
    })
}

/// Check that every set lists the same entities in the same order.
///
/// Compares `key_columns` of each set against the first set row by row and
/// fails on the first disagreement.
pub fn verify_alignment(sets: &[CategorySet], key_columns: &[&str]) -> Result<(), HarvestError> {
    let Some(first) = sets.first() else {
        return Ok(());
    };

    for set in sets {
        let key_index = |name: &str| {
            set.column_index(name)
                .ok_or_else(|| HarvestError::MergeAlignment {
                    category: set.category,
                    details: format!("no '{name}' column to verify against"),
                })
        };
        let keys = key_columns
            .iter()
            .map(|k| key_index(*k))
            .collect::<Result<Vec<_>, _>>()?;

        for (row, record) in set.records.iter().enumerate() {
            for (name, &col) in key_columns.iter().zip(&keys) {
                let expected = first.value(row, name);
                let found = record.0.get(col);
                if expected != found {
                    return Err(HarvestError::MergeAlignment {
                        category: set.category,
                        details: format!(
                            "row {row} has {name} {found:?} where '{}' has {expected:?}",
                            first.category
                        ),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, SemanticRecord};

    fn set(category: Category, columns: &[&str], rows: Vec<Vec<FieldValue>>) -> CategorySet {
        CategorySet {
            category,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: rows.into_iter().map(SemanticRecord).collect(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let a = set(
            Category::StandardStats,
            &["Player", "Goals"],
            vec![
                vec![text("A"), FieldValue::Number(1.0)],
                vec![text("B"), FieldValue::Number(2.0)],
            ],
        );
        let b = set(
            Category::PlayingTime,
            &["Player", "Minutes"],
            vec![vec![text("A"), FieldValue::Number(90.0)]],
        );
        match merge(&[a, b], 1) {
            Err(HarvestError::MergeAlignment { category, details }) => {
                assert_eq!(category, Category::PlayingTime);
                assert!(details.contains("expected 2 rows"));
            }
            other => panic!("expected alignment error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_occurrence_of_a_column_wins() {
        let a = set(
            Category::StandardStats,
            &["Player", "Goals"],
            vec![vec![text("A"), FieldValue::Number(3.0)]],
        );
        let b = set(
            Category::Shooting,
            &["Player", "Goals", "Shots"],
            vec![vec![text("A"), FieldValue::Number(99.0), FieldValue::Number(7.0)]],
        );
        let merged = merge(&[a, b], 1).unwrap();

        let names: Vec<_> = merged.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Player", "Goals", "Shots"]);
        assert_eq!(merged.value(0, "Goals"), Some(&FieldValue::Number(3.0)));
        assert_eq!(merged.columns[1].source, Category::StandardStats);
        assert_eq!(merged.columns[2].source, Category::Shooting);
    }

    #[test]
    fn test_columns_past_identity_are_numeric() {
        let a = set(
            Category::Passing,
            &["Player", "Completion", "Note"],
            vec![vec![text("A"), text("81,5%"), text("n/a")]],
        );
        let merged = merge(&[a], 1).unwrap();
        assert_eq!(merged.value(0, "Player"), Some(&text("A")));
        assert_eq!(merged.value(0, "Completion"), Some(&FieldValue::Number(81.5)));
        assert_eq!(merged.value(0, "Note"), Some(&FieldValue::Missing));
        assert_eq!(merged.diagnostics.coercion_failures, 1);
    }

    #[test]
    fn test_empty_input_merges_to_empty_table() {
        let merged = merge(&[], 7).unwrap();
        assert!(merged.columns.is_empty());
        assert!(merged.rows.is_empty());
    }

    #[test]
    fn test_verify_alignment() {
        let a = set(
            Category::StandardStats,
            &["Player", "Squad"],
            vec![vec![text("A"), text("X")], vec![text("B"), text("Y")]],
        );
        let b = set(
            Category::Shooting,
            &["Player", "Squad"],
            vec![vec![text("A"), text("X")], vec![text("B"), text("Y")]],
        );
        let swapped = set(
            Category::Passing,
            &["Player", "Squad"],
            vec![vec![text("B"), text("Y")], vec![text("A"), text("X")]],
        );

        assert!(verify_alignment(&[a.clone(), b], &["Player", "Squad"]).is_ok());
        assert!(matches!(
            verify_alignment(&[a, swapped], &["Player", "Squad"]),
            Err(HarvestError::MergeAlignment {
                category: Category::Passing,
                ..
            })
        ));
    }
}
