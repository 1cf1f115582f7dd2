//! Field coercion: canonical names and typed values.
//!
//! Cells are published as display text. After renaming, the identity columns
//! get their own cleanup rules and every other column is parsed as a number:
//!
//! | Column | Raw | Value |
//! |--------|-----|-------|
//! | `Nation` | `es ESP` | `Text("ESP")` |
//! | `Age` | `26-050` | `Number(26.0)` |
//! | `Competition` | `1. La Liga` | `Text("La Liga")` |
//! | stats | `12,5` / `45.2%` / `1,234` | `Number(12.5)` / `Number(45.2)` / `Number(1234.0)` |
//!
//! A cell that cannot be parsed becomes [`FieldValue::Missing`] and is counted;
//! it never aborts the table.

use crate::models::{CategorySet, Diagnostics, FieldValue, FlattenedTable, SemanticRecord};
use crate::pipeline::field_map::FieldMap;
use crate::pipeline::flatten::split_key;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const PLAYER: &str = "Player";
pub const NATION: &str = "Nation";
pub const POSITION: &str = "Position";
pub const SQUAD: &str = "Squad";
pub const COMPETITION: &str = "Competition";
pub const AGE: &str = "Age";
pub const BORN: &str = "Born";

/// Identity columns in published order. Together they are the leading
/// identity span of every player table.
pub const IDENTITY_COLUMNS: [&str; 7] = [PLAYER, NATION, POSITION, SQUAD, COMPETITION, AGE, BORN];

/// Identity columns that stay text.
const TEXT_COLUMNS: [&str; 5] = [PLAYER, NATION, POSITION, SQUAD, COMPETITION];

static NATION_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)$").unwrap());
static GROUPED_THOUSANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[1-9]\d{0,2}(,\d{3})+$").unwrap());

/// Trailing uppercase country code, e.g. `"es ESP"` -> `"ESP"`.
pub fn nation_code(raw: &str) -> Option<String> {
    NATION_CODE
        .captures(raw.trim())
        .map(|c| c[1].to_string())
}

/// Leading years component of a `years-days` age.
pub fn age_years(raw: &str) -> &str {
    raw.trim().split('-').next().unwrap_or_default().trim()
}

/// Competition name without its rank or country prefix.
///
/// The prefix is dropped only when it looks like one (`"1."`, `"eng"`), so a
/// plain name such as `"La Liga"` is kept whole.
pub fn competition_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.split_once(char::is_whitespace) {
        Some((prefix, rest)) if is_rank_prefix(prefix) => Some(rest.trim().to_string()),
        _ => Some(raw.to_string()),
    }
}

fn is_rank_prefix(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit() || c == '.')
        || token.chars().all(|c| c.is_ascii_lowercase())
}

/// Parse a display number: comma decimals, percent signs, grouped thousands.
///
/// Returns `None` for empty or unparsable text.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned = if GROUPED_THOUSANDS.is_match(raw) {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".").replace('%', "")
    };
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Coerce one text cell to a number, counting non-empty failures.
pub fn coerce_numeric(raw: &str, failures: &mut usize) -> FieldValue {
    match parse_number(raw) {
        Some(n) => FieldValue::Number(n),
        None => {
            if !raw.trim().is_empty() {
                *failures += 1;
            }
            FieldValue::Missing
        }
    }
}

fn coerce_cell(column: &str, raw: &str, failures: &mut usize) -> FieldValue {
    match column {
        NATION => nation_code(raw).map_or(FieldValue::Missing, FieldValue::Text),
        COMPETITION => competition_name(raw).map_or(FieldValue::Missing, FieldValue::Text),
        AGE => coerce_numeric(age_years(raw), failures),
        c if TEXT_COLUMNS.contains(&c) => {
            let text = raw.trim();
            if text.is_empty() {
                FieldValue::Missing
            } else {
                FieldValue::Text(text.to_string())
            }
        }
        _ => coerce_numeric(raw, failures),
    }
}

/// Rename flattened keys to canonical names and type every cell.
///
/// Unknown keys pass through unchanged and are listed in the diagnostics.
/// When two keys map to the same canonical name the first column wins.
pub fn canonicalize(table: FlattenedTable, map: &FieldMap) -> CategorySet {
    let mut diagnostics = Diagnostics::default();
    let mut seen = HashSet::new();
    let mut kept: Vec<(usize, String)> = Vec::new();

    for (i, key) in table.columns.iter().enumerate() {
        let name = match map.canonical(key) {
            Some(name) => name.to_string(),
            None => {
                if let Some((field, group, _)) = split_key(key) {
                    debug!(%field, %group, category = %table.category, "No canonical name");
                }
                diagnostics.unmapped_columns.push(key.clone());
                key.clone()
            }
        };
        if seen.insert(name.clone()) {
            kept.push((i, name));
        } else {
            debug!(%key, %name, "Dropping column with duplicate canonical name");
        }
    }

    if !diagnostics.unmapped_columns.is_empty() {
        warn!(
            category = %table.category,
            count = diagnostics.unmapped_columns.len(),
            columns = %diagnostics.unmapped_columns.iter().join(", "),
            "Columns missing from the field map; passing through"
        );
    }

    let records = table
        .rows
        .iter()
        .map(|row| {
            SemanticRecord(
                kept.iter()
                    .map(|(i, name)| {
                        let raw = row.get(*i).map(String::as_str).unwrap_or_default();
                        coerce_cell(name, raw, &mut diagnostics.coercion_failures)
                    })
                    .collect(),
            )
        })
        .collect();

    if diagnostics.coercion_failures > 0 {
        warn!(
            category = %table.category,
            failures = diagnostics.coercion_failures,
            "Cells could not be coerced and are missing"
        );
    }

    CategorySet {
        category: table.category,
        columns: kept.into_iter().map(|(_, name)| name).collect(),
        records,
        diagnostics,
    }
}
