//! Data models shared by every stage of the pipeline.
//!
//! The stages hand these types to each other in a fixed order:
//! - [`Locator`]: where one category table lives (from the catalog)
//! - [`RawTable`]: the table as published, header and text cells
//! - [`FlattenedTable`]: unique per-category column keys
//! - [`CategorySet`]: canonical field names and typed values
//! - [`UnifiedTable`]: several category sets merged by row position
//! - [`Dataset`]: typed identity plus numeric stats, one record per player

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// One statistics table published for a population of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Standard Stats")]
    StandardStats,
    #[serde(rename = "Goalkeeping")]
    Goalkeeping,
    #[serde(rename = "Advanced Goalkeeping")]
    AdvancedGoalkeeping,
    #[serde(rename = "Shooting")]
    Shooting,
    #[serde(rename = "Passing")]
    Passing,
    #[serde(rename = "Pass Types")]
    PassTypes,
    #[serde(rename = "Goal and Shot Creation")]
    GoalShotCreation,
    #[serde(rename = "Defensive Actions")]
    DefensiveActions,
    #[serde(rename = "Possession")]
    Possession,
    #[serde(rename = "Playing Time")]
    PlayingTime,
    #[serde(rename = "Miscellaneous Stats")]
    Miscellaneous,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::StandardStats,
        Category::Goalkeeping,
        Category::AdvancedGoalkeeping,
        Category::Shooting,
        Category::Passing,
        Category::PassTypes,
        Category::GoalShotCreation,
        Category::DefensiveActions,
        Category::Possession,
        Category::PlayingTime,
        Category::Miscellaneous,
    ];

    /// The tag embedded into flattened column keys.
    pub fn label(self) -> &'static str {
        match self {
            Category::StandardStats => "Standard Stats",
            Category::Goalkeeping => "Goalkeeping",
            Category::AdvancedGoalkeeping => "Advanced Goalkeeping",
            Category::Shooting => "Shooting",
            Category::Passing => "Passing",
            Category::PassTypes => "Pass Types",
            Category::GoalShotCreation => "Goal and Shot Creation",
            Category::DefensiveActions => "Defensive Actions",
            Category::Possession => "Possession",
            Category::PlayingTime => "Playing Time",
            Category::Miscellaneous => "Miscellaneous Stats",
        }
    }

    /// Path segment of the category page below a competition.
    pub fn path(self) -> &'static str {
        match self {
            Category::StandardStats => "stats/players",
            Category::Goalkeeping => "keepers/players",
            Category::AdvancedGoalkeeping => "keepersadv/players",
            Category::Shooting => "shooting/players",
            Category::Passing => "passing/players",
            Category::PassTypes => "passing_types/players",
            Category::GoalShotCreation => "gca/players",
            Category::DefensiveActions => "defense/players",
            Category::Possession => "possession/players",
            Category::PlayingTime => "playingtime/players",
            Category::Miscellaneous => "misc/players",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Address of one category table for one population and season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub url: Url,
    pub category: Category,
    /// Display name of the population, e.g. `"La Liga"`.
    pub population: String,
    /// The page aggregates several competitions and carries its own `Comp` column.
    pub combined: bool,
}

/// A header cell of a single-level table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLabel {
    /// Column index in the table as published, before cleanup dropped anything.
    pub position: usize,
    pub label: String,
}

/// A header cell of a two-level table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedLabel {
    pub position: usize,
    /// `None` when the over-header cell spanning this column is blank.
    pub group: Option<String>,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Single(Vec<SourceLabel>),
    TwoLevel(Vec<GroupedLabel>),
}

impl Header {
    pub fn len(&self) -> usize {
        match self {
            Header::Single(labels) => labels.len(),
            Header::TwoLevel(labels) => labels.len(),
        }
    }

    /// Field-level label of column `i`.
    #[cfg(test)]
    pub fn field(&self, i: usize) -> Option<&str> {
        match self {
            Header::Single(labels) => labels.get(i).map(|l| l.label.as_str()),
            Header::TwoLevel(labels) => labels.get(i).map(|l| l.field.as_str()),
        }
    }

    /// Keep only the columns whose index satisfies `keep`.
    pub fn retain_columns(&mut self, keep: &[bool]) {
        match self {
            Header::Single(labels) => retain_by_mask(labels, keep),
            Header::TwoLevel(labels) => retain_by_mask(labels, keep),
        }
    }
}

pub(crate) fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let k = keep.get(i).copied().unwrap_or(false);
        i += 1;
        k
    });
}

/// A table exactly as extracted from the document: labels plus text cells.
///
/// Every row has the same arity as the header; absent cells are empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub header: Header,
    pub rows: Vec<Vec<String>>,
}

/// A table whose column keys are unique and carry the category tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedTable {
    pub category: Category,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlattenedTable {
    #[cfg(test)]
    pub fn cell(&self, row: usize, key: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == key)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// One row of a [`CategorySet`], aligned with the set's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticRecord(pub Vec<FieldValue>);

/// Canonicalized, typed rows of one category in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySet {
    pub category: Category,
    pub columns: Vec<String>,
    pub records: Vec<SemanticRecord>,
    pub diagnostics: Diagnostics,
}

impl CategorySet {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&FieldValue> {
        let col = self.column_index(name)?;
        self.records.get(row)?.0.get(col)
    }

    /// `(name, value)` pairs of one record.
    #[cfg(test)]
    pub fn record(&self, row: usize) -> Option<impl Iterator<Item = (&str, &FieldValue)>> {
        let record = self.records.get(row)?;
        Some(self.columns.iter().map(String::as_str).zip(record.0.iter()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// A merged column and the category that contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedColumn {
    pub name: String,
    pub source: Category,
}

/// Several category sets concatenated column-wise, row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTable {
    pub columns: Vec<MergedColumn>,
    pub rows: Vec<Vec<FieldValue>>,
    pub diagnostics: Diagnostics,
}

impl UnifiedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[cfg(test)]
    pub fn value(&self, row: usize, name: &str) -> Option<&FieldValue> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col)
    }
}

/// The four-entry position vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Role {
    pub fn from_code(code: &str) -> Option<Role> {
        match code {
            "GK" => Some(Role::Goalkeeper),
            "DF" => Some(Role::Defender),
            "MF" => Some(Role::Midfielder),
            "FW" => Some(Role::Forward),
            _ => None,
        }
    }
}

/// A player's second listed position, or an explicit marker that there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryRole {
    None,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionDescriptor {
    pub primary: Role,
    pub secondary: SecondaryRole,
}

/// The decomposed position of a record, keeping codes outside the vocabulary visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Known(PositionDescriptor),
    Unrecognized(String),
}

impl Position {
    #[cfg(test)]
    pub fn primary(&self) -> Option<Role> {
        match self {
            Position::Known(d) => Some(d.primary),
            Position::Unrecognized(_) => None,
        }
    }
}

/// Identity columns of a player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub nation: Option<String>,
    pub position: Position,
    pub squad: String,
    pub competition: String,
    pub age: Option<u32>,
    pub born: Option<u32>,
}

/// One player's identity plus numeric stats, aligned with [`Dataset::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub identity: PlayerIdentity,
    pub stats: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Outfield,
    Goalkeeper,
}

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Outfield => "outfield",
            DatasetKind::Goalkeeper => "goalkeeper",
        }
    }
}

/// The unified, typed dataset handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub kind: DatasetKind,
    /// Names of the numeric stats, in merge order.
    pub columns: Vec<String>,
    pub records: Vec<PlayerRecord>,
    pub diagnostics: Diagnostics,
}

impl Dataset {
    #[cfg(test)]
    pub fn stat(&self, row: usize, name: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == name)?;
        self.records.get(row)?.stats.get(col).copied().flatten()
    }

    /// Keep only the players of one competition.
    pub fn filter_competition(&self, competition: &str) -> Dataset {
        Dataset {
            kind: self.kind,
            columns: self.columns.clone(),
            records: self
                .records
                .iter()
                .filter(|r| r.identity.competition == competition)
                .cloned()
                .collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Non-fatal conditions met while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Flattened keys the field map does not know, passed through unchanged.
    pub unmapped_columns: Vec<String>,
    /// Non-empty cells that could not be coerced to their expected type.
    pub coercion_failures: usize,
    /// Position codes outside the role vocabulary.
    pub unrecognized_positions: Vec<String>,
}

impl Diagnostics {
    pub fn absorb(&mut self, other: &Diagnostics) {
        self.unmapped_columns
            .extend(other.unmapped_columns.iter().cloned());
        self.coercion_failures += other.coercion_failures;
        self.unrecognized_positions
            .extend(other.unrecognized_positions.iter().cloned());
    }

    pub fn is_clean(&self) -> bool {
        self.unmapped_columns.is_empty()
            && self.coercion_failures == 0
            && self.unrecognized_positions.is_empty()
    }
}
