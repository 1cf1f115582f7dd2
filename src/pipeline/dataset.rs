//! Dataset assembly: catalog → fetch → flatten → canonicalize → merge → type.
//!
//! | Dataset | Categories | Row filter |
//! |---------|------------|------------|
//! | Outfield | Standard Stats, Shooting, Passing, Pass Types, Goal and Shot Creation, Defensive Actions, Possession, Miscellaneous Stats, Playing Time | Playing Time keeps `MatchesPlayed >= 1` |
//! | Goalkeeper | Goalkeeping, Advanced Goalkeeping | none |
//!
//! Category pages are fetched concurrently (bounded), in requested order, and
//! the merge waits for all of them. Any failing category fails the dataset.

use crate::api::DocumentSource;
use crate::catalog::Catalog;
use crate::errors::HarvestError;
use crate::models::{
    Category, CategorySet, Dataset, DatasetKind, FieldValue, PlayerIdentity, PlayerRecord,
    Position, UnifiedTable,
};
use crate::pipeline::coerce::{
    AGE, BORN, COMPETITION, IDENTITY_COLUMNS, NATION, PLAYER, POSITION, SQUAD, canonicalize,
};
use crate::pipeline::field_map::FieldMap;
use crate::pipeline::flatten::flatten;
use crate::pipeline::merge::{merge, verify_alignment};
use crate::pipeline::position::decompose;
use crate::scrapers::fbref::fetch_table;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument, warn};

pub const OUTFIELD_CATEGORIES: [Category; 9] = [
    Category::StandardStats,
    Category::Shooting,
    Category::Passing,
    Category::PassTypes,
    Category::GoalShotCreation,
    Category::DefensiveActions,
    Category::Possession,
    Category::Miscellaneous,
    Category::PlayingTime,
];

pub const GOALKEEPER_CATEGORIES: [Category; 2] =
    [Category::Goalkeeping, Category::AdvancedGoalkeeping];

/// Participation column used to filter the Playing Time table.
pub const PARTICIPATION_FIELD: &str = "MatchesPlayed";

pub fn categories_for(kind: DatasetKind) -> &'static [Category] {
    match kind {
        DatasetKind::Outfield => &OUTFIELD_CATEGORIES,
        DatasetKind::Goalkeeper => &GOALKEEPER_CATEGORIES,
    }
}

/// Builds typed datasets from category pages.
pub struct DatasetBuilder<C, S> {
    catalog: C,
    source: S,
    field_map: FieldMap,
    concurrency: usize,
    verify_alignment: bool,
}

impl<C, S> DatasetBuilder<C, S>
where
    C: Catalog,
    S: DocumentSource,
{
    pub fn new(catalog: C, source: S, field_map: FieldMap) -> Self {
        Self {
            catalog,
            source,
            field_map,
            concurrency: 3,
            verify_alignment: false,
        }
    }

    /// Category fetches allowed in flight at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Compare `Player` and `Squad` row by row before merging.
    pub fn with_alignment_check(mut self, enabled: bool) -> Self {
        self.verify_alignment = enabled;
        self
    }

    /// Build a dataset from the standard categories of `kind`.
    #[cfg(test)]
    pub async fn build_kind(
        &self,
        league: &str,
        season: &str,
        kind: DatasetKind,
    ) -> Result<Dataset, HarvestError> {
        self.build(league, season, categories_for(kind), kind).await
    }

    #[instrument(level = "info", skip(self, categories, kind), fields(categories = categories.len(), kind = kind.name()))]
    pub async fn build(
        &self,
        league: &str,
        season: &str,
        categories: &[Category],
        kind: DatasetKind,
    ) -> Result<Dataset, HarvestError> {
        let locators = categories
            .iter()
            .map(|&c| self.catalog.resolve(league, season, c))
            .collect::<Result<Vec<_>, _>>()?;

        let tables = stream::iter(locators.iter().map(|l| fetch_table(&self.source, l)))
            .buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        let sets: Vec<CategorySet> = tables
            .into_iter()
            .zip(categories)
            .map(|(table, &category)| {
                let set = canonicalize(flatten(table, category), &self.field_map);
                if category == Category::PlayingTime {
                    keep_participants(set)
                } else {
                    set
                }
            })
            .collect();

        if self.verify_alignment {
            verify_alignment(&sets, &[PLAYER, SQUAD])?;
        }

        let merged = merge(&sets, IDENTITY_COLUMNS.len())?;
        let dataset = into_dataset(merged, kind)?;

        info!(
            records = dataset.records.len(),
            columns = dataset.columns.len(),
            clean = dataset.diagnostics.is_clean(),
            "Built dataset"
        );
        Ok(dataset)
    }
}

/// Drop players without a recorded appearance.
fn keep_participants(mut set: CategorySet) -> CategorySet {
    let Some(col) = set.column_index(PARTICIPATION_FIELD) else {
        warn!(category = %set.category, "No participation column; keeping every row");
        return set;
    };
    let before = set.len();
    set.records
        .retain(|r| r.0.get(col).and_then(FieldValue::as_number).is_some_and(|n| n >= 1.0));
    info!(before, after = set.len(), "Filtered non-participants");
    set
}

fn whole(value: &FieldValue) -> Option<u32> {
    value
        .as_number()
        .filter(|n| *n >= 0.0)
        .map(|n| n as u32)
}

fn text_at(row: &[FieldValue], col: usize) -> String {
    row[col].as_text().map(str::to_string).unwrap_or_default()
}

fn into_dataset(table: UnifiedTable, kind: DatasetKind) -> Result<Dataset, HarvestError> {
    let index = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| HarvestError::MissingIdentity {
                column: name.to_string(),
            })
    };
    let player = index(PLAYER)?;
    let nation = index(NATION)?;
    let position = index(POSITION)?;
    let squad = index(SQUAD)?;
    let competition = index(COMPETITION)?;
    let age = index(AGE)?;
    let born = index(BORN)?;
    let identity = [player, nation, position, squad, competition, age, born];

    let stat_columns: Vec<usize> = (0..table.columns.len())
        .filter(|i| !identity.contains(i))
        .collect();

    let mut diagnostics = table.diagnostics.clone();

    let records = table
        .rows
        .iter()
        .map(|row| {
            let code = text_at(row, position);
            let role = match decompose(&code) {
                Ok(descriptor) => Position::Known(descriptor),
                Err(e) => {
                    warn!(player = %text_at(row, player), error = %e, "Keeping record with unrecognized position");
                    diagnostics.unrecognized_positions.push(code.clone());
                    Position::Unrecognized(code)
                }
            };
            PlayerRecord {
                identity: PlayerIdentity {
                    name: text_at(row, player),
                    nation: row[nation].as_text().map(str::to_string),
                    position: role,
                    squad: text_at(row, squad),
                    competition: text_at(row, competition),
                    age: whole(&row[age]),
                    born: whole(&row[born]),
                },
                stats: stat_columns.iter().map(|&i| row[i].as_number()).collect(),
            }
        })
        .collect();

    Ok(Dataset {
        kind,
        columns: stat_columns
            .iter()
            .map(|&i| table.columns[i].name.clone())
            .collect(),
        records,
        diagnostics,
    })
}
