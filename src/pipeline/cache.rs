//! Explicit dataset cache.
//!
//! Built datasets are kept per `(league, season, categories, kind)` and handed
//! out as shared [`Arc`]s. Entries live until the caller invalidates them;
//! there is no expiry.

use crate::api::DocumentSource;
use crate::catalog::Catalog;
use crate::errors::HarvestError;
use crate::models::{Category, Dataset, DatasetKind};
use crate::pipeline::dataset::DatasetBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub league: String,
    pub season: String,
    pub categories: Vec<Category>,
    pub kind: DatasetKind,
}

impl DatasetKey {
    pub fn new(league: &str, season: &str, categories: &[Category], kind: DatasetKind) -> Self {
        Self {
            league: league.to_string(),
            season: season.to_string(),
            categories: categories.to_vec(),
            kind,
        }
    }
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<DatasetKey, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, key: &DatasetKey) -> Option<Arc<Dataset>> {
        self.entries.get(key).cloned()
    }

    /// Return the cached dataset for `key`, building it on a miss.
    ///
    /// A failed build leaves the cache unchanged.
    pub async fn get_or_build<C, S>(
        &mut self,
        builder: &DatasetBuilder<C, S>,
        key: DatasetKey,
    ) -> Result<Arc<Dataset>, HarvestError>
    where
        C: Catalog,
        S: DocumentSource,
    {
        if let Some(dataset) = self.entries.get(&key) {
            debug!(league = %key.league, season = %key.season, kind = key.kind.name(), "Dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(
            builder
                .build(&key.league, &key.season, &key.categories, key.kind)
                .await?,
        );
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop one entry. Returns whether it was cached.
    #[cfg(test)]
    pub fn invalidate(&mut self, key: &DatasetKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry of one league and season.
    #[cfg(test)]
    pub fn invalidate_season(&mut self, league: &str, season: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|k, _| !(k.league == league && k.season == season));
        before - self.entries.len()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::tests::{catalog, outfield_pages};
    use crate::pipeline::field_map::FieldMap;
    use std::sync::atomic::Ordering;

    const CATEGORIES: [Category; 2] = [Category::StandardStats, Category::PlayingTime];

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let pages = outfield_pages("0");
        let builder = DatasetBuilder::new(catalog(), &pages, FieldMap::embedded().unwrap());
        let mut cache = DatasetCache::new();
        let key = DatasetKey::new("La Liga", "2024-2025", &CATEGORIES, DatasetKind::Outfield);

        let first = cache.get_or_build(&builder, key.clone()).await.unwrap();
        let second = cache.get_or_build(&builder, key.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pages.calls.load(Ordering::SeqCst), 2);

        assert!(cache.invalidate(&key));
        assert!(cache.get(&key).is_none());
        cache.get_or_build(&builder, key).await.unwrap();
        assert_eq!(pages.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let pages = outfield_pages("3");
        let builder = DatasetBuilder::new(catalog(), &pages, FieldMap::embedded().unwrap());
        let mut cache = DatasetCache::new();
        let key = DatasetKey::new("La Liga", "2024-2025", &CATEGORIES, DatasetKind::Outfield);

        assert!(cache.get_or_build(&builder, key).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_season_and_clear() {
        let pages = outfield_pages("0");
        let builder = DatasetBuilder::new(catalog(), &pages, FieldMap::embedded().unwrap());
        let mut cache = DatasetCache::new();
        let standard = [Category::StandardStats];

        for season in ["2024-2025", "2023-2024"] {
            let key = DatasetKey::new("La Liga", season, &standard, DatasetKind::Outfield);
            cache.get_or_build(&builder, key).await.unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.invalidate_season("La Liga", "2024-2025"), 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
