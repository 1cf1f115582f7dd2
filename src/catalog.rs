//! League catalog: maps (league, season, category) to a page locator.
//!
//! Pages follow the layout
//! `{base}{league_id}/{category_path}/{season}/{League-Name}-Stats`.
//! The "Big 5 European Leagues" page aggregates several competitions and is
//! flagged as a combined source.

use crate::errors::HarvestError;
use crate::models::{Category, Locator};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://fbref.com/en/comps/";

const SEASONS: [&str; 5] = [
    "2024-2025",
    "2023-2024",
    "2022-2023",
    "2021-2022",
    "2020-2021",
];

/// Resolves the address of a category table.
pub trait Catalog {
    fn resolve(&self, league: &str, season: &str, category: Category)
    -> Result<Locator, HarvestError>;
}

/// One league the catalog knows how to address.
#[derive(Debug, Clone)]
pub struct League {
    pub name: &'static str,
    pub id: &'static str,
    pub seasons: Vec<&'static str>,
}

impl League {
    fn new(name: &'static str, id: &'static str) -> Self {
        Self {
            name,
            id,
            seasons: SEASONS.to_vec(),
        }
    }

    pub fn is_combined(&self) -> bool {
        self.id == "Big5"
    }
}

/// The built-in catalog of supported leagues.
#[derive(Debug, Clone)]
pub struct FbrefCatalog {
    base_url: Url,
    leagues: Vec<League>,
}

impl FbrefCatalog {
    pub fn new(base_url: &str) -> Result<Self, HarvestError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| HarvestError::Config(format!("invalid base url '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            leagues: vec![
                League::new("Premier League", "9"),
                League::new("La Liga", "12"),
                League::new("Ligue 1", "13"),
                League::new("Bundesliga", "20"),
                League::new("Serie A", "11"),
                League::new("Big 5 European Leagues", "Big5"),
            ],
        })
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    pub fn league(&self, name: &str) -> Option<&League> {
        self.leagues.iter().find(|l| l.name == name)
    }
}

impl Catalog for FbrefCatalog {
    fn resolve(
        &self,
        league: &str,
        season: &str,
        category: Category,
    ) -> Result<Locator, HarvestError> {
        let unknown = || HarvestError::UnknownCatalogEntry {
            league: league.to_string(),
            season: season.to_string(),
            category: category.to_string(),
        };
        let entry = self.league(league).ok_or_else(unknown)?;
        if !entry.seasons.contains(&season) {
            return Err(unknown());
        }

        let page = format!(
            "{}/{}/{}/{}-Stats",
            entry.id,
            category.path(),
            season,
            entry.name.replace(' ', "-")
        );
        let url = self
            .base_url
            .join(&page)
            .map_err(|e| HarvestError::Config(format!("cannot build url for '{page}': {e}")))?;

        Ok(Locator {
            url,
            category,
            population: entry.name.to_string(),
            combined: entry.is_combined(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_single_league() {
        let catalog = FbrefCatalog::new(DEFAULT_BASE_URL).unwrap();
        let locator = catalog
            .resolve("La Liga", "2024-2025", Category::Shooting)
            .unwrap();
        assert_eq!(
            locator.url.as_str(),
            "https://fbref.com/en/comps/12/shooting/players/2024-2025/La-Liga-Stats"
        );
        assert_eq!(locator.population, "La Liga");
        assert!(!locator.combined);
    }

    #[test]
    fn test_resolve_combined_league() {
        let catalog = FbrefCatalog::new("https://fbref.com/en/comps").unwrap();
        let locator = catalog
            .resolve("Big 5 European Leagues", "2023-2024", Category::AdvancedGoalkeeping)
            .unwrap();
        assert_eq!(
            locator.url.as_str(),
            "https://fbref.com/en/comps/Big5/keepersadv/players/2023-2024/Big-5-European-Leagues-Stats"
        );
        assert!(locator.combined);
    }

    #[test]
    fn test_unknown_entries_are_caller_errors() {
        let catalog = FbrefCatalog::new(DEFAULT_BASE_URL).unwrap();
        assert!(matches!(
            catalog.resolve("Eredivisie", "2024-2025", Category::Passing),
            Err(HarvestError::UnknownCatalogEntry { .. })
        ));
        assert!(matches!(
            catalog.resolve("Serie A", "1999-2000", Category::Passing),
            Err(HarvestError::UnknownCatalogEntry { .. })
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            FbrefCatalog::new("not a url"),
            Err(HarvestError::Config(_))
        ));
    }
}
