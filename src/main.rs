//! # fbref_harvest
//!
//! Harvests per-category player statistics tables (standard, shooting,
//! passing, goalkeeping, ...) for one league and season and merges them into
//! one typed dataset per role.
//!
//! ## Usage
//!
//! ```sh
//! fbref_harvest --league "La Liga" --season 2024-2025 --dataset all -j ./json
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalog**: resolve each category page of the requested league and season
//! 2. **Fetching**: download the pages (bounded concurrency) and extract the
//!    player table, directly or from the comment it hides in
//! 3. **Normalization**: flatten headers, rename through the field map, coerce
//!    cells, merge categories by row position, decompose positions
//! 4. **Output**: one JSON document per dataset

use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod catalog;
mod cli;
mod config;
mod errors;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use api::{HttpSource, RetryFetch};
use catalog::FbrefCatalog;
use cli::Cli;
use config::HarvestConfig;
use errors::HarvestError;
use outputs::json::{DatasetExport, write_dataset};
use pipeline::cache::{DatasetCache, DatasetKey};
use pipeline::dataset::{DatasetBuilder, categories_for};
use pipeline::field_map::FieldMap;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fbref_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => HarvestConfig::load(path).await?,
        None => HarvestConfig::default(),
    };
    let catalog = FbrefCatalog::new(&config.base_url)?;

    if args.list_leagues {
        for league in catalog.leagues() {
            println!("{}: {}", league.name, league.seasons.iter().join(", "));
        }
        return Ok(());
    }

    let league = args
        .league
        .as_deref()
        .ok_or_else(|| HarvestError::Config("--league is required".into()))?;
    let season = args
        .season
        .as_deref()
        .ok_or_else(|| HarvestError::Config("--season is required".into()))?;

    let field_map = match &args.field_map {
        Some(path) => FieldMap::load(path).await?,
        None => FieldMap::embedded()?,
    };
    info!(version = field_map.version(), entries = field_map.len(), "Field map ready");

    // Early check: ensure JSON output dir is writable
    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir.display(),
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let source = RetryFetch::new(
        HttpSource::new(&config)?,
        config.max_retries,
        Duration::from_millis(config.base_delay_ms),
    );
    let builder = DatasetBuilder::new(catalog, source, field_map)
        .with_concurrency(config.concurrency)
        .with_alignment_check(args.verify_alignment);
    let mut cache = DatasetCache::new();

    let mut failed = Vec::new();
    for &kind in args.dataset.kinds() {
        let key = DatasetKey::new(league, season, categories_for(kind), kind);
        let dataset = match cache.get_or_build(&builder, key).await {
            Ok(dataset) => dataset,
            Err(e) => {
                error!(kind = kind.name(), error = %e, "Dataset build failed");
                failed.push(kind.name());
                continue;
            }
        };

        if !dataset.diagnostics.unmapped_columns.is_empty() {
            warn!(
                kind = kind.name(),
                columns = %dataset.diagnostics.unmapped_columns.iter().unique().join(", "),
                "Columns passed through without a canonical name"
            );
        }

        let scoped = args
            .competition
            .as_deref()
            .map(|c| dataset.filter_competition(c));
        if let (Some(c), Some(scoped)) = (args.competition.as_deref(), &scoped) {
            info!(competition = c, before = dataset.records.len(), after = scoped.records.len(), "Scoped to competition");
            if scoped.records.is_empty() {
                warn!(competition = c, "No players in this competition");
            }
        }

        let export = DatasetExport::new(
            league,
            season,
            args.competition.as_deref(),
            scoped.as_ref().unwrap_or(&*dataset),
        );
        if let Err(e) = write_dataset(&export, &args.json_output_dir).await {
            error!(kind = kind.name(), error = %e, "Failed to write dataset JSON");
            failed.push(kind.name());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if !failed.is_empty() {
        return Err(format!("failed datasets: {}", failed.iter().join(", ")).into());
    }
    Ok(())
}
