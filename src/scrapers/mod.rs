//! Source scrapers.
//!
//! Each scraper turns one fetched document into a [`crate::models::RawTable`].
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | FBref player tables | [`fbref`] | HTML scraping | Direct table first, comment-embedded table second |
//!
//! Scrapers use:
//! - A [`crate::api::DocumentSource`] for transport, so tests can feed fixtures
//! - `scraper` for the DOM, including comment nodes
//! - Explicit failure (`TableNotFound`) instead of partial tables

pub mod fbref;
