//! Output writers for built datasets.
//!
//! - [`json`]: one JSON document per dataset, grouped by league and season
//!
//! The presentation layer (tables, charts) reads these files; nothing here
//! renders them.

pub mod json;
