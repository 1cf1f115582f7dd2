//! Normalization pipeline from raw tables to typed datasets.
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | Flatten headers | [`flatten`] | `RawTable` | `FlattenedTable` |
//! | Canonical names and types | [`coerce`] with [`field_map`] | `FlattenedTable` | `CategorySet` |
//! | Positional merge | [`merge`] | `[CategorySet]` | `UnifiedTable` |
//! | Roles | [`position`] | position code | `PositionDescriptor` |
//! | Assembly | [`dataset`] | league, season, categories | `Dataset` |
//! | Reuse | [`cache`] | dataset key | shared `Dataset` |
//!
//! Only fetching and the dataset build touch I/O; every other stage is a pure
//! function over owned tables.

pub mod cache;
pub mod coerce;
pub mod dataset;
pub mod field_map;
pub mod flatten;
pub mod merge;
pub mod position;
