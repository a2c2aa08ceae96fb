#![warn(clippy::all, missing_docs)]

//! Core domain logic for GameTracker.
//!
//! This crate hosts the collection models, the in-memory query engine
//! (filter, sort, aggregate), form validation, configuration handling and
//! the REST client used by the terminal UI and any future frontends.

pub mod api;
pub mod config;
pub mod form;
pub mod library;
pub mod models;
pub mod query;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError};
pub use config::AppConfig;
pub use library::{Library, LibrarySync, StatsSource, SyncEvent};
pub use models::{Game, GameStatus, Genre, Platform, Review};
pub use query::{QueryParams, SearchMode, SortKey, StatusFilter};
pub use stats::{GameStats, ReviewStats};
