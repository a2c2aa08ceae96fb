//! In-memory library snapshot and its synchronisation with the server.

/// Thread-safe holder of the latest fetched records.
pub mod snapshot;
/// Background fetching of games and reviews.
pub mod sync;

pub use snapshot::Library;
pub use sync::{LibrarySync, StatsSource, SyncEvent};
