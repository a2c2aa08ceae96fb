//! Collection query engine: filter and sort stages over in-memory snapshots.
//!
//! Every function here is pure. The presentation layer owns the current
//! selection and hands it in as a [`QueryParams`] value on each call.

/// Status and free-text filtering.
pub mod filter;
/// Orderings over game lists.
pub mod sort;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Game, GameStatus, Review};

pub use filter::{filter, filter_with_mode};
pub use sort::{sort, SortKey};

/// Status restriction applied by the filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    /// No restriction.
    #[default]
    All,
    /// Only games with exactly this status.
    Only(GameStatus),
}

impl StatusFilter {
    /// Whether a game with `status` passes.
    pub fn matches(self, status: GameStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }

    /// `All`, then every status in display order, then back to `All`.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(GameStatus::ALL[0]),
            StatusFilter::Only(status) => {
                let idx = GameStatus::ALL
                    .iter()
                    .position(|candidate| *candidate == status)
                    .unwrap_or(0);
                GameStatus::ALL
                    .get(idx + 1)
                    .copied()
                    .map(StatusFilter::Only)
                    .unwrap_or(StatusFilter::All)
            }
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All statuses"),
            StatusFilter::Only(status) => f.write_str(status.label()),
        }
    }
}

/// How a non-empty search term interacts with the status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// The search term alone decides; status is ignored while searching.
    #[default]
    Override,
    /// Both the search term and the status filter must match.
    Combined,
}

/// Immutable snapshot of the library view's selections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    /// Status restriction.
    pub status: StatusFilter,
    /// Free-text search term.
    pub search: String,
    /// Ordering.
    pub sort: SortKey,
    /// Search precedence.
    pub search_mode: SearchMode,
}

impl QueryParams {
    /// Return a copy with a different status filter.
    pub fn with_status(&self, status: StatusFilter) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Return a copy with a different search term.
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    /// Return a copy with a different ordering.
    pub fn with_sort(&self, sort: SortKey) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Return a copy with a different search precedence.
    pub fn with_search_mode(&self, search_mode: SearchMode) -> Self {
        Self {
            search_mode,
            ..self.clone()
        }
    }

    /// Run the filter stage only.
    pub fn filter(&self, games: &[Game]) -> Vec<Game> {
        filter_with_mode(games, self.status, &self.search, self.search_mode)
    }

    /// Run filter then sort.
    pub fn apply(&self, games: &[Game]) -> Vec<Game> {
        sort(&self.filter(games), self.sort)
    }
}

/// Restriction applied to the review list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ReviewFilter {
    /// Every review.
    #[default]
    All,
    /// Only reviews of the game with this id.
    Game(String),
}

/// Keep the reviews that pass `filter`, in input order.
pub fn filter_reviews(reviews: &[Review], filter: &ReviewFilter) -> Vec<Review> {
    match filter {
        ReviewFilter::All => reviews.to_vec(),
        ReviewFilter::Game(id) => reviews
            .iter()
            .filter(|review| review.game.id() == id)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::test_support::{game, ids, review};

    #[test]
    fn apply_only_reorders_the_filtered_set() {
        let mut games = vec![
            game("1", "Zelda", 10.0),
            game("2", "Doom", 50.0),
            game("3", "Mario", 20.0),
            game("4", "Metroid", 5.0),
        ];
        games[1].status = GameStatus::Playing;
        games[3].status = GameStatus::Playing;

        for key in SortKey::ALL {
            for status in [StatusFilter::All, StatusFilter::Only(GameStatus::Playing)] {
                for search in ["", "m", "zzz"] {
                    let params = QueryParams::default()
                        .with_status(status)
                        .with_search(search)
                        .with_sort(key);
                    let filtered: HashSet<_> = ids(&params.filter(&games)).into_iter().collect();
                    let applied = ids(&params.apply(&games));
                    assert_eq!(applied.len(), filtered.len());
                    assert_eq!(applied.into_iter().collect::<HashSet<_>>(), filtered);
                }
            }
        }
    }

    #[test]
    fn apply_filters_then_sorts() {
        let mut games = vec![
            game("1", "Zelda", 10.0),
            game("2", "Doom", 50.0),
            game("3", "Metroid", 20.0),
        ];
        games[0].status = GameStatus::Completed;
        games[1].status = GameStatus::Playing;
        games[2].status = GameStatus::Playing;

        let params = QueryParams::default()
            .with_status(StatusFilter::Only(GameStatus::Playing))
            .with_sort(SortKey::Title);
        assert_eq!(ids(&params.apply(&games)), ["2", "3"]);

        let combined = params
            .with_search("o")
            .with_search_mode(SearchMode::Combined)
            .with_sort(SortKey::Hours);
        assert_eq!(ids(&combined.apply(&games)), ["2", "3"]);
    }

    #[test]
    fn status_filter_cycles_back_to_all() {
        let mut filter = StatusFilter::All;
        let mut seen = Vec::new();
        for _ in 0..5 {
            filter = filter.next();
            seen.push(filter);
        }
        assert_eq!(
            seen,
            [
                StatusFilter::Only(GameStatus::Unplayed),
                StatusFilter::Only(GameStatus::Playing),
                StatusFilter::Only(GameStatus::Completed),
                StatusFilter::Only(GameStatus::Abandoned),
                StatusFilter::All,
            ]
        );
    }

    #[test]
    fn review_filter_matches_game_reference() {
        let reviews = vec![
            review("r1", "g1", 4),
            review("r2", "g2", 5),
            review("r3", "g1", 2),
        ];
        assert_eq!(filter_reviews(&reviews, &ReviewFilter::All).len(), 3);
        let only = filter_reviews(&reviews, &ReviewFilter::Game("g1".into()));
        let ids: Vec<_> = only.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r3"]);
    }

    #[test]
    fn search_mode_reads_lowercase_names() {
        let mode: SearchMode = serde_json::from_str("\"combined\"").unwrap();
        assert_eq!(mode, SearchMode::Combined);
    }
}
