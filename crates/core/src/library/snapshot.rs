use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    models::{Game, Review},
    query::{filter_reviews, QueryParams, ReviewFilter},
    stats::{aggregate_games, aggregate_reviews, GameStats, ReviewStats},
};

/// Thread-safe snapshot of the collection as last fetched from the server.
///
/// Clones share the same snapshot. Records are only ever replaced wholesale.
#[derive(Clone, Default)]
pub struct Library {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    games: Vec<Game>,
    reviews: Vec<Review>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Library {
    /// Build a snapshot from already fetched records.
    pub fn new(games: Vec<Game>, reviews: Vec<Review>, fetched_at: DateTime<Utc>) -> Self {
        let library = Self::default();
        library.replace(games, reviews, fetched_at);
        library
    }

    /// Swap in freshly fetched records.
    pub fn replace(&self, games: Vec<Game>, reviews: Vec<Review>, fetched_at: DateTime<Utc>) {
        let mut inner = self.inner.write();
        inner.games = games;
        inner.reviews = reviews;
        inner.fetched_at = Some(fetched_at);
    }

    /// When the snapshot was fetched, if ever.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().fetched_at
    }

    /// All games, in server order.
    pub fn games(&self) -> Vec<Game> {
        self.inner.read().games.clone()
    }

    /// All reviews, in server order.
    pub fn reviews(&self) -> Vec<Review> {
        self.inner.read().reviews.clone()
    }

    /// Look up a game by id.
    pub fn game(&self, id: &str) -> Option<Game> {
        self.inner.read().games.iter().find(|game| game.id == id).cloned()
    }

    /// Title of a game by id, if it is in the snapshot.
    pub fn game_title(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .games
            .iter()
            .find(|game| game.id == id)
            .map(|game| game.title.clone())
    }

    /// Games passing `params`, in the requested order.
    pub fn query(&self, params: &QueryParams) -> Vec<Game> {
        params.apply(&self.inner.read().games)
    }

    /// Reviews passing `filter`.
    pub fn reviews_matching(&self, filter: &ReviewFilter) -> Vec<Review> {
        filter_reviews(&self.inner.read().reviews, filter)
    }

    /// Aggregate the snapshot's games.
    pub fn game_stats(&self) -> GameStats {
        aggregate_games(&self.inner.read().games)
    }

    /// Aggregate the snapshot's reviews.
    pub fn review_stats(&self) -> ReviewStats {
        aggregate_reviews(&self.inner.read().reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use crate::query::{SortKey, StatusFilter};
    use crate::test_support::{game, ids, review};

    #[test]
    fn clones_share_replaced_records() {
        let library = Library::default();
        assert!(library.fetched_at().is_none());
        assert!(library.games().is_empty());

        let view = library.clone();
        let now = Utc::now();
        library.replace(
            vec![game("1", "Zelda", 3.0), game("2", "Doom", 9.0)],
            vec![review("r1", "2", 5)],
            now,
        );

        assert_eq!(view.fetched_at(), Some(now));
        assert_eq!(view.games().len(), 2);
        assert_eq!(view.game_title("2").as_deref(), Some("Doom"));
        assert!(view.game("3").is_none());
        assert_eq!(view.review_stats().total, 1);
        assert_eq!(view.game_stats().total_hours, 12.0);
    }

    #[test]
    fn query_runs_the_engine_over_the_snapshot() {
        let mut games = vec![
            game("1", "Zelda", 3.0),
            game("2", "Doom", 9.0),
            game("3", "Celeste", 1.0),
        ];
        games[2].status = GameStatus::Completed;
        let library = Library::new(games, Vec::new(), Utc::now());

        let params = QueryParams::default().with_sort(SortKey::Hours);
        assert_eq!(ids(&library.query(&params)), ["2", "1", "3"]);

        let completed = params.with_status(StatusFilter::Only(GameStatus::Completed));
        assert_eq!(ids(&library.query(&completed)), ["3"]);
    }

    #[test]
    fn reviews_filter_by_game() {
        let library = Library::new(
            Vec::new(),
            vec![review("r1", "g1", 5), review("r2", "g2", 1)],
            Utc::now(),
        );
        let only = library.reviews_matching(&ReviewFilter::Game("g2".into()));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, "r2");
        assert_eq!(library.reviews().len(), 2);
    }
}
