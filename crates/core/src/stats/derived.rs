use std::collections::HashSet;

use crate::models::{Game, GameStatus, Genre, Review};

use super::{GameStats, ReviewStats};

/// Share of `part` in `total` as a percentage. A zero total yields `0.0`.
pub fn percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Count with its percentage of the collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portion {
    /// Absolute count.
    pub count: usize,
    /// Percentage of the total, `0.0` for an empty collection.
    pub percent: f64,
}

impl Portion {
    fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percent: percent(count as f64, total as f64),
        }
    }
}

/// Completed / playing / remaining split of a collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBreakdown {
    /// Completed games.
    pub completed: Portion,
    /// Games in progress.
    pub playing: Portion,
    /// Everything else.
    pub remaining: Portion,
}

impl StatusBreakdown {
    /// Derive the split from aggregate counts.
    pub fn from_stats(stats: &GameStats) -> Self {
        let remaining = stats
            .total
            .saturating_sub(stats.completed)
            .saturating_sub(stats.playing);
        Self {
            completed: Portion::of(stats.completed, stats.total),
            playing: Portion::of(stats.playing, stats.total),
            remaining: Portion::of(remaining, stats.total),
        }
    }
}

/// One bar of the genre distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreShare {
    /// Genre.
    pub genre: Genre,
    /// Games and their share of the collection.
    pub portion: Portion,
}

/// Genre histogram cut down to what the dashboard shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenreDistribution {
    /// Leading genres.
    pub shown: Vec<GenreShare>,
    /// Genres left out.
    pub hidden: usize,
}

impl GenreDistribution {
    /// Keep the first `limit` genres of the histogram.
    pub fn from_stats(stats: &GameStats, limit: usize) -> Self {
        let shown = stats
            .genres
            .iter()
            .take(limit)
            .map(|entry| GenreShare {
                genre: entry.genre.clone(),
                portion: Portion::of(entry.count, stats.total),
            })
            .collect();
        Self {
            shown,
            hidden: stats.genres.len().saturating_sub(limit),
        }
    }
}

/// A personal target tracked on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    /// Short description.
    pub label: &'static str,
    /// Progress so far.
    pub current: f64,
    /// Value at which the goal is reached.
    pub target: f64,
    /// Unit shown after the numbers.
    pub unit: &'static str,
}

impl Goal {
    /// Progress in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.current / self.target).clamp(0.0, 1.0)
    }

    /// Whether the target has been met.
    pub fn is_reached(&self) -> bool {
        self.current >= self.target
    }

    /// The standing goals: ten completed games, a hundred hours and five
    /// written reviews.
    pub fn defaults(games: &GameStats, reviews: &ReviewStats) -> Vec<Goal> {
        vec![
            Goal {
                label: "Complete 10 games",
                current: games.completed as f64,
                target: 10.0,
                unit: "completed",
            },
            Goal {
                label: "Play 100 hours",
                current: games.total_hours,
                target: 100.0,
                unit: "hours",
            },
            Goal {
                label: "Write 5 reviews",
                current: reviews.total as f64,
                target: 5.0,
                unit: "reviews",
            },
        ]
    }
}

/// Counters shown above the review list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReviewSummary {
    /// Reviews total.
    pub total: usize,
    /// Reviews recommending their game.
    pub recommended: usize,
    /// Mean rating, `0.0` when there are no reviews.
    pub mean_rating: f64,
    /// Distinct games that have been reviewed.
    pub games_reviewed: usize,
}

impl ReviewSummary {
    /// Summarise a list of reviews.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let rating_sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
        let games: HashSet<&str> = reviews.iter().map(|r| r.game.id()).collect();
        Self {
            total: reviews.len(),
            recommended: reviews.iter().filter(|r| r.recommended).count(),
            mean_rating: if reviews.is_empty() {
                0.0
            } else {
                rating_sum / reviews.len() as f64
            },
            games_reviewed: games.len(),
        }
    }
}

/// Counters shown above the game list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LibraryCounters {
    /// Games in the library.
    pub total: usize,
    /// Completed games.
    pub completed: usize,
    /// Hours across the library.
    pub total_hours: f64,
    /// Games passing the current filter.
    pub filtered: usize,
}

impl LibraryCounters {
    /// Compute counters for the full library and its filtered view.
    pub fn new(all: &[Game], filtered: &[Game]) -> Self {
        Self {
            total: all.len(),
            completed: all
                .iter()
                .filter(|g| g.status == GameStatus::Completed)
                .count(),
            total_hours: all.iter().map(|g| g.hours_played).sum(),
            filtered: filtered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{aggregate_games, aggregate_reviews, GenreCount};
    use crate::test_support::{game, review};

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent(0.0, 0.0), 0.0);
        assert_eq!(percent(3.0, 0.0), 0.0);
        assert_eq!(percent(1.0, 4.0), 25.0);
    }

    #[test]
    fn breakdown_of_empty_collection_is_zero() {
        let breakdown = StatusBreakdown::from_stats(&GameStats::default());
        for portion in [breakdown.completed, breakdown.playing, breakdown.remaining] {
            assert_eq!(portion.count, 0);
            assert_eq!(portion.percent, 0.0);
        }
    }

    #[test]
    fn breakdown_splits_collection() {
        let mut games = vec![
            game("1", "A", 0.0),
            game("2", "B", 0.0),
            game("3", "C", 0.0),
            game("4", "D", 0.0),
        ];
        games[0].status = GameStatus::Completed;
        games[1].status = GameStatus::Playing;
        games[2].status = GameStatus::Abandoned;

        let breakdown = StatusBreakdown::from_stats(&aggregate_games(&games));
        assert_eq!(breakdown.completed.percent, 25.0);
        assert_eq!(breakdown.playing.percent, 25.0);
        assert_eq!(breakdown.remaining.count, 2);
        assert_eq!(breakdown.remaining.percent, 50.0);
    }

    #[test]
    fn genre_distribution_reports_hidden_genres() {
        let stats = GameStats {
            total: 10,
            genres: Genre::KNOWN
                .iter()
                .take(10)
                .map(|genre| GenreCount {
                    genre: genre.clone(),
                    count: 1,
                })
                .collect(),
            ..GameStats::default()
        };
        let distribution = GenreDistribution::from_stats(&stats, 8);
        assert_eq!(distribution.shown.len(), 8);
        assert_eq!(distribution.hidden, 2);
        assert_eq!(distribution.shown[0].portion.percent, 10.0);
    }

    #[test]
    fn goals_clamp_progress() {
        let mut games = vec![game("1", "A", 150.0)];
        games[0].status = GameStatus::Completed;
        let reviews = vec![review("r1", "1", 5), review("r2", "1", 4)];
        let goals = Goal::defaults(&aggregate_games(&games), &aggregate_reviews(&reviews));

        assert_eq!(goals[0].fraction(), 0.1);
        assert_eq!(goals[1].fraction(), 1.0);
        assert!(goals[1].is_reached());
        assert_eq!(goals[2].fraction(), 0.4);
        assert!(!goals[2].is_reached());
    }

    #[test]
    fn review_summary_counts_distinct_games() {
        let mut reviews = vec![
            review("r1", "g1", 4),
            review("r2", "g1", 2),
            review("r3", "g2", 3),
        ];
        reviews[0].recommended = true;

        let summary = ReviewSummary::from_reviews(&reviews);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.recommended, 1);
        assert_eq!(summary.mean_rating, 3.0);
        assert_eq!(summary.games_reviewed, 2);
        assert_eq!(ReviewSummary::from_reviews(&[]).mean_rating, 0.0);
    }

    #[test]
    fn library_counters_cover_full_and_filtered_views() {
        let mut games = vec![game("1", "A", 2.5), game("2", "B", 4.0)];
        games[1].status = GameStatus::Completed;
        let counters = LibraryCounters::new(&games, &games[..1]);
        assert_eq!(counters.total, 2);
        assert_eq!(counters.completed, 1);
        assert_eq!(counters.total_hours, 6.5);
        assert_eq!(counters.filtered, 1);
    }
}
