//! Aggregate statistics over games and reviews.
//!
//! The result types decode from the server's statistics endpoints as well, so
//! the dashboard can use either source interchangeably.

/// Presentation-free metrics derived from aggregates.
pub mod derived;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Game, GameStatus, Genre, Review};

/// How many best-rated games the review aggregate keeps.
pub const TOP_RATED_LIMIT: usize = 3;

/// Number of games sharing a genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    /// Genre.
    #[serde(rename = "_id")]
    pub genre: Genre,
    /// Games in this genre.
    pub count: usize,
}

/// Summary of a game collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStats {
    /// Number of games.
    #[serde(rename = "totalJuegos", default)]
    pub total: usize,
    /// Games with status `Completed`.
    #[serde(rename = "juegosCompletados", default)]
    pub completed: usize,
    /// Games with status `Playing`.
    #[serde(rename = "juegosJugando", default)]
    pub playing: usize,
    /// Sum of hours played.
    #[serde(rename = "totalHoras", default)]
    pub total_hours: f64,
    /// Game with the most hours, first one on ties.
    #[serde(rename = "juegoMasJugado", default)]
    pub most_played: Option<Game>,
    /// Games per genre, largest first.
    #[serde(rename = "generosStats", default)]
    pub genres: Vec<GenreCount>,
}

/// Mean review rating of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RatedGameRecord", into = "RatedGameRecord")]
pub struct RatedGame {
    /// Game identifier.
    pub game_id: String,
    /// Game title.
    pub title: String,
    /// Mean rating across the game's reviews.
    pub mean_rating: f64,
}

/// Server shape of a best-rated entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RatedGameRecord {
    #[serde(rename = "_id")]
    game_id: String,
    #[serde(rename = "avgPuntuacion", default)]
    mean_rating: f64,
    #[serde(rename = "juegoInfo", default)]
    info: Option<RatedGameInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RatedGameInfo {
    #[serde(rename = "titulo", default)]
    title: Option<String>,
}

impl From<RatedGameRecord> for RatedGame {
    fn from(record: RatedGameRecord) -> Self {
        let title = record
            .info
            .and_then(|info| info.title)
            .unwrap_or_else(|| record.game_id.clone());
        Self {
            game_id: record.game_id,
            title,
            mean_rating: record.mean_rating,
        }
    }
}

impl From<RatedGame> for RatedGameRecord {
    fn from(game: RatedGame) -> Self {
        Self {
            game_id: game.game_id,
            mean_rating: game.mean_rating,
            info: Some(RatedGameInfo {
                title: Some(game.title),
            }),
        }
    }
}

/// Summary of all written reviews.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Number of reviews.
    #[serde(rename = "totalReseñas", default)]
    pub total: usize,
    /// Mean rating, `0.0` when there are no reviews.
    #[serde(rename = "promedioPuntuacion", default)]
    pub mean_rating: f64,
    /// Best-rated games, at most [`TOP_RATED_LIMIT`].
    #[serde(rename = "juegosMejorCalificados", default)]
    pub top_games: Vec<RatedGame>,
}

/// Aggregate a game collection.
pub fn aggregate_games(games: &[Game]) -> GameStats {
    let mut stats = GameStats {
        total: games.len(),
        ..GameStats::default()
    };
    let mut genre_slots: HashMap<&Genre, usize> = HashMap::new();
    let mut most_played: Option<&Game> = None;

    for game in games {
        match game.status {
            GameStatus::Completed => stats.completed += 1,
            GameStatus::Playing => stats.playing += 1,
            GameStatus::Unplayed | GameStatus::Abandoned => {}
        }
        stats.total_hours += game.hours_played;

        if most_played.map_or(true, |best| game.hours_played > best.hours_played) {
            most_played = Some(game);
        }

        match genre_slots.get(&game.genre) {
            Some(&slot) => stats.genres[slot].count += 1,
            None => {
                genre_slots.insert(&game.genre, stats.genres.len());
                stats.genres.push(GenreCount {
                    genre: game.genre.clone(),
                    count: 1,
                });
            }
        }
    }

    stats.most_played = most_played.cloned();
    // Stable, so equal counts keep first-appearance order.
    stats.genres.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Aggregate written reviews.
pub fn aggregate_reviews(reviews: &[Review]) -> ReviewStats {
    if reviews.is_empty() {
        return ReviewStats::default();
    }

    struct Tally<'a> {
        game_id: &'a str,
        title: Option<&'a str>,
        sum: f64,
        count: usize,
    }

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<Tally<'_>> = Vec::new();
    let mut rating_sum = 0.0;

    for review in reviews {
        let rating = f64::from(review.rating);
        rating_sum += rating;

        let game_id = review.game.id();
        let slot = *slots.entry(game_id).or_insert_with(|| {
            tallies.push(Tally {
                game_id,
                title: None,
                sum: 0.0,
                count: 0,
            });
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        tally.sum += rating;
        tally.count += 1;
        if tally.title.is_none() {
            tally.title = review.game.title();
        }
    }

    let mut top_games: Vec<RatedGame> = tallies
        .into_iter()
        .map(|tally| RatedGame {
            game_id: tally.game_id.to_string(),
            title: tally.title.unwrap_or(tally.game_id).to_string(),
            mean_rating: tally.sum / tally.count as f64,
        })
        .collect();
    top_games.sort_by(|a, b| b.mean_rating.total_cmp(&a.mean_rating));
    top_games.truncate(TOP_RATED_LIMIT);

    ReviewStats {
        total: reviews.len(),
        mean_rating: rating_sum / reviews.len() as f64,
        top_games,
    }
}
