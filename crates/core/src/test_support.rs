use chrono::{TimeZone, Utc};

use crate::models::{Game, GameRef, GameStatus, Genre, Platform, Review};

/// Unplayed, unrated indie game with the given title and hours.
pub fn game(id: &str, title: &str, hours: f64) -> Game {
    Game {
        id: id.to_string(),
        title: title.to_string(),
        developer: String::new(),
        genre: Genre::Indie,
        platform: Platform::Pc,
        release_year: 2020,
        cover_url: None,
        status: GameStatus::Unplayed,
        rating: 0,
        hours_played: hours,
        started_at: None,
        finished_at: None,
        added_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Review of `game_id` referencing the game by bare id.
pub fn review(id: &str, game_id: &str, rating: u8) -> Review {
    Review {
        id: id.to_string(),
        game: GameRef::Id(game_id.to_string()),
        title: format!("Review {id}"),
        body: String::new(),
        rating,
        pros: Vec::new(),
        cons: Vec::new(),
        hours_played: 0.0,
        recommended: false,
        review_date: None,
        created_at: None,
    }
}

pub fn ids(games: &[Game]) -> Vec<String> {
    games.iter().map(|game| game.id.clone()).collect()
}
