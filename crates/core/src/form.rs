//! Editable drafts for games and reviews and their validation.
//!
//! Drafts hold raw text the way a user typed it; `validate` turns them into
//! the typed payloads the API accepts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    Game, GameInput, GameStatus, Genre, Platform, Review, ReviewInput, MAX_RATING,
    MAX_RELEASE_YEARS_AHEAD, MIN_RELEASE_YEAR,
};

/// Longest accepted review title, in characters.
pub const MAX_REVIEW_TITLE_CHARS: usize = 100;
/// Longest accepted review body, in characters.
pub const MAX_REVIEW_BODY_CHARS: usize = 2000;

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_messages(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Failed fields and their messages, ordered by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn join_messages(fields: &BTreeMap<&'static str, String>) -> String {
    fields.values().map(String::as_str).collect::<Vec<_>>().join("; ")
}

/// Growable list of free-text points. Operations return new lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointList {
    items: Vec<String>,
}

impl Default for PointList {
    fn default() -> Self {
        Self {
            items: vec![String::new()],
        }
    }
}

impl PointList {
    /// Build a list from existing points; an empty input yields one blank entry.
    pub fn from_points(points: &[String]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        Self {
            items: points.to_vec(),
        }
    }

    /// Entries, including blank ones.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; a list keeps at least one entry.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a blank entry at the end.
    pub fn push_empty(&self) -> Self {
        let mut items = self.items.clone();
        items.push(String::new());
        Self { items }
    }

    /// Remove the entry at `index`. The last remaining entry is never removed.
    pub fn remove(&self, index: usize) -> Self {
        if self.items.len() <= 1 || index >= self.items.len() {
            return self.clone();
        }
        let mut items = self.items.clone();
        items.remove(index);
        Self { items }
    }

    /// Replace the entry at `index`.
    pub fn set(&self, index: usize, value: impl Into<String>) -> Self {
        let mut items = self.items.clone();
        if let Some(slot) = items.get_mut(index) {
            *slot = value.into();
        }
        Self { items }
    }

    /// Entries that are not blank, trimmed.
    pub fn cleaned(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Editable state of the game form.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct GameDraft {
    pub title: String,
    pub developer: String,
    pub genre: Option<Genre>,
    pub platform: Option<Platform>,
    pub release_year: String,
    pub cover_url: String,
    pub status: GameStatus,
    pub rating: u8,
    pub hours_played: String,
    pub started_on: String,
    pub finished_on: String,
}

impl GameDraft {
    /// Blank draft for a new game released in `current_year`.
    pub fn new(current_year: i32) -> Self {
        Self {
            title: String::new(),
            developer: String::new(),
            genre: None,
            platform: None,
            release_year: current_year.to_string(),
            cover_url: String::new(),
            status: GameStatus::Unplayed,
            rating: 0,
            hours_played: "0".to_string(),
            started_on: String::new(),
            finished_on: String::new(),
        }
    }

    /// Draft pre-filled from an existing game.
    pub fn from_game(game: &Game) -> Self {
        Self {
            title: game.title.clone(),
            developer: game.developer.clone(),
            genre: Some(game.genre.clone()).filter(|genre| !genre.as_str().is_empty()),
            platform: Some(game.platform.clone())
                .filter(|platform| !platform.as_str().is_empty()),
            release_year: game.release_year.to_string(),
            cover_url: game.cover_url.clone().unwrap_or_default(),
            status: game.status,
            rating: game.rating,
            hours_played: game.hours_played.to_string(),
            started_on: game
                .started_at
                .map(|date| date.date_naive().to_string())
                .unwrap_or_default(),
            finished_on: game
                .finished_at
                .map(|date| date.date_naive().to_string())
                .unwrap_or_default(),
        }
    }

    /// Check the draft and build the API payload.
    pub fn validate(&self, current_year: i32) -> Result<GameInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }
        let developer = self.developer.trim();
        if developer.is_empty() {
            errors.add("developer", "Developer is required");
        }
        if self.genre.is_none() {
            errors.add("genre", "Genre is required");
        }
        if self.platform.is_none() {
            errors.add("platform", "Platform is required");
        }

        let max_year = current_year + MAX_RELEASE_YEARS_AHEAD;
        let release_year = match self.release_year.trim().parse::<i32>() {
            Ok(year) if (MIN_RELEASE_YEAR..=max_year).contains(&year) => year,
            _ => {
                errors.add(
                    "release_year",
                    format!("Release year must be between {MIN_RELEASE_YEAR} and {max_year}"),
                );
                0
            }
        };

        let hours_played = parse_hours(&self.hours_played, "hours_played", &mut errors);

        if self.rating > MAX_RATING {
            errors.add("rating", format!("Rating must be between 0 and {MAX_RATING}"));
        }

        let started_on = parse_date(&self.started_on, "started_on", &mut errors);
        let finished_on = parse_date(&self.finished_on, "finished_on", &mut errors);

        let cover_url = Some(self.cover_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        errors.into_result(|| GameInput {
            title: title.to_string(),
            developer: developer.to_string(),
            genre: self.genre.clone().unwrap_or_default(),
            platform: self.platform.clone().unwrap_or_default(),
            release_year,
            cover_url,
            status: self.status,
            rating: self.rating,
            hours_played,
            started_on,
            finished_on,
        })
    }
}

/// Editable state of the review form.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub game_id: Option<String>,
    pub title: String,
    pub body: String,
    pub rating: u8,
    pub pros: PointList,
    pub cons: PointList,
    pub hours_played: String,
    pub recommended: bool,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            game_id: None,
            title: String::new(),
            body: String::new(),
            rating: 0,
            pros: PointList::default(),
            cons: PointList::default(),
            hours_played: "0".to_string(),
            recommended: true,
        }
    }
}

impl ReviewDraft {
    /// Draft pre-filled from an existing review.
    pub fn from_review(review: &Review) -> Self {
        Self {
            game_id: Some(review.game.id().to_string()),
            title: review.title.clone(),
            body: review.body.clone(),
            rating: review.rating,
            pros: PointList::from_points(&review.pros),
            cons: PointList::from_points(&review.cons),
            hours_played: review.hours_played.to_string(),
            recommended: review.recommended,
        }
    }

    /// Check the draft and build the API payload. Blank points are dropped.
    pub fn validate(&self) -> Result<ReviewInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let game_id = self
            .game_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if game_id.is_none() {
            errors.add("game", "Select a game to review");
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Review title is required");
        } else if title.chars().count() > MAX_REVIEW_TITLE_CHARS {
            errors.add(
                "title",
                format!("Title cannot exceed {MAX_REVIEW_TITLE_CHARS} characters"),
            );
        }

        let body = self.body.trim();
        if body.is_empty() {
            errors.add("body", "Review text is required");
        } else if body.chars().count() > MAX_REVIEW_BODY_CHARS {
            errors.add(
                "body",
                format!("Review cannot exceed {MAX_REVIEW_BODY_CHARS} characters"),
            );
        }

        if !(1..=MAX_RATING).contains(&self.rating) {
            errors.add("rating", "A rating from 1 to 5 is required");
        }

        let hours_played = parse_hours(&self.hours_played, "hours_played", &mut errors);

        let pros = self.pros.cleaned();
        let cons = self.cons.cleaned();
        if pros.is_empty() && cons.is_empty() {
            errors.add("points", "Add at least one positive or negative point");
        }

        errors.into_result(|| ReviewInput {
            game_id: game_id.unwrap_or_default().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            rating: self.rating,
            pros,
            cons,
            hours_played,
            recommended: self.recommended,
        })
    }
}

fn parse_hours(raw: &str, field: &'static str, errors: &mut ValidationErrors) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => hours,
        Ok(_) => {
            errors.add(field, "Hours played cannot be negative");
            0.0
        }
        Err(_) => {
            errors.add(field, "Hours played must be a number");
            0.0
        }
    }
}

fn parse_date(
    raw: &str,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Dates use the YYYY-MM-DD format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::game;

    fn valid_game_draft() -> GameDraft {
        GameDraft {
            title: "  Hades ".into(),
            developer: "Supergiant".into(),
            genre: Some(Genre::Action),
            platform: Some(Platform::Pc),
            release_year: "2020".into(),
            hours_played: "35.5".into(),
            started_on: "2024-02-01".into(),
            ..GameDraft::new(2026)
        }
    }

    #[test]
    fn game_draft_builds_trimmed_input() {
        let input = valid_game_draft().validate(2026).expect("valid draft");
        assert_eq!(input.title, "Hades");
        assert_eq!(input.hours_played, 35.5);
        assert_eq!(input.started_on, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(input.finished_on.is_none());
        assert!(input.cover_url.is_none());
        assert_eq!(input.status, GameStatus::Unplayed);
    }

    #[test]
    fn game_draft_reports_every_invalid_field() {
        let draft = GameDraft {
            title: "   ".into(),
            release_year: "1969".into(),
            hours_played: "-2".into(),
            finished_on: "01/02/2024".into(),
            ..GameDraft::new(2026)
        };
        let errors = draft.validate(2026).unwrap_err();
        for field in [
            "title",
            "developer",
            "genre",
            "platform",
            "release_year",
            "hours_played",
            "finished_on",
        ] {
            assert!(errors.get(field).is_some(), "expected error for {field}");
        }
        assert!(errors.get("started_on").is_none());
    }

    #[test]
    fn release_year_bounds_follow_current_year() {
        let mut draft = valid_game_draft();
        draft.release_year = "2031".into();
        assert!(draft.validate(2026).is_ok());
        draft.release_year = "2032".into();
        assert!(draft.validate(2026).is_err());
        draft.release_year = "1970".into();
        assert!(draft.validate(2026).is_ok());
    }

    #[test]
    fn game_draft_round_trips_existing_game() {
        let mut existing = game("g1", "Celeste", 12.0);
        existing.developer = "Maddy Makes Games".into();
        existing.genre = Genre::Platformer;
        existing.platform = Platform::NintendoSwitch;
        existing.release_year = 2018;
        existing.rating = 5;

        let draft = GameDraft::from_game(&existing);
        assert_eq!(draft.hours_played, "12");
        let input = draft.validate(2026).expect("existing game stays valid");
        assert_eq!(input.genre, Genre::Platformer);
        assert_eq!(input.rating, 5);
        assert_eq!(input.hours_played, 12.0);
    }

    #[test]
    fn point_list_operations_return_new_lists() {
        let list = PointList::default();
        assert_eq!(list.len(), 1);

        let grown = list.push_empty().set(0, "Great music").set(1, "  ");
        assert_eq!(grown.items().to_vec(), ["Great music", "  "]);
        assert_eq!(list.len(), 1);

        let shrunk = grown.remove(1);
        assert_eq!(shrunk.items().to_vec(), ["Great music"]);
        assert_eq!(shrunk.remove(0), shrunk);
        assert_eq!(grown.remove(7), grown);
        assert_eq!(grown.cleaned(), ["Great music"]);
    }

    #[test]
    fn review_draft_requires_a_point() {
        let draft = ReviewDraft {
            game_id: Some("g1".into()),
            title: "Fine".into(),
            body: "It was fine.".into(),
            rating: 3,
            pros: PointList::default().set(0, "   "),
            ..ReviewDraft::default()
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("points").is_some());
        assert_eq!(errors.iter().count(), 1);

        let fixed = ReviewDraft {
            cons: PointList::default().set(0, " Too short "),
            ..draft
        };
        let input = fixed.validate().expect("valid review");
        assert!(input.pros.is_empty());
        assert_eq!(input.cons, ["Too short"]);
        assert!(input.recommended);
    }

    #[test]
    fn review_draft_round_trips_an_existing_review() {
        let mut review = crate::test_support::review("r1", "g7", 4);
        review.body = "Loved the soundtrack.".into();
        review.cons = vec!["Short".into()];
        review.hours_played = 9.5;

        let draft = ReviewDraft::from_review(&review);
        assert_eq!(draft.game_id.as_deref(), Some("g7"));
        assert_eq!(draft.pros.len(), 1);
        let input = draft.validate().expect("existing review stays valid");
        assert_eq!(input.title, review.title);
        assert_eq!(input.cons, ["Short"]);
        assert_eq!(input.hours_played, 9.5);
        assert!(!input.recommended);
    }

    #[test]
    fn review_draft_enforces_lengths_and_rating() {
        let draft = ReviewDraft {
            title: "x".repeat(MAX_REVIEW_TITLE_CHARS + 1),
            body: "y".repeat(MAX_REVIEW_BODY_CHARS + 1),
            rating: 0,
            hours_played: "lots".into(),
            pros: PointList::default().set(0, "ok"),
            ..ReviewDraft::default()
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("game").is_some());
        assert!(errors.get("title").unwrap().contains("100"));
        assert!(errors.get("body").unwrap().contains("2000"));
        assert!(errors.get("rating").is_some());
        assert_eq!(errors.get("hours_played"), Some("Hours played must be a number"));
        assert!(errors.to_string().contains("Select a game"));
    }

    #[test]
    fn review_length_limits_apply_to_trimmed_text() {
        let draft = ReviewDraft {
            game_id: Some("g1".into()),
            title: format!("{} ", "a".repeat(MAX_REVIEW_TITLE_CHARS)),
            body: format!("  {}\n", "b".repeat(MAX_REVIEW_BODY_CHARS)),
            rating: 4,
            pros: PointList::default().set(0, "Tight"),
            ..ReviewDraft::default()
        };
        let input = draft.validate().expect("limits are measured after trimming");
        assert_eq!(input.title.chars().count(), MAX_REVIEW_TITLE_CHARS);
        assert_eq!(input.body.chars().count(), MAX_REVIEW_BODY_CHARS);
    }
}
