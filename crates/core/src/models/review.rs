use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Minimal game information embedded in a populated review reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Identifier of the referenced game.
    #[serde(rename = "_id")]
    pub id: String,
    /// Title, when the server populated it.
    #[serde(rename = "titulo", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Cover art URL, when present.
    #[serde(rename = "portada", default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// Reference from a review to the reviewed game.
///
/// The server either sends a bare id or the populated game document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameRef {
    /// Populated game document.
    Populated(GameSummary),
    /// Bare game id.
    Id(String),
}

impl GameRef {
    /// Identifier of the referenced game.
    pub fn id(&self) -> &str {
        match self {
            GameRef::Populated(summary) => &summary.id,
            GameRef::Id(id) => id,
        }
    }

    /// Title of the referenced game, if populated.
    pub fn title(&self) -> Option<&str> {
        match self {
            GameRef::Populated(summary) => summary.title.as_deref(),
            GameRef::Id(_) => None,
        }
    }

    /// Cover URL of the referenced game, if populated.
    pub fn cover_url(&self) -> Option<&str> {
        match self {
            GameRef::Populated(summary) => summary.cover_url.as_deref(),
            GameRef::Id(_) => None,
        }
    }
}

/// A written review of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Opaque server identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Reviewed game.
    #[serde(rename = "juegoId")]
    pub game: GameRef,
    /// Headline, at most 100 characters.
    #[serde(rename = "titulo")]
    pub title: String,
    /// Review text, at most 2000 characters.
    #[serde(rename = "contenido", default, deserialize_with = "null_as_default")]
    pub body: String,
    /// Rating from 1 to 5.
    #[serde(rename = "puntuacion")]
    pub rating: u8,
    /// Positive points, in the order they were written.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pros: Vec<String>,
    /// Negative points, in the order they were written.
    #[serde(rename = "contras", default, deserialize_with = "null_as_default")]
    pub cons: Vec<String>,
    /// Hours played when the review was written.
    #[serde(rename = "horasJugadasParaReseña", default, deserialize_with = "null_as_default")]
    pub hours_played: f64,
    /// Whether the reviewer recommends the game.
    #[serde(rename = "recomendado", default, deserialize_with = "null_as_default")]
    pub recommended: bool,
    /// Explicit review date.
    #[serde(rename = "fechaReseña", default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<DateTime<Utc>>,
    /// When the server stored the review.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// When the review was written, falling back to its creation time.
    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.review_date.or(self.created_at)
    }
}

/// Payload for creating or updating a review.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(rename = "juegoId")]
    pub game_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "contenido")]
    pub body: String,
    #[serde(rename = "puntuacion")]
    pub rating: u8,
    pub pros: Vec<String>,
    #[serde(rename = "contras")]
    pub cons: Vec<String>,
    #[serde(rename = "horasJugadasParaReseña")]
    pub hours_played: f64,
    #[serde(rename = "recomendado")]
    pub recommended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_populated_and_bare_game_refs() {
        let populated: Review = serde_json::from_value(json!({
            "_id": "r1",
            "juegoId": { "_id": "g1", "titulo": "Hades", "portada": "https://img/hades.png" },
            "titulo": "Great loop",
            "contenido": "One more run.",
            "puntuacion": 5,
            "pros": ["Combat"],
            "contras": [],
            "recomendado": true,
            "fechaReseña": "2024-05-01T12:00:00Z"
        }))
        .expect("populated review");
        assert_eq!(populated.game.id(), "g1");
        assert_eq!(populated.game.title(), Some("Hades"));
        assert_eq!(populated.game.cover_url(), Some("https://img/hades.png"));

        let bare: Review = serde_json::from_value(json!({
            "_id": "r2",
            "juegoId": "g2",
            "titulo": "Meh",
            "puntuacion": 2
        }))
        .expect("bare review");
        assert_eq!(bare.game, GameRef::Id("g2".into()));
        assert_eq!(bare.game.title(), None);
        assert!(bare.pros.is_empty());
        assert!(!bare.recommended);
        assert!(bare.reviewed_at().is_none());
    }

    #[test]
    fn review_date_falls_back_to_creation_time() {
        let created_only: Review = serde_json::from_value(json!({
            "_id": "r1",
            "juegoId": "g1",
            "titulo": "t",
            "puntuacion": 3,
            "createdAt": "2024-05-01T12:00:00Z"
        }))
        .expect("review with createdAt");
        assert_eq!(
            created_only.reviewed_at().map(|at| at.to_rfc3339()),
            Some("2024-05-01T12:00:00+00:00".to_string())
        );

        let both: Review = serde_json::from_value(json!({
            "_id": "r2",
            "juegoId": "g1",
            "titulo": "t",
            "puntuacion": 3,
            "fechaReseña": "2024-06-02T08:00:00Z",
            "createdAt": "2024-05-01T12:00:00Z",
            "contenido": null,
            "pros": null,
            "recomendado": null
        }))
        .expect("review with both dates");
        assert_eq!(both.reviewed_at(), both.review_date);
        assert_eq!(
            both.reviewed_at().map(|at| at.to_rfc3339()),
            Some("2024-06-02T08:00:00+00:00".to_string())
        );
        assert!(both.body.is_empty());
        assert!(both.pros.is_empty());
        assert!(!both.recommended);
    }
}
