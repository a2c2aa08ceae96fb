//! Shared domain models.
//!
//! Field names on the wire follow the catalog server's JSON schema, which is
//! why most fields carry a `serde(rename)`.

mod review;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use review::{GameRef, GameSummary, Review, ReviewInput};

/// Earliest accepted release year.
pub const MIN_RELEASE_YEAR: i32 = 1970;
/// How many years past the current one a release year may lie.
pub const MAX_RELEASE_YEARS_AHEAD: i32 = 5;
/// Highest rating a game or review can carry.
pub const MAX_RATING: u8 = 5;

/// Decodes a JSON `null` the same way as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Play-progress of a game in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Owned but not started yet.
    #[default]
    #[serde(rename = "Por jugar", alias = "Unplayed")]
    Unplayed,
    /// Currently being played.
    #[serde(rename = "Jugando", alias = "Playing")]
    Playing,
    /// Finished.
    #[serde(rename = "Completado", alias = "Completed")]
    Completed,
    /// Dropped before finishing.
    #[serde(rename = "Abandonado", alias = "Abandoned")]
    Abandoned,
}

impl GameStatus {
    /// Every status, in display order.
    pub const ALL: [GameStatus; 4] = [
        GameStatus::Unplayed,
        GameStatus::Playing,
        GameStatus::Completed,
        GameStatus::Abandoned,
    ];

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Unplayed => "Unplayed",
            GameStatus::Playing => "Playing",
            GameStatus::Completed => "Completed",
            GameStatus::Abandoned => "Abandoned",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declares a closed set of catalog values that still round-trips unknown
/// strings coming from the server.
macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
            /// Value not part of the known set, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Known values, in the order the forms present them.
            pub const KNOWN: &'static [$name] = &[$($name::$variant),+];

            /// Text stored on the server for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(value) => value.as_str(),
                }
            }

            /// Whether the value is one of the known catalog entries.
            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(value) => value,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Other(String::new())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

catalog_enum! {
    /// Genre of a game.
    Genre {
        Action => "Acción",
        Adventure => "Aventura",
        Rpg => "RPG",
        Strategy => "Estrategia",
        Sports => "Deportes",
        Racing => "Carreras",
        Shooter => "Shooter",
        Indie => "Indie",
        Simulation => "Simulación",
        Horror => "Terror",
        Platformer => "Plataformas",
        Fighting => "Lucha",
        OpenWorld => "Mundo abierto",
    }
}

catalog_enum! {
    /// Platform a game is played on.
    Platform {
        Pc => "PC",
        PlayStation => "PlayStation",
        Xbox => "Xbox",
        NintendoSwitch => "Nintendo Switch",
        Mobile => "Mobile",
        Multiplatform => "Multiplataforma",
    }
}

/// A game in the personal collection, as returned by the catalog server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Opaque server identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Game title.
    #[serde(rename = "titulo")]
    pub title: String,
    /// Developer studio.
    #[serde(rename = "desarrolladora", default, deserialize_with = "null_as_default")]
    pub developer: String,
    /// Genre.
    #[serde(rename = "genero", default, deserialize_with = "null_as_default")]
    pub genre: Genre,
    /// Platform.
    #[serde(rename = "plataforma", default, deserialize_with = "null_as_default")]
    pub platform: Platform,
    /// Year of release.
    #[serde(rename = "añoLanzamiento", default, deserialize_with = "null_as_default")]
    pub release_year: i32,
    /// Cover art URL.
    #[serde(rename = "portada", default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Play-progress.
    #[serde(rename = "estado", default, deserialize_with = "null_as_default")]
    pub status: GameStatus,
    /// Personal rating, `0` meaning unrated.
    #[serde(rename = "puntuacion", default, deserialize_with = "null_as_default")]
    pub rating: u8,
    /// Hours played so far.
    #[serde(rename = "horasJugadas", default, deserialize_with = "null_as_default")]
    pub hours_played: f64,
    /// When playing started.
    #[serde(rename = "fechaInicio", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When playing ended.
    #[serde(rename = "fechaFin", default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// When the game was added to the collection.
    #[serde(rename = "fechaAgregado")]
    pub added_at: DateTime<Utc>,
}

impl Game {
    /// Returns a user-facing label combining title and release year.
    pub fn display_name(&self) -> String {
        if self.release_year > 0 {
            format!("{} ({})", self.title, self.release_year)
        } else {
            self.title.clone()
        }
    }

    /// Whether the game carries a personal rating.
    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }
}

/// Payload for creating or updating a game.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInput {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "desarrolladora")]
    pub developer: String,
    #[serde(rename = "genero")]
    pub genre: Genre,
    #[serde(rename = "plataforma")]
    pub platform: Platform,
    #[serde(rename = "añoLanzamiento")]
    pub release_year: i32,
    #[serde(rename = "portada", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "estado")]
    pub status: GameStatus,
    #[serde(rename = "puntuacion")]
    pub rating: u8,
    #[serde(rename = "horasJugadas")]
    pub hours_played: f64,
    #[serde(rename = "fechaInicio", skip_serializing_if = "Option::is_none")]
    pub started_on: Option<NaiveDate>,
    #[serde(rename = "fechaFin", skip_serializing_if = "Option::is_none")]
    pub finished_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_server_game_with_missing_optionals() {
        let game: Game = serde_json::from_value(json!({
            "_id": "g1",
            "titulo": "Hollow Knight",
            "desarrolladora": "Team Cherry",
            "genero": "Plataformas",
            "plataforma": "PC",
            "añoLanzamiento": 2017,
            "estado": "Completado",
            "fechaAgregado": "2024-03-01T10:00:00.000Z",
            "portada": null
        }))
        .expect("game should decode");

        assert_eq!(game.genre, Genre::Platformer);
        assert_eq!(game.platform, Platform::Pc);
        assert_eq!(game.status, GameStatus::Completed);
        assert_eq!(game.rating, 0);
        assert_eq!(game.hours_played, 0.0);
        assert!(game.cover_url.is_none());
        assert!(game.started_at.is_none());
        assert!(!game.is_rated());
        assert_eq!(game.display_name(), "Hollow Knight (2017)");
    }

    #[test]
    fn null_fields_decode_as_defaults() {
        let game: Game = serde_json::from_value(json!({
            "_id": "g2",
            "titulo": "Outer Wilds",
            "desarrolladora": null,
            "genero": null,
            "plataforma": null,
            "añoLanzamiento": null,
            "estado": null,
            "puntuacion": null,
            "horasJugadas": null,
            "fechaAgregado": "2024-03-01T10:00:00Z"
        }))
        .expect("nulls should fall back to defaults");

        assert_eq!(game.developer, "");
        assert_eq!(game.genre, Genre::default());
        assert_eq!(game.platform, Platform::default());
        assert_eq!(game.release_year, 0);
        assert_eq!(game.status, GameStatus::Unplayed);
        assert_eq!(game.rating, 0);
        assert_eq!(game.hours_played, 0.0);
    }

    #[test]
    fn unknown_catalog_values_are_preserved() {
        let genre = Genre::from("Puzzle");
        assert!(!genre.is_known());
        assert_eq!(genre.as_str(), "Puzzle");
        assert_eq!(String::from(genre), "Puzzle");
        assert_eq!(Genre::from("Mundo abierto"), Genre::OpenWorld);
        assert_eq!(Platform::KNOWN.len(), 6);
        assert_eq!(Genre::KNOWN.len(), 13);
    }

    #[test]
    fn status_uses_server_wire_names() {
        let encoded = serde_json::to_value(GameStatus::Unplayed).expect("encode status");
        assert_eq!(encoded, json!("Por jugar"));
        let decoded: GameStatus = serde_json::from_value(json!("Abandoned")).expect("alias");
        assert_eq!(decoded, GameStatus::Abandoned);
    }

    #[test]
    fn game_input_omits_empty_dates() {
        let input = GameInput {
            title: "Celeste".into(),
            developer: "Maddy Makes Games".into(),
            genre: Genre::Platformer,
            platform: Platform::NintendoSwitch,
            release_year: 2018,
            cover_url: None,
            status: GameStatus::Playing,
            rating: 4,
            hours_played: 12.5,
            started_on: NaiveDate::from_ymd_opt(2024, 1, 2),
            finished_on: None,
        };
        let value = serde_json::to_value(&input).expect("encode input");
        assert_eq!(value["fechaInicio"], json!("2024-01-02"));
        assert!(value.get("fechaFin").is_none());
        assert_eq!(value["plataforma"], json!("Nintendo Switch"));
    }
}
