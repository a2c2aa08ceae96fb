//! Async client for the catalog REST API.
//!
//! Every endpoint wraps its payload in a `{ "data": ... }` envelope; failures
//! may carry a `message` field that is surfaced verbatim.

mod error;

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    config::ApiConfig,
    models::{Game, GameInput, Review, ReviewInput},
    stats::{GameStats, ReviewStats},
};

pub use error::ApiError;

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

const GAMES: &str = "juegos";
const REVIEWS: &str = "reseñas";
const STATS: &str = "estadisticas";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for game and review resources.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|err| ApiError::InvalidUrl {
            url: base_url.clone(),
            reason: err.to_string(),
        })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ApiError::Transport {
                path: String::new(),
                source,
            })?;
        Ok(Self { http, base_url })
    }

    /// Base URL every resource path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every game.
    pub async fn list_games(&self) -> ApiResult<Vec<Game>> {
        self.get(GAMES).await
    }

    /// Fetch one game.
    pub async fn get_game(&self, id: &str) -> ApiResult<Game> {
        self.get(&format!("{GAMES}/{id}")).await
    }

    /// Create a game and return the stored record.
    pub async fn create_game(&self, input: &GameInput) -> ApiResult<Game> {
        self.send(Method::POST, GAMES, Some(input)).await
    }

    /// Replace a game's editable fields.
    pub async fn update_game(&self, id: &str, input: &GameInput) -> ApiResult<Game> {
        self.send(Method::PUT, &format!("{GAMES}/{id}"), Some(input))
            .await
    }

    /// Delete a game.
    pub async fn delete_game(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("{GAMES}/{id}")).await
    }

    /// Server-computed collection statistics.
    pub async fn game_stats(&self) -> ApiResult<GameStats> {
        self.get(&format!("{GAMES}/{STATS}")).await
    }

    /// Fetch every review.
    pub async fn list_reviews(&self) -> ApiResult<Vec<Review>> {
        self.get(REVIEWS).await
    }

    /// Fetch the reviews of one game.
    pub async fn reviews_for_game(&self, game_id: &str) -> ApiResult<Vec<Review>> {
        self.get(&format!("{REVIEWS}/juego/{game_id}")).await
    }

    /// Create a review and return the stored record.
    pub async fn create_review(&self, input: &ReviewInput) -> ApiResult<Review> {
        self.send(Method::POST, REVIEWS, Some(input)).await
    }

    /// Replace a review's editable fields.
    pub async fn update_review(&self, id: &str, input: &ReviewInput) -> ApiResult<Review> {
        self.send(Method::PUT, &format!("{REVIEWS}/{id}"), Some(input))
            .await
    }

    /// Delete a review.
    pub async fn delete_review(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("{REVIEWS}/{id}")).await
    }

    /// Server-computed review statistics.
    pub async fn review_stats(&self) -> ApiResult<ReviewStats> {
        self.get(&format!("{REVIEWS}/{STATS}")).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.request::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let bytes = self.request(method, path, body).await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|source| {
                warn!(path, %source, "Undecodable API response");
                ApiError::Decode {
                    path: path.to_string(),
                    source,
                }
            })?;
        Ok(envelope.data)
    }

    async fn request<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        debug!(%method, %url, "API request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| {
            error!(path, %source, "API request failed without a response");
            ApiError::Transport {
                path: path.to_string(),
                source,
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            error!(path, status = status.as_u16(), %message, "API returned an error");
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| ApiError::InvalidUrl {
            url: raw,
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameStatus, Genre, Platform};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client(server: &ServerGuard) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("{}/api/", server.url()),
            timeout_secs: 5,
        })
        .expect("client")
    }

    fn game_json(id: &str, title: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "titulo": title,
            "desarrolladora": "Studio",
            "genero": "RPG",
            "plataforma": "PC",
            "añoLanzamiento": 2020,
            "estado": "Jugando",
            "puntuacion": 4,
            "horasJugadas": 12.5,
            "fechaAgregado": "2024-01-01T00:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn lists_games_from_envelope() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/juegos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "success": true, "data": [game_json("g1", "Persona 5")] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let games = client(&server).list_games().await.expect("games");
        mock.assert_async().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].title, "Persona 5");
        assert_eq!(games[0].status, GameStatus::Playing);
    }

    #[tokio::test]
    async fn creates_game_with_wire_field_names() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/juegos")
            .match_body(Matcher::PartialJson(json!({
                "titulo": "Persona 5",
                "genero": "RPG",
                "estado": "Jugando"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": game_json("g9", "Persona 5") }).to_string())
            .create_async()
            .await;

        let input = GameInput {
            title: "Persona 5".into(),
            developer: "Atlus".into(),
            genre: Genre::Rpg,
            platform: Platform::PlayStation,
            release_year: 2016,
            cover_url: None,
            status: GameStatus::Playing,
            rating: 0,
            hours_played: 0.0,
            started_on: None,
            finished_on: None,
        };
        let created = client(&server).create_game(&input).await.expect("created");
        mock.assert_async().await;
        assert_eq!(created.id, "g9");
    }

    #[tokio::test]
    async fn surfaces_server_error_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/juegos/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"message":"Juego no encontrado"}"#)
            .create_async()
            .await;

        let err = client(&server).delete_game("missing").await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "Juego no encontrado"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn falls_back_to_reason_phrase_without_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/juegos/estadisticas")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let err = client(&server).game_stats().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn reports_undecodable_bodies() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/juegos/g1")
            .with_status(200)
            .with_body(r#"{"data":{"unexpected":true}}"#)
            .create_async()
            .await;

        let err = client(&server).get_game("g1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn fetches_review_statistics() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/rese(ñ|%C3%B1)as/estadisticas$".into()))
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "totalReseñas": 1,
                        "promedioPuntuacion": 5,
                        "juegosMejorCalificados": []
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let stats = client(&server).review_stats().await.expect("stats");
        assert_eq!(stats.total, 1);
        assert_eq!(stats.mean_rating, 5.0);
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = ApiClient::new(&ApiConfig {
            base_url: "not a url".into(),
            timeout_secs: 1,
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}
