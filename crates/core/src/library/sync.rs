use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    api::ApiClient,
    models::{Game, Review},
    stats::{GameStats, ReviewStats},
};

use super::Library;

/// Events emitted by the async library synchroniser.
#[derive(Debug)]
pub enum SyncEvent {
    /// Fetch succeeded.
    Loaded {
        /// Every game on the server.
        games: Vec<Game>,
        /// Every review on the server.
        reviews: Vec<Review>,
        /// When the fetch completed.
        fetched_at: DateTime<Utc>,
    },
    /// Fetch failed.
    Error(anyhow::Error),
}

/// Where dashboard statistics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSource {
    /// Aggregate the fetched snapshot in-process.
    #[default]
    Local,
    /// Use the server's statistics endpoints.
    Remote,
}

impl StatsSource {
    /// Produce game and review statistics from this source.
    pub async fn fetch_stats(
        self,
        library: &Library,
        client: &ApiClient,
    ) -> Result<(GameStats, ReviewStats)> {
        match self {
            StatsSource::Local => Ok((library.game_stats(), library.review_stats())),
            StatsSource::Remote => {
                let (games, reviews) = tokio::try_join!(client.game_stats(), client.review_stats())
                    .context("failed to fetch statistics from server")?;
                Ok((games, reviews))
            }
        }
    }
}

/// Coordinates fetching the collection from the catalog API.
#[derive(Debug, Clone)]
pub struct LibrarySync {
    client: ApiClient,
}

impl LibrarySync {
    /// Create a new synchroniser around an API client.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Client used for fetching.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fetch games and reviews concurrently.
    pub async fn fetch(&self) -> Result<(Vec<Game>, Vec<Review>)> {
        let (games, reviews) =
            tokio::try_join!(self.client.list_games(), self.client.list_reviews())
                .with_context(|| format!("failed to fetch library from {}", self.client.base_url()))?;
        Ok((games, reviews))
    }

    /// Perform the initial load into `library`.
    pub async fn prepare(&self, library: &Library) -> Result<()> {
        let (games, reviews) = self.fetch().await?;
        info!(
            games = games.len(),
            reviews = reviews.len(),
            "Initial library load"
        );
        library.replace(games, reviews, Utc::now());
        Ok(())
    }

    /// Fetch once, sending the outcome to the provided channel.
    pub async fn run(self, sender: mpsc::Sender<SyncEvent>) -> Result<()> {
        let event = match self.fetch().await {
            Ok((games, reviews)) => {
                info!(
                    games = games.len(),
                    reviews = reviews.len(),
                    "Library refreshed"
                );
                SyncEvent::Loaded {
                    games,
                    reviews,
                    fetched_at: Utc::now(),
                }
            }
            Err(err) => {
                warn!(?err, "Library refresh failed");
                SyncEvent::Error(err)
            }
        };

        sender
            .send(event)
            .await
            .context("failed to send sync event")?;
        Ok(())
    }
}
