//! Song catalog collaborator.
//!
//! The orchestrator never owns song storage; it asks a catalog for one
//! random song matching the game's genres, excluding everything already
//! played. The HTTP implementation talks to the external catalog service;
//! the builtin implementation serves a JSON file for demos and tests.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CatalogConfig, CatalogMode};
use crate::protocol::SongInfo;

/// Failure modes of a selection call.
///
/// `NoSongAvailable` is a domain outcome, not a transport failure: the
/// catalog answered and there is simply nothing left to play.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("song catalog unavailable: {0}")]
    Unavailable(String),
    #[error("no unplayed song matches the requested genres")]
    NoSongAvailable,
}

/// Random-selection interface implemented by catalog backends.
#[async_trait]
pub trait SongCatalog: Send + Sync {
    /// Pick one random song matching `genres` (empty = no filter) whose id
    /// is not in `exclude_ids`.
    async fn select_song(
        &self,
        genres: &[String],
        exclude_ids: &[i64],
    ) -> Result<SongInfo, CatalogError>;
}

/// Construct the catalog backend chosen by configuration.
pub fn create_catalog(config: &CatalogConfig) -> anyhow::Result<Box<dyn SongCatalog>> {
    match config.mode {
        CatalogMode::Http => Ok(Box::new(HttpSongCatalog::new(config)?)),
        CatalogMode::Builtin => {
            let path = config
                .songs_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("catalog.songs_path is required in builtin mode"))?;
            Ok(Box::new(BuiltinSongCatalog::from_file(Path::new(path))?))
        }
    }
}

#[derive(Debug, Serialize)]
struct SelectRequest<'a> {
    genres: &'a [String],
    exclude_ids: &'a [i64],
    count: u32,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    songs: Vec<SongInfo>,
}

/// Catalog backed by the external HTTP service.
pub struct HttpSongCatalog {
    client: reqwest::Client,
    select_url: String,
    retry_backoff: Duration,
}

impl HttpSongCatalog {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("invalid catalog base_url '{}': {e}", config.base_url))?;
        let select_url = base.join("select")?.to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            select_url,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    async fn post_select(
        &self,
        genres: &[String],
        exclude_ids: &[i64],
    ) -> Result<SelectResponse, CatalogError> {
        let body = SelectRequest {
            genres,
            exclude_ids,
            count: 1,
        };

        let response = self
            .client
            .post(&self.select_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "catalog returned HTTP {status}"
            )));
        }

        response
            .json::<SelectResponse>()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("bad catalog payload: {e}")))
    }
}

#[async_trait]
impl SongCatalog for HttpSongCatalog {
    async fn select_song(
        &self,
        genres: &[String],
        exclude_ids: &[i64],
    ) -> Result<SongInfo, CatalogError> {
        // One retry on transport error only; a clean "nothing left" answer
        // is final and must not be retried.
        let response = match self.post_select(genres, exclude_ids).await {
            Ok(response) => response,
            Err(CatalogError::Unavailable(first_error)) => {
                tracing::warn!(error = %first_error, "Catalog call failed, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.post_select(genres, exclude_ids).await?
            }
            Err(other) => return Err(other),
        };

        response
            .songs
            .into_iter()
            .next()
            .ok_or(CatalogError::NoSongAvailable)
    }
}

/// One record of the builtin catalog's songs file.
///
/// The wire [`SongInfo`] carries no genre; the builtin file adds the genre
/// tags the external service would otherwise filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSong {
    #[serde(flatten)]
    pub info: SongInfo,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Catalog serving a fixed song list loaded at startup.
///
/// Selection is uniform over the eligible set.
pub struct BuiltinSongCatalog {
    songs: Vec<CatalogSong>,
}

impl BuiltinSongCatalog {
    pub fn new(songs: Vec<CatalogSong>) -> Self {
        Self { songs }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read songs file {}: {e}", path.display()))?;
        let songs: Vec<CatalogSong> = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse songs file {}: {e}", path.display()))?;
        tracing::info!(count = songs.len(), path = %path.display(), "Loaded builtin song catalog");
        Ok(Self::new(songs))
    }

    fn matches_genres(song: &CatalogSong, requested: &[String]) -> bool {
        if requested.is_empty() {
            return true;
        }
        song.genres
            .iter()
            .any(|g| requested.iter().any(|r| r.eq_ignore_ascii_case(g)))
    }
}

#[async_trait]
impl SongCatalog for BuiltinSongCatalog {
    async fn select_song(
        &self,
        genres: &[String],
        exclude_ids: &[i64],
    ) -> Result<SongInfo, CatalogError> {
        let excluded: HashSet<i64> = exclude_ids.iter().copied().collect();
        let eligible: Vec<&CatalogSong> = self
            .songs
            .iter()
            .filter(|song| !excluded.contains(&song.info.id))
            .filter(|song| Self::matches_genres(song, genres))
            .collect();

        if eligible.is_empty() {
            return Err(CatalogError::NoSongAvailable);
        }

        use rand::RngExt;
        let idx = rand::rng().random_range(0..eligible.len());
        // SAFETY: `idx` is produced by `random_range(0..len)` over a
        // non-empty vec, so it is always in bounds.
        #[allow(clippy::indexing_slicing)]
        Ok(eligible[idx].info.clone())
    }
}
