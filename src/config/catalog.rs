//! Song catalog collaborator configuration.

use super::defaults::{
    default_catalog_base_url, default_catalog_request_timeout, default_catalog_retry_backoff_ms,
    default_catalog_selection_deadline,
};
use serde::{Deserialize, Serialize};

/// Which catalog implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogMode {
    /// Query the external catalog service over HTTP.
    #[default]
    Http,
    /// Serve songs from a JSON file loaded at startup. Useful for demos
    /// and for running without the catalog service.
    Builtin,
}

/// Configuration for the song catalog collaborator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    #[serde(default)]
    pub mode: CatalogMode,
    /// Base URL of the catalog service (HTTP mode)
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    /// Upper bound on a selection call, in seconds
    #[serde(default = "default_catalog_request_timeout")]
    pub request_timeout: u64,
    /// Backoff before the single transport-error retry, in milliseconds
    #[serde(default = "default_catalog_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Overall deadline a room places on one selection, in seconds.
    /// Must cover the request timeout plus the retry.
    #[serde(default = "default_catalog_selection_deadline")]
    pub selection_deadline: u64,
    /// Path to a songs JSON file (builtin mode)
    #[serde(default)]
    pub songs_path: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mode: CatalogMode::default(),
            base_url: default_catalog_base_url(),
            request_timeout: default_catalog_request_timeout(),
            retry_backoff_ms: default_catalog_retry_backoff_ms(),
            selection_deadline: default_catalog_selection_deadline(),
            songs_path: None,
        }
    }
}
