//! Server orchestration: shared state, router construction, startup.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::{create_catalog, SongCatalog};
use crate::config::Config;
use crate::registry::RoomRegistry;
use crate::websocket;

/// Shared state handed to every handler.
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn SongCatalog>, config: Arc<Config>) -> Arc<Self> {
        let registry = Arc::new(RoomRegistry::new(catalog, Arc::clone(&config)));
        Arc::new(Self { registry, config })
    }
}

/// Build the Axum router: JSON control endpoints plus the push channel.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/api/games", post(api::create_game))
        .route("/api/games/{code}", get(api::get_game))
        .route("/api/games/{code}/kick/{team_name}", post(api::kick_team))
        .route("/ws/{role}/{game_code}", get(websocket::websocket_handler))
        .route("/health", get(api::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(cors_origins: &str) -> CorsLayer {
    if cors_origins == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, using permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the server: build the catalog, spawn the registry sweeper, serve.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let catalog: Arc<dyn SongCatalog> = Arc::from(create_catalog(&config.catalog)?);

    let state = AppState::new(catalog, Arc::clone(&config));

    let sweeper_registry = Arc::clone(&state.registry);
    tokio::spawn(async move {
        sweeper_registry.sweep_task().await;
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %config.server.cors_origins,
        "Server started - push channel: /ws/{{role}}/{{game_code}}, control: /api/games"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
