//! JSON control endpoints for the manager UI and operational tooling.
//!
//! These are convenience entry points that reduce to room commands; the
//! push channel remains the primary surface during play.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::GameError;
use crate::protocol::{validation, ErrorCode, RoomSnapshot};
use crate::room::{CommandReply, Origin, RoomCommand};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub max_rounds: u32,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub game_code: String,
}

#[derive(Debug, Serialize)]
pub struct KickResponse {
    pub kicked: String,
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = status_for(self.code());
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidState | ErrorCode::NameConflict | ErrorCode::NoSongAvailable => {
            StatusCode::CONFLICT
        }
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::CapacityExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorCode::ClientProtocol => StatusCode::BAD_REQUEST,
        ErrorCode::RoomGone => StatusCode::GONE,
        ErrorCode::BackpressureDropped => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /api/games`: create a room in its waiting state.
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), GameError> {
    let (game_code, _handle) = state
        .registry
        .create_room(request.max_rounds, request.genres)?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { game_code })))
}

/// `GET /api/games/{code}`: roster, state and settings for reconnect UX.
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, GameError> {
    let handle = state
        .registry
        .lookup(&code)
        .ok_or_else(|| GameError::NotFound(format!("no game with code '{code}'")))?;

    match handle.submit(Origin::Http, RoomCommand::Snapshot).await? {
        CommandReply::Snapshot(snapshot) => Ok(Json(*snapshot)),
        other => Err(GameError::InvalidState(format!(
            "unexpected reply to snapshot: {other:?}"
        ))),
    }
}

/// `POST /api/games/{code}/kick/{team_name}`: HTTP alternative to the
/// push-channel kick, for UIs that prefer a request/response round trip.
pub async fn kick_team(
    State(state): State<Arc<AppState>>,
    Path((code, team_name)): Path<(String, String)>,
) -> Result<Json<KickResponse>, GameError> {
    let team_name = validation::validate_team_name_with_config(&team_name, &state.config.protocol)
        .map_err(GameError::ClientProtocol)?;

    let handle = state
        .registry
        .lookup(&code)
        .ok_or_else(|| GameError::NotFound(format!("no game with code '{code}'")))?;

    handle
        .submit(
            Origin::Http,
            RoomCommand::KickTeam {
                team_name: team_name.clone(),
            },
        )
        .await?;
    Ok(Json(KickResponse { kicked: team_name }))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
