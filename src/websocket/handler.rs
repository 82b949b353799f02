use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::protocol::Role;
use crate::server::AppState;

use super::connection::handle_socket;

/// WebSocket handler for the game push channel.
///
/// URL shape: `/ws/{role}/{game_code}`, with team sessions carrying their
/// name in the `team_name` query parameter. A bad role segment or a missing
/// team name is a malformed URL and fails before the upgrade; room-level
/// rejections happen after the upgrade so they can carry a close code.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path((role_segment, game_code)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(role) = Role::from_path_segment(&role_segment) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let team_name = query.get("team_name").cloned();
    if role == Role::Team && team_name.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            "team sessions require a team_name query parameter",
        )
            .into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, role, game_code, team_name))
}
