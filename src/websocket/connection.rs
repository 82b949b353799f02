//! Per-session plumbing: attach handshake, send/receive tasks, inbound
//! message translation.
//!
//! Each session owns two child tasks. The send task drains the bounded
//! outbound queue filled by the room actor; the receive task parses inbound
//! frames, gates them by role, and submits room commands. Either side
//! terminating tears the session down and detaches it from the room.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::GameError;
use crate::protocol::validation::validate_team_name_with_config;
use crate::protocol::{close_codes, ClientMessage, ErrorCode, Role, ServerMessage, SessionId};
use crate::room::{Origin, Outbound, RoomCommand, RoomHandle};
use crate::server::AppState;

pub(super) async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    role: Role,
    game_code: String,
    team_name: Option<String>,
) {
    let (mut sender, receiver) = socket.split();

    let Some(room) = state.registry.lookup(&game_code) else {
        tracing::debug!(%game_code, "Rejecting session for unknown game");
        reject(
            &mut sender,
            &GameError::NotFound(format!("no game with code '{game_code}'")),
            close_codes::GAME_NOT_FOUND,
        )
        .await;
        return;
    };

    let team_name = match role {
        Role::Team => {
            // The handler guarantees presence; validation may still reject.
            let raw = team_name.unwrap_or_default();
            match validate_team_name_with_config(&raw, &state.config.protocol) {
                Ok(name) => Some(name),
                Err(reason) => {
                    tracing::debug!(game_code = %room.code(), %reason, "Rejecting team name");
                    reject(
                        &mut sender,
                        &GameError::ClientProtocol(reason),
                        close_codes::TEAM_NAME_REJECTED,
                    )
                    .await;
                    return;
                }
            }
        }
        Role::Manager | Role::Display => None,
    };

    let session_id = Uuid::new_v4();
    let capacity = state.config.server.outbound_queue_capacity.max(1);
    let (tx, rx) = mpsc::channel::<Outbound>(capacity);

    let attach = RoomCommand::Attach {
        session_id,
        role,
        team_name: team_name.clone(),
        sender: tx.clone(),
    };
    if let Err(error) = room.submit(Origin::Internal, attach).await {
        let close_code = rejection_close_code(role, &error);
        tracing::info!(
            game_code = %room.code(),
            %session_id,
            %role,
            close_code,
            error = %error,
            "Room refused session"
        );
        reject(&mut sender, &error, close_code).await;
        return;
    }

    tracing::info!(
        game_code = %room.code(),
        %session_id,
        %role,
        team_name = team_name.as_deref().unwrap_or("-"),
        "WebSocket session attached"
    );

    let send_task = tokio::spawn(run_send_loop(sender, rx));

    let receive_task = tokio::spawn(run_receive_loop(
        receiver,
        room.clone(),
        tx,
        role,
        team_name,
        session_id,
        Duration::from_secs(state.config.server.ping_timeout),
        state.config.protocol.max_message_size,
    ));

    // Either task finishing means the session is over.
    tokio::select! {
        _ = send_task => {}
        _ = receive_task => {}
    }

    room.notify(Origin::Internal, RoomCommand::Detach { session_id })
        .await;
    tracing::info!(game_code = %room.code(), %session_id, "WebSocket session closed");
}

/// Drain the outbound queue onto the socket. A close instruction or a dead
/// socket ends the loop; dropping the receiver unblocks the room's fan-out.
async fn run_send_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Event(event) => {
                let payload = match serde_json::to_string(&*event) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::error!(%error, "Failed to serialize outbound event");
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            Outbound::Close { code, reason } => {
                let _ = sender
                    .send(Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })))
                    .await;
                break;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_receive_loop(
    mut receiver: SplitStream<WebSocket>,
    room: RoomHandle,
    tx: mpsc::Sender<Outbound>,
    role: Role,
    team_name: Option<String>,
    session_id: SessionId,
    ping_timeout: Duration,
    max_message_size: usize,
) {
    loop {
        // Any inbound frame counts as liveness; a session silent past the
        // deadline (two missed pings) is treated as dead.
        let frame = match tokio::time::timeout(ping_timeout, receiver.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(error))) => {
                tracing::debug!(%session_id, %error, "WebSocket read error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!(
                    %session_id,
                    timeout_secs = ping_timeout.as_secs(),
                    "Session missed its ping deadline"
                );
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                if text.len() > max_message_size {
                    tracing::warn!(
                        %session_id,
                        size = text.len(),
                        max = max_message_size,
                        "Inbound message exceeds size limit"
                    );
                    send_error(
                        &tx,
                        GameError::ClientProtocol(format!(
                            "message too large ({} bytes, max {max_message_size})",
                            text.len()
                        )),
                    );
                    continue;
                }

                let message = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::debug!(%session_id, %error, "Rejected malformed frame");
                        send_error(
                            &tx,
                            GameError::ClientProtocol(format!("unrecognized message: {error}")),
                        );
                        continue;
                    }
                };

                if matches!(message, ClientMessage::Ping) {
                    let _ = tx.try_send(Outbound::Event(Arc::new(ServerMessage::Pong)));
                    continue;
                }

                let (origin, command) = match translate(role, team_name.as_deref(), message) {
                    Ok(pair) => pair,
                    Err(error) => {
                        send_error(&tx, error);
                        continue;
                    }
                };

                match room.submit(origin, command).await {
                    Ok(_) => {}
                    Err(GameError::RoomGone) => break,
                    // Command-level failures go to this session only.
                    Err(error) => send_error(&tx, error),
                }
            }
            Message::Close(_) => {
                tracing::debug!(%session_id, "Client closed the connection");
                break;
            }
            // Protocol-level ping/pong already reset the deadline above.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Binary(_) => {
                send_error(
                    &tx,
                    GameError::ClientProtocol("binary frames are not accepted".to_string()),
                );
            }
        }
    }
}

fn send_error(tx: &mpsc::Sender<Outbound>, error: GameError) {
    let _ = tx.try_send(Outbound::Event(Arc::new(error.to_event())));
}

/// Map an attach rejection to its close code.
fn rejection_close_code(role: Role, error: &GameError) -> u16 {
    match (role, error.code()) {
        (_, ErrorCode::NotFound) => close_codes::GAME_NOT_FOUND,
        (Role::Manager, ErrorCode::NameConflict) => close_codes::MANAGER_SLOT_OCCUPIED,
        (_, ErrorCode::InvalidState) => close_codes::ROOM_NOT_ACCEPTING_TEAMS,
        _ => close_codes::TEAM_NAME_REJECTED,
    }
}

/// Send a terminal error frame followed by a close frame; used for
/// rejections that happen before the session is attached.
async fn reject(sender: &mut SplitSink<WebSocket, Message>, error: &GameError, close_code: u16) {
    if let Ok(payload) = serde_json::to_string(&error.to_event()) {
        let _ = sender.send(Message::Text(payload.into())).await;
    }
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: close_code,
            reason: error.to_string().into(),
        })))
        .await;
}

/// Translate an inbound message into a room command, gated by role.
/// `Ping` never reaches this; the receive loop answers it directly.
fn translate(
    role: Role,
    team_name: Option<&str>,
    message: ClientMessage,
) -> Result<(Origin, RoomCommand), GameError> {
    match (role, message) {
        (_, ClientMessage::Ping) => Err(GameError::ClientProtocol(
            "ping is handled by the transport".to_string(),
        )),
        (Role::Team, ClientMessage::BuzzPressed { client_ts_ms }) => {
            let name = team_name.ok_or_else(|| {
                GameError::ClientProtocol("team session without a team name".to_string())
            })?;
            Ok((
                Origin::Team(name.to_string()),
                RoomCommand::BuzzPress {
                    team_name: name.to_string(),
                    client_ts_ms,
                },
            ))
        }
        (Role::Team, _) => Err(GameError::PermissionDenied(
            "teams may only buzz and ping".to_string(),
        )),
        (Role::Display, _) => Err(GameError::PermissionDenied(
            "display sessions are read-only".to_string(),
        )),
        (Role::Manager, message) => {
            let command = match message {
                ClientMessage::StartGame => RoomCommand::StartGame,
                ClientMessage::StartRound => RoomCommand::StartRound,
                ClientMessage::EvaluateAnswer {
                    song_ok,
                    artist_or_content_ok,
                    wrong,
                } => RoomCommand::EvaluateAnswer {
                    song_ok,
                    artist_or_content_ok,
                    wrong,
                },
                ClientMessage::RestartSong => RoomCommand::RestartSong,
                ClientMessage::SkipRound => RoomCommand::SkipRound,
                ClientMessage::KickTeam { team_name } => RoomCommand::KickTeam { team_name },
                ClientMessage::EndGame => RoomCommand::EndGame,
                ClientMessage::BuzzPressed { .. } => {
                    return Err(GameError::PermissionDenied(
                        "the manager does not buzz".to_string(),
                    ))
                }
                ClientMessage::Ping => unreachable!("handled above"),
            };
            Ok((Origin::Manager, command))
        }
    }
}
