//! The per-room actor.
//!
//! One task per room consumes a bounded command queue; every mutation and
//! every broadcast happens on that task, which makes total ordering per room
//! a structural property instead of a locking discipline. Handlers submit
//! commands and await replies over per-command oneshot channels.
//!
//! The only slow collaborator call, song selection, is dispatched to a
//! spawned task and re-enters the queue as `SongSelected` /
//! `SongSelectionFailed`; the consumer never blocks on I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::catalog::SongCatalog;
use crate::errors::{GameError, GameResult};
use crate::protocol::{close_codes, AnswerLabel, Role, RoomState, ServerMessage, SessionId};

use super::command::{CommandReply, Envelope, Origin, Outbound, RoomCommand, SessionSender};
use super::state::{BuzzOutcome, CompletedRound, GameState};

/// Runtime knobs a room needs, extracted from the loaded configuration.
#[derive(Debug, Clone)]
pub struct RoomRuntimeConfig {
    pub command_queue_capacity: usize,
    pub selection_deadline: Duration,
}

impl Default for RoomRuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: 256,
            selection_deadline: Duration::from_secs(5),
        }
    }
}

impl RoomRuntimeConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            command_queue_capacity: config.server.command_queue_capacity,
            selection_deadline: Duration::from_secs(config.catalog.selection_deadline),
        }
    }
}

/// Cheap shared view of a room, read by the registry sweeper without going
/// through the command queue.
#[derive(Debug)]
pub struct RoomMeta {
    code: String,
    created_at: DateTime<Utc>,
    attached_sessions: AtomicUsize,
    last_activity_ms: AtomicI64,
    defunct: AtomicBool,
}

impl RoomMeta {
    fn new(code: String) -> Self {
        Self {
            code,
            created_at: Utc::now(),
            attached_sessions: AtomicUsize::new(0),
            last_activity_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            defunct: AtomicBool::new(false),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attached_sessions(&self) -> usize {
        self.attached_sessions.load(Ordering::Relaxed)
    }

    /// Milliseconds since the room last processed a command.
    pub fn idle_for_ms(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.last_activity_ms.load(Ordering::Relaxed)).max(0)
    }

    /// True once the actor loop has exited.
    pub fn is_defunct(&self) -> bool {
        self.defunct.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn set_attached_sessions(&self, count: usize) {
        self.attached_sessions.store(count, Ordering::Relaxed);
    }

    fn mark_defunct(&self) {
        self.defunct.store(true, Ordering::Relaxed);
    }
}

/// Cloneable submission handle for one room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    tx: mpsc::Sender<Envelope>,
    meta: Arc<RoomMeta>,
}

impl RoomHandle {
    pub fn code(&self) -> &str {
        self.meta.code()
    }

    pub fn meta(&self) -> &Arc<RoomMeta> {
        &self.meta
    }

    /// Submit a command and await its result.
    pub async fn submit(&self, origin: Origin, command: RoomCommand) -> GameResult<CommandReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            origin,
            command,
            reply: Some(reply_tx),
        };
        self.tx
            .send(envelope)
            .await
            .map_err(|_| GameError::RoomGone)?;
        reply_rx.await.map_err(|_| GameError::RoomGone)?
    }

    /// Fire-and-forget submission; used by the selection task and the
    /// registry sweeper, which have nobody to report errors to.
    pub async fn notify(&self, origin: Origin, command: RoomCommand) {
        let envelope = Envelope {
            origin,
            command,
            reply: None,
        };
        if self.tx.send(envelope).await.is_err() {
            tracing::debug!(game_code = %self.meta.code(), "Dropping notify for defunct room");
        }
    }

    /// Whether the actor has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed() || self.meta.is_defunct()
    }
}

struct SessionHandle {
    role: Role,
    team_name: Option<String>,
    sender: SessionSender,
}

/// Construct a room in WAITING state and spawn its consumer task.
pub fn spawn_room(
    code: String,
    max_rounds: u32,
    genres: Vec<String>,
    catalog: Arc<dyn SongCatalog>,
    config: &RoomRuntimeConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_queue_capacity.max(1));
    let meta = Arc::new(RoomMeta::new(code.clone()));

    let actor = RoomActor {
        state: GameState::new(code.clone(), max_rounds, genres),
        sessions: HashMap::new(),
        manager: None,
        meta: Arc::clone(&meta),
        catalog,
        self_tx: tx.downgrade(),
        selection_deadline: config.selection_deadline,
    };

    tokio::spawn(actor.run(rx));
    tracing::info!(game_code = %code, max_rounds, "Room created");

    RoomHandle { tx, meta }
}

struct RoomActor {
    state: GameState,
    sessions: HashMap<SessionId, SessionHandle>,
    manager: Option<SessionId>,
    meta: Arc<RoomMeta>,
    catalog: Arc<dyn SongCatalog>,
    /// Weak sender into the own queue, for selection completions. Weak so
    /// that the queue closes once every external handle is gone.
    self_tx: mpsc::WeakSender<Envelope>,
    selection_deadline: Duration,
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            self.meta.touch();
            let stopping = matches!(envelope.command, RoomCommand::Shutdown { .. });

            let Envelope {
                origin,
                command,
                reply,
            } = envelope;

            tracing::debug!(
                game_code = %self.meta.code(),
                command = command.name(),
                origin = origin.describe(),
                "Processing room command"
            );

            let result = self.apply(&origin, command);
            if let Err(ref error) = result {
                tracing::debug!(
                    game_code = %self.meta.code(),
                    error = %error,
                    "Room command rejected"
                );
            }
            if let Some(reply) = reply {
                // The caller may have given up (e.g. its socket died).
                let _ = reply.send(result);
            }

            if stopping {
                break;
            }

            // A finished room with nobody attached has nothing left to do.
            if self.state.state() == RoomState::Finished && self.sessions.is_empty() {
                tracing::info!(game_code = %self.meta.code(), "Finished room is empty, stopping");
                break;
            }
        }

        self.meta.mark_defunct();
        tracing::info!(game_code = %self.meta.code(), "Room actor stopped");
    }

    fn apply(&mut self, origin: &Origin, command: RoomCommand) -> GameResult<CommandReply> {
        self.authorize(origin, &command)?;

        match command {
            RoomCommand::Attach {
                session_id,
                role,
                team_name,
                sender,
            } => self.attach(session_id, role, team_name, sender),
            RoomCommand::Detach { session_id } => self.detach(session_id),
            RoomCommand::KickTeam { team_name } => self.kick_team(&team_name),
            RoomCommand::StartGame => {
                let max_rounds = self.state.start_game()?;
                self.broadcast(ServerMessage::GameStarted { max_rounds });
                Ok(CommandReply::Ack)
            }
            RoomCommand::StartRound => self.start_round(),
            RoomCommand::BuzzPress {
                team_name,
                client_ts_ms,
            } => self.buzz(&team_name, client_ts_ms),
            RoomCommand::EvaluateAnswer {
                song_ok,
                artist_or_content_ok,
                wrong,
            } => self.evaluate(song_ok, artist_or_content_ok, wrong),
            RoomCommand::RestartSong => {
                self.state.restart_song()?;
                self.broadcast(ServerMessage::MediaRestart);
                Ok(CommandReply::Ack)
            }
            RoomCommand::SkipRound => {
                let completed = self.state.skip_round()?;
                self.broadcast_round_completed(&completed);
                Ok(CommandReply::Ack)
            }
            RoomCommand::EndGame => {
                let summary = self.state.end_game()?;
                tracing::info!(
                    game_code = %self.meta.code(),
                    winner = summary.winner.as_deref().unwrap_or("-"),
                    rounds_played = summary.rounds_played,
                    "Game ended"
                );
                self.broadcast(ServerMessage::GameEnded {
                    winner: summary.winner,
                    final_scores: summary.final_scores,
                    rounds_played: summary.rounds_played,
                });
                Ok(CommandReply::Ack)
            }
            RoomCommand::SongSelected { round_number, song } => {
                if self.state.round_started(round_number, song.clone()) {
                    tracing::info!(
                        game_code = %self.meta.code(),
                        round_number,
                        song_id = song.id,
                        "Round started"
                    );
                    self.broadcast(ServerMessage::RoundStarted {
                        round_number,
                        song_title: song.title,
                        answer_label: AnswerLabel::for_soundtrack(song.is_soundtrack),
                        answer_value: song.artist_or_content,
                        media_id: song.media_id,
                        is_soundtrack: song.is_soundtrack,
                    });
                } else {
                    tracing::debug!(
                        game_code = %self.meta.code(),
                        round_number,
                        "Discarding stale song selection"
                    );
                }
                Ok(CommandReply::Ack)
            }
            RoomCommand::SongSelectionFailed {
                round_number,
                error,
            } => {
                if self.state.selection_failed(round_number) {
                    tracing::warn!(
                        game_code = %self.meta.code(),
                        round_number,
                        error = %error,
                        "Song selection failed; round not started"
                    );
                    self.send_to_manager(error.to_event());
                }
                Ok(CommandReply::Ack)
            }
            RoomCommand::Snapshot => {
                let snapshot = self
                    .state
                    .snapshot(self.manager.is_some(), self.display_count());
                Ok(CommandReply::Snapshot(Box::new(snapshot)))
            }
            RoomCommand::Shutdown { close_code, reason } => {
                tracing::info!(game_code = %self.meta.code(), %reason, "Room shutting down");
                for (_, session) in self.sessions.drain() {
                    let _ = session.sender.try_send(Outbound::Close {
                        code: close_code,
                        reason: reason.clone(),
                    });
                }
                self.meta.set_attached_sessions(0);
                Ok(CommandReply::Ack)
            }
        }
    }

    /// Role gating. The hub already filters role-forbidden message types;
    /// this is the authoritative check.
    fn authorize(&self, origin: &Origin, command: &RoomCommand) -> GameResult<()> {
        match command {
            RoomCommand::Attach { .. }
            | RoomCommand::Detach { .. }
            | RoomCommand::Snapshot => Ok(()),
            RoomCommand::BuzzPress { team_name, .. } => match origin {
                Origin::Team(name) if name == team_name => Ok(()),
                Origin::Internal => Ok(()),
                _ => Err(GameError::PermissionDenied(
                    "only the named team may press its buzzer".to_string(),
                )),
            },
            RoomCommand::KickTeam { .. }
            | RoomCommand::StartGame
            | RoomCommand::StartRound
            | RoomCommand::EvaluateAnswer { .. }
            | RoomCommand::RestartSong
            | RoomCommand::SkipRound
            | RoomCommand::EndGame => {
                if origin.is_privileged() {
                    Ok(())
                } else {
                    Err(GameError::PermissionDenied(format!(
                        "only the manager may issue {}",
                        command.name()
                    )))
                }
            }
            RoomCommand::SongSelected { .. }
            | RoomCommand::SongSelectionFailed { .. }
            | RoomCommand::Shutdown { .. } => match origin {
                Origin::Internal => Ok(()),
                _ => Err(GameError::PermissionDenied(
                    "internal command".to_string(),
                )),
            },
        }
    }

    fn attach(
        &mut self,
        session_id: SessionId,
        role: Role,
        team_name: Option<String>,
        sender: SessionSender,
    ) -> GameResult<CommandReply> {
        match role {
            Role::Team => {
                let name = team_name.ok_or_else(|| {
                    GameError::ClientProtocol("team sessions must carry a team name".to_string())
                })?;
                self.state.join_team(&name)?;
                self.sessions.insert(
                    session_id,
                    SessionHandle {
                        role,
                        team_name: Some(name.clone()),
                        sender,
                    },
                );
                tracing::info!(
                    game_code = %self.meta.code(),
                    %session_id,
                    team_name = %name,
                    "Team attached"
                );
                self.broadcast_roster();
            }
            Role::Manager => {
                if self.manager.is_some() {
                    return Err(GameError::NameConflict(
                        "the manager slot is already occupied".to_string(),
                    ));
                }
                self.manager = Some(session_id);
                self.sessions.insert(
                    session_id,
                    SessionHandle {
                        role,
                        team_name: None,
                        sender,
                    },
                );
                tracing::info!(game_code = %self.meta.code(), %session_id, "Manager attached");
            }
            Role::Display => {
                self.sessions.insert(
                    session_id,
                    SessionHandle {
                        role,
                        team_name: None,
                        sender,
                    },
                );
                tracing::info!(game_code = %self.meta.code(), %session_id, "Display attached");
            }
        }

        self.meta.set_attached_sessions(self.sessions.len());
        Ok(CommandReply::Ack)
    }

    fn detach(&mut self, session_id: SessionId) -> GameResult<CommandReply> {
        let Some(session) = self.sessions.remove(&session_id) else {
            return Ok(CommandReply::Ack);
        };

        if self.manager == Some(session_id) {
            self.manager = None;
            tracing::info!(game_code = %self.meta.code(), %session_id, "Manager slot vacated");
        }

        let roster_changed = session
            .team_name
            .as_deref()
            .is_some_and(|name| self.state.detach_team(name));

        self.meta.set_attached_sessions(self.sessions.len());
        tracing::info!(
            game_code = %self.meta.code(),
            %session_id,
            role = %session.role,
            "Session detached"
        );

        if roster_changed {
            self.broadcast_roster();
        }
        Ok(CommandReply::Ack)
    }

    fn kick_team(&mut self, team_name: &str) -> GameResult<CommandReply> {
        self.state.kick_team(team_name)?;

        let kicked: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.team_name.as_deref() == Some(team_name))
            .map(|(id, _)| *id)
            .collect();

        for session_id in kicked {
            if let Some(session) = self.sessions.remove(&session_id) {
                let _ = session.sender.try_send(Outbound::Event(Arc::new(
                    ServerMessage::Kicked {
                        reason: "removed by the manager".to_string(),
                    },
                )));
                let _ = session.sender.try_send(Outbound::Close {
                    code: close_codes::KICKED_BY_MANAGER,
                    reason: "kicked by manager".to_string(),
                });
            }
        }

        self.meta.set_attached_sessions(self.sessions.len());
        tracing::info!(game_code = %self.meta.code(), team_name, "Team kicked");
        self.broadcast_roster();
        Ok(CommandReply::Ack)
    }

    fn start_round(&mut self) -> GameResult<CommandReply> {
        // The submitting caller holds a live handle, so the upgrade cannot
        // fail while a command is being processed.
        let tx = self.self_tx.upgrade().ok_or(GameError::RoomGone)?;

        let round_number = self.state.begin_selection()?;

        let catalog = Arc::clone(&self.catalog);
        let genres = self.state.genres().to_vec();
        let exclude_ids = self.state.played_song_ids().to_vec();
        let deadline = self.selection_deadline;
        let game_code = self.meta.code().to_string();

        tokio::spawn(async move {
            let outcome =
                tokio::time::timeout(deadline, catalog.select_song(&genres, &exclude_ids)).await;
            let command = match outcome {
                Ok(Ok(song)) => RoomCommand::SongSelected { round_number, song },
                Ok(Err(error)) => RoomCommand::SongSelectionFailed {
                    round_number,
                    error: error.into(),
                },
                Err(_) => RoomCommand::SongSelectionFailed {
                    round_number,
                    error: GameError::UpstreamUnavailable(format!(
                        "song selection exceeded {} s",
                        deadline.as_secs()
                    )),
                },
            };
            let envelope = Envelope {
                origin: Origin::Internal,
                command,
                reply: None,
            };
            if tx.send(envelope).await.is_err() {
                tracing::debug!(%game_code, "Room gone before song selection finished");
            }
        });

        Ok(CommandReply::Ack)
    }

    fn buzz(&mut self, team_name: &str, client_ts_ms: u64) -> GameResult<CommandReply> {
        match self.state.buzz(team_name, client_ts_ms)? {
            BuzzOutcome::Locked => {
                let server_ts_ms = Utc::now().timestamp_millis();
                tracing::info!(
                    game_code = %self.meta.code(),
                    team_name,
                    client_ts_ms,
                    "Buzzer locked"
                );
                self.broadcast(ServerMessage::BuzzerLocked {
                    team_name: team_name.to_string(),
                    server_ts_ms,
                });
            }
            BuzzOutcome::Ignored => {
                tracing::debug!(
                    game_code = %self.meta.code(),
                    team_name,
                    "Buzz ignored while locked"
                );
            }
        }
        Ok(CommandReply::Ack)
    }

    fn evaluate(
        &mut self,
        song_ok: bool,
        artist_or_content_ok: bool,
        wrong: bool,
    ) -> GameResult<CommandReply> {
        let outcome = self.state.evaluate(song_ok, artist_or_content_ok, wrong)?;

        self.broadcast(ServerMessage::AnswerEvaluated {
            team_name: outcome.team_name.clone(),
            delta: outcome.delta,
            component_locks: outcome.locks,
            scores: self.state.scores(),
        });

        match outcome.completed {
            Some(ref completed) => self.broadcast_round_completed(completed),
            None => self.broadcast(ServerMessage::BuzzersReopened {
                component_locks: outcome.locks,
            }),
        }
        Ok(CommandReply::Ack)
    }

    fn broadcast_round_completed(&mut self, completed: &CompletedRound) {
        tracing::info!(
            game_code = %self.meta.code(),
            round_number = completed.number,
            final_round = completed.final_round,
            "Round completed"
        );
        self.broadcast(ServerMessage::RoundCompleted {
            round_number: completed.number,
            correct_song_title: completed.song.title.clone(),
            correct_answer_value: completed.song.artist_or_content.clone(),
            final_round: completed.final_round,
        });
    }

    fn broadcast_roster(&mut self) {
        let teams = self.state.roster();
        let total = teams.len();
        self.broadcast(ServerMessage::TeamsUpdate { teams, total });
    }

    /// Enqueue an event to every attached session. Delivery is non-blocking:
    /// a full outbound queue terminates that session and the room carries on.
    fn broadcast(&mut self, message: ServerMessage) {
        let event = Arc::new(message);
        let dropped = self.fan_out(&event);

        let mut roster_changed = false;
        for session_id in dropped {
            roster_changed |= self.drop_for_backpressure(session_id);
        }

        if roster_changed {
            let teams = self.state.roster();
            let total = teams.len();
            let update = Arc::new(ServerMessage::TeamsUpdate { teams, total });
            for session_id in self.fan_out(&update) {
                self.drop_for_backpressure(session_id);
            }
        }
    }

    fn fan_out(&self, event: &Arc<ServerMessage>) -> Vec<SessionId> {
        let mut dropped = Vec::new();
        for (session_id, session) in &self.sessions {
            if session
                .sender
                .try_send(Outbound::Event(Arc::clone(event)))
                .is_err()
            {
                dropped.push(*session_id);
            }
        }
        dropped
    }

    /// Remove a slow or dead session. Returns true if the roster changed.
    fn drop_for_backpressure(&mut self, session_id: SessionId) -> bool {
        let Some(session) = self.sessions.remove(&session_id) else {
            return false;
        };
        tracing::warn!(
            game_code = %self.meta.code(),
            %session_id,
            role = %session.role,
            "Session dropped: outbound queue overflowed"
        );
        if self.manager == Some(session_id) {
            self.manager = None;
        }
        self.meta.set_attached_sessions(self.sessions.len());
        session
            .team_name
            .as_deref()
            .is_some_and(|name| self.state.detach_team(name))
    }

    fn send_to_manager(&self, message: ServerMessage) {
        let Some(manager_id) = self.manager else {
            return;
        };
        if let Some(session) = self.sessions.get(&manager_id) {
            let _ = session.sender.try_send(Outbound::Event(Arc::new(message)));
        }
    }

    fn display_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.role == Role::Display)
            .count()
    }
}
