//! Command vocabulary for the room actor.
//!
//! Every mutation of a room travels through this module: the connection hub
//! translates inbound WebSocket messages into commands, the HTTP control
//! handlers produce them directly, and the song-selection task re-enters the
//! queue with the internal completion commands.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::errors::GameError;
use crate::protocol::{Role, RoomSnapshot, ServerMessage, SessionId, SongInfo};

/// Who submitted a command. Role gating happens against this, never against
/// anything the client claims inside the message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A team session; carries the validated team name.
    Team(String),
    /// The manager session.
    Manager,
    /// A read-only display session.
    Display,
    /// The HTTP control surface; trusted with manager-level commands.
    Http,
    /// The room's own machinery (selection completions, disposal).
    Internal,
}

impl Origin {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Team(_) => "team",
            Self::Manager => "manager",
            Self::Display => "display",
            Self::Http => "http",
            Self::Internal => "internal",
        }
    }

    /// Whether this origin may issue manager commands.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Manager | Self::Http | Self::Internal)
    }
}

/// Item type of each session's outbound queue.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// A protocol event, shared across sessions to avoid per-session clones.
    Event(Arc<ServerMessage>),
    /// Terminal close instruction; the transport sends a close frame with
    /// this code and tears the connection down.
    Close { code: u16, reason: String },
}

/// Sender half of a session's outbound queue.
pub type SessionSender = mpsc::Sender<Outbound>;

/// Commands accepted by a room.
#[derive(Debug)]
pub enum RoomCommand {
    /// Bind a session to the room. For teams the name must already be
    /// validated and trimmed.
    Attach {
        session_id: SessionId,
        role: Role,
        team_name: Option<String>,
        sender: SessionSender,
    },
    /// Unbind a session; team names stay in the roster as detached.
    Detach { session_id: SessionId },
    /// Remove a team while the room is waiting; closes its sessions.
    KickTeam { team_name: String },
    /// Open play.
    StartGame,
    /// Start the next round by asking the catalog for a song.
    StartRound,
    /// A team pressed the buzzer. Arbitration is by queue arrival order;
    /// the client timestamp is logged, never trusted.
    BuzzPress { team_name: String, client_ts_ms: u64 },
    /// The manager's verdict on the locked team's answer.
    EvaluateAnswer {
        song_ok: bool,
        artist_or_content_ok: bool,
        wrong: bool,
    },
    /// Replay the media from the start; no state change.
    RestartSong,
    /// Complete the current round without further scoring.
    SkipRound,
    /// End the game and freeze the ledger.
    EndGame,
    /// Internal: the catalog produced a song for the reserved round.
    SongSelected { round_number: u32, song: SongInfo },
    /// Internal: selection failed or timed out; the round never starts.
    SongSelectionFailed {
        round_number: u32,
        error: GameError,
    },
    /// Read-only state view for the HTTP surface.
    Snapshot,
    /// Dispose the room: close every session with `close_code` and stop.
    Shutdown { close_code: u16, reason: String },
}

impl RoomCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attach { .. } => "attach",
            Self::Detach { .. } => "detach",
            Self::KickTeam { .. } => "kick_team",
            Self::StartGame => "start_game",
            Self::StartRound => "start_round",
            Self::BuzzPress { .. } => "buzz_press",
            Self::EvaluateAnswer { .. } => "evaluate_answer",
            Self::RestartSong => "restart_song",
            Self::SkipRound => "skip_round",
            Self::EndGame => "end_game",
            Self::SongSelected { .. } => "song_selected",
            Self::SongSelectionFailed { .. } => "song_selection_failed",
            Self::Snapshot => "snapshot",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

/// Successful command results.
#[derive(Debug)]
pub enum CommandReply {
    Ack,
    Snapshot(Box<RoomSnapshot>),
}

/// A command plus its reply channel, as queued to the actor.
#[derive(Debug)]
pub struct Envelope {
    pub origin: Origin,
    pub command: RoomCommand,
    /// Absent for fire-and-forget submissions (internal completions).
    pub reply: Option<oneshot::Sender<Result<CommandReply, GameError>>>,
}
