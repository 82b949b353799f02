//! Per-game room: authoritative state, command queue, broadcast fan-out.

pub mod actor;
pub mod command;
pub mod state;

pub use actor::{spawn_room, RoomHandle, RoomMeta, RoomRuntimeConfig};
pub use command::{CommandReply, Envelope, Origin, Outbound, RoomCommand, SessionSender};
pub use state::{
    BuzzOutcome, CompletedRound, EvaluationOutcome, GameState, GameSummary, JoinOutcome, Round,
    RoundEvent, Team, ARTIST_OR_CONTENT_POINTS, SONG_NAME_POINTS, WRONG_ANSWER_PENALTY,
};
