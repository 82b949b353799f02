// Protocol module: message types, game codes, close codes and validation

pub mod close_codes;
pub mod error_codes;
pub mod game_codes;
pub mod messages;
pub mod types;
pub mod validation;

pub use error_codes::ErrorCode;

pub use types::{
    AnswerLabel, ComponentLocks, Role, RoomSnapshot, RoomState, RoundPhase, ScoreEntry, SessionId,
    SongInfo, TeamEntry, TeamStanding, DEFAULT_GAME_CODE_LENGTH, DEFAULT_MAX_ROUNDS_LIMIT,
    DEFAULT_MAX_TEAM_NAME_CHARS,
};

pub use messages::{ClientMessage, ServerMessage};
