//! WebSocket close codes used when a session is refused or evicted.
//!
//! The 4000-4999 range is reserved for application use by RFC 6455; clients
//! match on these to show the right message without parsing a payload.

/// No room exists for the requested game code.
pub const GAME_NOT_FOUND: u16 = 4001;

/// The team name is invalid or already held by an attached session.
pub const TEAM_NAME_REJECTED: u16 = 4002;

/// The room is past WAITING and does not admit new team names.
pub const ROOM_NOT_ACCEPTING_TEAMS: u16 = 4003;

/// Another manager session is already attached.
pub const MANAGER_SLOT_OCCUPIED: u16 = 4004;

/// The manager removed this team from the game.
pub const KICKED_BY_MANAGER: u16 = 4009;

/// The room idled out or the server is disposing it.
pub const ROOM_DISPOSED: u16 = 4010;
