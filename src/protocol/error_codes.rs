use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown game code or team name.
    NotFound,
    /// Command is not legal in the current room or round state.
    InvalidState,
    /// Command attempted by a role that may not issue it.
    PermissionDenied,
    /// Duplicate team name, or the manager slot is already occupied.
    NameConflict,
    /// A free game code could not be allocated.
    CapacityExhausted,
    /// The song catalog call failed (timeout, 5xx, network error).
    UpstreamUnavailable,
    /// The catalog returned no song for the given genres and exclusions.
    NoSongAvailable,
    /// Malformed or unrecognized inbound message.
    ClientProtocol,
    /// The room was disposed while the command was pending.
    RoomGone,
    /// The session's outbound queue overflowed and it was terminated.
    BackpressureDropped,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code.
    ///
    /// Client UIs may show these directly; commands also attach more
    /// specific context in the error message itself.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => {
                "The requested game or team could not be found. The code may be wrong or the game may have ended."
            }
            Self::InvalidState => {
                "The game is not in a state that allows this action right now."
            }
            Self::PermissionDenied => {
                "Your role is not allowed to perform this action."
            }
            Self::NameConflict => {
                "That name is already taken in this game, or the manager seat is occupied."
            }
            Self::CapacityExhausted => {
                "No free game code could be allocated. Please try again in a moment."
            }
            Self::UpstreamUnavailable => {
                "The song catalog is temporarily unreachable. Try starting the round again."
            }
            Self::NoSongAvailable => {
                "No unplayed song matches the selected genres. Adjust the genres or end the game."
            }
            Self::ClientProtocol => {
                "The message was malformed or not recognized by the server."
            }
            Self::RoomGone => {
                "The game was closed while your request was in flight."
            }
            Self::BackpressureDropped => {
                "Your connection fell too far behind and was dropped by the server."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_error_codes_have_descriptions() {
        let error_codes = [
            ErrorCode::NotFound,
            ErrorCode::InvalidState,
            ErrorCode::PermissionDenied,
            ErrorCode::NameConflict,
            ErrorCode::CapacityExhausted,
            ErrorCode::UpstreamUnavailable,
            ErrorCode::NoSongAvailable,
            ErrorCode::ClientProtocol,
            ErrorCode::RoomGone,
            ErrorCode::BackpressureDropped,
        ];

        for error_code in &error_codes {
            let description = error_code.description();
            assert!(
                description.len() > 10,
                "ErrorCode::{:?} has suspiciously short description: '{}'",
                error_code,
                description
            );
        }
    }

    #[test]
    fn test_serialization_is_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::NoSongAvailable).unwrap();
        assert_eq!(json, "\"NO_SONG_AVAILABLE\"");
        let json = serde_json::to_string(&ErrorCode::RoomGone).unwrap();
        assert_eq!(json, "\"ROOM_GONE\"");
    }

    #[test]
    fn test_display_uses_description() {
        let error = ErrorCode::InvalidState;
        assert_eq!(format!("{}", error), error.description());
    }
}
