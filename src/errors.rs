//! Crate-wide error type for game commands and room lifecycle.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::protocol::{ErrorCode, ServerMessage};

/// Every way a command or lookup can fail, one variant per taxonomy kind.
///
/// The variants carry human-oriented context; the machine-readable kind is
/// recovered with [`GameError::code`] when crossing the wire.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NameConflict(String),
    #[error("no free game code could be allocated")]
    CapacityExhausted,
    #[error("song catalog unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("no unplayed song matches the selected genres")]
    NoSongAvailable,
    #[error("{0}")]
    ClientProtocol(String),
    #[error("the game was closed while the command was pending")]
    RoomGone,
    #[error("session outbound queue overflowed")]
    BackpressureDropped,
}

impl GameError {
    /// The wire-level error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::NameConflict(_) => ErrorCode::NameConflict,
            Self::CapacityExhausted => ErrorCode::CapacityExhausted,
            Self::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            Self::NoSongAvailable => ErrorCode::NoSongAvailable,
            Self::ClientProtocol(_) => ErrorCode::ClientProtocol,
            Self::RoomGone => ErrorCode::RoomGone,
            Self::BackpressureDropped => ErrorCode::BackpressureDropped,
        }
    }

    /// Render this error as a point-to-point `error` event.
    pub fn to_event(&self) -> ServerMessage {
        ServerMessage::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<CatalogError> for GameError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unavailable(msg) => Self::UpstreamUnavailable(msg),
            CatalogError::NoSongAvailable => Self::NoSongAvailable,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_taxonomy() {
        let err: GameError = CatalogError::NoSongAvailable.into();
        assert_eq!(err.code(), ErrorCode::NoSongAvailable);

        let err: GameError = CatalogError::Unavailable("timeout".to_string()).into();
        assert_eq!(err.code(), ErrorCode::UpstreamUnavailable);
    }

    #[test]
    fn error_event_carries_code_and_message() {
        let err = GameError::NameConflict("team name already taken".to_string());
        match err.to_event() {
            ServerMessage::Error { code, message } => {
                assert_eq!(code, ErrorCode::NameConflict);
                assert_eq!(message, "team name already taken");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
