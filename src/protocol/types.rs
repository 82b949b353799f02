use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default constants for validation (can be overridden by config)
/// These are used when no config is available
#[allow(dead_code)]
pub const DEFAULT_GAME_CODE_LENGTH: usize = 6;
#[allow(dead_code)]
pub const DEFAULT_MAX_TEAM_NAME_CHARS: usize = 30;
#[allow(dead_code)]
pub const DEFAULT_MAX_ROUNDS_LIMIT: u32 = 30;

/// Unique identifier for attached push-channel sessions
pub type SessionId = Uuid;

/// The three classes of clients that can join a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A playing team; buzzes and scores points.
    Team,
    /// The single privileged session that drives transitions and adjudicates.
    Manager,
    /// Read-only observer for public viewing.
    Display,
}

impl Role {
    /// Parse the role segment of the WebSocket upgrade path.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "team" => Some(Self::Team),
            "manager" => Some(Self::Manager),
            "display" => Some(Self::Display),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Manager => "manager",
            Self::Display => "display",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a game room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Teams may join; the Manager has not started play.
    Waiting,
    /// Rounds are being played.
    Playing,
    /// The game has ended; the ledger is frozen.
    Finished,
}

/// State of the in-progress round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Song disclosed, buzzers armed.
    SongPlaying,
    /// Exactly one team holds the right to answer.
    BuzzerLocked,
    /// The Manager is adjudicating a verbal answer. Accepted wherever
    /// `BuzzerLocked` is; this implementation never produces it itself.
    Evaluating,
    /// Both components answered or the round was skipped.
    Completed,
}

/// Which sub-answers of the current round have already been credited.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentLocks {
    pub song_name: bool,
    pub artist_or_content: bool,
}

impl ComponentLocks {
    pub fn both(self) -> bool {
        self.song_name && self.artist_or_content
    }
}

/// How the 5-point field should be labeled by UIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerLabel {
    Artist,
    Content,
}

impl AnswerLabel {
    pub fn for_soundtrack(is_soundtrack: bool) -> Self {
        if is_soundtrack {
            Self::Content
        } else {
            Self::Artist
        }
    }
}

/// Song metadata returned by the catalog collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongInfo {
    /// Stable catalog identifier, used for the played-song exclusion set.
    pub id: i64,
    pub title: String,
    /// Artist name, or content/franchise name for soundtrack songs.
    pub artist_or_content: String,
    /// Opaque identifier the UI uses to drive playback.
    pub media_id: String,
    #[serde(default)]
    pub is_soundtrack: bool,
}

/// Roster entry carried by `teams_update` broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntry {
    pub name: String,
    pub attached: bool,
}

/// One row of the score ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntry {
    pub team_name: String,
    pub score: i64,
}

/// Roster entry with score, used by the administrative snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStanding {
    pub name: String,
    pub attached: bool,
    pub score: i64,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Point-in-time view of a room, served by `GET /api/games/{code}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub game_code: String,
    pub state: RoomState,
    pub teams: Vec<TeamStanding>,
    pub manager_attached: bool,
    pub display_count: usize,
    pub max_rounds: u32,
    pub genres: Vec<String>,
    pub rounds_played: u32,
    /// Phase of the in-progress round, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_phase: Option<RoundPhase>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
