use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::types::{AnswerLabel, ComponentLocks, ScoreEntry, TeamEntry};

/// Message types sent from client to server.
///
/// Joining is implicit via the upgrade URL; there is no separate join
/// message. Fields are inline next to the `type` tag, so a buzz press is
/// `{"type":"buzz_pressed","client_ts_ms":1712345678901}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Team pressed the buzzer. The client wall clock is carried for
    /// observability only; arbitration is by server-side arrival order.
    BuzzPressed { client_ts_ms: u64 },
    /// Manager opens play; requires at least one attached team.
    StartGame,
    /// Manager starts the next round, triggering song selection.
    StartRound,
    /// Manager's verdict on the locked team's verbal answer.
    EvaluateAnswer {
        song_ok: bool,
        artist_or_content_ok: bool,
        wrong: bool,
    },
    /// Manager asks every client to restart media playback.
    RestartSong,
    /// Manager completes the current round without further scoring.
    SkipRound,
    /// Manager removes a team; only legal while the room is waiting.
    KickTeam { team_name: String },
    /// Manager ends the game and freezes the ledger.
    EndGame,
    /// Keep-alive; answered with `pong`.
    Ping,
}

/// Message types sent from server to client.
///
/// Everything here is broadcast to the whole room except `Error`, `Kicked`
/// and `Pong`, which are point-to-point. Broadcast order is identical for
/// every attached session of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Roster changed: a team joined, resumed, detached or was kicked.
    TeamsUpdate { teams: Vec<TeamEntry>, total: usize },
    /// The Manager opened play.
    GameStarted { max_rounds: u32 },
    /// A round began; the payload is identical for every role and includes
    /// the correct answers (UIs decide what to render).
    RoundStarted {
        round_number: u32,
        song_title: String,
        answer_label: AnswerLabel,
        answer_value: String,
        media_id: String,
        is_soundtrack: bool,
    },
    /// First buzz won the race; other presses are ignored until reopened.
    BuzzerLocked { team_name: String, server_ts_ms: i64 },
    /// The Manager adjudicated; `delta` is the signed score change applied
    /// to `team_name` and `scores` is the full ledger afterwards.
    AnswerEvaluated {
        team_name: String,
        delta: i64,
        component_locks: ComponentLocks,
        scores: Vec<ScoreEntry>,
    },
    /// Buzzers re-armed for the components still unlocked.
    BuzzersReopened { component_locks: ComponentLocks },
    /// Restart media playback; no scoring or lock change.
    MediaRestart,
    /// The round is frozen; correct answers are disclosed for display.
    RoundCompleted {
        round_number: u32,
        correct_song_title: String,
        correct_answer_value: String,
        /// True when this was the last configured round. The game still
        /// waits for the Manager's explicit `end_game`.
        final_round: bool,
    },
    /// The ledger is final. `winner` is absent for a game with no teams.
    GameEnded {
        winner: Option<String>,
        final_scores: Vec<ScoreEntry>,
        rounds_played: u32,
    },
    /// Point-to-point: delivered to the offending or requesting session only.
    Error { code: ErrorCode, message: String },
    /// Point-to-point: sent to a kicked team's sessions before close 4009.
    Kicked { reason: String },
    /// Point-to-point reply to `ping`.
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_inline_fields() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"buzz_pressed","client_ts_ms":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::BuzzPressed { client_ts_ms: 42 });

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"evaluate_answer","song_ok":true,"artist_or_content_ok":false,"wrong":false}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::EvaluateAnswer {
                song_ok: true,
                artist_or_content_ok: false,
                wrong: false
            }
        );
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let parsed = serde_json::from_str::<ClientMessage>(r#"{"type":"fire_missiles"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn server_messages_tag_with_snake_case() {
        let json = serde_json::to_string(&ServerMessage::MediaRestart).unwrap();
        assert_eq!(json, r#"{"type":"media_restart"}"#);

        let json = serde_json::to_string(&ServerMessage::BuzzerLocked {
            team_name: "The Sharps".to_string(),
            server_ts_ms: 1000,
        })
        .unwrap();
        assert!(json.contains(r#""type":"buzzer_locked""#));
        assert!(json.contains(r#""team_name":"The Sharps""#));
    }

    #[test]
    fn answer_label_serializes_lowercase() {
        let msg = ServerMessage::RoundStarted {
            round_number: 1,
            song_title: "X".to_string(),
            answer_label: AnswerLabel::Content,
            answer_value: "Y".to_string(),
            media_id: "m-1".to_string(),
            is_soundtrack: true,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""answer_label":"content""#));
    }
}
