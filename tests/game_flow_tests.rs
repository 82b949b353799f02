//! End-to-end game flows driven directly through room handles.
//!
//! These tests exercise the actor, round engine and scoring without the
//! WebSocket transport; `ws_integration_tests.rs` covers the full stack.


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use quizbeat_server::catalog::CatalogError;
use quizbeat_server::protocol::{
    ComponentLocks, ErrorCode, Role, RoomState, ServerMessage, SessionId,
};
use quizbeat_server::room::{
    spawn_room, CommandReply, Origin, Outbound, RoomCommand, RoomHandle, RoomRuntimeConfig,
};

use test_helpers::{song, ScriptedCatalog};

fn test_room(max_rounds: u32, catalog: Arc<ScriptedCatalog>) -> RoomHandle {
    spawn_room(
        "GAME42".to_string(),
        max_rounds,
        vec!["rock".to_string()],
        catalog,
        &RoomRuntimeConfig::default(),
    )
}

async fn attach(
    room: &RoomHandle,
    role: Role,
    team_name: Option<&str>,
) -> (SessionId, mpsc::Receiver<Outbound>) {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(64);
    room.submit(
        Origin::Internal,
        RoomCommand::Attach {
            session_id,
            role,
            team_name: team_name.map(str::to_string),
            sender: tx,
        },
    )
    .await
    .expect("attach succeeds");
    (session_id, rx)
}

async fn next_event(rx: &mut mpsc::Receiver<Outbound>) -> ServerMessage {
    match tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within deadline")
        .expect("queue open")
    {
        Outbound::Event(event) => (*event).clone(),
        Outbound::Close { code, .. } => panic!("unexpected close frame {code}"),
    }
}

async fn assert_quiet(rx: &mut mpsc::Receiver<Outbound>) {
    let outcome = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(outcome.is_err(), "expected no event, got {outcome:?}");
}

async fn manager_cmd(room: &RoomHandle, command: RoomCommand) {
    room.submit(Origin::Manager, command)
        .await
        .expect("manager command succeeds");
}

async fn buzz(room: &RoomHandle, team: &str) {
    room.submit(
        Origin::Team(team.to_string()),
        RoomCommand::BuzzPress {
            team_name: team.to_string(),
            client_ts_ms: 0,
        },
    )
    .await
    .expect("buzz accepted");
}

async fn snapshot(room: &RoomHandle) -> quizbeat_server::protocol::RoomSnapshot {
    match room
        .submit(Origin::Http, RoomCommand::Snapshot)
        .await
        .expect("snapshot")
    {
        CommandReply::Snapshot(snapshot) => *snapshot,
        other => panic!("unexpected reply {other:?}"),
    }
}

/// Two-team happy path: one round, full credit, winner declared.
#[tokio::test]
async fn two_team_happy_path() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, mut rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, _rx_b) = attach(&room, Role::Team, Some("B")).await;
    let (_, _rx_m) = attach(&room, Role::Manager, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;

    // A's stream: its own join, B's join, then the game events.
    match next_event(&mut rx_a).await {
        ServerMessage::TeamsUpdate { teams, total } => {
            assert_eq!(total, 1);
            assert_eq!(teams[0].name, "A");
        }
        other => panic!("expected teams_update, got {other:?}"),
    }
    match next_event(&mut rx_a).await {
        ServerMessage::TeamsUpdate { teams, total } => {
            assert_eq!(total, 2);
            assert_eq!(teams[1].name, "B");
        }
        other => panic!("expected teams_update, got {other:?}"),
    }
    match next_event(&mut rx_a).await {
        ServerMessage::GameStarted { max_rounds } => assert_eq!(max_rounds, 1),
        other => panic!("expected game_started, got {other:?}"),
    }
    match next_event(&mut rx_a).await {
        ServerMessage::RoundStarted {
            round_number,
            song_title,
            answer_value,
            ..
        } => {
            assert_eq!(round_number, 1);
            assert_eq!(song_title, "Song 7");
            assert_eq!(answer_value, "Artist 7");
        }
        other => panic!("expected round_started, got {other:?}"),
    }

    buzz(&room, "A").await;
    match next_event(&mut rx_a).await {
        ServerMessage::BuzzerLocked { team_name, .. } => assert_eq!(team_name, "A"),
        other => panic!("expected buzzer_locked, got {other:?}"),
    }

    manager_cmd(
        &room,
        RoomCommand::EvaluateAnswer {
            song_ok: true,
            artist_or_content_ok: true,
            wrong: false,
        },
    )
    .await;

    match next_event(&mut rx_a).await {
        ServerMessage::AnswerEvaluated {
            team_name,
            delta,
            component_locks,
            scores,
        } => {
            assert_eq!(team_name, "A");
            assert_eq!(delta, 15);
            assert!(component_locks.song_name && component_locks.artist_or_content);
            assert_eq!(scores.len(), 2);
            assert_eq!(scores[0].score, 15);
            assert_eq!(scores[1].score, 0);
        }
        other => panic!("expected answer_evaluated, got {other:?}"),
    }
    match next_event(&mut rx_a).await {
        ServerMessage::RoundCompleted {
            round_number,
            correct_song_title,
            final_round,
            ..
        } => {
            assert_eq!(round_number, 1);
            assert_eq!(correct_song_title, "Song 7");
            assert!(final_round);
        }
        other => panic!("expected round_completed, got {other:?}"),
    }

    manager_cmd(&room, RoomCommand::EndGame).await;
    match next_event(&mut rx_a).await {
        ServerMessage::GameEnded {
            winner,
            final_scores,
            rounds_played,
        } => {
            assert_eq!(winner.as_deref(), Some("A"));
            assert_eq!(rounds_played, 1);
            assert_eq!(final_scores[0].team_name, "A");
            assert_eq!(final_scores[0].score, 15);
            assert_eq!(final_scores[1].team_name, "B");
            assert_eq!(final_scores[1].score, 0);
        }
        other => panic!("expected game_ended, got {other:?}"),
    }
}

/// Wrong-answer penalty then split credit across both teams.
#[tokio::test]
async fn penalty_then_partial_credit() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, _rx_b) = attach(&room, Role::Team, Some("B")).await;
    let (_, mut rx_d) = attach(&room, Role::Display, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;

    // Drain up to the round start.
    loop {
        if matches!(next_event(&mut rx_d).await, ServerMessage::RoundStarted { .. }) {
            break;
        }
    }

    // A buzzes and is wrong: -2, buzzers reopen.
    buzz(&room, "A").await;
    manager_cmd(
        &room,
        RoomCommand::EvaluateAnswer {
            song_ok: false,
            artist_or_content_ok: false,
            wrong: true,
        },
    )
    .await;

    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::BuzzerLocked { .. }
    ));
    match next_event(&mut rx_d).await {
        ServerMessage::AnswerEvaluated {
            team_name, delta, ..
        } => {
            assert_eq!(team_name, "A");
            assert_eq!(delta, -2);
        }
        other => panic!("expected answer_evaluated, got {other:?}"),
    }
    match next_event(&mut rx_d).await {
        ServerMessage::BuzzersReopened { component_locks } => {
            assert_eq!(component_locks, ComponentLocks::default());
        }
        other => panic!("expected buzzers_reopened, got {other:?}"),
    }

    // B takes the song name: +10, artist still open.
    buzz(&room, "B").await;
    manager_cmd(
        &room,
        RoomCommand::EvaluateAnswer {
            song_ok: true,
            artist_or_content_ok: false,
            wrong: false,
        },
    )
    .await;

    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::BuzzerLocked { .. }
    ));
    match next_event(&mut rx_d).await {
        ServerMessage::AnswerEvaluated {
            team_name, delta, ..
        } => {
            assert_eq!(team_name, "B");
            assert_eq!(delta, 10);
        }
        other => panic!("expected answer_evaluated, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::BuzzersReopened { .. }
    ));

    // A takes the artist: +5, round completes. Song name is locked, so the
    // claimed song_ok must not double-credit.
    buzz(&room, "A").await;
    manager_cmd(
        &room,
        RoomCommand::EvaluateAnswer {
            song_ok: true,
            artist_or_content_ok: true,
            wrong: false,
        },
    )
    .await;

    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::BuzzerLocked { .. }
    ));
    match next_event(&mut rx_d).await {
        ServerMessage::AnswerEvaluated {
            team_name,
            delta,
            scores,
            ..
        } => {
            assert_eq!(team_name, "A");
            assert_eq!(delta, 5);
            let a = scores.iter().find(|s| s.team_name == "A").unwrap();
            let b = scores.iter().find(|s| s.team_name == "B").unwrap();
            assert_eq!(a.score, 3);
            assert_eq!(b.score, 10);
        }
        other => panic!("expected answer_evaluated, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::RoundCompleted { .. }
    ));

    manager_cmd(&room, RoomCommand::EndGame).await;
    match next_event(&mut rx_d).await {
        ServerMessage::GameEnded { winner, .. } => assert_eq!(winner.as_deref(), Some("B")),
        other => panic!("expected game_ended, got {other:?}"),
    }
}

/// Catalog exhaustion: the second round cannot start, the room stays
/// playing, and the exclusion set carries the first song exactly once.
#[tokio::test]
async fn song_exhaustion_leaves_room_playing() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(3, Arc::clone(&catalog));

    let (_, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, mut rx_m) = attach(&room, Role::Manager, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;
    loop {
        if matches!(next_event(&mut rx_m).await, ServerMessage::RoundStarted { .. }) {
            break;
        }
    }
    manager_cmd(&room, RoomCommand::SkipRound).await;
    assert!(matches!(
        next_event(&mut rx_m).await,
        ServerMessage::RoundCompleted { .. }
    ));

    // Script is exhausted: the next selection reports no song available.
    manager_cmd(&room, RoomCommand::StartRound).await;
    match next_event(&mut rx_m).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::NoSongAvailable),
        other => panic!("expected error event, got {other:?}"),
    }

    let view = snapshot(&room).await;
    assert_eq!(view.state, RoomState::Playing);
    assert_eq!(view.round_phase, None);
    assert_eq!(view.rounds_played, 1);

    // The manager can retry after the failure.
    manager_cmd(&room, RoomCommand::StartRound).await;
    match next_event(&mut rx_m).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::NoSongAvailable),
        other => panic!("expected error event, got {other:?}"),
    }

    // Exclusions: first call empty, later calls exactly [7].
    let calls = catalog.exclusion_calls();
    assert_eq!(calls[0], Vec::<i64>::new());
    assert_eq!(calls[1], vec![7]);
    assert_eq!(calls[2], vec![7]);
}

/// A transport failure surfaces to the manager and does not consume the
/// round; the retry succeeds.
#[tokio::test]
async fn catalog_outage_is_retryable() {
    let catalog = ScriptedCatalog::new(vec![
        Err(CatalogError::Unavailable("connection refused".to_string())),
        Ok(song(9)),
    ]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, mut rx_m) = attach(&room, Role::Manager, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    assert!(matches!(
        next_event(&mut rx_m).await,
        ServerMessage::GameStarted { .. }
    ));

    manager_cmd(&room, RoomCommand::StartRound).await;
    match next_event(&mut rx_m).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::UpstreamUnavailable),
        other => panic!("expected error event, got {other:?}"),
    }

    manager_cmd(&room, RoomCommand::StartRound).await;
    match next_event(&mut rx_m).await {
        ServerMessage::RoundStarted { round_number, .. } => assert_eq!(round_number, 1),
        other => panic!("expected round_started, got {other:?}"),
    }
}

/// Every attached session observes the identical broadcast sequence.
#[tokio::test]
async fn broadcast_order_is_identical_across_sessions() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, mut rx_d1) = attach(&room, Role::Display, None).await;
    let (_, mut rx_d2) = attach(&room, Role::Display, None).await;
    let (_, mut rx_a) = attach(&room, Role::Team, Some("A")).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;
    // Wait for the round to open before buzzing.
    loop {
        if matches!(next_event(&mut rx_a).await, ServerMessage::RoundStarted { .. }) {
            break;
        }
    }
    buzz(&room, "A").await;
    manager_cmd(
        &room,
        RoomCommand::EvaluateAnswer {
            song_ok: true,
            artist_or_content_ok: true,
            wrong: false,
        },
    )
    .await;
    manager_cmd(&room, RoomCommand::EndGame).await;

    let mut sequences: Vec<Vec<String>> = Vec::new();
    for rx in [&mut rx_d1, &mut rx_d2] {
        let mut events = Vec::new();
        loop {
            let event = next_event(rx).await;
            let is_end = matches!(event, ServerMessage::GameEnded { .. });
            events.push(serde_json::to_string(&event).expect("serialize"));
            if is_end {
                break;
            }
        }
        sequences.push(events);
    }

    assert_eq!(sequences[0], sequences[1]);
    // Both displays attached before any broadcast, so they saw everything:
    // join, game start, round start, lock, evaluation, completion, end.
    assert_eq!(sequences[0].len(), 7);
}

/// Repeated buzzing while locked changes nothing and emits nothing.
#[tokio::test]
async fn repeated_buzz_while_locked_is_silent() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, _rx_b) = attach(&room, Role::Team, Some("B")).await;
    let (_, mut rx_d) = attach(&room, Role::Display, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;
    loop {
        if matches!(next_event(&mut rx_d).await, ServerMessage::RoundStarted { .. }) {
            break;
        }
    }

    buzz(&room, "A").await;
    match next_event(&mut rx_d).await {
        ServerMessage::BuzzerLocked { team_name, .. } => assert_eq!(team_name, "A"),
        other => panic!("expected buzzer_locked, got {other:?}"),
    }

    // Winner mashes the button; a rival tries too. No further events.
    buzz(&room, "A").await;
    buzz(&room, "A").await;
    buzz(&room, "B").await;
    assert_quiet(&mut rx_d).await;
}

/// Media restart is broadcast without touching scores or locks.
#[tokio::test]
async fn restart_song_only_emits_media_restart() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (_, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, mut rx_d) = attach(&room, Role::Display, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::StartRound).await;
    loop {
        if matches!(next_event(&mut rx_d).await, ServerMessage::RoundStarted { .. }) {
            break;
        }
    }

    manager_cmd(&room, RoomCommand::RestartSong).await;
    manager_cmd(&room, RoomCommand::RestartSong).await;
    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::MediaRestart
    ));
    assert!(matches!(
        next_event(&mut rx_d).await,
        ServerMessage::MediaRestart
    ));

    let view = snapshot(&room).await;
    let a = view.teams.iter().find(|t| t.name == "A").unwrap();
    assert_eq!(a.score, 0);
}

/// A detached team resumes into the same roster position with its score.
#[tokio::test]
async fn team_resume_preserves_roster_position() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (a_id, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, _rx_b) = attach(&room, Role::Team, Some("B")).await;

    room.submit(Origin::Internal, RoomCommand::Detach { session_id: a_id })
        .await
        .expect("detach");

    let view = snapshot(&room).await;
    assert_eq!(view.teams[0].name, "A");
    assert!(!view.teams[0].attached);

    let (_, _rx_a2) = attach(&room, Role::Team, Some("A")).await;
    let view = snapshot(&room).await;
    assert_eq!(view.teams[0].name, "A");
    assert!(view.teams[0].attached);
    assert_eq!(view.teams[1].name, "B");
}

/// After the game ends, only detach is accepted; the ledger is frozen.
#[tokio::test]
async fn finished_room_rejects_everything_but_detach() {
    let catalog = ScriptedCatalog::with_songs(&[7]);
    let room = test_room(1, Arc::clone(&catalog));

    let (a_id, _rx_a) = attach(&room, Role::Team, Some("A")).await;
    let (_, _rx_m) = attach(&room, Role::Manager, None).await;

    manager_cmd(&room, RoomCommand::StartGame).await;
    manager_cmd(&room, RoomCommand::EndGame).await;

    for command in [
        RoomCommand::StartGame,
        RoomCommand::StartRound,
        RoomCommand::SkipRound,
        RoomCommand::EndGame,
        RoomCommand::KickTeam {
            team_name: "A".to_string(),
        },
    ] {
        let err = room.submit(Origin::Manager, command).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    let view = snapshot(&room).await;
    assert_eq!(view.state, RoomState::Finished);

    room.submit(Origin::Internal, RoomCommand::Detach { session_id: a_id })
        .await
        .expect("detach still works");
}
