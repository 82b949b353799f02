//! Authoritative state for one game and the round engine that mutates it.
//!
//! Everything here is plain synchronous code driven by the room actor; the
//! actor owns the only reference, so no locking appears at this layer.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::errors::{GameError, GameResult};
use crate::protocol::{
    ComponentLocks, RoomSnapshot, RoomState, RoundPhase, ScoreEntry, SongInfo, TeamEntry,
    TeamStanding,
};

/// Points for a correct song name, credited at most once per round.
pub const SONG_NAME_POINTS: i64 = 10;
/// Points for a correct artist or content, credited at most once per round.
pub const ARTIST_OR_CONTENT_POINTS: i64 = 5;
/// Penalty applied to the buzzing team for a wrong answer.
pub const WRONG_ANSWER_PENALTY: i64 = -2;

/// One roster entry. Roster order is join order and never changes while the
/// team remains in the game.
#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub attached: bool,
    pub joined_at: DateTime<Utc>,
    pub score: i64,
}

/// Internal per-round event log, kept for test observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Disclosed { song_id: i64 },
    Buzz { team_name: String, client_ts_ms: u64 },
    Credit { team_name: String, points: i64 },
    Penalty { team_name: String, points: i64 },
    Reopened,
    Skipped,
    Completed,
}

impl RoundEvent {
    /// Signed score contribution of this event.
    pub fn delta(&self) -> i64 {
        match self {
            Self::Credit { points, .. } | Self::Penalty { points, .. } => *points,
            _ => 0,
        }
    }
}

/// The in-progress round.
#[derive(Debug, Clone)]
pub struct Round {
    pub number: u32,
    pub song: SongInfo,
    pub phase: RoundPhase,
    pub locked_by: Option<String>,
    pub locks: ComponentLocks,
    pub started_at: DateTime<Utc>,
    pub events: Vec<RoundEvent>,
}

/// A frozen round, returned to the caller when play on it ends.
#[derive(Debug, Clone)]
pub struct CompletedRound {
    pub number: u32,
    pub song: SongInfo,
    /// True when this was the last configured round.
    pub final_round: bool,
    pub events: Vec<RoundEvent>,
}

/// Result of admitting a team session into the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new roster entry was appended.
    Joined,
    /// A detached team re-attached under its existing name.
    Resumed,
}

/// Result of a buzz press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// This press won the race and locked the round.
    Locked,
    /// A lock was already held; the press is dropped without error.
    Ignored,
}

/// Result of a manager evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub team_name: String,
    /// Signed score change applied to `team_name` by this verdict.
    pub delta: i64,
    pub locks: ComponentLocks,
    /// Present when the verdict completed the round.
    pub completed: Option<CompletedRound>,
}

/// Final ledger produced by `end_game`.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub winner: Option<String>,
    pub final_scores: Vec<ScoreEntry>,
    pub rounds_played: u32,
}

/// All authoritative state for one game.
#[derive(Debug)]
pub struct GameState {
    code: String,
    state: RoomState,
    teams: Vec<Team>,
    max_rounds: u32,
    genres: Vec<String>,
    played_song_ids: HashSet<i64>,
    /// Ids in play order; the exclusion list sent to the catalog.
    played_song_order: Vec<i64>,
    rounds_played: u32,
    round: Option<Round>,
    /// Round number currently waiting on the catalog, if any.
    pending_selection: Option<u32>,
    created_at: DateTime<Utc>,
}

impl GameState {
    pub fn new(code: String, max_rounds: u32, genres: Vec<String>) -> Self {
        Self {
            code,
            state: RoomState::Waiting,
            teams: Vec::new(),
            max_rounds,
            genres,
            played_song_ids: HashSet::new(),
            played_song_order: Vec::new(),
            rounds_played: 0,
            round: None,
            pending_selection: None,
            created_at: Utc::now(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn played_song_ids(&self) -> &[i64] {
        &self.played_song_order
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// Roster in join order, for `teams_update`.
    pub fn roster(&self) -> Vec<TeamEntry> {
        self.teams
            .iter()
            .map(|t| TeamEntry {
                name: t.name.clone(),
                attached: t.attached,
            })
            .collect()
    }

    /// Full ledger in join order, for `answer_evaluated` and `game_ended`.
    pub fn scores(&self) -> Vec<ScoreEntry> {
        self.teams
            .iter()
            .map(|t| ScoreEntry {
                team_name: t.name.clone(),
                score: t.score,
            })
            .collect()
    }

    /// Admit a team session. Validated name is assumed (see
    /// `protocol::validation`); this only enforces roster rules.
    pub fn join_team(&mut self, name: &str) -> GameResult<JoinOutcome> {
        if let Some(team) = self.teams.iter_mut().find(|t| t.name == name) {
            if team.attached {
                return Err(GameError::NameConflict(format!(
                    "team name '{name}' is already connected"
                )));
            }
            if self.state == RoomState::Finished {
                return Err(GameError::InvalidState(
                    "the game has already ended".to_string(),
                ));
            }
            // A known name is resuming, allowed while waiting or playing.
            team.attached = true;
            return Ok(JoinOutcome::Resumed);
        }

        if self.state != RoomState::Waiting {
            return Err(GameError::InvalidState(
                "the game is not accepting new teams".to_string(),
            ));
        }

        self.teams.push(Team {
            name: name.to_string(),
            attached: true,
            joined_at: Utc::now(),
            score: 0,
        });
        Ok(JoinOutcome::Joined)
    }

    /// Mark a team detached. Returns true if the roster changed.
    pub fn detach_team(&mut self, name: &str) -> bool {
        match self.teams.iter_mut().find(|t| t.name == name) {
            Some(team) if team.attached => {
                team.attached = false;
                true
            }
            _ => false,
        }
    }

    /// Remove a team entirely. Manager-only, and only while waiting.
    pub fn kick_team(&mut self, name: &str) -> GameResult<()> {
        if self.state != RoomState::Waiting {
            return Err(GameError::InvalidState(
                "teams can only be kicked before the game starts".to_string(),
            ));
        }
        let position = self
            .teams
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| GameError::NotFound(format!("no team named '{name}'")))?;
        self.teams.remove(position);
        Ok(())
    }

    /// Open play. Requires at least one attached team.
    pub fn start_game(&mut self) -> GameResult<u32> {
        if self.state != RoomState::Waiting {
            return Err(GameError::InvalidState(
                "the game has already started".to_string(),
            ));
        }
        if !self.teams.iter().any(|t| t.attached) {
            return Err(GameError::InvalidState(
                "at least one connected team is required to start".to_string(),
            ));
        }
        self.state = RoomState::Playing;
        Ok(self.max_rounds)
    }

    /// Reserve the next round number and enter the selection sub-state.
    /// The round itself is only created once the catalog answers.
    pub fn begin_selection(&mut self) -> GameResult<u32> {
        if self.state != RoomState::Playing {
            return Err(GameError::InvalidState(
                "rounds can only be started while the game is playing".to_string(),
            ));
        }
        if self.round.is_some() {
            return Err(GameError::InvalidState(
                "a round is already in progress".to_string(),
            ));
        }
        if self.pending_selection.is_some() {
            return Err(GameError::InvalidState(
                "a song is already being selected".to_string(),
            ));
        }
        if self.rounds_played >= self.max_rounds {
            return Err(GameError::InvalidState(format!(
                "all {} rounds have been played",
                self.max_rounds
            )));
        }

        let number = self.rounds_played + 1;
        self.pending_selection = Some(number);
        Ok(number)
    }

    /// Abort a pending selection. Returns true if it was still expected;
    /// a stale failure (game ended meanwhile) is dropped silently.
    pub fn selection_failed(&mut self, round_number: u32) -> bool {
        if self.pending_selection == Some(round_number) {
            self.pending_selection = None;
            true
        } else {
            false
        }
    }

    /// Complete a pending selection: create the round and disclose the song.
    /// Returns false for a stale completion (selection superseded or game
    /// ended), in which case the song is NOT marked as played.
    pub fn round_started(&mut self, round_number: u32, song: SongInfo) -> bool {
        if self.state != RoomState::Playing || self.pending_selection != Some(round_number) {
            return false;
        }
        self.pending_selection = None;

        if self.played_song_ids.insert(song.id) {
            self.played_song_order.push(song.id);
        }

        self.round = Some(Round {
            number: round_number,
            phase: RoundPhase::SongPlaying,
            locked_by: None,
            locks: ComponentLocks::default(),
            started_at: Utc::now(),
            events: vec![RoundEvent::Disclosed { song_id: song.id }],
            song,
        });
        true
    }

    /// First buzz to be consumed wins; later presses while locked are
    /// ignored without error.
    pub fn buzz(&mut self, team_name: &str, client_ts_ms: u64) -> GameResult<BuzzOutcome> {
        let attached = self
            .team(team_name)
            .ok_or_else(|| GameError::NotFound(format!("no team named '{team_name}'")))?
            .attached;
        if !attached {
            return Err(GameError::InvalidState(
                "team is not connected".to_string(),
            ));
        }

        let round = self.round.as_mut().ok_or_else(|| {
            GameError::InvalidState("no round is in progress".to_string())
        })?;

        match round.phase {
            RoundPhase::SongPlaying => {
                round.phase = RoundPhase::BuzzerLocked;
                round.locked_by = Some(team_name.to_string());
                round.events.push(RoundEvent::Buzz {
                    team_name: team_name.to_string(),
                    client_ts_ms,
                });
                Ok(BuzzOutcome::Locked)
            }
            RoundPhase::BuzzerLocked | RoundPhase::Evaluating => Ok(BuzzOutcome::Ignored),
            RoundPhase::Completed => Err(GameError::InvalidState(
                "the round is already complete".to_string(),
            )),
        }
    }

    /// Apply the manager's verdict on the locked team's answer.
    pub fn evaluate(
        &mut self,
        song_ok: bool,
        artist_or_content_ok: bool,
        wrong: bool,
    ) -> GameResult<EvaluationOutcome> {
        let round = self.round.as_mut().ok_or_else(|| {
            GameError::InvalidState("no round is in progress".to_string())
        })?;

        if !matches!(
            round.phase,
            RoundPhase::BuzzerLocked | RoundPhase::Evaluating
        ) {
            return Err(GameError::InvalidState(
                "no team is locked in to answer".to_string(),
            ));
        }

        // Invariant: locked_by is set whenever the phase is a locked one.
        let team_name = round.locked_by.clone().ok_or_else(|| {
            GameError::InvalidState("no team is locked in to answer".to_string())
        })?;

        let mut delta: i64 = 0;
        if wrong {
            delta = WRONG_ANSWER_PENALTY;
            round.events.push(RoundEvent::Penalty {
                team_name: team_name.clone(),
                points: WRONG_ANSWER_PENALTY,
            });
        } else {
            if song_ok && !round.locks.song_name {
                round.locks.song_name = true;
                delta += SONG_NAME_POINTS;
                round.events.push(RoundEvent::Credit {
                    team_name: team_name.clone(),
                    points: SONG_NAME_POINTS,
                });
            }
            if artist_or_content_ok && !round.locks.artist_or_content {
                round.locks.artist_or_content = true;
                delta += ARTIST_OR_CONTENT_POINTS;
                round.events.push(RoundEvent::Credit {
                    team_name: team_name.clone(),
                    points: ARTIST_OR_CONTENT_POINTS,
                });
            }
        }

        let locks = round.locks;

        if let Some(team) = self.teams.iter_mut().find(|t| t.name == team_name) {
            team.score += delta;
        }

        // Reborrow: the ledger update above needed `self.teams`.
        // SAFETY: presence was checked at the top of the method.
        #[allow(clippy::unwrap_used)]
        let round = self.round.as_mut().unwrap();

        let completed = if locks.both() {
            round.events.push(RoundEvent::Completed);
            round.phase = RoundPhase::Completed;
            Some(self.freeze_round())
        } else {
            round.locked_by = None;
            round.phase = RoundPhase::SongPlaying;
            round.events.push(RoundEvent::Reopened);
            None
        };

        Ok(EvaluationOutcome {
            team_name,
            delta,
            locks,
            completed,
        })
    }

    /// Media restart touches nothing; it only needs a disclosed song.
    pub fn restart_song(&self) -> GameResult<()> {
        match self.round {
            Some(ref round) if round.phase != RoundPhase::Completed => Ok(()),
            _ => Err(GameError::InvalidState(
                "no round is in progress".to_string(),
            )),
        }
    }

    /// Complete the current round without further scoring.
    pub fn skip_round(&mut self) -> GameResult<CompletedRound> {
        let round = self.round.as_mut().ok_or_else(|| {
            GameError::InvalidState("no round is in progress".to_string())
        })?;
        round.events.push(RoundEvent::Skipped);
        round.phase = RoundPhase::Completed;
        Ok(self.freeze_round())
    }

    /// Detach the completed round, advance the counter, and hand the frozen
    /// round back for the completion broadcast.
    fn freeze_round(&mut self) -> CompletedRound {
        // SAFETY: callers transition the round to Completed immediately
        // before calling this.
        #[allow(clippy::unwrap_used)]
        let round = self.round.take().unwrap();
        self.rounds_played = round.number;
        CompletedRound {
            number: round.number,
            song: round.song,
            final_round: round.number >= self.max_rounds,
            events: round.events,
        }
    }

    /// End the game and compute the winner: highest score, ties broken by
    /// earliest join. Joins are serialized by the room, so roster order is
    /// join order and the tie-break is total.
    pub fn end_game(&mut self) -> GameResult<GameSummary> {
        if self.state == RoomState::Finished {
            return Err(GameError::InvalidState(
                "the game has already ended".to_string(),
            ));
        }
        self.state = RoomState::Finished;
        self.round = None;
        self.pending_selection = None;

        let winner = self
            .teams
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.score.cmp(&b.score).then(ib.cmp(ia)))
            .map(|(_, t)| t.name.clone());

        Ok(GameSummary {
            winner,
            final_scores: self.scores(),
            rounds_played: self.rounds_played,
        })
    }

    /// Point-in-time view for the administrative snapshot endpoint.
    pub fn snapshot(&self, manager_attached: bool, display_count: usize) -> RoomSnapshot {
        RoomSnapshot {
            game_code: self.code.clone(),
            state: self.state,
            teams: self
                .teams
                .iter()
                .map(|t| TeamStanding {
                    name: t.name.clone(),
                    attached: t.attached,
                    score: t.score,
                    joined_at: t.joined_at,
                })
                .collect(),
            manager_attached,
            display_count,
            max_rounds: self.max_rounds,
            genres: self.genres.clone(),
            rounds_played: self.rounds_played,
            round_phase: self.round.as_ref().map(|r| r.phase),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorCode;

    fn song(id: i64) -> SongInfo {
        SongInfo {
            id,
            title: format!("Song {id}"),
            artist_or_content: format!("Artist {id}"),
            media_id: format!("media-{id}"),
            is_soundtrack: false,
        }
    }

    fn playing_state(teams: &[&str]) -> GameState {
        let mut state = GameState::new("ABCDEF".to_string(), 3, vec!["rock".to_string()]);
        for name in teams {
            state.join_team(name).unwrap();
        }
        state.start_game().unwrap();
        state
    }

    fn start_round(state: &mut GameState, song_id: i64) -> u32 {
        let number = state.begin_selection().unwrap();
        assert!(state.round_started(number, song(song_id)));
        number
    }

    #[test]
    fn roster_preserves_join_order_and_uniqueness() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        assert_eq!(state.join_team("A").unwrap(), JoinOutcome::Joined);
        assert_eq!(state.join_team("B").unwrap(), JoinOutcome::Joined);

        // Same attached name is a conflict, not a resume.
        let err = state.join_team("A").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NameConflict);

        let roster = state.roster();
        assert_eq!(roster[0].name, "A");
        assert_eq!(roster[1].name, "B");
    }

    #[test]
    fn detached_team_resumes_into_same_roster_slot() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        state.join_team("A").unwrap();
        state.join_team("B").unwrap();

        assert!(state.detach_team("A"));
        assert!(!state.roster()[0].attached);

        assert_eq!(state.join_team("A").unwrap(), JoinOutcome::Resumed);
        let roster = state.roster();
        assert_eq!(roster[0].name, "A");
        assert!(roster[0].attached);
    }

    #[test]
    fn resume_is_allowed_while_playing_but_new_names_are_not() {
        let mut state = playing_state(&["A", "B"]);
        state.detach_team("B");

        assert_eq!(state.join_team("B").unwrap(), JoinOutcome::Resumed);
        let err = state.join_team("C").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    #[test]
    fn start_game_requires_an_attached_team() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        assert_eq!(
            state.start_game().unwrap_err().code(),
            ErrorCode::InvalidState
        );

        state.join_team("A").unwrap();
        state.detach_team("A");
        assert_eq!(
            state.start_game().unwrap_err().code(),
            ErrorCode::InvalidState
        );

        state.join_team("A").unwrap();
        assert_eq!(state.start_game().unwrap(), 1);
        assert_eq!(state.state(), RoomState::Playing);
    }

    #[test]
    fn kick_is_waiting_only() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        state.join_team("A").unwrap();
        state.join_team("B").unwrap();
        state.join_team("C").unwrap();

        state.kick_team("B").unwrap();
        let names: Vec<_> = state.roster().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["A", "C"]);

        state.start_game().unwrap();
        let err = state.kick_team("C").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(state.roster().len(), 2);
    }

    #[test]
    fn selection_reserves_one_round_at_a_time() {
        let mut state = playing_state(&["A"]);

        assert_eq!(state.begin_selection().unwrap(), 1);
        assert_eq!(
            state.begin_selection().unwrap_err().code(),
            ErrorCode::InvalidState
        );

        // Failure clears the reservation so the manager can retry.
        assert!(state.selection_failed(1));
        assert_eq!(state.begin_selection().unwrap(), 1);
    }

    #[test]
    fn stale_selection_completion_is_dropped() {
        let mut state = playing_state(&["A"]);
        let number = state.begin_selection().unwrap();
        state.end_game().unwrap();

        assert!(!state.round_started(number, song(7)));
        assert!(state.played_song_ids().is_empty());
    }

    #[test]
    fn disclosed_songs_enter_the_exclusion_set_once() {
        let mut state = playing_state(&["A"]);
        start_round(&mut state, 7);
        assert_eq!(state.played_song_ids(), &[7]);

        state.skip_round().unwrap();
        start_round(&mut state, 9);
        assert_eq!(state.played_song_ids(), &[7, 9]);
    }

    #[test]
    fn first_buzz_locks_and_later_buzzes_are_ignored() {
        let mut state = playing_state(&["T1", "T2", "T3"]);
        start_round(&mut state, 7);

        assert_eq!(state.buzz("T2", 10).unwrap(), BuzzOutcome::Locked);
        assert_eq!(state.buzz("T1", 11).unwrap(), BuzzOutcome::Ignored);
        assert_eq!(state.buzz("T3", 12).unwrap(), BuzzOutcome::Ignored);
        assert_eq!(state.buzz("T2", 13).unwrap(), BuzzOutcome::Ignored);

        let round = state.round().unwrap();
        assert_eq!(round.locked_by.as_deref(), Some("T2"));
        assert_eq!(round.phase, RoundPhase::BuzzerLocked);
        // Exactly one buzz event was recorded.
        let buzzes = round
            .events
            .iter()
            .filter(|e| matches!(e, RoundEvent::Buzz { .. }))
            .count();
        assert_eq!(buzzes, 1);
    }

    #[test]
    fn buzz_from_unknown_or_detached_team_fails() {
        let mut state = playing_state(&["A"]);
        start_round(&mut state, 7);

        assert_eq!(
            state.buzz("ghost", 0).unwrap_err().code(),
            ErrorCode::NotFound
        );

        state.detach_team("A");
        assert_eq!(
            state.buzz("A", 0).unwrap_err().code(),
            ErrorCode::InvalidState
        );
    }

    #[test]
    fn full_credit_completes_the_round_with_fifteen_points() {
        let mut state = playing_state(&["A", "B"]);
        start_round(&mut state, 7);
        state.buzz("A", 0).unwrap();

        let outcome = state.evaluate(true, true, false).unwrap();
        assert_eq!(outcome.team_name, "A");
        assert_eq!(outcome.delta, 15);
        assert!(outcome.locks.both());
        let completed = outcome.completed.expect("round completes");
        assert_eq!(completed.number, 1);
        assert!(!completed.final_round);

        assert_eq!(state.team("A").unwrap().score, 15);
        assert_eq!(state.team("B").unwrap().score, 0);
        assert!(state.round().is_none());
        assert_eq!(state.rounds_played(), 1);
    }

    #[test]
    fn wrong_answer_penalizes_and_reopens() {
        let mut state = playing_state(&["A", "B"]);
        start_round(&mut state, 7);
        state.buzz("A", 0).unwrap();

        let outcome = state.evaluate(false, false, true).unwrap();
        assert_eq!(outcome.delta, -2);
        assert!(outcome.completed.is_none());
        assert_eq!(state.team("A").unwrap().score, -2);

        let round = state.round().unwrap();
        assert_eq!(round.phase, RoundPhase::SongPlaying);
        assert_eq!(round.locked_by, None);
        assert!(!round.locks.song_name);
    }

    #[test]
    fn locked_component_cannot_be_credited_twice() {
        let mut state = playing_state(&["A", "B"]);
        start_round(&mut state, 7);

        // B takes the song name.
        state.buzz("B", 0).unwrap();
        let outcome = state.evaluate(true, false, false).unwrap();
        assert_eq!(outcome.delta, 10);
        assert!(outcome.completed.is_none());

        // A claims the song name again plus the artist: only +5 lands.
        state.buzz("A", 0).unwrap();
        let outcome = state.evaluate(true, true, false).unwrap();
        assert_eq!(outcome.delta, 5);
        assert!(outcome.completed.is_some());

        assert_eq!(state.team("B").unwrap().score, 10);
        assert_eq!(state.team("A").unwrap().score, 5);
    }

    #[test]
    fn evaluation_requires_a_locked_team() {
        let mut state = playing_state(&["A"]);
        start_round(&mut state, 7);

        let err = state.evaluate(true, false, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    #[test]
    fn round_deltas_reconcile_with_event_log() {
        let mut state = playing_state(&["A", "B"]);
        start_round(&mut state, 7);

        state.buzz("A", 0).unwrap();
        state.evaluate(false, false, true).unwrap();
        state.buzz("B", 0).unwrap();
        state.evaluate(true, false, false).unwrap();
        state.buzz("A", 0).unwrap();
        let outcome = state.evaluate(false, true, false).unwrap();

        let completed = outcome.completed.expect("both components locked");
        let total: i64 = completed.events.iter().map(RoundEvent::delta).sum();
        // -2 (wrong) + 10 (song) + 5 (artist)
        assert_eq!(total, 13);
        assert_eq!(
            state.team("A").unwrap().score + state.team("B").unwrap().score,
            13
        );
    }

    #[test]
    fn skip_round_freezes_without_scoring() {
        let mut state = playing_state(&["A"]);
        start_round(&mut state, 7);
        state.buzz("A", 0).unwrap();
        state.evaluate(false, false, true).unwrap();

        let completed = state.skip_round().unwrap();
        assert_eq!(completed.number, 1);
        assert_eq!(state.team("A").unwrap().score, -2);
        assert!(state.round().is_none());
        assert_eq!(state.rounds_played(), 1);
    }

    #[test]
    fn final_round_is_flagged_but_game_stays_open() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        state.join_team("A").unwrap();
        state.start_game().unwrap();
        start_round(&mut state, 7);

        let completed = state.skip_round().unwrap();
        assert!(completed.final_round);
        assert_eq!(state.state(), RoomState::Playing);

        // No further round may start; the manager must end the game.
        assert_eq!(
            state.begin_selection().unwrap_err().code(),
            ErrorCode::InvalidState
        );
    }

    #[test]
    fn restart_song_needs_a_disclosed_round() {
        let mut state = playing_state(&["A"]);
        assert_eq!(
            state.restart_song().unwrap_err().code(),
            ErrorCode::InvalidState
        );

        start_round(&mut state, 7);
        assert!(state.restart_song().is_ok());

        // Scores and locks untouched however often it runs.
        state.restart_song().unwrap();
        state.restart_song().unwrap();
        let round = state.round().unwrap();
        assert_eq!(round.locks, ComponentLocks::default());
        assert_eq!(state.team("A").unwrap().score, 0);
    }

    #[test]
    fn winner_is_highest_score_with_join_order_tiebreak() {
        let mut state = playing_state(&["A", "B", "C"]);
        start_round(&mut state, 7);
        state.buzz("B", 0).unwrap();
        state.evaluate(true, true, false).unwrap();

        let summary = state.end_game().unwrap();
        assert_eq!(summary.winner.as_deref(), Some("B"));
        assert_eq!(summary.rounds_played, 1);
        assert_eq!(summary.final_scores.len(), 3);
    }

    #[test]
    fn tied_scores_go_to_the_earlier_join() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        state.join_team("first").unwrap();
        state.join_team("second").unwrap();

        // Both teams hold 0 points; the earlier join wins.
        let summary = state.end_game().unwrap();
        assert_eq!(summary.winner.as_deref(), Some("first"));
    }

    #[test]
    fn ending_an_empty_game_has_no_winner() {
        let mut state = GameState::new("ABCDEF".to_string(), 1, vec![]);
        let summary = state.end_game().unwrap();
        assert_eq!(summary.winner, None);
        assert_eq!(summary.final_scores.len(), 0);
    }

    #[test]
    fn finished_game_rejects_further_play() {
        let mut state = playing_state(&["A"]);
        state.end_game().unwrap();

        assert_eq!(
            state.begin_selection().unwrap_err().code(),
            ErrorCode::InvalidState
        );
        assert_eq!(
            state.end_game().unwrap_err().code(),
            ErrorCode::InvalidState
        );
        assert_eq!(
            state.join_team("B").unwrap_err().code(),
            ErrorCode::InvalidState
        );
    }

    #[test]
    fn end_game_from_waiting_is_allowed() {
        let mut state = GameState::new("ABCDEF".to_string(), 3, vec![]);
        state.join_team("A").unwrap();
        let summary = state.end_game().unwrap();
        assert_eq!(summary.winner.as_deref(), Some("A"));
        assert_eq!(summary.rounds_played, 0);
        assert_eq!(state.state(), RoomState::Finished);
    }

    #[test]
    fn snapshot_reflects_round_phase() {
        let mut state = playing_state(&["A"]);
        let snapshot = state.snapshot(true, 2);
        assert_eq!(snapshot.state, RoomState::Playing);
        assert_eq!(snapshot.round_phase, None);
        assert!(snapshot.manager_attached);
        assert_eq!(snapshot.display_count, 2);

        start_round(&mut state, 7);
        let snapshot = state.snapshot(false, 0);
        assert_eq!(snapshot.round_phase, Some(RoundPhase::SongPlaying));
    }
}
