#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools
)]

//! # Quizbeat Server
//!
//! In-memory coordinator for real-time music-trivia games: teams race to
//! buzz, a manager adjudicates, displays watch. One actor per game room
//! keeps every mutation and broadcast totally ordered.
//!
//! All state lives in the process; a room disappears with its game.

/// Song catalog collaborator (HTTP service or builtin file)
pub mod catalog;

/// Server configuration and environment variables
pub mod config;

/// Crate-wide error taxonomy
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// Wire protocol: messages, game codes, close codes, validation
pub mod protocol;

/// Room registry: code allocation, lookup, idle sweeping
pub mod registry;

/// Per-game room actor, state machine and scoring
pub mod room;

/// HTTP control surface and server orchestration
pub mod server;

/// WebSocket connection handling
pub mod websocket;
