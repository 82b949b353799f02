//! Server behavior configuration types.

use super::defaults::{
    default_command_queue_capacity, default_cors_origins, default_idle_room_ttl, default_max_rooms,
    default_outbound_queue_capacity, default_ping_timeout, default_room_sweep_interval,
};
use serde::{Deserialize, Serialize};

/// Server configuration for room lifecycle and session plumbing.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Seconds a session may stay silent before it is treated as dead.
    /// Clients ping every 30 s; the default allows two missed pings.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    /// Interval of the registry sweep task (seconds)
    #[serde(default = "default_room_sweep_interval")]
    pub room_sweep_interval: u64,
    /// Seconds a room may sit with no attached sessions before disposal
    #[serde(default = "default_idle_room_ttl")]
    pub idle_room_ttl: u64,
    /// Bound of each session's outbound event queue; overflow drops the session
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Bound of each room's command queue
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,
    /// Maximum number of live rooms
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Comma-separated CORS origins, or "*" for permissive
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ping_timeout: default_ping_timeout(),
            room_sweep_interval: default_room_sweep_interval(),
            idle_room_ttl: default_idle_room_ttl(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            command_queue_capacity: default_command_queue_capacity(),
            max_rooms: default_max_rooms(),
            cors_origins: default_cors_origins(),
        }
    }
}
