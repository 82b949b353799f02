//! Protocol configuration: game codes, team names, round limits.

use super::defaults::{
    default_code_allocation_attempts, default_game_code_length, default_max_genres,
    default_max_message_size, default_max_rounds_limit, default_max_team_name_chars,
};
use serde::{Deserialize, Serialize};

/// Validation limits for the wire protocol.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProtocolConfig {
    /// Length of generated game codes
    #[serde(default = "default_game_code_length")]
    pub game_code_length: usize,
    /// How many random codes to try before reporting capacity exhaustion
    #[serde(default = "default_code_allocation_attempts")]
    pub code_allocation_attempts: usize,
    /// Team name budget, counted in characters
    #[serde(default = "default_max_team_name_chars")]
    pub max_team_name_chars: usize,
    /// Upper bound on a game's configured round count
    #[serde(default = "default_max_rounds_limit")]
    pub max_rounds_limit: u32,
    /// Upper bound on the genre filter size
    #[serde(default = "default_max_genres")]
    pub max_genres: usize,
    /// Maximum inbound WebSocket frame size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            game_code_length: default_game_code_length(),
            code_allocation_attempts: default_code_allocation_attempts(),
            max_team_name_chars: default_max_team_name_chars(),
            max_rounds_limit: default_max_rounds_limit(),
            max_genres: default_max_genres(),
            max_message_size: default_max_message_size(),
        }
    }
}
