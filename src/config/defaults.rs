//! Default value functions referenced by serde attributes.

use super::logging::LogFormat;

pub fn default_port() -> u16 {
    8090
}

// server

pub fn default_ping_timeout() -> u64 {
    // Clients ping every 30 s; allow two missed pings plus slack.
    65
}

pub fn default_room_sweep_interval() -> u64 {
    60
}

pub fn default_idle_room_ttl() -> u64 {
    // 4 hours, matching the ephemeral design.
    4 * 60 * 60
}

pub fn default_outbound_queue_capacity() -> usize {
    64
}

pub fn default_command_queue_capacity() -> usize {
    256
}

pub fn default_max_rooms() -> usize {
    1000
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

// protocol

pub fn default_game_code_length() -> usize {
    6
}

pub fn default_code_allocation_attempts() -> usize {
    8
}

pub fn default_max_team_name_chars() -> usize {
    30
}

pub fn default_max_rounds_limit() -> u32 {
    30
}

pub fn default_max_genres() -> usize {
    16
}

pub fn default_max_message_size() -> usize {
    16 * 1024
}

// catalog

pub fn default_catalog_base_url() -> String {
    "http://127.0.0.1:8091".to_string()
}

pub fn default_catalog_request_timeout() -> u64 {
    2
}

pub fn default_catalog_retry_backoff_ms() -> u64 {
    250
}

pub fn default_catalog_selection_deadline() -> u64 {
    // Overall bound on a round-start selection, covering the retry.
    5
}

// logging

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub fn default_enable_file_logging() -> bool {
    false
}

pub fn default_log_format() -> LogFormat {
    LogFormat::Text
}
