//! Configuration validation.

use super::catalog::CatalogMode;
use super::Config;

/// Validate a loaded configuration before the server starts.
///
/// Returns a multi-line error listing every problem found, so operators can
/// fix a bad deployment in one pass instead of replaying startup failures.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut problems = Vec::new();

    if config.protocol.game_code_length < 4 || config.protocol.game_code_length > 10 {
        problems.push(format!(
            "protocol.game_code_length must be between 4 and 10 (got {})",
            config.protocol.game_code_length
        ));
    }

    if config.protocol.code_allocation_attempts == 0 {
        problems.push("protocol.code_allocation_attempts must be at least 1".to_string());
    }

    if config.protocol.max_team_name_chars == 0 {
        problems.push("protocol.max_team_name_chars must be at least 1".to_string());
    }

    if config.server.outbound_queue_capacity == 0 {
        problems.push("server.outbound_queue_capacity must be at least 1".to_string());
    }

    if config.server.command_queue_capacity == 0 {
        problems.push("server.command_queue_capacity must be at least 1".to_string());
    }

    if config.server.ping_timeout < 35 {
        problems.push(format!(
            "server.ping_timeout must allow at least one 30 s ping period (got {})",
            config.server.ping_timeout
        ));
    }

    match config.catalog.mode {
        CatalogMode::Http => {
            if let Err(e) = url::Url::parse(&config.catalog.base_url) {
                problems.push(format!(
                    "catalog.base_url '{}' is not a valid URL: {e}",
                    config.catalog.base_url
                ));
            }
            if config.catalog.request_timeout == 0 {
                problems.push("catalog.request_timeout must be at least 1 second".to_string());
            }
        }
        CatalogMode::Builtin => {
            if config.catalog.songs_path.is_none() {
                problems.push(
                    "catalog.mode is 'builtin' but catalog.songs_path is not set".to_string(),
                );
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}
